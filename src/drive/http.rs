// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::backend::{DriveBackend, FOLDER_MIME_TYPE, RemoteItem};
use super::query::SearchQuery;
use crate::storage::error::{StorageError, StorageResult};
use crate::util::paginate::Page;

/// Default root of the Google APIs.
pub const DEFAULT_DRIVE_API_URL: &str = "https://www.googleapis.com/";

const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType)";
const ITEM_FIELDS: &str = "id, name, mimeType";
const UPLOAD_BOUNDARY: &str = "firecam-storage-upload-boundary";

/// Drive v3 REST backend authenticated with a ready-made bearer token.
pub struct DriveHttpBackend {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl DriveHttpBackend {
    /// Create a backend against `base_url` (normally [`DEFAULT_DRIVE_API_URL`]).
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * `base_url` is not a valid URL
    /// * The HTTP client cannot be built
    pub fn new(base_url: &str, access_token: impl Into<String>) -> StorageResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            access_token: access_token.into(),
        })
    }

    fn endpoint(&self, path: &str) -> StorageResult<Url> {
        Ok(self.base_url.join(path)?)
    }
}

/// Turn a non-success response into a `RemoteError` carrying the body.
async fn check_status(response: Response) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StorageError::RemoteError {
        status: status.as_u16(),
        body,
    })
}

/// Body of a `multipart/related` upload: JSON metadata followed by the media.
fn multipart_related_body(metadata: &serde_json::Value, mime_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + 512);
    body.extend_from_slice(
        format!(
            "--{UPLOAD_BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!("--{UPLOAD_BOUNDARY}\r\nContent-Type: {mime_type}\r\n\r\n").as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{UPLOAD_BOUNDARY}--\r\n").as_bytes());
    body
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListDto {
    #[serde(default)]
    files: Vec<FileDto>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileDto {
    id: String,
    #[serde(default)]
    name: String,
    mime_type: Option<String>,
}

impl From<FileDto> for RemoteItem {
    fn from(value: FileDto) -> Self {
        RemoteItem {
            is_folder: value.mime_type.as_deref() == Some(FOLDER_MIME_TYPE),
            id: value.id,
            name: value.name,
            mime_type: value.mime_type,
        }
    }
}

#[async_trait]
impl DriveBackend for DriveHttpBackend {
    fn name(&self) -> &str {
        "drive-v3"
    }

    async fn list(
        &self,
        query: &SearchQuery,
        page_token: Option<&str>,
    ) -> StorageResult<Page<RemoteItem>> {
        let q = query.to_query_string();
        debug!("Drive list q={}, page_token={:?}", q, page_token);

        let mut request = self
            .client
            .get(self.endpoint("drive/v3/files")?)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", q.as_str()),
                ("fields", LIST_FIELDS),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ]);
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = check_status(request.send().await?).await?;
        let payload: FileListDto = response.json().await?;
        Ok(Page::new(
            payload.files.into_iter().map(RemoteItem::from).collect(),
            payload.next_page_token,
        ))
    }

    async fn create_folder(&self, parent_id: &str, name: &str) -> StorageResult<String> {
        let metadata = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
            "parents": [parent_id],
        });

        let response = self
            .client
            .post(self.endpoint("drive/v3/files")?)
            .bearer_auth(&self.access_token)
            .query(&[("supportsAllDrives", "true"), ("fields", "id")])
            .json(&metadata)
            .send()
            .await?;
        let created: FileDto = check_status(response).await?.json().await?;
        Ok(created.id)
    }

    async fn upload(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        content: Bytes,
    ) -> StorageResult<RemoteItem> {
        let metadata = serde_json::json!({
            "name": name,
            "parents": [parent_id],
        });
        let body = multipart_related_body(&metadata, mime_type, &content);

        let response = self
            .client
            .post(self.endpoint("upload/drive/v3/files")?)
            .bearer_auth(&self.access_token)
            .query(&[
                ("uploadType", "multipart"),
                ("supportsAllDrives", "true"),
                ("fields", ITEM_FIELDS),
            ])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={UPLOAD_BOUNDARY}"),
            )
            .body(body)
            .send()
            .await?;
        let created: FileDto = check_status(response).await?.json().await?;
        Ok(created.into())
    }

    async fn download(&self, file_id: &str) -> StorageResult<Bytes> {
        let response = self
            .client
            .get(self.endpoint(&format!("drive/v3/files/{}", file_id))?)
            .bearer_auth(&self.access_token)
            .query(&[("alt", "media"), ("supportsAllDrives", "true")])
            .send()
            .await?;
        Ok(check_status(response).await?.bytes().await?)
    }

    async fn delete(&self, item_id: &str) -> StorageResult<()> {
        let response = self
            .client
            .delete(self.endpoint(&format!("drive/v3/files/{}", item_id))?)
            .bearer_auth(&self.access_token)
            .query(&[("supportsAllDrives", "true")])
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
