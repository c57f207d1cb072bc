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
use std::fmt::{Debug, Formatter, Result as FmtResult};

use super::query::SearchQuery;
use crate::storage::error::StorageResult;
use crate::util::paginate::Page;

/// MIME type the Drive API uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// A file or folder entry of the collaboration backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: String,
    pub name: String,
    pub is_folder: bool,
    pub mime_type: Option<String>,
}

impl RemoteItem {
    pub fn file(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_folder: false,
            mime_type: None,
        }
    }

    pub fn folder(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_folder: true,
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
        }
    }
}

/// Raw calls expected from the collaboration backend.
///
/// Implementations make a single attempt per call; retries and pagination are
/// layered on top by [`DriveStore`](super::store::DriveStore).
#[async_trait]
pub trait DriveBackend: Send + Sync {
    /// Short name of the backend, used in logs.
    fn name(&self) -> &str;

    /// One page of the children matching `query`, continuing from `page_token`.
    async fn list(
        &self,
        query: &SearchQuery,
        page_token: Option<&str>,
    ) -> StorageResult<Page<RemoteItem>>;

    /// Create a folder and return its ID.
    async fn create_folder(&self, parent_id: &str, name: &str) -> StorageResult<String>;

    /// Create a file with the given content inside `parent_id`.
    async fn upload(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        content: Bytes,
    ) -> StorageResult<RemoteItem>;

    /// Fetch the content of a file.
    async fn download(&self, file_id: &str) -> StorageResult<Bytes>;

    /// Delete a file or folder.
    async fn delete(&self, item_id: &str) -> StorageResult<()>;
}

impl Debug for dyn DriveBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "DriveBackend(name={})", self.name())
    }
}
