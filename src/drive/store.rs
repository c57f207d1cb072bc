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

use bytes::Bytes;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use super::backend::{DriveBackend, RemoteItem};
use super::query::{SearchFilter, SearchQuery};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::provider::partial_download_path;
use crate::util::paginate::{Page, list_all, list_all_strict};
use crate::util::retry::RetryPolicy;

/// Page token asking for a paged search that starts at the first page.
pub const PAGE_TOKEN_INIT: &str = "init";

/// Image class name (smoke, nonSmoke, ...) to the ID of its top-level folder.
pub type ClassLocations = HashMap<String, String>;

/// Folder and file operations against the collaboration backend.
///
/// Every backend call runs under the retry policy; searches over large
/// folders are drained page by page. Lookups that need a unique match fail
/// with [`StorageError::NotUnique`] and are never retried.
pub struct DriveStore {
    backend: Arc<dyn DriveBackend>,
    retry_policy: RetryPolicy,
}

impl DriveStore {
    pub fn new(backend: Arc<dyn DriveBackend>) -> Self {
        Self {
            backend,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Create a folder named `name` inside `parent_id` and return its ID.
    pub async fn create_folder(&self, parent_id: &str, name: &str) -> StorageResult<String> {
        let backend = &self.backend;
        let folder_id = self
            .retry_policy
            .execute(&format!("create_folder({})", name), move || {
                backend.create_folder(parent_id, name)
            })
            .await?;
        info!(
            "Created folder name={}, id={}, parent={}",
            name, folder_id, parent_id
        );
        Ok(folder_id)
    }

    /// Delete a file or folder by ID.
    pub async fn delete_item(&self, item_id: &str) -> StorageResult<()> {
        let backend = &self.backend;
        self.retry_policy
            .execute(&format!("delete_item({})", item_id), move || {
                backend.delete(item_id)
            })
            .await
    }

    /// One page of the children of `parent_id` matching `filter`.
    ///
    /// A `page_token` of [`PAGE_TOKEN_INIT`] starts from the first page, like
    /// `None`.
    pub async fn search(
        &self,
        parent_id: &str,
        filter: &SearchFilter,
        page_token: Option<&str>,
    ) -> StorageResult<Page<RemoteItem>> {
        let page_token = page_token.filter(|token| *token != PAGE_TOKEN_INIT);
        let query = SearchQuery::new(parent_id, filter.clone());
        let (backend, query) = (&self.backend, &query);

        self.retry_policy
            .execute(&format!("search({})", parent_id), move || {
                backend.list(query, page_token)
            })
            .await
    }

    /// Every child of `parent_id` matching `filter`, across all pages.
    ///
    /// A page that cannot be fetched ends the listing early with the items
    /// gathered so far.
    pub async fn search_all(
        &self,
        parent_id: &str,
        filter: &SearchFilter,
    ) -> StorageResult<Vec<RemoteItem>> {
        list_all(&format!("search_all({})", parent_id), |page_token| async move {
            self.search(parent_id, filter, page_token.as_deref()).await
        })
        .await
    }

    /// Children of `parent_id` named exactly `name`.
    pub async fn list_by_name(&self, parent_id: &str, name: &str) -> StorageResult<Vec<RemoteItem>> {
        self.search_all(parent_id, &SearchFilter::by_name(name)).await
    }

    /// The single child of `parent_id` named `name`.
    ///
    /// Every page of the search must be fetched: a page that exhausts its
    /// retries fails the lookup with `RetriesExhausted` instead of deciding
    /// uniqueness on a partial listing.
    pub async fn find_unique(&self, parent_id: &str, name: &str) -> StorageResult<RemoteItem> {
        let filter = SearchFilter::by_name(name);
        let filter = &filter;
        let mut matches = list_all_strict(
            &format!("find_unique({}, {})", parent_id, name),
            |page_token| async move {
                self.search(parent_id, filter, page_token.as_deref()).await
            },
        )
        .await?;
        if matches.len() != 1 {
            error!(
                "Expected 1 item with name={} in parent={}, but found count={}: {:?}",
                name,
                parent_id,
                matches.len(),
                matches
            );
            return Err(StorageError::NotUnique {
                parent_id: parent_id.to_string(),
                name: name.to_string(),
                found: matches.len(),
            });
        }
        Ok(matches.remove(0))
    }

    /// Download the file named `name` in `parent_id` to `local_path`.
    ///
    /// # Errors
    ///
    /// Fails with `StorageError::NotUnique` unless exactly one item has that
    /// name; nothing is downloaded in that case.
    pub async fn download(
        &self,
        parent_id: &str,
        name: &str,
        local_path: &Path,
    ) -> StorageResult<()> {
        let item = self.find_unique(parent_id, name).await?;
        self.download_by_id(&item.id, local_path).await
    }

    /// Download a file by ID to `local_path`.
    pub async fn download_by_id(&self, file_id: &str, local_path: &Path) -> StorageResult<()> {
        let backend = &self.backend;
        let content = self
            .retry_policy
            .execute(&format!("download({})", file_id), move || {
                backend.download(file_id)
            })
            .await?;
        let partial_path = partial_download_path(local_path);
        tokio::fs::write(&partial_path, &content).await?;
        if let Err(e) = tokio::fs::rename(&partial_path, local_path).await {
            let _ = tokio::fs::remove_file(&partial_path).await;
            return Err(e.into());
        }
        info!(
            "Downloaded file_id={} to local_path={}, bytes={}",
            file_id,
            local_path.display(),
            content.len()
        );
        Ok(())
    }

    /// Upload a local file into `parent_id`, keeping its file name.
    pub async fn upload(&self, parent_id: &str, local_path: &Path) -> StorageResult<RemoteItem> {
        let name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                StorageError::InvalidPath(format!(
                    "No file name in local path: {}",
                    local_path.display()
                ))
            })?;
        let content = Bytes::from(tokio::fs::read(local_path).await?);
        let mime_type = guess_mime_type(local_path);
        let backend = &self.backend;

        let item = self
            .retry_policy
            .execute(&format!("upload({})", local_path.display()), move || {
                backend.upload(parent_id, name, mime_type, content.clone())
            })
            .await?;
        info!(
            "Uploaded local_path={} as id={}, parent={}",
            local_path.display(),
            item.id,
            parent_id
        );
        Ok(item)
    }

    /// Folder holding the images of `camera_id` under the `image_class` root.
    ///
    /// # Returns
    ///
    /// `(folder_id, folder_name)` of the camera folder.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * `image_class` has no entry in `class_locations`
    /// * Zero or several folders carry the camera name, which means the remote
    ///   folder layout is broken and is not retried
    pub async fn resolve_camera_image_folder(
        &self,
        class_locations: &ClassLocations,
        image_class: &str,
        camera_id: &str,
    ) -> StorageResult<(String, String)> {
        let parent_id = class_locations.get(image_class).ok_or_else(|| {
            StorageError::ConfigError(format!("No folder configured for image class {}", image_class))
        })?;

        match self.find_unique(parent_id, camera_id).await {
            Ok(folder) => Ok((folder.id, folder.name)),
            Err(e) => {
                error!(
                    "Camera folder lookup failed for image_class={}, camera={}, locations={:?}",
                    image_class, camera_id, class_locations
                );
                Err(e)
            }
        }
    }

    /// Download `file_name` of `camera_id` from the `image_class` folders into
    /// `output_dir`, unless a file with that name is already there.
    ///
    /// # Returns
    ///
    /// The local path of the image.
    pub async fn download_class_image(
        &self,
        class_locations: &ClassLocations,
        image_class: &str,
        camera_id: &str,
        file_name: &str,
        output_dir: &Path,
    ) -> StorageResult<PathBuf> {
        let local_path = output_dir.join(file_name);
        if tokio::fs::try_exists(&local_path).await? {
            return Ok(local_path);
        }

        let (folder_id, _) = self
            .resolve_camera_image_folder(class_locations, image_class, camera_id)
            .await?;
        self.download(&folder_id, file_name, &local_path).await?;
        Ok(local_path)
    }
}

impl Debug for DriveStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DriveStore(backend={}, retry_policy={:?})",
            self.backend.name(),
            self.retry_policy
        )
    }
}

fn guess_mime_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("csv") => "text/csv",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        Some("mp4") => "video/mp4",
        _ => "application/octet-stream",
    }
}
