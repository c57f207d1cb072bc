// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path as ObjectPath;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::StorageResult;
use super::path::RemotePath;

/// Shape of a listing below a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListMode {
    /// Objects directly under the prefix; nested levels are grouped away.
    Files,
    /// The grouped sub-prefixes ("directories") directly under the prefix,
    /// without trailing delimiter.
    Directories,
    /// Every object under the prefix, flattened.
    Deep,
}

/// Generic trait for object storage providers
///
/// Objects are addressed by container (bucket) and name (key). Every remote
/// call made by an implementation goes through its retry policy, so a
/// [`StorageError::RetriesExhausted`](super::error::StorageError::RetriesExhausted)
/// result means the backend stayed unavailable.
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// Short name of the backend ("gcs", "local", ...).
    fn kind(&self) -> &str;

    /// Read the contents of an object.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The object does not exist
    /// * Permission denied
    /// * Network or storage access errors persist through all retries
    async fn read_file(&self, container: &str, name: &str) -> StorageResult<Bytes>;

    /// Create or replace an object.
    async fn write_file(&self, container: &str, name: &str, data: Bytes) -> StorageResult<()>;

    /// Delete an object.
    async fn delete_file(&self, container: &str, name: &str) -> StorageResult<()>;

    /// Check if an object exists.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The object exists
    /// * `Ok(false)` - The object does not exist
    /// * `Err(StorageError)` - If the existence check fails (not including NotFound)
    async fn exists(&self, container: &str, name: &str) -> StorageResult<bool>;

    /// List entry names below `prefix`, shaped by `mode`.
    ///
    /// Returned names are full keys inside the container, in backend order.
    async fn list_entries(
        &self,
        container: &str,
        prefix: &str,
        mode: ListMode,
    ) -> StorageResult<Vec<String>>;

    /// Upload a local file as an object.
    async fn upload_file(
        &self,
        container: &str,
        name: &str,
        local_path: &Path,
    ) -> StorageResult<()> {
        let data = tokio::fs::read(local_path).await?;
        info!(
            "Uploading local_path={} to {}, bytes={}",
            local_path.display(),
            RemotePath::repack(container, name),
            data.len()
        );
        self.write_file(container, name, Bytes::from(data)).await
    }

    /// Download an object into a local file.
    ///
    /// Nothing is fetched when `local_path` already exists: only existence is
    /// checked, never size or freshness.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The object was downloaded
    /// * `Ok(false)` - The local file already existed and was left untouched
    async fn download_file(
        &self,
        container: &str,
        name: &str,
        local_path: &Path,
    ) -> StorageResult<bool> {
        if tokio::fs::try_exists(local_path).await? {
            debug!(
                "Skipping {}, local_path={} already exists",
                RemotePath::repack(container, name),
                local_path.display()
            );
            return Ok(false);
        }

        let data = self.read_file(container, name).await?;
        let partial_path = partial_download_path(local_path);
        tokio::fs::write(&partial_path, &data).await?;
        if let Err(e) = tokio::fs::rename(&partial_path, local_path).await {
            let _ = tokio::fs::remove_file(&partial_path).await;
            return Err(e.into());
        }
        info!(
            "Downloaded {} to local_path={}, bytes={}",
            RemotePath::repack(container, name),
            local_path.display(),
            data.len()
        );
        Ok(true)
    }
}

impl Debug for dyn StorageProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "StorageProvider(kind={})", self.kind())
    }
}

/// Sibling of `local_path` that receives a download until it is complete, so
/// an interrupted transfer never leaves a file at `local_path`.
pub(crate) fn partial_download_path(local_path: &Path) -> PathBuf {
    let file_name = local_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    local_path.with_file_name(format!(".{}.part", file_name))
}

/// Helper function to create an ObjectPath from a string
pub(crate) fn string_to_path(s: &str) -> ObjectPath {
    ObjectPath::from(s)
}

/// Listing prefix as an ObjectPath, `None` for the container root.
pub(crate) fn prefix_to_path(prefix: &str) -> Option<ObjectPath> {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(string_to_path(trimmed))
    }
}
