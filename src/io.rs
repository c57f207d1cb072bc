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

use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::path::RemotePath;
use crate::storage::provider::StorageProvider;

/// Path-based file access that dispatches between the object store and the
/// local filesystem.
///
/// Paths in the remote notation (`gs://container/name`) go to the provider;
/// every other path is a local filesystem path.
#[derive(Debug, Clone)]
pub struct UnifiedIo {
    provider: Arc<dyn StorageProvider>,
}

impl UnifiedIo {
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn StorageProvider> {
        &self.provider
    }

    /// Read the whole content of a remote or local file as text.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The file cannot be read
    /// * The content is not valid UTF-8
    pub async fn read_text(&self, path: &str) -> StorageResult<String> {
        match RemotePath::parse(path) {
            Some(remote) => {
                let data = self
                    .provider
                    .read_file(&remote.container, &remote.name)
                    .await?;
                Ok(String::from_utf8(data.to_vec())?)
            }
            None => Ok(tokio::fs::read_to_string(path).await?),
        }
    }

    /// Copy a local file into a remote or local directory.
    ///
    /// # Returns
    ///
    /// The full path of the copy: `gs://<container>/<dir>/<file name>` for a
    /// remote destination, `<dest>/<file name>` otherwise.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * `src` is a remote path
    /// * `src` has no file name
    /// * The upload or the local copy fails
    pub async fn copy_local_file_to(&self, src: &str, dest_dir: &str) -> StorageResult<String> {
        if RemotePath::is_remote(src) {
            return Err(StorageError::InvalidPath(format!(
                "Source must be a local path: {}",
                src
            )));
        }

        let src_path = Path::new(src);
        let file_name = src_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::InvalidPath(format!("No file name in path: {}", src)))?;

        match RemotePath::parse(dest_dir) {
            Some(dest) => {
                let target = dest.join(file_name);
                self.provider
                    .upload_file(&target.container, &target.name, src_path)
                    .await?;
                Ok(target.to_string())
            }
            None => {
                tokio::fs::create_dir_all(dest_dir).await?;
                let target = Path::new(dest_dir).join(file_name);
                let bytes = tokio::fs::copy(src_path, &target).await?;
                info!(
                    "Copied local_path={} to {}, bytes={}",
                    src,
                    target.display(),
                    bytes
                );
                Ok(target.to_string_lossy().into_owned())
            }
        }
    }
}

/// Directory path under `parent` named after `date` (`YYYY-MM-DD`).
pub fn date_sub_dir(parent: &str, date: NaiveDate) -> String {
    let sub_dir = date.format("%Y-%m-%d");
    if parent.ends_with('/') {
        format!("{}{}", parent, sub_dir)
    } else {
        format!("{}/{}", parent, sub_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::config::StorageConfig;
    use crate::storage::object_store::ObjectStoreProvider;
    use crate::util::retry::RetryPolicy;
    use bytes::Bytes;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn memory_io() -> UnifiedIo {
        let provider = ObjectStoreProvider::new(StorageConfig::memory())
            .await
            .unwrap()
            .with_retry_policy(RetryPolicy::new(2, Duration::ZERO));
        UnifiedIo::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn test_read_text_remote() {
        let io = memory_io().await;
        io.provider()
            .write_file("settings", "cams/list.json", Bytes::from_static(b"{\"a\":1}"))
            .await
            .unwrap();

        let text = io.read_text("gs://settings/cams/list.json").await.unwrap();
        assert_eq!(text, "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_read_text_remote_invalid_utf8() {
        let io = memory_io().await;
        io.provider()
            .write_file("b", "bin", Bytes::from_static(&[0xff, 0xfe]))
            .await
            .unwrap();

        let result = io.read_text("gs://b/bin").await;
        assert!(matches!(result, Err(StorageError::Utf8Error(_))));
    }

    #[tokio::test]
    async fn test_read_text_local() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join("notes.txt");
        std::fs::write(&local, "hello fire").unwrap();

        let io = memory_io().await;
        let text = io.read_text(local.to_str().unwrap()).await.unwrap();
        assert_eq!(text, "hello fire");
    }

    #[tokio::test]
    async fn test_copy_to_remote_dir() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join("img.jpg");
        std::fs::write(&local, b"pixels").unwrap();

        let io = memory_io().await;
        for dest in ["gs://images/archive", "gs://images/archive/"] {
            let copied = io
                .copy_local_file_to(local.to_str().unwrap(), dest)
                .await
                .unwrap();
            assert_eq!(copied, "gs://images/archive/img.jpg");
        }
        assert_eq!(
            io.provider()
                .read_file("images", "archive/img.jpg")
                .await
                .unwrap(),
            Bytes::from_static(b"pixels")
        );
    }

    #[tokio::test]
    async fn test_copy_to_local_dir_creates_directories() {
        let temp = TempDir::new().unwrap();
        let local = temp.path().join("img.jpg");
        std::fs::write(&local, b"pixels").unwrap();
        let dest = temp.path().join("out").join("nested");

        let io = memory_io().await;
        let copied = io
            .copy_local_file_to(local.to_str().unwrap(), dest.to_str().unwrap())
            .await
            .unwrap();

        assert_eq!(copied, dest.join("img.jpg").to_string_lossy());
        assert_eq!(std::fs::read(dest.join("img.jpg")).unwrap(), b"pixels");
    }

    #[tokio::test]
    async fn test_copy_rejects_remote_source() {
        let io = memory_io().await;
        let result = io.copy_local_file_to("gs://b/img.jpg", "/tmp").await;
        assert!(matches!(result, Err(StorageError::InvalidPath(_))));
    }

    #[test]
    fn test_date_sub_dir() {
        let date = NaiveDate::from_ymd_opt(2019, 6, 1).unwrap();
        assert_eq!(date_sub_dir("gs://b/dir", date), "gs://b/dir/2019-06-01");
        assert_eq!(date_sub_dir("/tmp/out/", date), "/tmp/out/2019-06-01");
    }
}
