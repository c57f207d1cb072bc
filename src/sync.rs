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

use futures::stream::{self, StreamExt};
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::path::{RemotePath, leaf_name};
use crate::storage::provider::{ListMode, StorageProvider};

/// Counts gathered by one tree download.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub downloaded: usize,
    /// Files already present locally, left untouched.
    pub skipped: usize,
    pub failed: usize,
    /// Directories visited, the starting one included.
    pub directories: usize,
}

impl Display for SyncReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "downloaded={}, skipped={}, failed={}, directories={}",
            self.downloaded, self.skipped, self.failed, self.directories
        )
    }
}

/// Recursive download of an object-store directory into a local directory.
#[derive(Debug, Clone)]
pub struct TreeSync {
    provider: Arc<dyn StorageProvider>,
    parallelism: usize,
}

impl TreeSync {
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self {
            provider,
            parallelism: 1,
        }
    }

    /// Number of files of one directory fetched concurrently (at least 1).
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Mirror `remote_dir` of `container` into `local_dir`.
    ///
    /// Files of a directory are fetched first, then its sub-directories are
    /// walked depth-first in listing order. Files that already exist locally
    /// are not fetched again, so an interrupted sync can simply be re-run.
    /// A file that fails to download is logged and counted, and a listing that
    /// keeps failing is skipped; neither stops the walk. Sub-directories are
    /// still walked when only the file listing of their parent failed.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * A local directory cannot be created
    /// * A listing fails with an error other than retry exhaustion
    pub async fn download_tree(
        &self,
        container: &str,
        remote_dir: &str,
        local_dir: &Path,
    ) -> StorageResult<SyncReport> {
        let mut report = SyncReport::default();
        let mut pending: Vec<(String, PathBuf)> =
            vec![(remote_dir.to_string(), local_dir.to_path_buf())];

        while let Some((dir, local)) = pending.pop() {
            tokio::fs::create_dir_all(&local).await?;
            let prefix = directory_prefix(&dir);
            report.directories += 1;

            if let Some(files) = self
                .list_or_skip(container, &prefix, ListMode::Files)
                .await?
            {
                self.download_files(container, &files, &local, &mut report)
                    .await;
            }

            let Some(dirs) = self
                .list_or_skip(container, &prefix, ListMode::Directories)
                .await?
            else {
                continue;
            };
            for sub_dir in dirs.into_iter().rev() {
                let next_local = local.join(leaf_name(&sub_dir));
                pending.push((sub_dir, next_local));
            }
        }

        info!(
            "Synced {} into local_dir={}: {}",
            RemotePath::repack(container, remote_dir),
            local_dir.display(),
            report
        );
        Ok(report)
    }

    async fn list_or_skip(
        &self,
        container: &str,
        prefix: &str,
        mode: ListMode,
    ) -> StorageResult<Option<Vec<String>>> {
        match self.provider.list_entries(container, prefix, mode).await {
            Ok(entries) => Ok(Some(entries)),
            Err(e @ StorageError::RetriesExhausted { .. }) => {
                warn!(
                    "Skipping {}, listing failed: {}",
                    RemotePath::repack(container, prefix),
                    e
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn download_files(
        &self,
        container: &str,
        files: &[String],
        local_dir: &Path,
        report: &mut SyncReport,
    ) {
        let provider = &self.provider;
        let outcomes: Vec<(&String, StorageResult<bool>)> = stream::iter(files)
            .map(|key| async move {
                let local_path = local_dir.join(leaf_name(key));
                (key, provider.download_file(container, key, &local_path).await)
            })
            .buffered(self.parallelism)
            .collect()
            .await;

        for (key, outcome) in outcomes {
            match outcome {
                Ok(true) => report.downloaded += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    error!(
                        "Failed to download {}: {}",
                        RemotePath::repack(container, key),
                        e
                    );
                    report.failed += 1;
                }
            }
        }
    }
}

/// Listing prefix of a directory: ends with `/`, or is empty for the root.
fn directory_prefix(dir: &str) -> String {
    let trimmed = dir.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}
