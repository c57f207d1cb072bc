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

use super::config::{StorageConfig, StorageType};
use super::error::{StorageError, StorageResult};
use super::path::RemotePath;
use super::provider::{ListMode, StorageProvider, prefix_to_path, string_to_path};
use crate::util::retry::{RetryPolicy, retry_with_policy};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::TryStreamExt;
use object_store::{
    ClientOptions, ObjectStore, ObjectStoreExt, PutPayload, RetryConfig, aws::AmazonS3Builder,
    gcp::GoogleCloudStorageBuilder, local::LocalFileSystem, memory::InMemory,
};
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;

/// Storage provider backed by the `object_store` crate.
///
/// A container maps to one `ObjectStore` handle (a bucket for the cloud
/// backends, a sub-directory for the local one). Handles are built on first
/// use and then shared by every caller for the lifetime of the provider.
pub struct ObjectStoreProvider {
    pub config: StorageConfig,
    retry_policy: RetryPolicy,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl ObjectStoreProvider {
    /// Create a new storage provider from configuration.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * Local storage is configured without a usable 'path' option
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        if config.storage_type == StorageType::Local {
            Self::local_root(&config)?;
        }

        Ok(Self {
            retry_policy: config.retry_policy(),
            config,
            stores: Mutex::new(HashMap::new()),
        })
    }

    /// Replace the retry policy derived from the configuration.
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Get the store for a container, building it on first use.
    fn store_for(&self, container: &str) -> StorageResult<Arc<dyn ObjectStore>> {
        let mut stores = self.stores.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(store) = stores.get(container) {
            return Ok(Arc::clone(store));
        }

        let store: Arc<dyn ObjectStore> = Arc::from(Self::build_store(&self.config, container)?);
        info!(
            "Created {} store for container={}",
            self.config.storage_type_str(),
            container
        );
        stores.insert(container.to_string(), Arc::clone(&store));
        Ok(store)
    }

    /// Build the object store for one container based on configuration.
    fn build_store(config: &StorageConfig, container: &str) -> StorageResult<Box<dyn ObjectStore>> {
        match config.storage_type {
            StorageType::Local => Self::build_local_store(config, container),
            StorageType::Memory => Ok(Box::new(InMemory::new())),
            StorageType::Aws => Self::build_aws_store(config, container),
            StorageType::Gcs => Self::build_gcs_store(config, container),
        }
    }

    /// Resolve the configured local root directory.
    fn local_root(config: &StorageConfig) -> StorageResult<PathBuf> {
        let path = config.options.get("path").ok_or_else(|| {
            StorageError::ConfigError("Local storage requires 'path' option".to_string())
        })?;

        let canonical_path = PathBuf::from(path).canonicalize().map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to resolve path '{}': {} (path must exist)",
                path, e
            ))
        })?;

        if !canonical_path.is_dir() {
            return Err(StorageError::ConfigError(format!(
                "Base path is not a directory: {}",
                canonical_path.display()
            )));
        }
        Ok(canonical_path)
    }

    /// Build a local filesystem store rooted at `<path>/<container>`.
    fn build_local_store(
        config: &StorageConfig,
        container: &str,
    ) -> StorageResult<Box<dyn ObjectStore>> {
        let container_dir = Self::local_root(config)?.join(container);
        std::fs::create_dir_all(&container_dir)?;

        let store = LocalFileSystem::new_with_prefix(&container_dir).map_err(|e| {
            StorageError::ConfigError(format!("Failed to create local store: {}", e))
        })?;
        Ok(Box::new(store))
    }

    /// Build connection options from configuration.
    fn build_connection_options(config: &StorageConfig) -> ClientOptions {
        let mut client_options = ClientOptions::default();
        if let Some(timeout_str) = config.options.get("timeout") {
            if timeout_str == "0" || timeout_str == "disabled" {
                client_options = client_options.with_timeout_disabled();
            } else if let Ok(sec) = timeout_str.parse::<u64>() {
                client_options = client_options.with_timeout(Duration::from_secs(sec))
            }
        };
        if let Some(connect_timeout_str) = config.options.get("connect_timeout") {
            if connect_timeout_str == "0" || connect_timeout_str == "disabled" {
                client_options = client_options.with_connect_timeout_disabled();
            } else if let Ok(sec) = connect_timeout_str.parse::<u64>() {
                client_options = client_options.with_connect_timeout(Duration::from_secs(sec))
            }
        }
        if let Some(pool_idle_timeout_str) = config.options.get("pool_idle_timeout") {
            if let Ok(sec) = pool_idle_timeout_str.parse::<u64>() {
                client_options = client_options.with_pool_idle_timeout(Duration::from_secs(sec))
            }
        }
        if let Some(pool_max_idle_per_host_str) = config.options.get("pool_max_idle_per_host") {
            if let Ok(max_idle) = pool_max_idle_per_host_str.parse::<usize>() {
                client_options = client_options.with_pool_max_idle_per_host(max_idle)
            }
        }
        client_options
    }

    /// Client-level retries are disabled: every call is already wrapped in the
    /// provider's fixed-delay retry policy.
    fn build_retry_options() -> RetryConfig {
        RetryConfig {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Build an AWS S3 store for the bucket named by `container`.
    fn build_aws_store(
        config: &StorageConfig,
        container: &str,
    ) -> StorageResult<Box<dyn ObjectStore>> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(container)
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options());

        for (key, value) in &config.options {
            match key.as_str() {
                "region" => builder = builder.with_region(value),
                "access_key_id" => builder = builder.with_access_key_id(value),
                "secret_access_key" => builder = builder.with_secret_access_key(value),
                "session_token" | "token" => builder = builder.with_token(value),
                "endpoint" => builder = builder.with_endpoint(value),
                "allow_http" => {
                    if value.to_lowercase() == "true" {
                        builder = builder.with_allow_http(true);
                    }
                }
                // Already handled by `build_connection_options` and the retry policy
                "timeout"
                | "connect_timeout"
                | "pool_idle_timeout"
                | "pool_max_idle_per_host"
                | "max_attempts"
                | "retry_delay_secs" => (),
                _ => {
                    tracing::warn!("Unknown AWS S3 option: {}", key);
                }
            }
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create S3 store: {}", e)))?;
        Ok(Box::new(store))
    }

    /// Build a GCS store for the bucket named by `container`.
    fn build_gcs_store(
        config: &StorageConfig,
        container: &str,
    ) -> StorageResult<Box<dyn ObjectStore>> {
        let mut builder = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(container)
            .with_client_options(Self::build_connection_options(config))
            .with_retry(Self::build_retry_options());

        for (key, value) in &config.options {
            match key.as_str() {
                "service_account_key_path" => builder = builder.with_service_account_path(value),
                "service_account_key" => builder = builder.with_service_account_key(value),
                // Already handled by `build_connection_options` and the retry policy
                "timeout"
                | "connect_timeout"
                | "pool_idle_timeout"
                | "pool_max_idle_per_host"
                | "max_attempts"
                | "retry_delay_secs" => (),
                _ => {
                    tracing::warn!("Unknown GCS option: {}", key);
                }
            }
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(format!("Failed to create GCS store: {}", e)))?;
        Ok(Box::new(store))
    }

    /// Retry wrapper for operations that may fail due to transient network errors.
    async fn retry_operation<F, Fut, T>(&self, operation_name: &str, operation: F) -> StorageResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, object_store::Error>>,
    {
        retry_with_policy(&self.retry_policy, operation_name, operation).await
    }
}

#[async_trait]
impl StorageProvider for ObjectStoreProvider {
    fn kind(&self) -> &str {
        self.config.storage_type_str()
    }

    async fn read_file(&self, container: &str, name: &str) -> StorageResult<Bytes> {
        let store = self.store_for(container)?;
        let path = string_to_path(name);
        let (store, path) = (&store, &path);

        self.retry_operation(
            &format!("read_file({})", RemotePath::repack(container, name)),
            || async move { store.get(path).await?.bytes().await },
        )
        .await
    }

    async fn write_file(&self, container: &str, name: &str, data: Bytes) -> StorageResult<()> {
        let store = self.store_for(container)?;
        let path = string_to_path(name);
        let (store, path) = (&store, &path);

        self.retry_operation(
            &format!("write_file({})", RemotePath::repack(container, name)),
            || {
                let payload = PutPayload::from(data.clone());
                async move { store.put(path, payload).await.map(|_| ()) }
            },
        )
        .await
    }

    async fn delete_file(&self, container: &str, name: &str) -> StorageResult<()> {
        let store = self.store_for(container)?;
        let path = string_to_path(name);
        let (store, path) = (&store, &path);

        self.retry_operation(
            &format!("delete_file({})", RemotePath::repack(container, name)),
            || async move { store.delete(path).await },
        )
        .await
    }

    async fn exists(&self, container: &str, name: &str) -> StorageResult<bool> {
        let store = self.store_for(container)?;
        let path = string_to_path(name);
        let (store, path) = (&store, &path);

        self.retry_operation(
            &format!("exists({})", RemotePath::repack(container, name)),
            || async move {
                match store.head(path).await {
                    Ok(_) => Ok(true),
                    Err(object_store::Error::NotFound { .. }) => Ok(false),
                    Err(e) => Err(e),
                }
            },
        )
        .await
    }

    async fn list_entries(
        &self,
        container: &str,
        prefix: &str,
        mode: ListMode,
    ) -> StorageResult<Vec<String>> {
        let store = self.store_for(container)?;
        let object_path = prefix_to_path(prefix);
        let (store, object_path) = (&store, &object_path);

        let mut entries = self
            .retry_operation(
                &format!(
                    "list_entries({}, {:?})",
                    RemotePath::repack(container, prefix),
                    mode
                ),
                || async move {
                    match mode {
                        ListMode::Deep => {
                            store
                                .list(object_path.as_ref())
                                .map_ok(|meta| meta.location.to_string())
                                .try_collect::<Vec<String>>()
                                .await
                        }
                        ListMode::Files => {
                            let list_result =
                                store.list_with_delimiter(object_path.as_ref()).await?;
                            Ok(list_result
                                .objects
                                .into_iter()
                                .map(|meta| meta.location.to_string())
                                .collect())
                        }
                        ListMode::Directories => {
                            let list_result =
                                store.list_with_delimiter(object_path.as_ref()).await?;
                            Ok(list_result
                                .common_prefixes
                                .iter()
                                .map(|prefix| prefix.to_string())
                                .collect())
                        }
                    }
                },
            )
            .await?;

        // Backends disagree on ordering (the local walk is unordered); use key order.
        entries.sort();

        info!(
            "Listed container={}, prefix={}, mode={:?}, count={}",
            container,
            prefix,
            mode,
            entries.len()
        );
        Ok(entries)
    }
}

impl Debug for ObjectStoreProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "StorageProvider(type=object_store, backend={}, retry_policy={:?})",
            self.config.storage_type_str(),
            self.retry_policy
        )
    }
}
