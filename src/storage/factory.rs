use std::sync::Arc;

use super::config::StorageConfig;
use super::error::StorageResult;
use super::object_store::ObjectStoreProvider;
use super::provider::StorageProvider;

/// Factory for creating storage providers
pub struct StorageProviderFactory;

impl StorageProviderFactory {
    /// Create a storage provider from a configuration.
    ///
    /// Every backend (GCS, AWS S3, local directory, in-memory) is served by the
    /// same `object_store`-based provider.
    ///
    /// # Returns
    ///
    /// A `Result` containing:
    /// * `Ok(Arc<dyn StorageProvider>)` - A thread-safe reference to the initialized storage provider
    /// * `Err(StorageError)` - If the provider cannot be created
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The storage configuration is invalid
    /// * Required configuration options are missing
    pub async fn from_config(config: StorageConfig) -> StorageResult<Arc<dyn StorageProvider>> {
        let provider = ObjectStoreProvider::new(config).await?;
        Ok(Arc::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_from_config_memory() {
        let provider = StorageProviderFactory::from_config(StorageConfig::memory())
            .await
            .unwrap();
        assert_eq!(provider.kind(), "memory");

        provider
            .write_file("bucket", "k", Bytes::from_static(b"v"))
            .await
            .unwrap();
        assert!(provider.exists("bucket", "k").await.unwrap());
    }

    #[tokio::test]
    async fn test_from_config_invalid_local() {
        let result = StorageProviderFactory::from_config(StorageConfig::local()).await;
        assert!(result.is_err());
    }
}
