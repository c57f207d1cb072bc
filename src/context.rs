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

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use crate::drive::http::{DEFAULT_DRIVE_API_URL, DriveHttpBackend};
use crate::drive::store::DriveStore;
use crate::io::UnifiedIo;
use crate::messaging::{DEFAULT_PUBSUB_API_URL, MessagePublisher, PubSubHttpPublisher, TopicPublisher};
use crate::settings::Settings;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::factory::StorageProviderFactory;
use crate::storage::provider::StorageProvider;
use crate::sync::TreeSync;

/// Shared handles to the remote services.
///
/// Each handle is created on first use from the settings and then reused by
/// every caller. Concurrent first uses still create the handle only once.
///
/// # Example
///
/// ```rust,no_run
/// use firecam_storage::{ServiceContext, Settings};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let context = ServiceContext::new(Settings::from_env()?);
/// let io = context.unified_io().await?;
/// let cameras = io.read_text("gs://fire-settings/cameras.json").await?;
/// println!("{}", cameras);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ServiceContext {
    settings: Settings,
    storage: OnceCell<Arc<dyn StorageProvider>>,
    drive: OnceCell<Arc<DriveStore>>,
    publisher: OnceCell<Arc<dyn MessagePublisher>>,
}

impl ServiceContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            storage: OnceCell::new(),
            drive: OnceCell::new(),
            publisher: OnceCell::new(),
        }
    }

    /// Use `provider` instead of building one from the settings.
    pub fn with_storage(self, provider: Arc<dyn StorageProvider>) -> Self {
        Self {
            storage: OnceCell::new_with(Some(provider)),
            ..self
        }
    }

    /// Use `drive` instead of building one from the settings.
    pub fn with_drive(self, drive: Arc<DriveStore>) -> Self {
        Self {
            drive: OnceCell::new_with(Some(drive)),
            ..self
        }
    }

    /// Use `publisher` instead of building one from the settings.
    pub fn with_publisher(self, publisher: Arc<dyn MessagePublisher>) -> Self {
        Self {
            publisher: OnceCell::new_with(Some(publisher)),
            ..self
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The object-store provider.
    pub async fn storage(&self) -> StorageResult<Arc<dyn StorageProvider>> {
        let provider = self
            .storage
            .get_or_try_init(|| async {
                let config = self.settings.storage_config();
                info!("Creating storage provider type={}", config.storage_type_str());
                StorageProviderFactory::from_config(config).await
            })
            .await?;
        Ok(Arc::clone(provider))
    }

    /// The collaboration store.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigError` when the settings carry no access
    /// token.
    pub async fn drive(&self) -> StorageResult<Arc<DriveStore>> {
        let drive = self
            .drive
            .get_or_try_init(|| async {
                let token = self.settings.require_access_token()?;
                let base_url = self
                    .settings
                    .drive_api_url
                    .as_deref()
                    .unwrap_or(DEFAULT_DRIVE_API_URL);
                info!("Creating drive client base_url={}", base_url);
                let backend = DriveHttpBackend::new(base_url, token)?;
                Ok::<_, StorageError>(Arc::new(DriveStore::new(Arc::new(backend))))
            })
            .await?;
        Ok(Arc::clone(drive))
    }

    /// Publisher bound to the configured topic.
    ///
    /// When no topic is configured, no client is created and the returned
    /// publisher drops every message.
    pub async fn topic_publisher(&self) -> StorageResult<TopicPublisher> {
        let topic = self.settings.pubsub_topic.clone().filter(|t| !t.is_empty());
        let publisher: Arc<dyn MessagePublisher> = match topic {
            Some(_) => Arc::clone(self.message_publisher().await?),
            None => Arc::new(DisabledPublisher),
        };
        Ok(TopicPublisher::new(publisher, topic))
    }

    async fn message_publisher(&self) -> StorageResult<&Arc<dyn MessagePublisher>> {
        self.publisher
            .get_or_try_init(|| async {
                let token = self.settings.require_access_token()?;
                let project = self.settings.gcp_project.as_deref().ok_or_else(|| {
                    StorageError::ConfigError("Settings lack 'gcpProject'".to_string())
                })?;
                let base_url = self
                    .settings
                    .pubsub_api_url
                    .as_deref()
                    .unwrap_or(DEFAULT_PUBSUB_API_URL);
                info!("Creating pubsub client project={}", project);
                let publisher: Arc<dyn MessagePublisher> =
                    Arc::new(PubSubHttpPublisher::new(base_url, project, token)?);
                Ok::<_, StorageError>(publisher)
            })
            .await
    }

    pub async fn unified_io(&self) -> StorageResult<UnifiedIo> {
        Ok(UnifiedIo::new(self.storage().await?))
    }

    pub async fn tree_sync(&self) -> StorageResult<TreeSync> {
        Ok(TreeSync::new(self.storage().await?))
    }
}

/// Publisher used when no topic is configured. It is never called.
struct DisabledPublisher;

#[async_trait::async_trait]
impl MessagePublisher for DisabledPublisher {
    async fn publish(&self, topic: &str, _payload: bytes::Bytes) -> StorageResult<String> {
        Err(StorageError::ConfigError(format!(
            "Publishing to topic={} is disabled",
            topic
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::config::StorageConfig;
    use crate::storage::object_store::ObjectStoreProvider;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_storage_is_created_once() {
        let settings = Settings {
            storage: Some(StorageConfig::memory()),
            ..Default::default()
        };
        let context = ServiceContext::new(settings);

        let first = context.storage().await.unwrap();
        let second = context.storage().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.kind(), "memory");
    }

    #[tokio::test]
    async fn test_unified_io_shares_storage() {
        let provider: Arc<dyn StorageProvider> = Arc::new(
            ObjectStoreProvider::new(StorageConfig::memory())
                .await
                .unwrap(),
        );
        let context = ServiceContext::new(Settings::default()).with_storage(provider.clone());

        provider
            .write_file("b", "k.txt", Bytes::from_static(b"shared"))
            .await
            .unwrap();
        let io = context.unified_io().await.unwrap();
        assert_eq!(io.read_text("gs://b/k.txt").await.unwrap(), "shared");
    }

    #[tokio::test]
    async fn test_drive_requires_access_token() {
        let context = ServiceContext::new(Settings::default());
        let result = context.drive().await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_drive_created_from_settings() {
        let settings = Settings {
            access_token: Some("token".to_string()),
            drive_api_url: Some("http://localhost:9/".to_string()),
            ..Default::default()
        };
        let context = ServiceContext::new(settings);

        let first = context.drive().await.unwrap();
        let second = context.drive().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_topic_publisher_without_topic() {
        let context = ServiceContext::new(Settings::default());
        let publisher = context.topic_publisher().await.unwrap();

        assert!(publisher.topic().is_none());
        assert!(publisher.publish_json(&"x").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_topic_publisher_requires_project() {
        let settings = Settings {
            pubsub_topic: Some("alerts".to_string()),
            access_token: Some("token".to_string()),
            ..Default::default()
        };
        let context = ServiceContext::new(settings);
        let result = context.topic_publisher().await;
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    struct StaticPublisher;

    #[async_trait::async_trait]
    impl MessagePublisher for StaticPublisher {
        async fn publish(&self, topic: &str, _payload: Bytes) -> StorageResult<String> {
            Ok(format!("{}-1", topic))
        }
    }

    #[tokio::test]
    async fn test_topic_publisher_uses_injected_publisher() {
        let settings = Settings {
            pubsub_topic: Some("alerts".to_string()),
            ..Default::default()
        };
        let context = ServiceContext::new(settings).with_publisher(Arc::new(StaticPublisher));

        let id = context
            .topic_publisher()
            .await
            .unwrap()
            .publish_json(&serde_json::json!({"fire": true}))
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("alerts-1"));
    }

    #[tokio::test]
    async fn test_with_drive_skips_token_check() {
        let backend = crate::drive::http::DriveHttpBackend::new("http://localhost:9/", "t").unwrap();
        let drive = Arc::new(DriveStore::new(Arc::new(backend)));
        let context = ServiceContext::new(Settings::default()).with_drive(drive.clone());

        assert!(Arc::ptr_eq(&context.drive().await.unwrap(), &drive));
    }
}
