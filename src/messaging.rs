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
use base64::prelude::*;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::storage::error::{StorageError, StorageResult};
use crate::util::retry::RetryPolicy;

/// Default root of the Pub/Sub REST API.
pub const DEFAULT_PUBSUB_API_URL: &str = "https://pubsub.googleapis.com/";

/// Publishing side of a message bus.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish one message on `topic` and return the message ID.
    async fn publish(&self, topic: &str, payload: Bytes) -> StorageResult<String>;
}

impl std::fmt::Debug for dyn MessagePublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MessagePublisher")
    }
}

/// Pub/Sub `topics.publish` over REST, for one project.
pub struct PubSubHttpPublisher {
    client: Client,
    base_url: Url,
    project: String,
    access_token: String,
}

impl PubSubHttpPublisher {
    pub fn new(
        base_url: &str,
        project: impl Into<String>,
        access_token: impl Into<String>,
    ) -> StorageResult<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url,
            project: project.into(),
            access_token: access_token.into(),
        })
    }

    fn publish_url(&self, topic: &str) -> StorageResult<Url> {
        Ok(self.base_url.join(&format!(
            "v1/projects/{}/topics/{}:publish",
            self.project, topic
        ))?)
    }
}

#[derive(Debug, Serialize)]
struct PublishRequest {
    messages: Vec<PubsubMessage>,
}

#[derive(Debug, Serialize)]
struct PubsubMessage {
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PublishResponse {
    #[serde(default)]
    message_ids: Vec<String>,
}

impl PublishRequest {
    fn single(payload: &[u8]) -> Self {
        Self {
            messages: vec![PubsubMessage {
                data: BASE64_STANDARD.encode(payload),
            }],
        }
    }
}

#[async_trait]
impl MessagePublisher for PubSubHttpPublisher {
    async fn publish(&self, topic: &str, payload: Bytes) -> StorageResult<String> {
        let url = self.publish_url(topic)?;
        debug!("Publishing to url={}, bytes={}", url, payload.len());

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&PublishRequest::single(&payload))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::RemoteError {
                status: status.as_u16(),
                body,
            });
        }

        let published: PublishResponse = response.json().await?;
        published.message_ids.into_iter().next().ok_or_else(|| {
            StorageError::RemoteError {
                status: status.as_u16(),
                body: "Publish response carried no message ID".to_string(),
            }
        })
    }
}

/// JSON publisher bound to the configured topic.
///
/// Publishing is a no-op when no topic is configured, so components can
/// announce events unconditionally.
#[derive(Clone)]
pub struct TopicPublisher {
    publisher: Arc<dyn MessagePublisher>,
    topic: Option<String>,
    retry_policy: RetryPolicy,
}

impl TopicPublisher {
    pub fn new(publisher: Arc<dyn MessagePublisher>, topic: Option<String>) -> Self {
        Self {
            publisher,
            topic: topic.filter(|t| !t.is_empty()),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Serialize `data` as JSON and publish it on the topic.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(id))` - The message ID assigned by the bus
    /// * `Ok(None)` - No topic is configured, nothing was sent
    pub async fn publish_json<T: Serialize + ?Sized>(
        &self,
        data: &T,
    ) -> StorageResult<Option<String>> {
        let Some(topic) = self.topic.as_deref() else {
            debug!("No topic configured, message dropped");
            return Ok(None);
        };

        let payload = Bytes::from(serde_json::to_vec(data)?);
        let publisher = &self.publisher;
        let message_id = self
            .retry_policy
            .execute(&format!("publish({})", topic), move || {
                publisher.publish(topic, payload.clone())
            })
            .await?;
        info!("Published message_id={} on topic={}", message_id, topic);
        Ok(Some(message_id))
    }
}

impl std::fmt::Debug for TopicPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TopicPublisher(topic={:?}, retry_policy={:?})",
            self.topic, self.retry_policy
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPublisher {
        sent: Mutex<Vec<(String, Bytes)>>,
        failures_left: Mutex<usize>,
    }

    #[async_trait]
    impl MessagePublisher for RecordingPublisher {
        async fn publish(&self, topic: &str, payload: Bytes) -> StorageResult<String> {
            {
                let mut failures_left = self.failures_left.lock().unwrap();
                if *failures_left > 0 {
                    *failures_left -= 1;
                    return Err(StorageError::RemoteError {
                        status: 503,
                        body: "busy".to_string(),
                    });
                }
            }
            let mut sent = self.sent.lock().unwrap();
            sent.push((topic.to_string(), payload));
            Ok(format!("msg-{}", sent.len()))
        }
    }

    #[tokio::test]
    async fn test_publish_json_without_topic() {
        let recorder = Arc::new(RecordingPublisher::default());
        let publisher = TopicPublisher::new(recorder.clone(), None);

        let result = publisher
            .publish_json(&serde_json::json!({"camera": "cam-a"}))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(recorder.sent.lock().unwrap().is_empty());

        let empty_topic = TopicPublisher::new(recorder.clone(), Some(String::new()));
        assert!(empty_topic.topic().is_none());
    }

    #[tokio::test]
    async fn test_publish_json_with_topic() {
        let recorder = Arc::new(RecordingPublisher::default());
        let publisher = TopicPublisher::new(recorder.clone(), Some("detections".to_string()));

        let id = publisher
            .publish_json(&serde_json::json!({"camera": "cam-a", "score": 0.9}))
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("msg-1"));

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent[0].0, "detections");
        let decoded: serde_json::Value = serde_json::from_slice(&sent[0].1).unwrap();
        assert_eq!(decoded["camera"], "cam-a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_json_retries() {
        let recorder = Arc::new(RecordingPublisher::default());
        *recorder.failures_left.lock().unwrap() = 2;
        let publisher = TopicPublisher::new(recorder.clone(), Some("t".to_string()));

        let id = publisher.publish_json("hello").await.unwrap();
        assert_eq!(id.as_deref(), Some("msg-1"));
        assert_eq!(recorder.sent.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_publish_url() {
        let publisher = PubSubHttpPublisher::new(DEFAULT_PUBSUB_API_URL, "fire-proj", "token").unwrap();
        assert_eq!(
            publisher.publish_url("alerts").unwrap().as_str(),
            "https://pubsub.googleapis.com/v1/projects/fire-proj/topics/alerts:publish"
        );
    }

    #[test]
    fn test_publish_request_encoding() {
        let request = PublishRequest::single(b"{\"a\":1}");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["data"], "eyJhIjoxfQ==");
    }

    #[test]
    fn test_publish_response_decoding() {
        let response: PublishResponse =
            serde_json::from_str(r#"{"messageIds": ["42", "43"]}"#).unwrap();
        assert_eq!(response.message_ids, vec!["42", "43"]);
    }
}
