// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License. You may obtain a copy
// of the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under
// the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR REPRESENTATIONS
// OF ANY KIND, either express or implied. See the License for the specific language
// governing permissions and limitations under the License.

use super::error::{StorageError, StorageResult};
use crate::util::retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

/// Storage provider type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageType {
    /// Local directory, one sub-directory per container
    Local,
    /// In-process store, one per container
    Memory,
    /// AWS S3 storage, container is the bucket
    Aws,
    /// Google Cloud Storage, container is the bucket
    Gcs,
}

impl FromStr for StorageType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(StorageType::Local),
            "memory" | "inmemory" => Ok(StorageType::Memory),
            "aws" | "s3" => Ok(StorageType::Aws),
            "gcs" | "gcp" | "gs" => Ok(StorageType::Gcs),
            _ => Err(StorageError::ConfigError(format!(
                "Unknown storage type: {}",
                s
            ))),
        }
    }
}

/// Generic configuration for storage providers using object_store
///
/// Provider-specific options live in a string map and are handed to the
/// object_store builders, so adding a backend option needs no new struct field.
///
/// # Examples
///
/// ## Local filesystem
/// ```
/// use firecam_storage::storage::StorageConfig;
///
/// let config = StorageConfig::local()
///     .with_option("path", "/tmp/data");
/// ```
///
/// ## GCS
/// ```
/// use firecam_storage::storage::StorageConfig;
///
/// let config = StorageConfig::gcs()
///     .with_option("service_account_key_path", "/path/to/key.json");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage provider type
    #[serde(rename = "type")]
    pub storage_type: StorageType,

    /// Provider-specific configuration options
    ///
    /// AWS S3:
    /// - region: AWS region (e.g., "us-east-1")
    /// - access_key_id, secret_access_key, session_token
    /// - endpoint: Custom endpoint URL (for S3-compatible services)
    /// - allow_http: "true" to allow HTTP connections
    ///
    /// GCS:
    /// - service_account_key_path: Path to service account JSON key file
    /// - service_account_key: Service account key as JSON string
    ///
    /// Local:
    /// - path: Root directory, containers are its sub-directories
    ///
    /// All:
    /// - max_attempts, retry_delay_secs: retry policy for every remote call
    /// - timeout, connect_timeout, pool_idle_timeout, pool_max_idle_per_host
    #[serde(default)]
    pub options: HashMap<String, String>,
}

impl StorageConfig {
    /// Create a new storage configuration from a type name ("local", "memory",
    /// "aws", "gcs").
    ///
    /// # Errors
    ///
    /// Returns `StorageError::ConfigError` for an unknown type name.
    pub fn new(storage_type: impl AsRef<str>) -> StorageResult<Self> {
        Ok(Self::of_type(storage_type.as_ref().parse()?))
    }

    fn of_type(storage_type: StorageType) -> Self {
        Self {
            storage_type,
            options: Self::default_options(),
        }
    }

    /// Create a local filesystem storage configuration.
    pub fn local() -> Self {
        Self::of_type(StorageType::Local)
    }

    /// Create an in-memory storage configuration.
    pub fn memory() -> Self {
        Self::of_type(StorageType::Memory)
    }

    /// Create an AWS S3 storage configuration.
    pub fn aws() -> Self {
        Self::of_type(StorageType::Aws)
    }

    /// Create a GCS storage configuration.
    pub fn gcs() -> Self {
        Self::of_type(StorageType::Gcs)
    }

    /// Get default options for all storage types.
    ///
    /// # Returns
    ///
    /// A HashMap containing default timeout, retry, and connection pool settings.
    pub fn default_options() -> HashMap<String, String> {
        [
            ("timeout", "1200"),
            ("connect_timeout", "30"),
            ("pool_idle_timeout", "15"),
            ("pool_max_idle_per_host", "5"),
            ("max_attempts", "5"),
            ("retry_delay_secs", "5"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    /// Add a configuration option.
    ///
    /// # Returns
    ///
    /// The `StorageConfig` instance with the added option (for method chaining).
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Add multiple configuration options.
    pub fn with_options(mut self, options: HashMap<String, String>) -> Self {
        self.options.extend(options);
        self
    }

    /// Get a configuration option.
    pub fn get_option(&self, key: &str) -> Option<&String> {
        self.options.get(key)
    }

    /// Retry policy for remote calls, falling back to 5 attempts 5 seconds apart
    /// when the options are missing or unparsable.
    pub fn retry_policy(&self) -> RetryPolicy {
        let max_attempts = self
            .get_option("max_attempts")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let delay = self
            .get_option("retry_delay_secs")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RETRY_DELAY);
        RetryPolicy::new(max_attempts, delay)
    }

    /// Get the storage type as a string.
    pub fn storage_type_str(&self) -> &str {
        match self.storage_type {
            StorageType::Local => "local",
            StorageType::Memory => "memory",
            StorageType::Aws => "aws",
            StorageType::Gcs => "gcs",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_type_serialization() {
        assert_eq!(
            serde_json::to_string(&StorageType::Local).unwrap(),
            "\"local\""
        );
        assert_eq!(
            serde_json::to_string(&StorageType::Memory).unwrap(),
            "\"memory\""
        );
        assert_eq!(serde_json::to_string(&StorageType::Gcs).unwrap(), "\"gcs\"");
    }

    #[test]
    fn test_storage_type_deserialization() {
        let gcs: StorageType = serde_json::from_str("\"gcs\"").unwrap();
        let aws: StorageType = serde_json::from_str("\"aws\"").unwrap();
        assert_eq!(gcs, StorageType::Gcs);
        assert_eq!(aws, StorageType::Aws);
    }

    #[test]
    fn test_storage_config_new_aliases() {
        assert_eq!(
            StorageConfig::new("s3").unwrap().storage_type,
            StorageType::Aws
        );
        assert_eq!(
            StorageConfig::new("GCP").unwrap().storage_type,
            StorageType::Gcs
        );
        assert_eq!(
            StorageConfig::new("gs").unwrap().storage_type,
            StorageType::Gcs
        );
        assert_eq!(
            StorageConfig::new("memory").unwrap().storage_type,
            StorageType::Memory
        );
    }

    #[test]
    fn test_storage_config_new_invalid() {
        let result = StorageConfig::new("ftp");
        assert!(matches!(result, Err(StorageError::ConfigError(_))));
    }

    #[test]
    fn test_default_options() {
        let options = StorageConfig::default_options();
        assert_eq!(options.get("timeout"), Some(&"1200".to_string()));
        assert_eq!(options.get("max_attempts"), Some(&"5".to_string()));
        assert_eq!(options.get("retry_delay_secs"), Some(&"5".to_string()));
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = StorageConfig::gcs().retry_policy();
        assert_eq!(policy, RetryPolicy::default());
    }

    #[test]
    fn test_retry_policy_overrides() {
        let policy = StorageConfig::memory()
            .with_option("max_attempts", "2")
            .with_option("retry_delay_secs", "0")
            .retry_policy();
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.delay, Duration::ZERO);
    }

    #[test]
    fn test_retry_policy_invalid_values_fall_back() {
        let policy = StorageConfig::memory()
            .with_option("max_attempts", "many")
            .retry_policy();
        assert_eq!(policy.max_attempts, DEFAULT_MAX_ATTEMPTS);
    }

    #[test]
    fn test_with_options_keeps_defaults() {
        let mut custom = HashMap::new();
        custom.insert("region".to_string(), "us-east-1".to_string());

        let config = StorageConfig::aws().with_options(custom);
        assert_eq!(config.get_option("region"), Some(&"us-east-1".to_string()));
        assert_eq!(config.get_option("timeout"), Some(&"1200".to_string()));
    }

    #[test]
    fn test_config_deserialization() {
        let json = r#"{"type":"local","options":{"path":"/data"}}"#;
        let config: StorageConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.storage_type, StorageType::Local);
        assert_eq!(config.get_option("path"), Some(&"/data".to_string()));
        assert_eq!(config.storage_type_str(), "local");
    }
}
