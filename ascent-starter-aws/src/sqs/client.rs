/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::config::{self, Profiles, StarterConfig};
use crate::sqs::SqsProperties;

/// Builds the Amazon SQS client, and the Amazon S3 client used for offloaded payloads, from
/// `ascent.sqs.*` properties.
#[derive(Debug, Clone)]
pub struct SqsConfig {
    properties: SqsProperties,
    profiles: Profiles,
    s3_endpoint: Option<String>,
}

impl SqsConfig {
    /// Create a factory for the given properties and active profiles.
    pub fn new(properties: SqsProperties, profiles: Profiles) -> Self {
        SqsConfig {
            properties,
            profiles,
            s3_endpoint: None,
        }
    }

    /// Create a factory from bound starter configuration, or `None` when no queue is configured.
    ///
    /// Offloaded payloads use the `ascent.s3.endpoint` under a local profile.
    pub fn from_starter(config: &StarterConfig) -> Option<Self> {
        let sqs = config.sqs()?.clone();
        Some(
            SqsConfig::new(sqs, config.profiles().clone())
                .with_s3_endpoint(config.s3().endpoint().map(str::to_owned)),
        )
    }

    /// Endpoint for the payload S3 client under a local profile.
    pub fn with_s3_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.s3_endpoint = endpoint;
        self
    }

    /// Returns the properties this factory was built from
    pub fn properties(&self) -> &SqsProperties {
        &self.properties
    }

    /// The SQS endpoint to target instead of AWS, if any: the origin of the queue URL when a
    /// local profile is active.
    pub fn endpoint_override(&self) -> Option<String> {
        self.profiles
            .uses_local_endpoint()
            .then(|| self.properties.endpoint_origin())
    }

    fn s3_endpoint_override(&self) -> Option<&str> {
        self.s3_endpoint
            .as_deref()
            .filter(|_| self.profiles.uses_local_endpoint())
    }

    /// Construct the Amazon SQS client.
    pub async fn sqs_client(&self) -> aws_sdk_sqs::Client {
        let endpoint = self.endpoint_override();
        let sdk_config = config::load_sdk_config(
            self.properties.region(),
            self.properties.credentials(),
            endpoint.as_deref(),
            "ascent-sqs",
        )
        .await;
        tracing::debug!(
            region = self.properties.region(),
            endpoint = endpoint.as_deref(),
            queue = self.properties.endpoint(),
            "creating Amazon SQS client"
        );
        aws_sdk_sqs::Client::new(&sdk_config)
    }

    /// Construct the Amazon S3 client for offloaded payloads, or `None` when offloading is not
    /// configured.
    ///
    /// Region and access keys fall back to the queue's own when the extended properties leave
    /// them unset.
    pub async fn extended_s3_client(&self) -> Option<aws_sdk_s3::Client> {
        let extended = self.properties.extended();
        if !extended.is_enabled() {
            return None;
        }

        let region = extended
            .get_s3_region()
            .unwrap_or(self.properties.region());
        let credentials = extended
            .get_s3_credentials()
            .or(self.properties.credentials());
        let endpoint = self.s3_endpoint_override();
        let sdk_config =
            config::load_sdk_config(region, credentials, endpoint, "ascent-sqs-extended").await;
        tracing::debug!(
            region,
            endpoint,
            bucket = extended.get_s3_bucket_name(),
            "creating Amazon S3 client for extended payloads"
        );
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(endpoint.is_some())
            .build();
        Some(aws_sdk_s3::Client::from_conf(s3_config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AccessKeys, PROFILE_EMBEDDED_AWS};
    use crate::sqs::Extended;

    const QUEUE: &str = "http://localhost:4576/queue/evss";

    fn properties(extended: Extended) -> SqsProperties {
        SqsProperties::builder()
            .region("us-west-2")
            .endpoint(QUEUE)
            .credentials(AccessKeys::new("test-id", "test-key"))
            .extended(extended)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_sqs_client_embedded_profile() {
        let factory = SqsConfig::new(
            properties(Extended::default()),
            Profiles::new([PROFILE_EMBEDDED_AWS]),
        );
        assert_eq!(
            Some("http://localhost:4576".to_owned()),
            factory.endpoint_override()
        );
        let client = factory.sqs_client().await;
        assert_eq!("us-west-2", client.config().region().unwrap().as_ref());
    }

    #[tokio::test]
    async fn test_endpoint_ignored_without_local_profile() {
        let factory = SqsConfig::new(properties(Extended::default()), Profiles::default());
        assert_eq!(None, factory.endpoint_override());
    }

    #[tokio::test]
    async fn test_extended_s3_client_disabled() {
        let factory = SqsConfig::new(properties(Extended::default()), Profiles::default());
        assert!(factory.extended_s3_client().await.is_none());
    }

    #[tokio::test]
    async fn test_extended_s3_client_region() {
        let factory = SqsConfig::new(
            properties(Extended::new("evss-payloads")),
            Profiles::new([PROFILE_EMBEDDED_AWS]),
        )
        .with_s3_endpoint(Some("http://localhost:4572".to_owned()));
        let client = factory.extended_s3_client().await.unwrap();
        assert_eq!("us-west-2", client.config().region().unwrap().as_ref());

        let factory = SqsConfig::new(
            properties(Extended::new("evss-payloads").s3_region("eu-west-1")),
            Profiles::default(),
        );
        let client = factory.extended_s3_client().await.unwrap();
        assert_eq!("eu-west-1", client.config().region().unwrap().as_ref());
    }

    #[test]
    fn test_from_starter() {
        let config = StarterConfig::builder().build();
        assert!(SqsConfig::from_starter(&config).is_none());

        let config = StarterConfig::builder()
            .sqs(properties(Extended::default()))
            .build();
        let factory = SqsConfig::from_starter(&config).unwrap();
        assert_eq!(QUEUE, factory.properties().endpoint());
    }
}
