/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use url::Url;

use crate::config::{self, AccessKeys, PropertySource, DEFAULT_REGION};
use crate::error::{self, Error};

const PREFIX: &str = "ascent.sqs";

/// Largest message body SQS accepts; bigger payloads must be offloaded to S3.
pub const DEFAULT_PAYLOAD_SIZE_THRESHOLD: usize = 256 * 1024;

/// `ascent.sqs.*` properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqsProperties {
    region: String,
    endpoint: Url,
    credentials: Option<AccessKeys>,
    number_of_messages_to_prefetch: Option<i32>,
    dlq_endpoint: Option<Url>,
    extended: Extended,
}

impl SqsProperties {
    /// Create a new `SqsProperties` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Bind from `ascent.sqs.*` keys. Returns `None` when no queue endpoint is configured.
    pub fn bind(source: &PropertySource) -> Result<Option<Self>, Error> {
        let key = |name: &str| format!("{PREFIX}.{name}");

        let endpoint = match source.get(&key("endpoint")) {
            Some(endpoint) => endpoint,
            None => return Ok(None),
        };

        let mut builder = Builder::default()
            .endpoint(endpoint)
            .set_credentials(config::bind_access_keys(
                source,
                &key("access-key"),
                &key("secret-key"),
            )?)
            .set_number_of_messages_to_prefetch(
                source.get_parsed(&key("number-of-messages-to-prefetch"))?,
            )
            .set_dlq_endpoint(source.get(&key("dlq-endpoint")))
            .extended(Extended::bind(source)?);
        if let Some(region) = source.get(&key("region")) {
            builder = builder.region(region);
        }
        builder.build().map(Some)
    }

    /// Returns the region
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Returns the queue URL
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// Returns the static access keys, if configured
    pub fn credentials(&self) -> Option<&AccessKeys> {
        self.credentials.as_ref()
    }

    /// Returns the number of messages to fetch per receive, if configured
    pub fn number_of_messages_to_prefetch(&self) -> Option<i32> {
        self.number_of_messages_to_prefetch
    }

    /// Returns the dead-letter queue URL, if configured
    pub fn dlq_endpoint(&self) -> Option<&str> {
        self.dlq_endpoint.as_ref().map(Url::as_str)
    }

    /// Returns the extended client (S3 payload offloading) properties
    pub fn extended(&self) -> &Extended {
        &self.extended
    }

    /// Queue name: the last path segment of the endpoint URL.
    pub fn queue_name(&self) -> &str {
        let name = last_path_segment(&self.endpoint);
        tracing::info!(path = self.endpoint.path(), "queue name {name}");
        name
    }

    /// Dead-letter queue name, if a dead-letter endpoint is configured.
    pub fn dlq_queue_name(&self) -> Option<&str> {
        self.dlq_endpoint.as_ref().map(last_path_segment)
    }

    /// Scheme, host and port of the queue URL.
    pub(crate) fn endpoint_origin(&self) -> String {
        self.endpoint.origin().ascii_serialization()
    }
}

fn last_path_segment(url: &Url) -> &str {
    let path = url.path();
    match path.rfind('/') {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

fn parse_endpoint(property: &str, endpoint: &str) -> Result<Url, Error> {
    config::validate_endpoint(property, endpoint)?;
    Url::parse(endpoint.trim()).map_err(|err| {
        error::invalid_config(format!("{property}: invalid URL `{endpoint}`: {err}"))
    })
}

/// Fluent style builder for [SqsProperties]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    region: Option<String>,
    endpoint: Option<String>,
    credentials: Option<AccessKeys>,
    number_of_messages_to_prefetch: Option<i32>,
    dlq_endpoint: Option<String>,
    extended: Extended,
}

impl Builder {
    /// Set the region. Defaults to `us-east-1`.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the queue URL. Required.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set static access keys.
    pub fn credentials(self, credentials: AccessKeys) -> Self {
        self.set_credentials(Some(credentials))
    }

    /// Set or clear static access keys.
    pub fn set_credentials(mut self, credentials: Option<AccessKeys>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set the number of messages to fetch per receive.
    pub fn set_number_of_messages_to_prefetch(mut self, count: Option<i32>) -> Self {
        self.number_of_messages_to_prefetch = count;
        self
    }

    /// Set the dead-letter queue URL.
    pub fn dlq_endpoint(self, endpoint: impl Into<String>) -> Self {
        self.set_dlq_endpoint(Some(endpoint.into()))
    }

    /// Set or clear the dead-letter queue URL.
    pub fn set_dlq_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.dlq_endpoint = endpoint;
        self
    }

    /// Set the extended client properties.
    pub fn extended(mut self, extended: Extended) -> Self {
        self.extended = extended;
        self
    }

    /// Validate and construct the [`SqsProperties`]
    pub fn build(self) -> Result<SqsProperties, Error> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| error::invalid_config("ascent.sqs.endpoint is required"))?;
        let dlq_endpoint = self
            .dlq_endpoint
            .map(|dlq| parse_endpoint("ascent.sqs.dlq-endpoint", &dlq))
            .transpose()?;

        Ok(SqsProperties {
            region: self.region.unwrap_or_else(|| DEFAULT_REGION.to_owned()),
            endpoint: parse_endpoint("ascent.sqs.endpoint", &endpoint)?,
            credentials: self.credentials,
            number_of_messages_to_prefetch: self.number_of_messages_to_prefetch,
            dlq_endpoint,
            extended: self.extended,
        })
    }
}

/// `ascent.sqs.extended.*` properties: where oversized message payloads are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extended {
    s3_region: Option<String>,
    s3_bucket_name: Option<String>,
    s3_credentials: Option<AccessKeys>,
    payload_size_threshold: usize,
}

impl Default for Extended {
    fn default() -> Self {
        Extended {
            s3_region: None,
            s3_bucket_name: None,
            s3_credentials: None,
            payload_size_threshold: DEFAULT_PAYLOAD_SIZE_THRESHOLD,
        }
    }
}

impl Extended {
    /// Offload payloads to `bucket`.
    pub fn new(bucket: impl Into<String>) -> Self {
        Extended {
            s3_bucket_name: Some(bucket.into()),
            ..Default::default()
        }
    }

    fn bind(source: &PropertySource) -> Result<Self, Error> {
        let key = |name: &str| format!("{PREFIX}.extended.{name}");
        Ok(Extended {
            s3_region: source.get(&key("s3-region")),
            s3_bucket_name: source.get(&key("s3-bucket-name")),
            s3_credentials: config::bind_access_keys(
                source,
                &key("s3-access-key"),
                &key("s3-secret-key"),
            )?,
            payload_size_threshold: source
                .get_parsed(&key("payload-size-threshold"))?
                .unwrap_or(DEFAULT_PAYLOAD_SIZE_THRESHOLD),
        })
    }

    /// Set the S3 region used for payloads.
    pub fn s3_region(mut self, region: impl Into<String>) -> Self {
        self.s3_region = Some(region.into());
        self
    }

    /// Set the S3 access keys used for payloads.
    pub fn s3_credentials(mut self, credentials: AccessKeys) -> Self {
        self.s3_credentials = Some(credentials);
        self
    }

    /// Set the body size, in bytes, above which payloads are offloaded.
    pub fn payload_size_threshold(mut self, threshold: usize) -> Self {
        self.payload_size_threshold = threshold;
        self
    }

    /// Whether payload offloading is configured.
    pub fn is_enabled(&self) -> bool {
        self.s3_bucket_name.is_some()
    }

    /// Returns the S3 region for payloads, if different from the queue's
    pub fn get_s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    /// Returns the payload bucket
    pub fn get_s3_bucket_name(&self) -> Option<&str> {
        self.s3_bucket_name.as_deref()
    }

    /// Returns the S3 access keys for payloads, if different from the queue's
    pub fn get_s3_credentials(&self) -> Option<&AccessKeys> {
        self.s3_credentials.as_ref()
    }

    /// Returns the offload threshold in bytes
    pub fn get_payload_size_threshold(&self) -> usize {
        self.payload_size_threshold
    }
}
