/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::config::{self, AccessKeys, PropertySource, DEFAULT_REGION};
use crate::error::Error;

const PREFIX: &str = "ascent.s3";

/// `ascent.s3.*` properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Properties {
    region: String,
    endpoint: Option<String>,
    credentials: Option<AccessKeys>,
    bucket: Option<String>,
    target_bucket: Option<String>,
    dlq_bucket: Option<String>,
    multipart_threshold: Option<u64>,
    part_size: Option<u64>,
}

impl Default for S3Properties {
    fn default() -> Self {
        S3Properties {
            region: DEFAULT_REGION.to_owned(),
            endpoint: None,
            credentials: None,
            bucket: None,
            target_bucket: None,
            dlq_bucket: None,
            multipart_threshold: None,
            part_size: None,
        }
    }
}

impl S3Properties {
    /// Create a new `S3Properties` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Bind from `ascent.s3.*` keys.
    pub fn bind(source: &PropertySource) -> Result<Self, Error> {
        let key = |name: &str| format!("{PREFIX}.{name}");

        let mut builder = Builder::default()
            .set_endpoint(source.get(&key("endpoint")))
            .set_credentials(config::bind_access_keys(
                source,
                &key("access-key"),
                &key("secret-key"),
            )?)
            .set_bucket(source.get(&key("bucket")))
            .set_target_bucket(source.get(&key("target-bucket")))
            .set_dlq_bucket(source.get(&key("dlq-bucket")))
            .set_multipart_threshold(source.get_parsed(&key("multipart-threshold"))?)
            .set_part_size(source.get_parsed(&key("part-size"))?);
        if let Some(region) = source.get(&key("region")) {
            builder = builder.region(region);
        }
        builder.build()
    }

    /// Returns the region
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Returns the endpoint override, used when a local profile is active
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Returns the static access keys, if configured
    pub fn credentials(&self) -> Option<&AccessKeys> {
        self.credentials.as_ref()
    }

    /// Returns the default bucket
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// Returns the target bucket for copies
    pub fn target_bucket(&self) -> Option<&str> {
        self.target_bucket.as_deref()
    }

    /// Returns the bucket dead letters are moved to
    pub fn dlq_bucket(&self) -> Option<&str> {
        self.dlq_bucket.as_deref()
    }

    /// Returns the transfer manager multipart threshold in bytes
    pub fn multipart_threshold(&self) -> Option<u64> {
        self.multipart_threshold
    }

    /// Returns the transfer manager target part size in bytes
    pub fn part_size(&self) -> Option<u64> {
        self.part_size
    }
}

/// Fluent style builder for [S3Properties]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    inner: S3Properties,
}

impl Builder {
    /// Set the region.
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.inner.region = region.into();
        self
    }

    /// Set the endpoint override.
    pub fn endpoint(self, endpoint: impl Into<String>) -> Self {
        self.set_endpoint(Some(endpoint.into()))
    }

    /// Set or clear the endpoint override.
    pub fn set_endpoint(mut self, endpoint: Option<String>) -> Self {
        self.inner.endpoint = endpoint;
        self
    }

    /// Set static access keys.
    pub fn credentials(self, credentials: AccessKeys) -> Self {
        self.set_credentials(Some(credentials))
    }

    /// Set or clear static access keys.
    pub fn set_credentials(mut self, credentials: Option<AccessKeys>) -> Self {
        self.inner.credentials = credentials;
        self
    }

    /// Set the default bucket.
    pub fn bucket(self, bucket: impl Into<String>) -> Self {
        self.set_bucket(Some(bucket.into()))
    }

    /// Set or clear the default bucket.
    pub fn set_bucket(mut self, bucket: Option<String>) -> Self {
        self.inner.bucket = bucket;
        self
    }

    /// Set the copy target bucket.
    pub fn target_bucket(self, bucket: impl Into<String>) -> Self {
        self.set_target_bucket(Some(bucket.into()))
    }

    /// Set or clear the copy target bucket.
    pub fn set_target_bucket(mut self, bucket: Option<String>) -> Self {
        self.inner.target_bucket = bucket;
        self
    }

    /// Set the dead letter bucket.
    pub fn dlq_bucket(self, bucket: impl Into<String>) -> Self {
        self.set_dlq_bucket(Some(bucket.into()))
    }

    /// Set or clear the dead letter bucket.
    pub fn set_dlq_bucket(mut self, bucket: Option<String>) -> Self {
        self.inner.dlq_bucket = bucket;
        self
    }

    /// Minimum object size that should trigger a multipart upload.
    pub fn set_multipart_threshold(mut self, threshold: Option<u64>) -> Self {
        self.inner.multipart_threshold = threshold;
        self
    }

    /// Target part size for multipart uploads.
    pub fn set_part_size(mut self, part_size: Option<u64>) -> Self {
        self.inner.part_size = part_size;
        self
    }

    /// Validate and construct the [`S3Properties`]
    pub fn build(self) -> Result<S3Properties, Error> {
        if let Some(endpoint) = &self.inner.endpoint {
            config::validate_endpoint("ascent.s3.endpoint", endpoint)?;
        }
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_bind_defaults() {
        let props = S3Properties::bind(&PropertySource::new()).unwrap();
        assert_eq!(S3Properties::default(), props);
        assert_eq!("us-east-1", props.region());
        assert!(props.credentials().is_none());
    }

    #[test]
    fn test_bind_fields() {
        let source = PropertySource::new()
            .with("ascent.s3.region", "us-east-1")
            .with("ascent.s3.endpoint", "http://localhost:4572/evsstestbucket/")
            .with("ascent.s3.access-key", "test-id")
            .with("ascent.s3.secret-key", "test-key")
            .with("ascent.s3.bucket", "test-bucket")
            .with("ascent.s3.target-bucket", "test-target-bucket")
            .with("ascent.s3.dlq-bucket", "test-dlq-bucket")
            .with("ascent.s3.multipart-threshold", "16777216");

        let props = S3Properties::bind(&source).unwrap();
        assert_eq!("us-east-1", props.region());
        assert_eq!(Some("http://localhost:4572/evsstestbucket/"), props.endpoint());
        assert_eq!("test-id", props.credentials().unwrap().access_key());
        assert_eq!("test-key", props.credentials().unwrap().secret_key());
        assert_eq!(Some("test-bucket"), props.bucket());
        assert_eq!(Some("test-target-bucket"), props.target_bucket());
        assert_eq!(Some("test-dlq-bucket"), props.dlq_bucket());
        assert_eq!(Some(16 * 1024 * 1024), props.multipart_threshold());
        assert_eq!(None, props.part_size());
    }

    #[test]
    fn test_build_rejects_bad_endpoint() {
        let err = S3Properties::builder()
            .endpoint("localhost:4572")
            .build()
            .unwrap_err();
        assert_eq!(&ErrorKind::ConfigInvalid, err.kind());
    }
}
