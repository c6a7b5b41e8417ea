/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

use crate::error::{self, Error};
use crate::s3::S3Properties;
use crate::sqs::SqsProperties;

pub(crate) mod loader;
mod property_source;

pub use property_source::PropertySource;

/// Profile for running against a local AWS emulator (e.g. localstack).
pub const PROFILE_EMBEDDED_AWS: &str = "embedded-aws";

/// Profile for the local integration environment.
pub const PROFILE_ENV_LOCAL_INT: &str = "local-int";

/// Property holding the comma separated list of active profiles.
pub const ACTIVE_PROFILES_KEY: &str = "ascent.profiles.active";

/// Region used when none is configured.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Bound starter configuration: active profiles plus the S3 and SQS properties.
#[derive(Debug, Clone)]
pub struct StarterConfig {
    profiles: Profiles,
    s3: S3Properties,
    sqs: Option<SqsProperties>,
}

impl StarterConfig {
    /// Create a new `StarterConfig` builder
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Returns the active profiles
    pub fn profiles(&self) -> &Profiles {
        &self.profiles
    }

    /// Returns the `ascent.s3.*` properties
    pub fn s3(&self) -> &S3Properties {
        &self.s3
    }

    /// Returns the `ascent.sqs.*` properties, if a queue endpoint is configured
    pub fn sqs(&self) -> Option<&SqsProperties> {
        self.sqs.as_ref()
    }
}

/// Fluent style builder for [StarterConfig]
#[derive(Debug, Clone, Default)]
pub struct Builder {
    profiles: Profiles,
    s3: Option<S3Properties>,
    sqs: Option<SqsProperties>,
}

impl Builder {
    /// Set the active profiles.
    pub fn profiles(mut self, profiles: Profiles) -> Self {
        self.profiles = profiles;
        self
    }

    /// Set the S3 properties. Defaults to [`S3Properties::default`].
    pub fn s3(mut self, s3: S3Properties) -> Self {
        self.s3 = Some(s3);
        self
    }

    /// Set the SQS properties. SQS is not configured unless this is set.
    pub fn sqs(mut self, sqs: SqsProperties) -> Self {
        self.sqs = Some(sqs);
        self
    }

    /// Consumes the builder and constructs a [`StarterConfig`]
    pub fn build(self) -> StarterConfig {
        StarterConfig {
            profiles: self.profiles,
            s3: self.s3.unwrap_or_default(),
            sqs: self.sqs,
        }
    }
}

/// The set of active deployment profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profiles(Vec<String>);

impl Profiles {
    /// Create from a list of profile names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Profiles(names.into_iter().map(Into::into).collect())
    }

    /// Parse a comma separated list of profile names, ignoring blanks.
    pub fn parse(value: &str) -> Self {
        Profiles::new(
            value
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }

    /// Whether `name` is an active profile.
    pub fn is_active(&self, name: &str) -> bool {
        self.0.iter().any(|p| p == name)
    }

    /// Whether clients should talk to a configured local endpoint rather than AWS.
    pub fn uses_local_endpoint(&self) -> bool {
        self.is_active(PROFILE_EMBEDDED_AWS) || self.is_active(PROFILE_ENV_LOCAL_INT)
    }

    /// Returns the active profile names
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

/// Static access key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessKeys {
    access_key: String,
    secret_key: String,
}

impl AccessKeys {
    /// Create a key pair.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        AccessKeys {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Returns the access key id
    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    /// Returns the secret access key
    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }

    /// Convert to SDK credentials. `provider` names the source in SDK logs.
    pub(crate) fn to_credentials(&self, provider: &'static str) -> aws_sdk_s3::config::Credentials {
        aws_sdk_s3::config::Credentials::new(
            self.access_key.clone(),
            self.secret_key.clone(),
            None,
            None,
            provider,
        )
    }
}

impl fmt::Debug for AccessKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessKeys")
            .field("access_key", &self.access_key)
            .field("secret_key", &"** redacted **")
            .finish()
    }
}

/// Bind an access/secret key pair. Both or neither must be present.
pub(crate) fn bind_access_keys(
    source: &PropertySource,
    access_key_property: &str,
    secret_key_property: &str,
) -> Result<Option<AccessKeys>, Error> {
    match (
        source.get(access_key_property),
        source.get(secret_key_property),
    ) {
        (Some(access_key), Some(secret_key)) => Ok(Some(AccessKeys::new(access_key, secret_key))),
        (None, None) => Ok(None),
        (Some(_), None) => Err(error::invalid_config(format!(
            "{access_key_property} is set but {secret_key_property} is missing"
        ))),
        (None, Some(_)) => Err(error::invalid_config(format!(
            "{secret_key_property} is set but {access_key_property} is missing"
        ))),
    }
}

/// Endpoints must be absolute http(s) URLs.
pub(crate) fn validate_endpoint(property: &str, endpoint: &str) -> Result<(), Error> {
    let lower = endpoint.trim().to_ascii_lowercase();
    if !lower.starts_with("http://") && !lower.starts_with("https://") {
        return Err(error::invalid_config(format!(
            "{property} must start with http:// or https://, got `{endpoint}`"
        )));
    }
    Ok(())
}

/// Load shared SDK configuration for one service.
///
/// Static keys replace the default credentials provider chain. `endpoint` is only passed when
/// a local profile is active.
pub(crate) async fn load_sdk_config(
    region: &str,
    credentials: Option<&AccessKeys>,
    endpoint: Option<&str>,
    provider: &'static str,
) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_owned()));
    if let Some(keys) = credentials {
        loader = loader.credentials_provider(keys.to_credentials(provider));
    }
    if let Some(endpoint) = endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    loader.load().await
}
