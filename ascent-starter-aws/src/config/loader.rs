/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use crate::config::{Profiles, PropertySource, StarterConfig, ACTIVE_PROFILES_KEY};
use crate::error::Error;
use crate::s3::S3Properties;
use crate::sqs::SqsProperties;

/// Load starter [`StarterConfig`] from the environment.
#[derive(Debug)]
pub struct ConfigLoader {
    source: PropertySource,
    profiles: Option<Profiles>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        ConfigLoader {
            source: PropertySource::from_env(),
            profiles: None,
        }
    }
}

impl ConfigLoader {
    /// Replace the property source. The process environment is not consulted unless the new
    /// source was built with [`PropertySource::from_env`].
    pub fn property_source(mut self, source: PropertySource) -> Self {
        self.source = source;
        self
    }

    /// Override a single property.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.source.insert(key, value);
        self
    }

    /// Override the active profiles instead of reading `ascent.profiles.active`.
    pub fn profiles(mut self, profiles: Profiles) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Bind and validate the configuration.
    ///
    /// SQS is only configured when `ascent.sqs.endpoint` is present.
    pub fn load(self) -> Result<StarterConfig, Error> {
        let profiles = match self.profiles {
            Some(profiles) => profiles,
            None => self
                .source
                .get(ACTIVE_PROFILES_KEY)
                .map(|value| Profiles::parse(&value))
                .unwrap_or_default(),
        };
        tracing::debug!(profiles = ?profiles.names(), "binding ascent properties");

        let mut builder = StarterConfig::builder()
            .profiles(profiles)
            .s3(S3Properties::bind(&self.source)?);

        if let Some(sqs) = SqsProperties::bind(&self.source)? {
            builder = builder.sqs(sqs);
        }
        Ok(builder.build())
    }
}
