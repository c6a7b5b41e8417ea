/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_sdk_s3_transfer_manager::types::PartSize;

use crate::config::{self, Profiles, StarterConfig};
use crate::s3::S3Properties;

/// Builds the Amazon S3 client and transfer manager from `ascent.s3.*` properties.
#[derive(Debug, Clone)]
pub struct S3Config {
    properties: S3Properties,
    profiles: Profiles,
}

impl S3Config {
    /// Create a factory for the given properties and active profiles.
    pub fn new(properties: S3Properties, profiles: Profiles) -> Self {
        S3Config {
            properties,
            profiles,
        }
    }

    /// Create a factory from bound starter configuration.
    pub fn from_starter(config: &StarterConfig) -> Self {
        S3Config::new(config.s3().clone(), config.profiles().clone())
    }

    /// Returns the properties this factory was built from
    pub fn properties(&self) -> &S3Properties {
        &self.properties
    }

    /// The endpoint clients should target instead of AWS, if any.
    ///
    /// Only honoured when a local profile (`embedded-aws`, `local-int`) is active.
    pub fn endpoint_override(&self) -> Option<&str> {
        self.properties
            .endpoint()
            .filter(|_| self.profiles.uses_local_endpoint())
    }

    /// Shared SDK configuration for S3.
    pub async fn sdk_config(&self) -> aws_config::SdkConfig {
        config::load_sdk_config(
            self.properties.region(),
            self.properties.credentials(),
            self.endpoint_override(),
            "ascent-s3",
        )
        .await
    }

    /// Construct the Amazon S3 client.
    ///
    /// Local endpoints are addressed path-style since emulators rarely resolve
    /// virtual-hosted bucket names.
    pub async fn s3_client(&self) -> aws_sdk_s3::Client {
        let sdk_config = self.sdk_config().await;
        let path_style = self.endpoint_override().is_some();
        tracing::debug!(
            region = self.properties.region(),
            endpoint = self.endpoint_override(),
            path_style,
            "creating Amazon S3 client"
        );
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(path_style)
            .build();
        aws_sdk_s3::Client::from_conf(s3_config)
    }

    /// Construct a transfer manager that sends requests through `client`.
    pub fn transfer_manager(&self, client: aws_sdk_s3::Client) -> aws_sdk_s3_transfer_manager::Client {
        let mut builder = aws_sdk_s3_transfer_manager::Config::builder().client(client);
        if let Some(threshold) = self.properties.multipart_threshold() {
            builder = builder.multipart_threshold(PartSize::Target(threshold));
        }
        if let Some(part_size) = self.properties.part_size() {
            builder = builder.part_size(PartSize::Target(part_size));
        }
        aws_sdk_s3_transfer_manager::Client::new(builder.build())
    }
}
