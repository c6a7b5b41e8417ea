/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use crate::config::StarterConfig;
use crate::resource::ResourceLoader;
use crate::s3::{S3Config, S3Service, S3ServiceImpl};
use crate::sqs::{PayloadStore, SqsConfig, SqsService, SqsServiceImpl};

/// The clients and services an application injects.
///
/// Anything supplied on the [`Builder`] is used as-is; everything else is created from the
/// [`StarterConfig`].
///
/// ```no_run
/// # async fn example() -> Result<(), ascent_starter_aws::error::Error> {
/// let config = ascent_starter_aws::from_env().load()?;
/// let aws = ascent_starter_aws::AscentAws::from_config(config).await;
/// let response = aws
///     .s3_service()
///     .download_file("my-bucket", "report.pdf")
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AscentAws {
    config: StarterConfig,
    s3_client: aws_sdk_s3::Client,
    transfer_manager: aws_sdk_s3_transfer_manager::Client,
    s3_service: Arc<dyn S3Service>,
    sqs_client: Option<aws_sdk_sqs::Client>,
    sqs_service: Option<Arc<dyn SqsService>>,
}

impl AscentAws {
    /// Create a new `AscentAws` builder
    pub fn builder(config: StarterConfig) -> Builder {
        Builder {
            config,
            s3_client: None,
            transfer_manager: None,
            s3_service: None,
            resource_loader: None,
            sqs_client: None,
            extended_s3_client: None,
            sqs_service: None,
        }
    }

    /// Wire everything from `config`.
    pub async fn from_config(config: StarterConfig) -> Self {
        AscentAws::builder(config).build().await
    }

    /// Returns the configuration everything was built from
    pub fn config(&self) -> &StarterConfig {
        &self.config
    }

    /// Returns the Amazon S3 client
    pub fn s3_client(&self) -> &aws_sdk_s3::Client {
        &self.s3_client
    }

    /// Returns the transfer manager
    pub fn transfer_manager(&self) -> &aws_sdk_s3_transfer_manager::Client {
        &self.transfer_manager
    }

    /// Returns the S3 service
    pub fn s3_service(&self) -> Arc<dyn S3Service> {
        Arc::clone(&self.s3_service)
    }

    /// Returns the Amazon SQS client, if SQS is configured
    pub fn sqs_client(&self) -> Option<&aws_sdk_sqs::Client> {
        self.sqs_client.as_ref()
    }

    /// Returns the SQS service, if SQS is configured or a service was supplied
    pub fn sqs_service(&self) -> Option<Arc<dyn SqsService>> {
        self.sqs_service.clone()
    }
}

/// Fluent style builder for [AscentAws]
#[derive(Debug)]
pub struct Builder {
    config: StarterConfig,
    s3_client: Option<aws_sdk_s3::Client>,
    transfer_manager: Option<aws_sdk_s3_transfer_manager::Client>,
    s3_service: Option<Arc<dyn S3Service>>,
    resource_loader: Option<ResourceLoader>,
    sqs_client: Option<aws_sdk_sqs::Client>,
    extended_s3_client: Option<aws_sdk_s3::Client>,
    sqs_service: Option<Arc<dyn SqsService>>,
}

impl Builder {
    /// Use this Amazon S3 client instead of building one.
    pub fn s3_client(mut self, client: aws_sdk_s3::Client) -> Self {
        self.s3_client = Some(client);
        self
    }

    /// Use this transfer manager instead of building one on the S3 client.
    pub fn transfer_manager(mut self, transfer_manager: aws_sdk_s3_transfer_manager::Client) -> Self {
        self.transfer_manager = Some(transfer_manager);
        self
    }

    /// Use this S3 service instead of [`S3ServiceImpl`].
    pub fn s3_service(mut self, service: Arc<dyn S3Service>) -> Self {
        self.s3_service = Some(service);
        self
    }

    /// Resolve upload paths with this loader.
    pub fn resource_loader(mut self, resource_loader: ResourceLoader) -> Self {
        self.resource_loader = Some(resource_loader);
        self
    }

    /// Use this Amazon SQS client instead of building one.
    pub fn sqs_client(mut self, client: aws_sdk_sqs::Client) -> Self {
        self.sqs_client = Some(client);
        self
    }

    /// Use this Amazon S3 client for offloaded message payloads.
    pub fn extended_s3_client(mut self, client: aws_sdk_s3::Client) -> Self {
        self.extended_s3_client = Some(client);
        self
    }

    /// Use this SQS service instead of [`SqsServiceImpl`].
    pub fn sqs_service(mut self, service: Arc<dyn SqsService>) -> Self {
        self.sqs_service = Some(service);
        self
    }

    /// Create whatever was not supplied.
    pub async fn build(self) -> AscentAws {
        let s3_config = S3Config::from_starter(&self.config);
        let s3_client = match self.s3_client {
            Some(client) => client,
            None => s3_config.s3_client().await,
        };
        let transfer_manager = self
            .transfer_manager
            .unwrap_or_else(|| s3_config.transfer_manager(s3_client.clone()));
        let s3_service = match self.s3_service {
            Some(service) => service,
            None => {
                let service = S3ServiceImpl::new(s3_client.clone(), transfer_manager.clone())
                    .with_resource_loader(self.resource_loader.unwrap_or_default());
                Arc::new(service) as Arc<dyn S3Service>
            }
        };

        let (sqs_client, sqs_service) = match SqsConfig::from_starter(&self.config) {
            Some(sqs_config) => {
                let sqs_client = match self.sqs_client {
                    Some(client) => client,
                    None => sqs_config.sqs_client().await,
                };
                let sqs_service = match self.sqs_service {
                    Some(service) => service,
                    None => {
                        let extended_s3_client = match self.extended_s3_client {
                            Some(client) => Some(client),
                            None => sqs_config.extended_s3_client().await,
                        };
                        sqs_service(&sqs_config, sqs_client.clone(), extended_s3_client)
                    }
                };
                (Some(sqs_client), Some(sqs_service))
            }
            None => {
                tracing::debug!("ascent.sqs.endpoint is not set, skipping SQS");
                (self.sqs_client, self.sqs_service)
            }
        };

        AscentAws {
            config: self.config,
            s3_client,
            transfer_manager,
            s3_service,
            sqs_client,
            sqs_service,
        }
    }
}

fn sqs_service(
    sqs_config: &SqsConfig,
    client: aws_sdk_sqs::Client,
    extended_s3_client: Option<aws_sdk_s3::Client>,
) -> Arc<dyn SqsService> {
    let properties = sqs_config.properties();
    let mut service = SqsServiceImpl::from_properties(client, properties);
    let payload_store = extended_s3_client
        .and_then(|s3| PayloadStore::from_properties(s3, properties.extended()));
    if let Some(store) = payload_store {
        service = service.with_payload_store(store);
    }
    Arc::new(service)
}
