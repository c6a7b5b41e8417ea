/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/* Automatically managed default lints */
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
/* End of automatically managed default lints */
#![warn(
    missing_debug_implementations,
    missing_docs,
    rustdoc::missing_crate_level_docs,
    unreachable_pub,
    rust_2018_idioms
)]

//! Ready-made Amazon S3 and Amazon SQS services for applications on the Ascent platform.
//!
//! Properties are bound from `ascent.s3.*` and `ascent.sqs.*` keys (or the matching
//! `ASCENT_S3_*` / `ASCENT_SQS_*` environment variables). Under the `embedded-aws` and
//! `local-int` profiles the clients target the configured endpoints instead of AWS.
//!
//! # Examples
//!
//! Wire the services from the environment:
//!
//! ```no_run
//! # async fn example() -> Result<(), ascent_starter_aws::error::Error> {
//! use std::collections::HashMap;
//!
//! let config = ascent_starter_aws::from_env().load()?;
//! let aws = ascent_starter_aws::AscentAws::from_config(config).await;
//!
//! let response = aws
//!     .s3_service()
//!     .upload_byte_array("my-bucket", "hello".into(), "hello.txt", &HashMap::new())
//!     .await?;
//! println!("{:?}", response.body());
//!
//! if let Some(sqs) = aws.sqs_service() {
//!     sqs.send_message("uploaded hello.txt").await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Services are trait objects ([`S3Service`](crate::s3::S3Service),
//! [`SqsService`](crate::sqs::SqsService)); supply your own through [`AscentAws::builder`] to
//! replace the defaults.

/// Error types emitted by `ascent-starter-aws`
pub mod error;

/// Property binding and profiles
pub mod config;

/// Amazon S3 properties, client factory and service
pub mod s3;

/// Amazon SQS properties, client factory and service
pub mod sqs;

/// Resource resolution for uploads
pub mod resource;

/// Service wiring
pub mod autoconfigure;

/// Failure logging helpers
pub(crate) mod log;

/// HTTP response construction
pub(crate) mod response;

pub use self::autoconfigure::AscentAws;
use self::config::loader::ConfigLoader;
pub use self::config::StarterConfig;
pub use self::response::{encode_file_name, APPLICATION_OCTET_STREAM};

/// Create a config loader
pub fn from_env() -> ConfigLoader {
    ConfigLoader::default()
}
