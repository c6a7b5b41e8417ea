/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// `ascent.sqs.*` properties
pub mod properties;

/// Amazon SQS client factory
pub mod client;

/// Payload offloading to Amazon S3
pub mod extended;

/// The SQS service
pub mod service;

mod message;

pub use client::SqsConfig;
pub use extended::{PayloadS3Pointer, PayloadStore};
pub use message::SqsMessage;
pub use properties::{Extended, SqsProperties};
pub use service::{SqsService, SqsServiceImpl};
