/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

/// `ascent.s3.*` properties
pub mod properties;

/// Amazon S3 client and transfer manager construction
pub mod client;

/// The S3 service exposed to applications
pub mod service;

mod types;

pub use client::S3Config;
pub use properties::S3Properties;
pub use service::{S3Service, S3ServiceImpl};
pub use types::{MultipartFile, UploadResult};
