/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::PathBuf;

use bytes::Bytes;

/// Outcome of a completed upload.
///
/// An upload that never reached S3 (e.g. the local file could not be read) is reported as
/// `UploadResult::default()`: every field is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct UploadResult {
    bucket_name: Option<String>,
    key: Option<String>,
    e_tag: Option<String>,
    version_id: Option<String>,
}

impl UploadResult {
    pub(crate) fn from_output(
        bucket: &str,
        key: &str,
        output: &aws_sdk_s3_transfer_manager::operation::upload::UploadOutput,
    ) -> Self {
        UploadResult {
            bucket_name: Some(bucket.to_owned()),
            key: Some(key.to_owned()),
            e_tag: output.e_tag().map(str::to_owned),
            version_id: output.version_id().map(str::to_owned),
        }
    }

    /// Bucket the object was written to
    pub fn bucket_name(&self) -> Option<&str> {
        self.bucket_name.as_deref()
    }

    /// Key the object was written to
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Entity tag of the new object
    pub fn e_tag(&self) -> Option<&str> {
        self.e_tag.as_deref()
    }

    /// Version of the new object, when bucket versioning is enabled
    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }
}

/// A file received in a multipart form request.
///
/// Small parts are usually held in memory; large ones are spooled to disk by the web layer
/// and referenced by path.
#[derive(Debug, Clone)]
pub struct MultipartFile {
    name: String,
    original_filename: Option<String>,
    content_type: Option<String>,
    content: Content,
}

#[derive(Debug, Clone)]
enum Content {
    Memory(Bytes),
    Disk(PathBuf),
}

impl MultipartFile {
    /// A form part held in memory.
    pub fn from_bytes(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        MultipartFile {
            name: name.into(),
            original_filename: None,
            content_type: None,
            content: Content::Memory(content.into()),
        }
    }

    /// A form part spooled to `path`.
    pub fn from_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        MultipartFile {
            name: name.into(),
            original_filename: None,
            content_type: None,
            content: Content::Disk(path.into()),
        }
    }

    /// Set the file name the client submitted.
    pub fn original_filename(mut self, filename: impl Into<String>) -> Self {
        self.original_filename = Some(filename.into());
        self
    }

    /// Set the content type the client submitted.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Form field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name the client submitted, if any
    pub fn get_original_filename(&self) -> Option<&str> {
        self.original_filename.as_deref()
    }

    /// Content type the client submitted, if any
    pub fn get_content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Read the part contents.
    pub async fn bytes(&self) -> std::io::Result<Bytes> {
        match &self.content {
            Content::Memory(bytes) => Ok(bytes.clone()),
            Content::Disk(path) => tokio::fs::read(path).await.map(Bytes::from),
        }
    }
}
