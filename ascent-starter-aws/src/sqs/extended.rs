/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

//! Offloading of oversized message bodies to Amazon S3.
//!
//! The wire format is shared with the Amazon SQS Extended Client Library so queues can be
//! consumed by either side: the message body is replaced with a JSON pointer to the stored
//! object and the original size is sent in the `ExtendedPayloadSize` attribute.

use std::collections::HashMap;

use aws_sdk_s3::primitives::ByteStream;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind};
use crate::sqs::Extended;

/// Class name tagging the pointer JSON.
pub const POINTER_CLASS: &str = "software.amazon.payloadoffloading.PayloadS3Pointer";

/// Number attribute carrying the original body size of an offloaded message.
pub const RESERVED_ATTRIBUTE_NAME: &str = "ExtendedPayloadSize";

const BUCKET_MARKER: &str = "-..s3BucketName..-";
const KEY_MARKER: &str = "-..s3Key..-";

/// Location of an offloaded message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadS3Pointer {
    s3_bucket_name: String,
    s3_key: String,
}

impl PayloadS3Pointer {
    /// Point at `key` in `bucket`.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        PayloadS3Pointer {
            s3_bucket_name: bucket.into(),
            s3_key: key.into(),
        }
    }

    /// Returns the bucket holding the payload
    pub fn s3_bucket_name(&self) -> &str {
        &self.s3_bucket_name
    }

    /// Returns the payload object key
    pub fn s3_key(&self) -> &str {
        &self.s3_key
    }

    /// Serialize as the message body sent in place of the payload.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&(POINTER_CLASS, self))?)
    }

    /// Parse a message body. Returns `None` for anything that isn't a pointer.
    pub fn from_json(body: &str) -> Option<Self> {
        serde_json::from_str::<(String, PayloadS3Pointer)>(body)
            .ok()
            .filter(|(class, _)| class == POINTER_CLASS)
            .map(|(_, pointer)| pointer)
    }

    /// Prefix `receipt_handle` with the payload location so deleting the message can also
    /// delete the payload.
    pub(crate) fn embed_in_receipt_handle(&self, receipt_handle: &str) -> String {
        format!(
            "{BUCKET_MARKER}{}{BUCKET_MARKER}{KEY_MARKER}{}{KEY_MARKER}{receipt_handle}",
            self.s3_bucket_name, self.s3_key
        )
    }
}

/// Split a receipt handle into the embedded payload location, if any, and the handle SQS
/// issued.
pub(crate) fn split_receipt_handle(receipt_handle: &str) -> (Option<PayloadS3Pointer>, &str) {
    let embedded = receipt_handle
        .strip_prefix(BUCKET_MARKER)
        .and_then(|rest| rest.split_once(BUCKET_MARKER))
        .and_then(|(bucket, rest)| {
            let (key, handle) = rest.strip_prefix(KEY_MARKER)?.split_once(KEY_MARKER)?;
            Some((PayloadS3Pointer::new(bucket, key), handle))
        });
    match embedded {
        Some((pointer, handle)) => (Some(pointer), handle),
        None => (None, receipt_handle),
    }
}

/// Size SQS counts against its message limit: the body plus every attribute's name, type and
/// value.
pub(crate) fn message_size(body: &str, attributes: &HashMap<String, String>) -> usize {
    let attribute_size: usize = attributes
        .iter()
        .map(|(name, value)| name.len() + "String".len() + value.len())
        .sum();
    body.len() + attribute_size
}

/// Stores and retrieves offloaded message bodies.
#[derive(Debug, Clone)]
pub struct PayloadStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    threshold: usize,
}

impl PayloadStore {
    /// Store payloads larger than `threshold` bytes in `bucket`.
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>, threshold: usize) -> Self {
        PayloadStore {
            client,
            bucket: bucket.into(),
            threshold,
        }
    }

    /// Create from `ascent.sqs.extended.*` properties, or `None` when offloading is disabled.
    pub fn from_properties(client: aws_sdk_s3::Client, extended: &Extended) -> Option<Self> {
        let bucket = extended.get_s3_bucket_name()?;
        Some(PayloadStore::new(
            client,
            bucket,
            extended.get_payload_size_threshold(),
        ))
    }

    /// Returns the payload bucket
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Returns the offload threshold in bytes
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub(crate) fn exceeds_threshold(
        &self,
        body: &str,
        attributes: &HashMap<String, String>,
    ) -> bool {
        message_size(body, attributes) > self.threshold
    }

    /// Store `body` under a fresh random key.
    #[tracing::instrument(skip_all, level = "debug", fields(bucket = self.bucket.as_str(), size = body.len()))]
    pub(crate) async fn store(&self, body: &str) -> Result<PayloadS3Pointer, Error> {
        let key = uuid::Uuid::new_v4().to_string();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body.as_bytes().to_vec()))
            .send()
            .await?;
        tracing::debug!(key = key.as_str(), "stored message payload");
        Ok(PayloadS3Pointer::new(self.bucket.clone(), key))
    }

    /// Read an offloaded body back.
    #[tracing::instrument(skip_all, level = "debug", fields(bucket = pointer.s3_bucket_name(), key = pointer.s3_key()))]
    pub(crate) async fn fetch(&self, pointer: &PayloadS3Pointer) -> Result<String, Error> {
        let output = self
            .client
            .get_object()
            .bucket(pointer.s3_bucket_name())
            .key(pointer.s3_key())
            .send()
            .await?;
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| Error::new(ErrorKind::IOError, err))?
            .into_bytes();
        String::from_utf8(bytes.to_vec()).map_err(|err| Error::new(ErrorKind::IOError, err))
    }

    /// Delete an offloaded body.
    #[tracing::instrument(skip_all, level = "debug", fields(bucket = pointer.s3_bucket_name(), key = pointer.s3_key()))]
    pub(crate) async fn delete(&self, pointer: &PayloadS3Pointer) -> Result<(), Error> {
        self.client
            .delete_object()
            .bucket(pointer.s3_bucket_name())
            .key(pointer.s3_key())
            .send()
            .await?;
        Ok(())
    }
}
