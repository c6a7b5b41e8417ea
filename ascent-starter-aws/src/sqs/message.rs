/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;

use crate::sqs::extended::RESERVED_ATTRIBUTE_NAME;

/// A received message.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqsMessage {
    message_id: Option<String>,
    receipt_handle: Option<String>,
    body: Option<String>,
    attributes: HashMap<String, String>,
}

impl SqsMessage {
    /// Create a message with `body`, e.g. to hand to
    /// [`move_message_to_dlq`](crate::sqs::SqsService::move_message_to_dlq).
    pub fn new(body: impl Into<String>) -> Self {
        SqsMessage {
            body: Some(body.into()),
            ..Default::default()
        }
    }

    /// Set the message id.
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    /// Set the receipt handle.
    pub fn with_receipt_handle(mut self, receipt_handle: impl Into<String>) -> Self {
        self.receipt_handle = Some(receipt_handle.into());
        self
    }

    /// Add a string attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns the id SQS assigned to the message
    pub fn message_id(&self) -> Option<&str> {
        self.message_id.as_deref()
    }

    /// Returns the handle used to delete the message
    pub fn receipt_handle(&self) -> Option<&str> {
        self.receipt_handle.as_deref()
    }

    /// Returns the message body, with any offloaded payload already resolved
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Returns the string message attributes
    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub(crate) fn set_body(&mut self, body: String) {
        self.body = Some(body);
    }

    pub(crate) fn set_receipt_handle(&mut self, receipt_handle: Option<String>) {
        self.receipt_handle = receipt_handle;
    }

    /// Copy the fields we expose. Binary and reserved attributes are dropped.
    pub(crate) fn from_sdk(message: &aws_sdk_sqs::types::Message) -> Self {
        let attributes = message
            .message_attributes()
            .into_iter()
            .flatten()
            .filter(|(name, _)| name.as_str() != RESERVED_ATTRIBUTE_NAME)
            .filter_map(|(name, value)| {
                value
                    .string_value()
                    .map(|value| (name.clone(), value.to_owned()))
            })
            .collect();

        SqsMessage {
            message_id: message.message_id().map(str::to_owned),
            receipt_handle: message.receipt_handle().map(str::to_owned),
            body: message.body().map(str::to_owned),
            attributes,
        }
    }
}
