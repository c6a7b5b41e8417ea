/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use aws_sdk_s3::operation::put_object::PutObjectError;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::operation::send_message::SendMessageError;
use aws_sdk_sqs::types::MessageAttributeValue;
use http::Response;

use crate::error::{self, Error, ErrorKind};
use crate::log;
use crate::response;
use crate::sqs::extended::{self, PayloadS3Pointer, PayloadStore, RESERVED_ATTRIBUTE_NAME};
use crate::sqs::{SqsMessage, SqsProperties};

/// Validation message for a missing message body
pub const MESSAGE_NOTNULL_MESSAGE: &str = "Message Body can't be null";
/// Validation message for a missing receipt handle
pub const RECEIPT_HANDLE_NOTNULL_MESSAGE: &str = "Receipt Handle can't be null";
/// Banner logged when a send fails
pub const SEND_FAILED: &str = "Send Failed";

/// Most messages a single receive may return.
pub const MAX_NUMBER_OF_MESSAGES: i32 = 10;

const SERVICE_NAME: &str = "Amazon SQS";

/// Message queue operations exposed to the application.
///
/// Send failures are logged and reported through an empty body with a `200 OK` status. Receive,
/// delete and dead-letter failures are returned.
#[async_trait]
pub trait SqsService: Send + Sync + fmt::Debug {
    /// Send `message_body` to the queue. The response body is the message id.
    async fn send_message(&self, message_body: &str) -> Result<Response<Option<String>>, Error>;

    /// Send `message_body` with string message attributes. The `ExtendedPayloadSize`
    /// attribute name is reserved for offloaded payloads.
    async fn send_message_with_attributes(
        &self,
        message_body: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<Response<Option<String>>, Error>;

    /// Receive up to the configured number of messages, resolving offloaded payloads.
    async fn receive_messages(&self) -> Result<Vec<SqsMessage>, Error>;

    /// Delete a received message, and its offloaded payload if it has one.
    async fn delete_message(&self, receipt_handle: &str) -> Result<(), Error>;

    /// Send a received message to the dead-letter queue and delete it from the queue.
    async fn move_message_to_dlq(&self, message: &SqsMessage) -> Result<(), Error>;
}

/// [`SqsService`] backed by the Amazon SQS client.
#[derive(Debug, Clone)]
pub struct SqsServiceImpl {
    client: aws_sdk_sqs::Client,
    queue_url: String,
    dlq_url: Option<String>,
    max_number_of_messages: i32,
    payload_store: Option<PayloadStore>,
}

impl SqsServiceImpl {
    /// Create a service for the queue at `queue_url`.
    pub fn new(client: aws_sdk_sqs::Client, queue_url: impl Into<String>) -> Self {
        SqsServiceImpl {
            client,
            queue_url: queue_url.into(),
            dlq_url: None,
            max_number_of_messages: 1,
            payload_store: None,
        }
    }

    /// Create a service for the queues named by `properties`.
    pub fn from_properties(client: aws_sdk_sqs::Client, properties: &SqsProperties) -> Self {
        tracing::debug!(
            queue = properties.queue_name(),
            dlq = properties.dlq_queue_name(),
            "creating SQS service"
        );
        SqsServiceImpl::new(client, properties.endpoint())
            .with_dlq_url(properties.dlq_endpoint().map(str::to_owned))
            .with_max_number_of_messages(properties.number_of_messages_to_prefetch().unwrap_or(1))
    }

    /// Set or clear the dead-letter queue URL.
    pub fn with_dlq_url(mut self, dlq_url: Option<String>) -> Self {
        self.dlq_url = dlq_url;
        self
    }

    /// Number of messages per receive, clamped to `1..=10`.
    pub fn with_max_number_of_messages(mut self, count: i32) -> Self {
        self.max_number_of_messages = count.clamp(1, MAX_NUMBER_OF_MESSAGES);
        self
    }

    /// Offload large bodies to `payload_store`.
    pub fn with_payload_store(mut self, payload_store: PayloadStore) -> Self {
        self.payload_store = Some(payload_store);
        self
    }

    /// Returns the Amazon SQS client
    pub fn client(&self) -> &aws_sdk_sqs::Client {
        &self.client
    }

    /// Returns the queue URL
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    /// Returns the dead-letter queue URL
    pub fn dlq_url(&self) -> Option<&str> {
        self.dlq_url.as_deref()
    }

    /// Returns the number of messages requested per receive
    pub fn max_number_of_messages(&self) -> i32 {
        self.max_number_of_messages
    }

    /// Returns the payload store, if offloading is enabled
    pub fn payload_store(&self) -> Option<&PayloadStore> {
        self.payload_store.as_ref()
    }

    /// Send to `queue_url`, offloading the body first when it is too large.
    async fn dispatch(
        &self,
        queue_url: &str,
        message_body: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<Option<String>, Error> {
        if attributes.contains_key(RESERVED_ATTRIBUTE_NAME) {
            return Err(error::invalid_input(format!(
                "message attribute {RESERVED_ATTRIBUTE_NAME} is reserved"
            )));
        }
        let mut request = self.client.send_message().queue_url(queue_url);
        for (name, value) in attributes {
            request = request.message_attributes(name, attribute("String", value.clone())?);
        }

        request = match &self.payload_store {
            Some(store) if store.exceeds_threshold(message_body, attributes) => {
                let pointer = store.store(message_body).await?;
                tracing::debug!(
                    bucket = pointer.s3_bucket_name(),
                    key = pointer.s3_key(),
                    size = message_body.len(),
                    "message body offloaded to S3"
                );
                request.message_body(pointer.to_json()?).message_attributes(
                    RESERVED_ATTRIBUTE_NAME,
                    attribute("Number", message_body.len().to_string())?,
                )
            }
            _ => request.message_body(message_body),
        };

        let output = request.send().await?;
        Ok(output.message_id().map(str::to_owned))
    }

    /// Swap an offloaded pointer body for the stored payload.
    async fn resolve(&self, message: &aws_sdk_sqs::types::Message) -> Result<SqsMessage, Error> {
        let mut sqs_message = SqsMessage::from_sdk(message);
        let offloaded = message
            .message_attributes()
            .is_some_and(|attributes| attributes.contains_key(RESERVED_ATTRIBUTE_NAME));
        let store = match &self.payload_store {
            Some(store) if offloaded => store,
            _ => return Ok(sqs_message),
        };

        let pointer = sqs_message
            .body()
            .and_then(PayloadS3Pointer::from_json)
            .ok_or_else(|| {
                error::invalid_input(format!(
                    "message {} carries {RESERVED_ATTRIBUTE_NAME} but its body is not a payload pointer",
                    message.message_id().unwrap_or("unknown")
                ))
            })?;
        sqs_message.set_body(store.fetch(&pointer).await?);
        let receipt_handle = sqs_message
            .receipt_handle()
            .map(|handle| pointer.embed_in_receipt_handle(handle));
        sqs_message.set_receipt_handle(receipt_handle);
        Ok(sqs_message)
    }
}

#[async_trait]
impl SqsService for SqsServiceImpl {
    async fn send_message(&self, message_body: &str) -> Result<Response<Option<String>>, Error> {
        self.send_message_with_attributes(message_body, &HashMap::new())
            .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(queue = self.queue_url.as_str(), size = message_body.len()))]
    async fn send_message_with_attributes(
        &self,
        message_body: &str,
        attributes: &HashMap<String, String>,
    ) -> Result<Response<Option<String>>, Error> {
        error::require(message_body, MESSAGE_NOTNULL_MESSAGE)?;

        match self.dispatch(&self.queue_url, message_body, attributes).await {
            Ok(message_id) => {
                tracing::info!(message_id = message_id.as_deref(), "Message sent");
                Ok(response::ok(message_id))
            }
            Err(err) if err.kind() == &ErrorKind::InputInvalid => Err(err),
            Err(err) => {
                log_send_error(&err);
                Ok(response::ok(None))
            }
        }
    }

    #[tracing::instrument(skip_all, level = "debug", fields(queue = self.queue_url.as_str()))]
    async fn receive_messages(&self) -> Result<Vec<SqsMessage>, Error> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(self.max_number_of_messages)
            .message_attribute_names("All")
            .send()
            .await?;

        let mut messages = Vec::with_capacity(output.messages().len());
        for message in output.messages() {
            messages.push(self.resolve(message).await?);
        }
        tracing::debug!(count = messages.len(), "received messages");
        Ok(messages)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(queue = self.queue_url.as_str()))]
    async fn delete_message(&self, receipt_handle: &str) -> Result<(), Error> {
        error::require(receipt_handle, RECEIPT_HANDLE_NOTNULL_MESSAGE)?;

        let (pointer, receipt_handle) = extended::split_receipt_handle(receipt_handle);
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await?;

        if let Some(pointer) = pointer {
            match &self.payload_store {
                Some(store) => store.delete(&pointer).await?,
                None => tracing::warn!(
                    bucket = pointer.s3_bucket_name(),
                    key = pointer.s3_key(),
                    "payload left in S3; extended client is not configured"
                ),
            }
        }
        tracing::info!("Deleted message");
        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(message_id = message.message_id()))]
    async fn move_message_to_dlq(&self, message: &SqsMessage) -> Result<(), Error> {
        let dlq_url = self
            .dlq_url
            .as_deref()
            .ok_or_else(|| error::invalid_config("ascent.sqs.dlq-endpoint is not configured"))?;
        let message_body = message.body().unwrap_or_default();
        error::require(message_body, MESSAGE_NOTNULL_MESSAGE)?;
        let receipt_handle = message.receipt_handle().unwrap_or_default();
        error::require(receipt_handle, RECEIPT_HANDLE_NOTNULL_MESSAGE)?;

        let dlq_message_id = self
            .dispatch(dlq_url, message_body, message.attributes())
            .await?;
        tracing::info!(
            dlq_url,
            dlq_message_id = dlq_message_id.as_deref(),
            "Moved message to DLQ"
        );
        self.delete_message(receipt_handle).await
    }
}

fn attribute(data_type: &str, value: String) -> Result<MessageAttributeValue, Error> {
    Ok(MessageAttributeValue::builder()
        .data_type(data_type)
        .string_value(value)
        .build()?)
}

/// Log a failed send, surfacing the SQS or S3 failure behind it when there is one.
fn log_send_error(err: &Error) {
    if let Some(sdk_err) = log::find_sdk_error::<SendMessageError>(err) {
        log::sdk_error(SEND_FAILED, SERVICE_NAME, sdk_err);
    } else if let Some(sdk_err) = log::find_sdk_error::<PutObjectError>(err) {
        log::sdk_error(SEND_FAILED, "Amazon S3", sdk_err);
    } else {
        log::error_with_banner(SEND_FAILED, &DisplayErrorContext(err).to_string());
    }
}
