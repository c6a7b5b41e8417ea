/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::operation::complete_multipart_upload::CompleteMultipartUploadError;
use aws_sdk_s3::operation::create_multipart_upload::CreateMultipartUploadError;
use aws_sdk_s3::operation::put_object::PutObjectError;
use aws_sdk_s3::operation::upload_part::UploadPartError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3_transfer_manager::io::InputStream;
use bytes::Bytes;
use http::Response;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{self, Error, ErrorKind};
use crate::log;
use crate::resource::ResourceLoader;
use crate::response;
use crate::s3::{MultipartFile, UploadResult};

/// Validation message for a missing bucket name
pub const BUCKET_NAME_NOTNULL_MESSAGE: &str = "Bucket Name can't be null";
/// Validation message for a missing object key
pub const KEY_NOTNULL_MESSAGE: &str = "Key of the object can't be null";
/// Validation message for a missing file name
pub const FILE_NAME_NOTNULL_MESSAGE: &str = "File Name can't be null";
/// Banner logged when an upload fails
pub const UPLOAD_FAILED: &str = "Upload Failed";
/// Banner logged when a copy fails
pub const COPY_FAILED: &str = "Copy Failed";

const SERVICE_NAME: &str = "Amazon S3";

/// Characters left as-is in the `x-amz-copy-source` key.
const COPY_SOURCE_KEY: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Object storage operations exposed to the application.
///
/// Upload failures are logged and reported through an empty body with a `200 OK` status so
/// callers behind a web endpoint always get a response. Input validation failures are returned
/// as [`ErrorKind::InputInvalid`].
#[async_trait]
pub trait S3Service: Send + Sync + fmt::Debug {
    /// Upload a byte array as `file_name`, with `property_map` as user metadata.
    async fn upload_byte_array(
        &self,
        bucket_name: &str,
        byte_data: Bytes,
        file_name: &str,
        property_map: &HashMap<String, String>,
    ) -> Result<Response<Option<UploadResult>>, Error>;

    /// Upload a single multipart form file under its original file name.
    async fn upload_multipart_file(
        &self,
        bucket_name: &str,
        multipart_file: &MultipartFile,
        property_map: &HashMap<String, String>,
    ) -> Result<Response<Option<UploadResult>>, Error>;

    /// Upload several multipart form files.
    ///
    /// Files without an original file name are skipped; files that fail to read or upload are
    /// logged and left out of the result. Objects are stored without user metadata.
    async fn upload_multipart_files(
        &self,
        bucket_name: &str,
        multipart_files: &[MultipartFile],
    ) -> Result<Response<Vec<UploadResult>>, Error>;

    /// Upload the resource at `upload_file_path` as `key_name`.
    ///
    /// If the resource cannot be read the body is an empty [`UploadResult`].
    async fn upload_file(
        &self,
        bucket_name: &str,
        key_name: &str,
        upload_file_path: &str,
    ) -> Result<Response<UploadResult>, Error>;

    /// Move `key` from one bucket to another: copy, then delete the source object.
    ///
    /// AWS failures are logged, not returned.
    async fn copy_file_from_source_to_target_bucket(
        &self,
        source_bucket_name: &str,
        target_bucket_name: &str,
        key: &str,
    ) -> Result<(), Error>;

    /// Store a dead-letter message body in the DLQ bucket.
    async fn move_message_to_s3(
        &self,
        dlq_bucket_name: &str,
        key: &str,
        message: &str,
    ) -> Result<(), Error>;

    /// Read an object into an `application/octet-stream` attachment response.
    async fn download_file(
        &self,
        bucket_name: &str,
        key_name: &str,
    ) -> Result<Response<Bytes>, Error>;

    /// Delete an object.
    async fn delete_file(&self, bucket_name: &str, key_name: &str) -> Result<(), Error>;
}

/// [`S3Service`] backed by the Amazon S3 client and transfer manager.
#[derive(Debug, Clone)]
pub struct S3ServiceImpl {
    client: aws_sdk_s3::Client,
    transfer_manager: aws_sdk_s3_transfer_manager::Client,
    resource_loader: ResourceLoader,
}

impl S3ServiceImpl {
    /// Create the service. Uploads go through `transfer_manager`, everything else through
    /// `client`.
    pub fn new(
        client: aws_sdk_s3::Client,
        transfer_manager: aws_sdk_s3_transfer_manager::Client,
    ) -> Self {
        S3ServiceImpl {
            client,
            transfer_manager,
            resource_loader: ResourceLoader::default(),
        }
    }

    /// Use `resource_loader` to resolve [`upload_file`](S3Service::upload_file) paths.
    pub fn with_resource_loader(mut self, resource_loader: ResourceLoader) -> Self {
        self.resource_loader = resource_loader;
        self
    }

    /// Returns the Amazon S3 client
    pub fn client(&self) -> &aws_sdk_s3::Client {
        &self.client
    }

    /// Returns the transfer manager
    pub fn transfer_manager(&self) -> &aws_sdk_s3_transfer_manager::Client {
        &self.transfer_manager
    }

    /// Upload `body` with a public-read ACL. Failures are logged and yield `None`.
    async fn upload(
        &self,
        bucket_name: &str,
        upload_key: &str,
        body: Bytes,
        property_map: &HashMap<String, String>,
    ) -> Option<UploadResult> {
        let metadata = (!property_map.is_empty()).then(|| property_map.clone());
        let handle = self
            .transfer_manager
            .upload()
            .bucket(bucket_name)
            .key(upload_key)
            .acl(ObjectCannedAcl::PublicRead)
            .set_metadata(metadata)
            .body(InputStream::from(body))
            .initiate();

        let result = match handle {
            Ok(handle) => handle.join().await,
            Err(err) => Err(err),
        };

        match result {
            Ok(output) => {
                tracing::info!(
                    bucket = bucket_name,
                    key = upload_key,
                    "Upload completed"
                );
                Some(UploadResult::from_output(bucket_name, upload_key, &output))
            }
            Err(err) => {
                log_transfer_error(UPLOAD_FAILED, &err);
                None
            }
        }
    }
}

#[async_trait]
impl S3Service for S3ServiceImpl {
    #[tracing::instrument(skip_all, level = "debug", fields(bucket = bucket_name, key = file_name))]
    async fn upload_byte_array(
        &self,
        bucket_name: &str,
        byte_data: Bytes,
        file_name: &str,
        property_map: &HashMap<String, String>,
    ) -> Result<Response<Option<UploadResult>>, Error> {
        error::require(bucket_name, BUCKET_NAME_NOTNULL_MESSAGE)?;
        error::require(file_name, FILE_NAME_NOTNULL_MESSAGE)?;

        let result = self
            .upload(bucket_name, file_name, byte_data, property_map)
            .await;
        tracing::debug!(upload_result = ?result, "UploadResult");
        Ok(response::ok(result))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(bucket = bucket_name, field = multipart_file.name()))]
    async fn upload_multipart_file(
        &self,
        bucket_name: &str,
        multipart_file: &MultipartFile,
        property_map: &HashMap<String, String>,
    ) -> Result<Response<Option<UploadResult>>, Error> {
        error::require(bucket_name, BUCKET_NAME_NOTNULL_MESSAGE)?;
        let file_name = multipart_file.get_original_filename().unwrap_or_default();
        error::require(file_name, FILE_NAME_NOTNULL_MESSAGE)?;

        let result = match multipart_file.bytes().await {
            Ok(bytes) => self.upload(bucket_name, file_name, bytes, property_map).await,
            Err(err) => {
                tracing::error!(error = %err, file_name, "failed to read multipart file");
                None
            }
        };
        tracing::debug!(upload_result = ?result, "UploadResult");
        Ok(response::ok(result))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(bucket = bucket_name, files = multipart_files.len()))]
    async fn upload_multipart_files(
        &self,
        bucket_name: &str,
        multipart_files: &[MultipartFile],
    ) -> Result<Response<Vec<UploadResult>>, Error> {
        error::require(bucket_name, BUCKET_NAME_NOTNULL_MESSAGE)?;

        let no_metadata = HashMap::new();
        let mut results = Vec::with_capacity(multipart_files.len());
        for multipart_file in multipart_files {
            let file_name = match multipart_file.get_original_filename() {
                Some(name) if !name.is_empty() => name,
                _ => continue,
            };
            let bytes = match multipart_file.bytes().await {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::error!(error = %err, file_name, "failed to read multipart file");
                    continue;
                }
            };
            if let Some(result) = self
                .upload(bucket_name, file_name, bytes, &no_metadata)
                .await
            {
                results.push(result);
            }
        }

        tracing::debug!(upload_results = ?results, "UploadResult");
        Ok(response::ok(results))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(bucket = bucket_name, key = key_name))]
    async fn upload_file(
        &self,
        bucket_name: &str,
        key_name: &str,
        upload_file_path: &str,
    ) -> Result<Response<UploadResult>, Error> {
        error::require(bucket_name, BUCKET_NAME_NOTNULL_MESSAGE)?;
        error::require(key_name, KEY_NOTNULL_MESSAGE)?;
        error::require(upload_file_path, "Upload File Path can't be null")?;

        let resource = self.resource_loader.get_resource(upload_file_path);
        let result = match resource.read().await {
            Ok(bytes) => {
                let result = self
                    .upload(bucket_name, key_name, bytes, &HashMap::new())
                    .await
                    .unwrap_or_default();
                tracing::debug!(upload_result = ?result, "Upload File - Done!");
                result
            }
            Err(err) => {
                tracing::error!(
                    error = %err,
                    path = %resource.path().display(),
                    "Caught an IOException"
                );
                UploadResult::default()
            }
        };
        Ok(response::ok(result))
    }

    #[tracing::instrument(skip_all, level = "debug", fields(source = source_bucket_name, target = target_bucket_name, key = key))]
    async fn copy_file_from_source_to_target_bucket(
        &self,
        source_bucket_name: &str,
        target_bucket_name: &str,
        key: &str,
    ) -> Result<(), Error> {
        error::require(source_bucket_name, "Source Bucket Name can't be null")?;
        error::require(target_bucket_name, "Target Bucket Name can't be null")?;
        error::require(key, KEY_NOTNULL_MESSAGE)?;

        let copy_source = format!(
            "{source_bucket_name}/{}",
            utf8_percent_encode(key, COPY_SOURCE_KEY)
        );
        tracing::info!(%copy_source, target_bucket_name, key, "Copying object");
        let copied = self
            .client
            .copy_object()
            .copy_source(copy_source)
            .bucket(target_bucket_name)
            .key(key)
            .send()
            .await;
        if let Err(err) = copied {
            log::sdk_error(COPY_FAILED, SERVICE_NAME, &err);
            return Ok(());
        }

        let deleted = self
            .client
            .delete_object()
            .bucket(source_bucket_name)
            .key(key)
            .send()
            .await;
        match deleted {
            Ok(_) => tracing::info!(
                bucket = source_bucket_name,
                key,
                "Deleting object"
            ),
            Err(err) => log::sdk_error(COPY_FAILED, SERVICE_NAME, &err),
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(bucket = dlq_bucket_name, key = key))]
    async fn move_message_to_s3(
        &self,
        dlq_bucket_name: &str,
        key: &str,
        message: &str,
    ) -> Result<(), Error> {
        error::require(dlq_bucket_name, BUCKET_NAME_NOTNULL_MESSAGE)?;
        error::require(key, KEY_NOTNULL_MESSAGE)?;
        error::require(message, "Message Content can't be null")?;

        tracing::debug!(dlq_bucket_name, key, "Moving Message to S3");
        self.client
            .put_object()
            .bucket(dlq_bucket_name)
            .key(key)
            .body(ByteStream::from(message.as_bytes().to_vec()))
            .send()
            .await?;
        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(bucket = bucket_name, key = key_name))]
    async fn download_file(
        &self,
        bucket_name: &str,
        key_name: &str,
    ) -> Result<Response<Bytes>, Error> {
        error::require(bucket_name, BUCKET_NAME_NOTNULL_MESSAGE)?;
        error::require(key_name, KEY_NOTNULL_MESSAGE)?;

        let output = self
            .client
            .get_object()
            .bucket(bucket_name)
            .key(key_name)
            .send()
            .await?;
        tracing::debug!(
            content_length = output.content_length(),
            e_tag = output.e_tag(),
            "S3Object"
        );

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| Error::new(ErrorKind::IOError, err))?
            .into_bytes();
        response::attachment(key_name, bytes)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(bucket = bucket_name, key = key_name))]
    async fn delete_file(&self, bucket_name: &str, key_name: &str) -> Result<(), Error> {
        error::require(bucket_name, BUCKET_NAME_NOTNULL_MESSAGE)?;
        error::require(key_name, KEY_NOTNULL_MESSAGE)?;

        self.client
            .delete_object()
            .bucket(bucket_name)
            .key(key_name)
            .send()
            .await?;
        tracing::info!(bucket = bucket_name, key = key_name, "Deleted object");
        Ok(())
    }
}

/// Log a failed upload, surfacing the S3 request failure behind it when there is one.
fn log_transfer_error(title: &str, err: &aws_sdk_s3_transfer_manager::error::Error) {
    if let Some(sdk_err) = log::find_sdk_error::<PutObjectError>(err) {
        log::sdk_error(title, SERVICE_NAME, sdk_err);
    } else if let Some(sdk_err) = log::find_sdk_error::<CreateMultipartUploadError>(err) {
        log::sdk_error(title, SERVICE_NAME, sdk_err);
    } else if let Some(sdk_err) = log::find_sdk_error::<UploadPartError>(err) {
        log::sdk_error(title, SERVICE_NAME, sdk_err);
    } else if let Some(sdk_err) = log::find_sdk_error::<CompleteMultipartUploadError>(err) {
        log::sdk_error(title, SERVICE_NAME, sdk_err);
    } else {
        log::error_with_banner(title, &err.to_string());
        tracing::error!(error = %DisplayErrorContext(err), "upload rejected");
    }
}
