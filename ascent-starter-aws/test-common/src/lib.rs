/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use ascent_starter_aws::resource::ResourceLoader;
use ascent_starter_aws::s3::S3ServiceImpl;
use ascent_starter_aws::sqs::{PayloadStore, SqsServiceImpl};
use aws_sdk_s3::error::ErrorMetadata;
use aws_sdk_s3::operation::head_bucket::HeadBucketOutput;
use aws_sdk_s3::operation::put_object::{PutObjectError, PutObjectOutput};
use aws_sdk_sqs::operation::get_queue_url::GetQueueUrlOutput;
use aws_sdk_s3_transfer_manager::types::PartSize;
use aws_smithy_mocks::{mock, mock_client, Rule, RuleMode};

pub const TEST_BUCKET: &str = "evsstestbucket";
pub const TARGET_BUCKET: &str = "evsstargetbucket";
pub const DLQ_BUCKET: &str = "evssdlqbucket";
pub const PAYLOAD_BUCKET: &str = "evsspayloadbucket";
pub const TEST_KEY: &str = "test-key.txt";
pub const TEST_E_TAG: &str = "\"3858f62230ac3c915f300c664312c11f\"";
pub const QUEUE_URL: &str = "http://localhost:4576/queue/evss";
pub const DLQ_URL: &str = "http://localhost:4576/queue/evss-dlq";
/// Nothing listens here; requests fail before a response arrives.
pub const UNREACHABLE_ENDPOINT: &str = "http://127.0.0.1:1";

/// Transfer manager on top of `client`, uploading anything under 8 MiB in a single request.
pub fn test_tm(client: aws_sdk_s3::Client) -> aws_sdk_s3_transfer_manager::Client {
    let config = aws_sdk_s3_transfer_manager::Config::builder()
        .client(client)
        .multipart_threshold(PartSize::Target(8 * 1024 * 1024))
        .build();
    aws_sdk_s3_transfer_manager::Client::new(config)
}

/// S3 service where both the client and the transfer manager send through `client`.
pub fn test_s3_service(client: aws_sdk_s3::Client) -> S3ServiceImpl {
    S3ServiceImpl::new(client.clone(), test_tm(client))
}

/// S3 service resolving upload paths against `base_dir`.
pub fn test_s3_service_in(client: aws_sdk_s3::Client, base_dir: &std::path::Path) -> S3ServiceImpl {
    test_s3_service(client).with_resource_loader(ResourceLoader::new(base_dir, base_dir))
}

/// SQS service for [`QUEUE_URL`] with [`DLQ_URL`] as its dead-letter queue.
pub fn test_sqs_service(client: aws_sdk_sqs::Client) -> SqsServiceImpl {
    SqsServiceImpl::new(client, QUEUE_URL).with_dlq_url(Some(DLQ_URL.to_owned()))
}

/// [`test_sqs_service`] offloading bodies over `threshold` bytes to [`PAYLOAD_BUCKET`].
pub fn test_extended_sqs_service(
    client: aws_sdk_sqs::Client,
    s3_client: aws_sdk_s3::Client,
    threshold: usize,
) -> SqsServiceImpl {
    test_sqs_service(client).with_payload_store(PayloadStore::new(
        s3_client,
        PAYLOAD_BUCKET,
        threshold,
    ))
}

/// S3 client for tests where validation fails before any request is sent.
pub fn unused_s3_client() -> aws_sdk_s3::Client {
    let never = mock!(aws_sdk_s3::Client::head_bucket).then_output(|| HeadBucketOutput::builder().build());
    mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&never])
}

/// SQS client for tests where validation fails before any request is sent.
pub fn unused_sqs_client() -> aws_sdk_sqs::Client {
    let never = mock!(aws_sdk_sqs::Client::get_queue_url)
        .then_output(|| GetQueueUrlOutput::builder().build());
    mock_client!(aws_sdk_sqs, RuleMode::Sequential, &[&never])
}

/// S3 client whose requests fail to connect, surfacing as client errors.
pub fn unreachable_s3_client() -> aws_sdk_s3::Client {
    let config = aws_sdk_s3::Config::builder()
        .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            "test-id",
            "test-key",
            None,
            None,
            "unreachable",
        ))
        .region(aws_sdk_s3::config::Region::new("us-east-1"))
        .endpoint_url(UNREACHABLE_ENDPOINT)
        .force_path_style(true)
        .retry_config(aws_sdk_s3::config::retry::RetryConfig::disabled())
        .build();
    aws_sdk_s3::Client::from_conf(config)
}

/// SQS client whose requests fail to connect, surfacing as client errors.
pub fn unreachable_sqs_client() -> aws_sdk_sqs::Client {
    let config = aws_sdk_sqs::Config::builder()
        .behavior_version(aws_sdk_sqs::config::BehaviorVersion::latest())
        .credentials_provider(aws_sdk_sqs::config::Credentials::new(
            "test-id",
            "test-key",
            None,
            None,
            "unreachable",
        ))
        .region(aws_sdk_sqs::config::Region::new("us-east-1"))
        .endpoint_url(UNREACHABLE_ENDPOINT)
        .retry_config(aws_sdk_sqs::config::retry::RetryConfig::disabled())
        .build();
    aws_sdk_sqs::Client::from_conf(config)
}

/// A successful `PutObject` into `bucket`.
pub fn put_object_ok(bucket: &'static str) -> Rule {
    mock!(aws_sdk_s3::Client::put_object)
        .match_requests(move |r| r.bucket() == Some(bucket))
        .then_output(|| {
            PutObjectOutput::builder()
                .e_tag(TEST_E_TAG)
                .version_id("v1")
                .build()
        })
}

/// A `PutObject` rejected with `code`.
pub fn put_object_err(code: &'static str) -> Rule {
    mock!(aws_sdk_s3::Client::put_object).then_error(move || {
        PutObjectError::generic(
            ErrorMetadata::builder()
                .code(code)
                .message("The specified bucket does not exist")
                .build(),
        )
    })
}

/// Create a temporary directory holding `files` (relative path, contents).
pub fn create_test_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
    let temp_dir = tempfile::tempdir().unwrap();
    for (path, contents) in files {
        let full_path = temp_dir.path().join(path);
        std::fs::create_dir_all(full_path.parent().unwrap()).unwrap();
        std::fs::write(&full_path, contents).unwrap();
    }
    temp_dir
}

