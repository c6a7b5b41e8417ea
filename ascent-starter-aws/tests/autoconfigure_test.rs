/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::sync::Arc;

use ascent_starter_aws::config::PropertySource;
use ascent_starter_aws::s3::S3Service;
use ascent_starter_aws::sqs::SqsService;
use ascent_starter_aws::{AscentAws, StarterConfig};
use aws_sdk_s3::operation::get_object::GetObjectOutput;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_sqs::operation::send_message::SendMessageOutput;
use aws_smithy_mocks::{mock, mock_client, RuleMode};
use bytes::Bytes;
use test_common::{test_s3_service, unused_s3_client, QUEUE_URL, TEST_BUCKET, TEST_KEY};

fn load(vars: &[(&str, &str)]) -> StarterConfig {
    ascent_starter_aws::from_env()
        .property_source(PropertySource::from_vars(vars.iter().copied()))
        .load()
        .unwrap()
}

#[tokio::test]
async fn test_wires_s3_only_without_sqs_endpoint() {
    let config = load(&[
        ("ASCENT_PROFILES_ACTIVE", "embedded-aws"),
        ("ASCENT_S3_ENDPOINT", "http://localhost:4572"),
        ("ASCENT_S3_ACCESS_KEY", "test-id"),
        ("ASCENT_S3_SECRET_KEY", "test-key"),
    ]);
    let aws = AscentAws::from_config(config).await;

    assert!(aws.sqs_service().is_none());
    assert!(aws.sqs_client().is_none());
    assert_eq!(
        "us-east-1",
        aws.s3_client().config().region().unwrap().as_ref()
    );
}

#[tokio::test]
async fn test_wires_sqs_with_endpoint() {
    let config = load(&[
        ("ASCENT_SQS_ENDPOINT", QUEUE_URL),
        ("ASCENT_SQS_REGION", "us-west-2"),
    ]);
    let aws = AscentAws::from_config(config).await;

    assert!(aws.sqs_service().is_some());
    assert_eq!(
        "us-west-2",
        aws.sqs_client().unwrap().config().region().unwrap().as_ref()
    );
}

#[tokio::test]
async fn test_supplied_clients_are_used() {
    let get_object = mock!(aws_sdk_s3::Client::get_object).then_output(|| {
        GetObjectOutput::builder()
            .body(ByteStream::from_static(b"testString"))
            .build()
    });
    let s3_client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&get_object]);
    let send_message = mock!(aws_sdk_sqs::Client::send_message)
        .match_requests(|r| r.queue_url() == Some(QUEUE_URL))
        .then_output(|| SendMessageOutput::builder().message_id("m-1").build());
    let sqs_client = mock_client!(aws_sdk_sqs, RuleMode::Sequential, &[&send_message]);

    let config = load(&[("ASCENT_SQS_ENDPOINT", QUEUE_URL)]);
    let aws = AscentAws::builder(config)
        .s3_client(s3_client)
        .sqs_client(sqs_client)
        .build()
        .await;

    let response = aws
        .s3_service()
        .download_file(TEST_BUCKET, TEST_KEY)
        .await
        .unwrap();
    assert_eq!(&Bytes::from_static(b"testString"), response.body());

    let response = aws.sqs_service().unwrap().send_message("hello").await.unwrap();
    assert_eq!(&Some("m-1".to_owned()), response.body());
}

#[tokio::test]
async fn test_supplied_service_is_kept() {
    let supplied: Arc<dyn S3Service> = Arc::new(test_s3_service(unused_s3_client()));
    let aws = AscentAws::builder(StarterConfig::builder().build())
        .s3_service(Arc::clone(&supplied))
        .build()
        .await;

    assert!(std::ptr::addr_eq(
        Arc::as_ptr(&supplied),
        Arc::as_ptr(&aws.s3_service())
    ));
}

#[tokio::test]
async fn test_supplied_sqs_service_without_endpoint() {
    let sqs_client = test_common::unused_sqs_client();
    let supplied: Arc<dyn SqsService> = Arc::new(test_common::test_sqs_service(sqs_client));
    let aws = AscentAws::builder(StarterConfig::builder().build())
        .sqs_service(Arc::clone(&supplied))
        .build()
        .await;

    assert!(aws.sqs_service().is_some());
    assert!(aws.sqs_client().is_none());
}
