/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;

use ascent_starter_aws::error::ErrorKind;
use ascent_starter_aws::s3::service::{BUCKET_NAME_NOTNULL_MESSAGE, KEY_NOTNULL_MESSAGE};
use ascent_starter_aws::s3::{MultipartFile, S3Service};
use aws_sdk_s3::error::ErrorMetadata;
use aws_sdk_s3::operation::copy_object::{CopyObjectError, CopyObjectOutput};
use aws_sdk_s3::operation::create_multipart_upload::CreateMultipartUploadError;
use aws_sdk_s3::operation::delete_object::DeleteObjectOutput;
use aws_sdk_s3::operation::get_object::{GetObjectError, GetObjectOutput};
use aws_sdk_s3::operation::put_object::PutObjectOutput;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_smithy_mocks::{mock, mock_client, RuleMode};
use aws_smithy_runtime::test_util::capture_test_logs::capture_test_logs;
use bytes::Bytes;
use http::StatusCode;
use test_common::{
    create_test_dir, put_object_err, put_object_ok, test_s3_service, test_s3_service_in,
    unreachable_s3_client, unused_s3_client, DLQ_BUCKET, TARGET_BUCKET, TEST_BUCKET, TEST_E_TAG, TEST_KEY,
};

#[tokio::test]
async fn test_upload_byte_array() {
    let put_object = mock!(aws_sdk_s3::Client::put_object)
        .match_requests(|r| {
            r.bucket() == Some(TEST_BUCKET)
                && r.key() == Some(TEST_KEY)
                && r.acl() == Some(&ObjectCannedAcl::PublicRead)
                && r.metadata().and_then(|m| m.get("docType")).map(String::as_str)
                    == Some("claim")
        })
        .then_output(|| PutObjectOutput::builder().e_tag(TEST_E_TAG).build());
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&put_object]);
    let service = test_s3_service(client);

    let properties = HashMap::from([("docType".to_owned(), "claim".to_owned())]);
    let response = service
        .upload_byte_array(
            TEST_BUCKET,
            Bytes::from_static(b"testString"),
            TEST_KEY,
            &properties,
        )
        .await
        .unwrap();

    assert_eq!(StatusCode::OK, response.status());
    let result = response.body().as_ref().unwrap();
    assert_eq!(Some(TEST_BUCKET), result.bucket_name());
    assert_eq!(Some(TEST_KEY), result.key());
    assert_eq!(Some(TEST_E_TAG), result.e_tag());
}

#[tokio::test]
async fn test_upload_byte_array_service_error() {
    let (_guard, rx) = capture_test_logs();
    let put_object = put_object_err("NoSuchBucket");
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&put_object]);
    let service = test_s3_service(client);

    let response = service
        .upload_byte_array(
            TEST_BUCKET,
            Bytes::from_static(b"testString"),
            TEST_KEY,
            &HashMap::new(),
        )
        .await
        .unwrap();

    assert_eq!(StatusCode::OK, response.status());
    assert!(response.body().is_none());
    let logs = rx.contents();
    assert!(logs.contains("Upload Failed"), "{logs}");
}

#[tokio::test]
async fn test_multipart_upload_service_error() {
    let (_guard, rx) = capture_test_logs();
    let create_multipart_upload = mock!(aws_sdk_s3::Client::create_multipart_upload).then_error(|| {
        CreateMultipartUploadError::generic(
            ErrorMetadata::builder()
                .code("AccessDenied")
                .message("Access Denied")
                .build(),
        )
    });
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&create_multipart_upload]);
    let service = test_s3_service(client);

    // above the 8 MiB single-request threshold of the test transfer manager
    let body = Bytes::from(vec![0u8; 9 * 1024 * 1024]);
    let response = service
        .upload_byte_array(TEST_BUCKET, body, TEST_KEY, &HashMap::new())
        .await
        .unwrap();

    assert_eq!(StatusCode::OK, response.status());
    assert!(response.body().is_none());
    let logs = rx.contents();
    assert!(logs.contains("Upload Failed"), "{logs}");
    assert!(logs.contains("aws_error_code"), "{logs}");
    assert!(logs.contains("AccessDenied"), "{logs}");
    assert!(logs.contains(r#"error_type="Service""#), "{logs}");
}

#[tokio::test]
async fn test_upload_byte_array_client_error() {
    let (_guard, rx) = capture_test_logs();
    let service = test_s3_service(unreachable_s3_client());

    let response = service
        .upload_byte_array(
            TEST_BUCKET,
            Bytes::from_static(b"testString"),
            TEST_KEY,
            &HashMap::new(),
        )
        .await
        .unwrap();

    assert_eq!(StatusCode::OK, response.status());
    assert!(response.body().is_none());
    let logs = rx.contents();
    assert!(logs.contains("Upload Failed"), "{logs}");
    assert!(logs.contains(r#"error_type="Client""#), "{logs}");
}

#[tokio::test]
async fn test_upload_byte_array_accepts_whitespace_file_name() {
    let put_object = mock!(aws_sdk_s3::Client::put_object)
        .match_requests(|r| r.key() == Some(" "))
        .then_output(|| PutObjectOutput::builder().build());
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&put_object]);
    let service = test_s3_service(client);

    let response = service
        .upload_byte_array(TEST_BUCKET, Bytes::from_static(b"x"), " ", &HashMap::new())
        .await
        .unwrap();
    assert_eq!(Some(" "), response.body().as_ref().and_then(|r| r.key()));
    assert_eq!(1, put_object.num_calls());
}

#[tokio::test]
async fn test_upload_byte_array_requires_bucket_and_file_name() {
    let client = unused_s3_client();
    let service = test_s3_service(client);

    let err = service
        .upload_byte_array("", Bytes::new(), TEST_KEY, &HashMap::new())
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::InputInvalid, err.kind());
    assert_eq!(
        format!("invalid input: {BUCKET_NAME_NOTNULL_MESSAGE}"),
        err.to_string()
    );

    let err = service
        .upload_byte_array(TEST_BUCKET, Bytes::new(), "", &HashMap::new())
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::InputInvalid, err.kind());
}

#[tokio::test]
async fn test_upload_multipart_file() {
    let put_object = put_object_ok(TEST_BUCKET);
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&put_object]);
    let service = test_s3_service(client);

    let file = MultipartFile::from_bytes("file", Bytes::from_static(b"testString"))
        .original_filename(TEST_KEY)
        .content_type("text/plain");
    let response = service
        .upload_multipart_file(TEST_BUCKET, &file, &HashMap::new())
        .await
        .unwrap();

    let result = response.body().as_ref().unwrap();
    assert_eq!(Some(TEST_KEY), result.key());
    assert_eq!(Some("v1"), result.version_id());
}

#[tokio::test]
async fn test_upload_multipart_file_unreadable() {
    let (_guard, rx) = capture_test_logs();
    let client = unused_s3_client();
    let service = test_s3_service(client);
    let dir = create_test_dir(&[]);

    let file = MultipartFile::from_path("file", dir.path().join("missing.txt"))
        .original_filename("missing.txt");
    let response = service
        .upload_multipart_file(TEST_BUCKET, &file, &HashMap::new())
        .await
        .unwrap();

    assert_eq!(StatusCode::OK, response.status());
    assert!(response.body().is_none());
    assert!(rx.contents().contains("failed to read multipart file"));
}

#[tokio::test]
async fn test_upload_multipart_files_skips_unnamed_and_failed() {
    let (_guard, rx) = capture_test_logs();
    let first = put_object_ok(TEST_BUCKET);
    let second = put_object_err("AccessDenied");
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&first, &second]);
    let service = test_s3_service(client);

    let files = [
        MultipartFile::from_bytes("a", Bytes::from_static(b"one")).original_filename("one.txt"),
        MultipartFile::from_bytes("b", Bytes::from_static(b"unnamed")),
        MultipartFile::from_bytes("c", Bytes::from_static(b"two")).original_filename("two.txt"),
    ];
    let response = service
        .upload_multipart_files(TEST_BUCKET, &files)
        .await
        .unwrap();

    assert_eq!(StatusCode::OK, response.status());
    let results = response.body();
    assert_eq!(1, results.len());
    assert_eq!(Some("one.txt"), results[0].key());
    assert!(rx.contents().contains("Upload Failed"));
}

#[tokio::test]
async fn test_upload_file() {
    let put_object = put_object_ok(TEST_BUCKET);
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&put_object]);
    let dir = create_test_dir(&[("testFile.txt", "testString")]);
    let service = test_s3_service_in(client, dir.path());

    let response = service
        .upload_file(TEST_BUCKET, TEST_KEY, "testFile.txt")
        .await
        .unwrap();

    assert_eq!(StatusCode::OK, response.status());
    assert_eq!(Some(TEST_BUCKET), response.body().bucket_name());
    assert_eq!(Some(TEST_KEY), response.body().key());
}

#[tokio::test]
async fn test_upload_file_missing_resource() {
    let client = unused_s3_client();
    let dir = create_test_dir(&[]);
    let service = test_s3_service_in(client, dir.path());

    let response = service
        .upload_file(TEST_BUCKET, TEST_KEY, "file:missing.txt")
        .await
        .unwrap();

    assert_eq!(StatusCode::OK, response.status());
    assert_eq!(None, response.body().bucket_name());
    assert_eq!(None, response.body().key());
}

#[tokio::test]
async fn test_copy_file_from_source_to_target_bucket() {
    let copy_object = mock!(aws_sdk_s3::Client::copy_object)
        .match_requests(|r| {
            r.copy_source() == Some("evsstestbucket/folder/my%20file.txt")
                && r.bucket() == Some(TARGET_BUCKET)
                && r.key() == Some("folder/my file.txt")
        })
        .then_output(|| CopyObjectOutput::builder().build());
    let delete_object = mock!(aws_sdk_s3::Client::delete_object)
        .match_requests(|r| r.bucket() == Some(TEST_BUCKET) && r.key() == Some("folder/my file.txt"))
        .then_output(|| DeleteObjectOutput::builder().build());
    let client = mock_client!(
        aws_sdk_s3,
        RuleMode::Sequential,
        &[&copy_object, &delete_object]
    );
    let service = test_s3_service(client);

    service
        .copy_file_from_source_to_target_bucket(TEST_BUCKET, TARGET_BUCKET, "folder/my file.txt")
        .await
        .unwrap();
    assert_eq!(1, copy_object.num_calls());
    assert_eq!(1, delete_object.num_calls());
}

#[tokio::test]
async fn test_copy_failure_is_logged_not_returned() {
    let (_guard, rx) = capture_test_logs();
    let copy_object = mock!(aws_sdk_s3::Client::copy_object).then_error(|| {
        CopyObjectError::generic(
            ErrorMetadata::builder()
                .code("NoSuchKey")
                .message("The specified key does not exist.")
                .build(),
        )
    });
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&copy_object]);
    let service = test_s3_service(client);

    service
        .copy_file_from_source_to_target_bucket(TEST_BUCKET, TARGET_BUCKET, TEST_KEY)
        .await
        .unwrap();

    let logs = rx.contents();
    assert!(logs.contains("Copy Failed"), "{logs}");
    assert!(logs.contains("The specified key does not exist."), "{logs}");
    assert!(logs.contains("NoSuchKey"), "{logs}");
}

#[tokio::test]
async fn test_copy_client_error_is_logged_not_returned() {
    let (_guard, rx) = capture_test_logs();
    let service = test_s3_service(unreachable_s3_client());

    service
        .copy_file_from_source_to_target_bucket(TEST_BUCKET, TARGET_BUCKET, TEST_KEY)
        .await
        .unwrap();

    let logs = rx.contents();
    assert!(logs.contains("Copy Failed"), "{logs}");
    assert!(logs.contains(r#"error_type="Client""#), "{logs}");
}

#[tokio::test]
async fn test_move_message_to_s3() {
    let put_object = mock!(aws_sdk_s3::Client::put_object)
        .match_requests(|r| r.bucket() == Some(DLQ_BUCKET) && r.key() == Some("message-1"))
        .then_output(|| PutObjectOutput::builder().build());
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&put_object]);
    let service = test_s3_service(client);

    service
        .move_message_to_s3(DLQ_BUCKET, "message-1", "{\"claimId\":42}")
        .await
        .unwrap();
    assert_eq!(1, put_object.num_calls());

    let err = service
        .move_message_to_s3(DLQ_BUCKET, "", "{}")
        .await
        .unwrap_err();
    assert_eq!(
        format!("invalid input: {KEY_NOTNULL_MESSAGE}"),
        err.to_string()
    );
}

#[tokio::test]
async fn test_move_message_to_s3_failure_propagates() {
    let put_object = put_object_err("NoSuchBucket");
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&put_object]);
    let service = test_s3_service(client);

    let err = service
        .move_message_to_s3(DLQ_BUCKET, "message-1", "body")
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::NotFound, err.kind());
}

#[tokio::test]
async fn test_download_file() {
    let get_object = mock!(aws_sdk_s3::Client::get_object)
        .match_requests(|r| r.bucket() == Some(TEST_BUCKET) && r.key() == Some("my report.pdf"))
        .then_output(|| {
            GetObjectOutput::builder()
                .content_length(10)
                .body(ByteStream::from_static(b"testString"))
                .build()
        });
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&get_object]);
    let service = test_s3_service(client);

    let response = service
        .download_file(TEST_BUCKET, "my report.pdf")
        .await
        .unwrap();

    assert_eq!(StatusCode::OK, response.status());
    assert_eq!(&Bytes::from_static(b"testString"), response.body());
    let headers = response.headers();
    assert_eq!("application/octet-stream", headers[http::header::CONTENT_TYPE]);
    assert_eq!("10", headers[http::header::CONTENT_LENGTH]);
    assert_eq!(
        "form-data; name=\"attachment\"; filename=\"my%20report.pdf\"",
        headers[http::header::CONTENT_DISPOSITION]
    );
}

#[tokio::test]
async fn test_download_file_not_found() {
    let get_object = mock!(aws_sdk_s3::Client::get_object).then_error(|| {
        GetObjectError::generic(ErrorMetadata::builder().code("NoSuchKey").build())
    });
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&get_object]);
    let service = test_s3_service(client);

    let err = service
        .download_file(TEST_BUCKET, TEST_KEY)
        .await
        .unwrap_err();
    assert_eq!(&ErrorKind::NotFound, err.kind());
}

#[tokio::test]
async fn test_delete_file() {
    let delete_object = mock!(aws_sdk_s3::Client::delete_object)
        .match_requests(|r| r.bucket() == Some(TEST_BUCKET) && r.key() == Some(TEST_KEY))
        .then_output(|| DeleteObjectOutput::builder().build());
    let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&delete_object]);
    let service = test_s3_service(client);

    service.delete_file(TEST_BUCKET, TEST_KEY).await.unwrap();
    assert_eq!(1, delete_object.num_calls());
}
