/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use bytes::Bytes;
use http::header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use http::{Response, StatusCode};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{self, Error};

/// Content type of downloaded files
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

/// Characters left as-is in attachment file names. Everything else is percent encoded;
/// spaces become `%20`.
const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'*')
    .remove(b'_');

/// A `200 OK` response wrapping `body`.
pub(crate) fn ok<T>(body: T) -> Response<T> {
    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    response
}

/// A `200 OK` file download response.
pub(crate) fn attachment(key: &str, bytes: Bytes) -> Result<Response<Bytes>, Error> {
    let file_name = encode_file_name(key);
    tracing::debug!(file_name = file_name.as_str(), bytes_length = bytes.len(), "building download response");
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, APPLICATION_OCTET_STREAM)
        .header(CONTENT_LENGTH, bytes.len())
        .header(
            CONTENT_DISPOSITION,
            format!("form-data; name=\"attachment\"; filename=\"{file_name}\""),
        )
        .body(bytes)
        .map_err(error::invalid_input)
}

/// URL-encode an object key for use as an attachment file name.
pub fn encode_file_name(key: &str) -> String {
    utf8_percent_encode(key, FILE_NAME).to_string()
}
