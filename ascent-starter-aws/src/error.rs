/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::fmt;

use aws_sdk_s3::error::ProvideErrorMetadata;

/// A boxed error that is `Send` and `Sync`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned by this library
///
/// NOTE: Use [`aws_smithy_types::error::display::DisplayErrorContext`] or similar to display
/// the entire error cause/source chain.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    source: BoxError,
}

/// General categories of starter errors.
#[derive(Clone, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Operation input validation issues (empty bucket name, key, etc)
    InputInvalid,

    /// A configuration property is missing, malformed or inconsistent
    ConfigInvalid,

    /// I/O errors
    IOError,

    /// Resource not found (e.g. bucket, key, queue not found)
    NotFound,

    /// The request reached AWS but was rejected with an error response
    ServiceError,

    /// The client failed before a response was received (network, timeout, dispatch)
    ClientError,

    /// The transfer manager failed to complete an upload
    TransferFailed,
}

impl Error {
    /// Creates a new [`Error`] from a known kind of error as well as an arbitrary error
    /// source.
    pub fn new<E>(kind: ErrorKind, err: E) -> Error
    where
        E: Into<BoxError>,
    {
        Error {
            kind,
            source: err.into(),
        }
    }

    /// Returns the corresponding [`ErrorKind`] for this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::InputInvalid => write!(f, "invalid input: {}", self.source),
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration: {}", self.source),
            ErrorKind::IOError => write!(f, "I/O error"),
            ErrorKind::NotFound => write!(f, "resource not found"),
            ErrorKind::ServiceError => write!(f, "service error"),
            ErrorKind::ClientError => write!(f, "client error"),
            ErrorKind::TransferFailed => write!(f, "transfer failed"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::new(ErrorKind::IOError, value)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::new(ErrorKind::InputInvalid, value)
    }
}

impl From<aws_smithy_types::error::operation::BuildError> for Error {
    fn from(value: aws_smithy_types::error::operation::BuildError) -> Self {
        Self::new(ErrorKind::InputInvalid, value)
    }
}

impl From<aws_sdk_s3_transfer_manager::error::Error> for Error {
    fn from(value: aws_sdk_s3_transfer_manager::error::Error) -> Self {
        use aws_sdk_s3_transfer_manager::error::ErrorKind as TransferErrorKind;
        let kind = match value.kind() {
            TransferErrorKind::InputInvalid => ErrorKind::InputInvalid,
            TransferErrorKind::IOError => ErrorKind::IOError,
            TransferErrorKind::NotFound => ErrorKind::NotFound,
            _ => ErrorKind::TransferFailed,
        };
        Error::new(kind, value)
    }
}

impl<E, R> From<aws_sdk_s3::error::SdkError<E, R>> for Error
where
    E: std::error::Error + ProvideErrorMetadata + Send + Sync + 'static,
    R: Send + Sync + fmt::Debug + 'static,
{
    fn from(value: aws_sdk_s3::error::SdkError<E, R>) -> Self {
        use aws_sdk_s3::error::SdkError;
        let kind = match &value {
            SdkError::ServiceError(_) => match value.code() {
                Some(
                    "NotFound"
                    | "NoSuchKey"
                    | "NoSuchBucket"
                    | "AWS.SimpleQueueService.NonExistentQueue"
                    | "QueueDoesNotExist",
                ) => ErrorKind::NotFound,
                _ => ErrorKind::ServiceError,
            },
            _ => ErrorKind::ClientError,
        };

        Error::new(kind, value)
    }
}

pub(crate) fn invalid_input<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::InputInvalid, err)
}

pub(crate) fn invalid_config<E>(err: E) -> Error
where
    E: Into<BoxError>,
{
    Error::new(ErrorKind::ConfigInvalid, err)
}

/// Fail with [`ErrorKind::InputInvalid`] when `value` is empty.
pub(crate) fn require(value: &str, message: &'static str) -> Result<(), Error> {
    if value.is_empty() {
        return Err(invalid_input(message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_rejects_empty() {
        let err = require("", "Bucket Name can't be null").unwrap_err();
        assert_eq!(&ErrorKind::InputInvalid, err.kind());
        assert_eq!("invalid input: Bucket Name can't be null", err.to_string());
        assert!(require("bucket", "Bucket Name can't be null").is_ok());
        assert!(require("  ", "Bucket Name can't be null").is_ok());
    }

    #[test]
    fn test_io_error_kind() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(&ErrorKind::IOError, err.kind());
    }
}
