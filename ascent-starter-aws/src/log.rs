/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::RequestId;
use aws_smithy_runtime_api::client::orchestrator::HttpResponse;

const BANNER_WIDTH: usize = 72;

/// Frame `title` in a line of `=` so failures stand out in aggregated logs.
pub(crate) fn banner(title: &str) -> String {
    let title = format!(" {title} ");
    let fill = BANNER_WIDTH.saturating_sub(title.len());
    let left = fill / 2;
    format!("{}{title}{}", "=".repeat(left), "=".repeat(fill - left))
}

/// Log an error framed by a banner line.
pub(crate) fn error_with_banner(title: &str, message: &str) {
    tracing::error!("{}", banner(title));
    tracing::error!(error_message = %message, "{title}");
}

/// Log everything the SDK tells us about a failed request.
///
/// Service errors reached AWS and were rejected; anything else never got a response
/// (no network, timeout, construction failure).
pub(crate) fn sdk_error<E>(title: &str, service: &str, err: &SdkError<E, HttpResponse>)
where
    E: std::error::Error + ProvideErrorMetadata + 'static,
{
    let message = err.message().unwrap_or("unknown");
    error_with_banner(title, message);

    match err {
        SdkError::ServiceError(context) => {
            tracing::error!(
                error = %DisplayErrorContext(err),
                error_message = message,
                http_status = context.raw().status().as_u16(),
                aws_error_code = err.code().unwrap_or("unknown"),
                error_type = "Service",
                request_id = err.meta().request_id().unwrap_or("unknown"),
                "request made it to {service}, but was rejected with an error response",
            );
        }
        _ => {
            tracing::error!(
                error = %DisplayErrorContext(err),
                error_type = "Client",
                "client encountered an internal error while trying to communicate with {service}",
            );
        }
    }
}

/// Find the first `SdkError<E, _>` in the source chain of `err`.
pub(crate) fn find_sdk_error<'a, E>(
    err: &'a (dyn std::error::Error + 'static),
) -> Option<&'a SdkError<E, HttpResponse>>
where
    E: std::error::Error + 'static,
{
    let mut source = Some(err);
    while let Some(current) = source {
        if let Some(sdk_err) = current.downcast_ref::<SdkError<E, HttpResponse>>() {
            return Some(sdk_err);
        }
        source = current.source();
    }
    None
}
