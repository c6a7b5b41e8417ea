/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */
use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;
use std::str::FromStr;
use std::time;

use ascent_starter_aws::config::Profiles;
use ascent_starter_aws::s3::MultipartFile;
use ascent_starter_aws::AscentAws;
use aws_sdk_s3::error::DisplayErrorContext;
use clap::{CommandFactory, Parser};
use tokio::fs;

type BoxError = Box<dyn Error + Send + Sync>;

/// Exercise the S3 and SQS services configured from `ASCENT_*` environment variables.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "ascent")]
pub struct Args {
    /// Comma separated active profiles; overrides ASCENT_PROFILES_ACTIVE
    #[arg(long)]
    profiles: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::Subcommand)]
enum Command {
    /// Upload a local file to s3://bucket/key
    Upload {
        source: PathBuf,
        dest: S3Uri,
        /// Object metadata as name=value
        #[arg(long = "metadata", value_parser = parse_metadata)]
        metadata: Vec<(String, String)>,
    },
    /// Download s3://bucket/key to a local file
    Download { source: S3Uri, dest: PathBuf },
    /// Move s3://bucket/key into another bucket
    Copy { source: S3Uri, target_bucket: String },
    /// Send a message to the configured queue
    Send { body: String },
    /// Receive messages from the configured queue, deleting them once printed
    Receive {
        /// Leave messages on the queue
        #[arg(long, default_value_t = false, action = clap::ArgAction::SetTrue)]
        keep: bool,
    },
}

#[derive(Clone, Debug)]
struct S3Uri(String);

impl S3Uri {
    /// Split the URI into it's component parts '(bucket, key)'
    fn parts(&self) -> (&str, &str) {
        let uri = self.0.strip_prefix("s3://").unwrap_or(&self.0);
        uri.split_once('/').unwrap_or((uri, ""))
    }
}

impl FromStr for S3Uri {
    type Err = BoxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with("s3://") {
            return Err(format!("expected s3://bucket/key, got `{s}`").into());
        }
        Ok(S3Uri(s.to_owned()))
    }
}

fn parse_metadata(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected name=value, got `{s}`"))
}

fn invalid_arg(message: &str) -> ! {
    Args::command()
        .error(clap::error::ErrorKind::InvalidValue, message)
        .exit()
}

async fn do_upload(
    aws: &AscentAws,
    source: PathBuf,
    dest: &S3Uri,
    metadata: Vec<(String, String)>,
) -> Result<(), BoxError> {
    let (bucket, key) = dest.parts();
    if key.is_empty() {
        invalid_arg("upload destination needs a key");
    }
    let file = MultipartFile::from_path("file", source).original_filename(key);
    let metadata: HashMap<String, String> = metadata.into_iter().collect();

    let start = time::Instant::now();
    let response = aws
        .s3_service()
        .upload_multipart_file(bucket, &file, &metadata)
        .await?;
    match response.body() {
        Some(result) => println!(
            "uploaded s3://{bucket}/{key} in {:?}; e_tag={:?}",
            start.elapsed(),
            result.e_tag()
        ),
        None => println!("upload failed, see logs"),
    }
    Ok(())
}

async fn do_download(aws: &AscentAws, source: &S3Uri, dest: PathBuf) -> Result<(), BoxError> {
    let (bucket, key) = source.parts();
    let start = time::Instant::now();
    let response = aws.s3_service().download_file(bucket, key).await?;
    tracing::debug!(headers = ?response.headers(), "download response");
    fs::write(&dest, response.body()).await?;
    println!(
        "downloaded {} bytes to {} in {:?}",
        response.body().len(),
        dest.display(),
        start.elapsed()
    );
    Ok(())
}

async fn do_receive(aws: &AscentAws, keep: bool) -> Result<(), BoxError> {
    let Some(sqs) = aws.sqs_service() else {
        invalid_arg("ASCENT_SQS_ENDPOINT is not set");
    };
    let messages = sqs.receive_messages().await?;
    println!("received {} message(s)", messages.len());
    for message in messages {
        println!(
            "{}: {}",
            message.message_id().unwrap_or("-"),
            message.body().unwrap_or_default()
        );
        if let (false, Some(receipt_handle)) = (keep, message.receipt_handle()) {
            sqs.delete_message(receipt_handle).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_thread_ids(true)
        .init();

    let mut loader = ascent_starter_aws::from_env();
    if let Some(profiles) = &args.profiles {
        loader = loader.profiles(Profiles::parse(profiles));
    }
    let config = loader.load()?;
    tracing::debug!("using configuration: {config:?}");
    let aws = AscentAws::from_config(config).await;

    let result = match args.command {
        Command::Upload {
            source,
            dest,
            metadata,
        } => do_upload(&aws, source, &dest, metadata).await,
        Command::Download { source, dest } => do_download(&aws, &source, dest).await,
        Command::Copy {
            source,
            target_bucket,
        } => {
            let (bucket, key) = source.parts();
            aws.s3_service()
                .copy_file_from_source_to_target_bucket(bucket, &target_bucket, key)
                .await
                .map_err(Into::into)
        }
        Command::Send { body } => match aws.sqs_service() {
            Some(sqs) => sqs
                .send_message(&body)
                .await
                .map(|response| println!("message id: {:?}", response.body()))
                .map_err(Into::into),
            None => invalid_arg("ASCENT_SQS_ENDPOINT is not set"),
        },
        Command::Receive { keep } => do_receive(&aws, keep).await,
    };

    if let Err(ref err) = result {
        tracing::error!("command failed: {}", DisplayErrorContext(err.as_ref()));
    }

    Ok(())
}
