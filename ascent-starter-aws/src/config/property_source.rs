/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{self, Error};

/// Flat key/value properties such as `ascent.s3.access-key`.
///
/// Explicit entries take precedence over environment variables. Environment variables are
/// matched with relaxed binding: `ascent.s3.access-key` is read from `ASCENT_S3_ACCESS_KEY`.
/// Blank values are treated as unset.
#[derive(Clone, Default)]
pub struct PropertySource {
    entries: HashMap<String, String>,
    env: HashMap<String, String>,
}

impl PropertySource {
    /// An empty source with no environment fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// A source backed by a snapshot of the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// A source backed by the given environment-style variables (`ASCENT_S3_REGION=...`).
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        PropertySource {
            entries: HashMap::new(),
            env: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Add (or replace) an explicit property.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add (or replace) an explicit property in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up a property, falling back to its environment variable form.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .get(key)
            .or_else(|| self.env.get(&env_var_name(key)))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    }

    /// Look up and parse a property.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>, Error>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|err| {
                    error::invalid_config(format!("{key}: cannot parse `{raw}`: {err}"))
                })
            })
            .transpose()
    }
}

impl fmt::Debug for PropertySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // values may hold secrets
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("PropertySource")
            .field("keys", &keys)
            .field("env_vars", &self.env.len())
            .finish()
    }
}

/// Relaxed binding name for a property key: `ascent.sqs.extended.s3-bucket-name` becomes
/// `ASCENT_SQS_EXTENDED_S3_BUCKET_NAME`.
pub(crate) fn env_var_name(key: &str) -> String {
    key.chars()
        .map(|c| match c {
            '.' | '-' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_env_var_name() {
        assert_eq!("ASCENT_S3_ACCESS_KEY", env_var_name("ascent.s3.access-key"));
        assert_eq!(
            "ASCENT_SQS_EXTENDED_S3_BUCKET_NAME",
            env_var_name("ascent.sqs.extended.s3-bucket-name")
        );
    }

    #[test]
    fn test_explicit_entry_wins_over_env() {
        let source = PropertySource::from_vars([
            ("ASCENT_S3_REGION", "us-west-2"),
            ("ASCENT_S3_BUCKET", "env-bucket"),
        ])
        .with("ascent.s3.region", "us-gov-west-1");

        assert_eq!(Some("us-gov-west-1".to_owned()), source.get("ascent.s3.region"));
        assert_eq!(Some("env-bucket".to_owned()), source.get("ascent.s3.bucket"));
        assert_eq!(None, source.get("ascent.s3.endpoint"));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let source = PropertySource::new().with("ascent.s3.bucket", "   ");
        assert_eq!(None, source.get("ascent.s3.bucket"));
    }

    #[test]
    fn test_get_parsed() {
        let source = PropertySource::new()
            .with("ascent.sqs.number-of-messages-to-prefetch", "5")
            .with("ascent.s3.part-size", "lots");

        let prefetch: Option<i32> = source
            .get_parsed("ascent.sqs.number-of-messages-to-prefetch")
            .unwrap();
        assert_eq!(Some(5), prefetch);

        let missing: Option<u64> = source.get_parsed("ascent.s3.multipart-threshold").unwrap();
        assert_eq!(None, missing);

        let err = source.get_parsed::<u64>("ascent.s3.part-size").unwrap_err();
        assert_eq!(&ErrorKind::ConfigInvalid, err.kind());
    }

    #[test]
    fn test_debug_hides_values() {
        let source = PropertySource::new().with("ascent.s3.secret-key", "hunter2");
        let debug = format!("{source:?}");
        assert!(debug.contains("ascent.s3.secret-key"));
        assert!(!debug.contains("hunter2"));
    }
}
