/*
 * Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
 * SPDX-License-Identifier: Apache-2.0
 */

use std::path::{Path, PathBuf};

use bytes::Bytes;

const FILE_PREFIX: &str = "file:";
const CLASSPATH_PREFIX: &str = "classpath:";

/// Resolves resource locations used by [`upload_file`](crate::s3::S3Service::upload_file).
///
/// * `file:<path>` and bare paths are file system paths; relative paths resolve against the
///   base directory.
/// * `classpath:<path>` resolves against the bundled resource root.
#[derive(Debug, Clone)]
pub struct ResourceLoader {
    base_dir: PathBuf,
    resource_root: PathBuf,
}

impl Default for ResourceLoader {
    fn default() -> Self {
        let base_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        ResourceLoader {
            resource_root: base_dir.join("resources"),
            base_dir,
        }
    }
}

impl ResourceLoader {
    /// Create a loader resolving relative paths against `base_dir` and `classpath:` locations
    /// against `resource_root`.
    pub fn new(base_dir: impl Into<PathBuf>, resource_root: impl Into<PathBuf>) -> Self {
        ResourceLoader {
            base_dir: base_dir.into(),
            resource_root: resource_root.into(),
        }
    }

    /// Resolve `location` to a resource handle. Nothing is read until [`Resource::read`].
    pub fn get_resource(&self, location: &str) -> Resource {
        let path = if let Some(rest) = location.strip_prefix(CLASSPATH_PREFIX) {
            self.resource_root.join(rest.trim_start_matches('/'))
        } else {
            let raw = Path::new(location.strip_prefix(FILE_PREFIX).unwrap_or(location));
            if raw.is_absolute() {
                raw.to_path_buf()
            } else {
                self.base_dir.join(raw)
            }
        };
        Resource { path }
    }
}

/// A resolved resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    path: PathBuf,
}

impl Resource {
    /// Returns the resolved file system path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole resource.
    pub async fn read(&self) -> std::io::Result<Bytes> {
        tokio::fs::read(&self.path).await.map(Bytes::from)
    }
}
