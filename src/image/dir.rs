//
// Copyright 2026 The Sigstore Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{ImageManifest, ImageSource, OciReference};
use crate::errors::{PolicyError, Result};

const MANIFEST_FILE: &str = "manifest.json";

/// An image stored inside of a local directory, using the layout of the
/// `dir:` transport: the manifest is kept inside of `manifest.json`, the
/// signatures inside of `signature-1`, `signature-2`,...
///
/// The reference the image is evaluated under is not part of the directory
/// and must be provided by the caller.
#[derive(Debug, Clone)]
pub struct DirImageSource {
    path: PathBuf,
    identity: Option<OciReference>,
}

impl DirImageSource {
    pub fn new(path: impl Into<PathBuf>, identity: Option<OciReference>) -> Self {
        Self {
            path: path.into(),
            identity,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn signature_path(&self, index: usize) -> PathBuf {
        self.path.join(format!("signature-{index}"))
    }
}

impl ImageSource for DirImageSource {
    fn identity(&self) -> Option<&OciReference> {
        self.identity.as_ref()
    }

    fn manifest(&self) -> Result<ImageManifest> {
        let path = self.path.join(MANIFEST_FILE);
        let bytes = std::fs::read(&path).map_err(|e| {
            PolicyError::ImageReadError(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(ImageManifest::new(bytes))
    }

    fn signatures(&self) -> Result<Vec<Vec<u8>>> {
        let metadata = std::fs::metadata(&self.path).map_err(|e| {
            PolicyError::ImageReadError(format!("cannot access {}: {e}", self.path.display()))
        })?;
        if !metadata.is_dir() {
            return Err(PolicyError::ImageReadError(format!(
                "{} is not a directory",
                self.path.display()
            )));
        }

        let mut signatures = Vec::new();
        for index in 1.. {
            let path = self.signature_path(index);
            match std::fs::read(&path) {
                Ok(blob) => signatures.push(blob),
                Err(e) if e.kind() == ErrorKind::NotFound => break,
                Err(e) => {
                    return Err(PolicyError::ImageReadError(format!(
                        "cannot read {}: {e}",
                        path.display()
                    )))
                }
            }
        }
        debug!(
            path = %self.path.display(),
            count = signatures.len(),
            "signatures found"
        );
        Ok(signatures)
    }
}
