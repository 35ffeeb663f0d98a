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

use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::crypto::CosignVerificationKey;
use crate::errors::{PolicyError, Result};

/// Where the public key of a requirement comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    /// The key material itself, PEM or DER encoded
    Data(Vec<u8>),
    /// A file holding the key material. The file is read every time the key
    /// is needed.
    Path(PathBuf),
}

impl KeySource {
    /// Build a [`KeySource`] out of the two mutually exclusive ways of
    /// providing a key. Exactly one of them must be set.
    pub fn new(path: Option<PathBuf>, data: Option<Vec<u8>>) -> Result<Self> {
        match (path, data) {
            (Some(path), None) => Ok(KeySource::Path(path)),
            (None, Some(data)) => Ok(KeySource::Data(data)),
            (Some(_), Some(_)) => Err(PolicyError::ConfigError(
                "both a key path and key data are specified".to_string(),
            )),
            (None, None) => Err(PolicyError::ConfigError(
                "neither a key path nor key data is specified".to_string(),
            )),
        }
    }

    /// Load the verification key.
    pub fn load(&self, cancel: &CancellationToken) -> Result<CosignVerificationKey> {
        match self {
            KeySource::Data(data) => CosignVerificationKey::try_from_bytes(data),
            KeySource::Path(path) => {
                if cancel.is_cancelled() {
                    return Err(PolicyError::Cancelled);
                }
                debug!(path = %path.display(), "reading key file");
                let data = std::fs::read(path).map_err(|e| {
                    PolicyError::KeyError(format!("cannot read {}: {e}", path.display()))
                })?;
                CosignVerificationKey::try_from_bytes(&data)
            }
        }
    }
}
