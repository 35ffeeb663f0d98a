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

//! Access to the image being evaluated: its identity, its manifest and the
//! raw signature blobs stored next to it.

use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::errors::Result;

pub mod dir;
pub use dir::DirImageSource;

pub mod reference;
pub use reference::OciReference;

/// Name of the transport of registry-backed images.
pub const DOCKER_TRANSPORT: &str = "docker";

/// Capabilities that are expected to be provided by the storage of an image
pub trait ImageSource {
    /// The transport the image is accessed through, used to select the
    /// policy scopes.
    fn transport_name(&self) -> &str {
        DOCKER_TRANSPORT
    }

    /// The reference the image is being evaluated under, if the transport
    /// has one.
    fn identity(&self) -> Option<&OciReference>;

    /// Fetch the manifest of the image.
    fn manifest(&self) -> Result<ImageManifest>;

    /// List the raw signature blobs attached to the image.
    fn signatures(&self) -> Result<Vec<Vec<u8>>>;
}

/// The manifest of an image together with its digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageManifest {
    pub bytes: Vec<u8>,
    pub digest: String,
}

impl ImageManifest {
    /// Build the manifest out of its canonical bytes, the digest is computed
    /// with SHA-256.
    pub fn new(bytes: Vec<u8>) -> Self {
        let digest = format!("sha256:{}", hex::encode(Sha256::digest(&bytes)));
        Self { bytes, digest }
    }

    /// Check whether `claimed` is the digest of this manifest.
    ///
    /// Claimed digests computed with another supported algorithm are
    /// checked by hashing the manifest again.
    pub fn matches_digest(&self, claimed: &str) -> bool {
        if claimed == self.digest {
            return true;
        }

        let Some((algorithm, expected)) = claimed.split_once(':') else {
            return false;
        };
        if self.digest.split_once(':').map(|(a, _)| a) == Some(algorithm) {
            return false;
        }
        let actual = match algorithm {
            "sha256" => hex::encode(Sha256::digest(&self.bytes)),
            "sha384" => hex::encode(Sha384::digest(&self.bytes)),
            "sha512" => hex::encode(Sha512::digest(&self.bytes)),
            _ => return false,
        };
        actual == expected
    }
}
