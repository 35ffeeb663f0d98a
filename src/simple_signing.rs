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

//! This module provides a series of Rust Struct that implementation
//! the Container signature format described
//! [here](https://github.com/containers/image/blob/a5061e5a5f00333ea3a92e7103effd11c6e2f51d/docs/containers-signature.5.md#json-data-format).
//!
//! Only payloads that went through cryptographic verification must be
//! decoded with [`SimpleSigning::decode_claim`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::{PolicyError, Result};
use crate::image::OciReference;

/// `critical.type` of the payloads created by cosign
pub const COSIGN_SIGNATURE_TYPE: &str = "cosign container image signature";

/// `critical.type` of the payloads created by the simple signing format
pub const ATOMIC_SIGNATURE_TYPE: &str = "atomic container signature";

#[derive(Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct SimpleSigning {
    pub critical: Critical,
    pub optional: Option<Optional>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct Critical {
    #[serde(rename = "type")]
    pub type_name: String,
    pub image: Image,
    pub identity: Identity,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Image {
    pub docker_manifest_digest: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Identity {
    pub docker_reference: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Optional {
    pub creator: Option<String>,
    pub timestamp: Option<i64>,

    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// What a verified signature asserts about the image it was created for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClaim {
    pub claimed_identity: OciReference,
    pub claimed_manifest_digest: String,
}

impl SimpleSigning {
    /// Build the payload signed for the image `identity` whose manifest has
    /// digest `manifest_digest`.
    pub fn new(type_name: &str, identity: &str, manifest_digest: &str) -> Self {
        SimpleSigning {
            critical: Critical {
                type_name: type_name.to_string(),
                image: Image {
                    docker_manifest_digest: manifest_digest.to_string(),
                },
                identity: Identity {
                    docker_reference: identity.to_string(),
                },
            },
            optional: None,
        }
    }

    /// Decode a verified payload into the claim it makes, ensuring the
    /// payload has the `expected_type`.
    pub fn decode_claim(payload: &[u8], expected_type: &str) -> Result<VerifiedClaim> {
        let simple_signing: SimpleSigning = serde_json::from_slice(payload)
            .map_err(|e| PolicyError::PayloadInvalid(e.to_string()))?;
        simple_signing.into_claim(expected_type)
    }

    fn into_claim(self, expected_type: &str) -> Result<VerifiedClaim> {
        let critical = self.critical;
        if critical.type_name != expected_type {
            return Err(PolicyError::PayloadInvalid(format!(
                "unexpected signature type {:?}, expected {expected_type:?}",
                critical.type_name
            )));
        }

        let digest = critical.image.docker_manifest_digest;
        validate_digest(&digest)?;

        let claimed_identity = critical
            .identity
            .docker_reference
            .parse::<OciReference>()
            .map_err(|e| PolicyError::PayloadInvalid(e.to_string()))?;

        Ok(VerifiedClaim {
            claimed_identity,
            claimed_manifest_digest: digest,
        })
    }
}

/// Ensure `digest` has the `algorithm:hex` form.
fn validate_digest(digest: &str) -> Result<()> {
    let invalid = || PolicyError::PayloadInvalid(format!("invalid manifest digest {digest:?}"));

    let (algorithm, encoded) = digest.split_once(':').ok_or_else(invalid)?;
    if algorithm.is_empty()
        || !algorithm
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    {
        return Err(invalid());
    }
    if encoded.is_empty()
        || !encoded
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return Err(invalid());
    }

    let expected_len = match algorithm {
        "sha256" => Some(64),
        "sha384" => Some(96),
        "sha512" => Some(128),
        _ => None,
    };
    match expected_len {
        Some(len) if encoded.len() != len => Err(invalid()),
        _ => Ok(()),
    }
}
