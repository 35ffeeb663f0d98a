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

//! Typed view over the raw signature blobs attached to an image.
//!
//! A stored blob is either a legacy simple signing blob (an OpenPGP
//! message), or a `0x00` byte followed by the name of the format, a newline
//! and the format specific body.

use tracing::debug;

pub mod constants;
pub mod envelope;
pub mod sigstore;

pub use envelope::Envelope;
pub use sigstore::SigstoreAttachment;

use constants::{SIGSTORE_JSON_FORMAT, SIMPLE_SIGNING_FORMAT};

use crate::errors::{PolicyError, Result};

/// A signature attached to an image. None of its contents is trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signature {
    /// A simple signing blob, signature and payload are combined together
    SimpleSigning(Vec<u8>),
    /// A cosign attachment
    SigstoreAttachment(SigstoreAttachment),
    /// A blob whose format is not known
    Unrecognized,
}

impl Signature {
    /// Parse a stored blob. Blobs that cannot be parsed are
    /// [`Signature::Unrecognized`].
    pub fn from_blob(blob: &[u8]) -> Signature {
        let Some(&first) = blob.first() else {
            return Signature::Unrecognized;
        };

        if first != 0x00 {
            return if looks_like_openpgp(first) {
                Signature::SimpleSigning(blob.to_vec())
            } else {
                debug!(first_byte = first, "unrecognized signature blob");
                Signature::Unrecognized
            };
        }

        let Some(newline) = blob.iter().position(|b| *b == b'\n') else {
            debug!("signature blob without format name");
            return Signature::Unrecognized;
        };
        let (format, body) = (&blob[1..newline], &blob[newline + 1..]);

        match format {
            f if f == SIMPLE_SIGNING_FORMAT.as_bytes() => Signature::SimpleSigning(body.to_vec()),
            f if f == SIGSTORE_JSON_FORMAT.as_bytes() => {
                match serde_json::from_slice::<SigstoreAttachment>(body) {
                    Ok(attachment) => Signature::SigstoreAttachment(attachment),
                    Err(e) => {
                        debug!(error = %e, "invalid sigstore attachment");
                        Signature::Unrecognized
                    }
                }
            }
            other => {
                debug!(
                    format = %String::from_utf8_lossy(other),
                    "unknown signature format"
                );
                Signature::Unrecognized
            }
        }
    }

    /// Encode the signature in the form it is stored with.
    pub fn to_blob(&self) -> Result<Vec<u8>> {
        let (format, body) = match self {
            Signature::SimpleSigning(blob) => (SIMPLE_SIGNING_FORMAT, blob.clone()),
            Signature::SigstoreAttachment(attachment) => (
                SIGSTORE_JSON_FORMAT,
                serde_json::to_vec(attachment).map_err(|e| {
                    PolicyError::SignatureFormatError(format!("cannot encode attachment: {e}"))
                })?,
            ),
            Signature::Unrecognized => {
                return Err(PolicyError::SignatureFormatError(
                    "cannot encode an unrecognized signature".to_string(),
                ))
            }
        };

        let mut blob = Vec::with_capacity(format.len() + body.len() + 2);
        blob.push(0x00);
        blob.extend_from_slice(format.as_bytes());
        blob.push(b'\n');
        blob.extend_from_slice(&body);
        Ok(blob)
    }

    /// Short name of the signature kind, used for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Signature::SimpleSigning(_) => SIMPLE_SIGNING_FORMAT,
            Signature::SigstoreAttachment(_) => SIGSTORE_JSON_FORMAT,
            Signature::Unrecognized => "unrecognized",
        }
    }
}

/// First bytes of the OpenPGP packets simple signing blobs were created with
/// before the format prefix existed.
fn looks_like_openpgp(first: u8) -> bool {
    matches!(
        first,
        0xA0..=0xA3 | 0xC8 | 0x90..=0x92 | 0x3D | 0xC4 | 0x88..=0x8B | 0xC2
    )
}
