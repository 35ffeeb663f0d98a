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

//! The envelope stored inside of simple signing blobs.
//!
//! Simple signing blobs combine the signed payload and its signatures into a
//! single DSSE envelope, see
//! <https://github.com/secure-systems-lab/dsse/blob/v1.0.0/envelope.md>.

use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::serde_as;
use tracing::debug;

use super::constants::SIMPLE_SIGNING_PAYLOAD_TYPE;
use crate::crypto::{self, CosignVerificationKey};
use crate::errors::{PolicyError, Result};

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub payload_type: String,
    #[serde_as(as = "Base64")]
    pub payload: Vec<u8>,
    pub signatures: Vec<EnvelopeSignature>,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EnvelopeSignature {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub keyid: String,
    #[serde_as(as = "Base64")]
    pub sig: Vec<u8>,
}

impl Envelope {
    /// Parse a simple signing blob body.
    pub fn from_json(contents: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(contents).map_err(|e| {
            PolicyError::SignatureFormatError(format!("invalid simple signing envelope: {e}"))
        })?;

        if envelope.payload_type != SIMPLE_SIGNING_PAYLOAD_TYPE {
            return Err(PolicyError::SignatureFormatError(format!(
                "unexpected payload type {:?}",
                envelope.payload_type
            )));
        }
        if envelope.signatures.is_empty() {
            return Err(PolicyError::SignatureFormatError(
                "envelope holds no signatures".to_string(),
            ));
        }
        Ok(envelope)
    }

    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| PolicyError::SignatureFormatError(format!("cannot encode envelope: {e}")))
    }

    /// The pre-authentication encoding the signatures are computed over.
    pub fn pae(&self) -> Vec<u8> {
        pae(&self.payload_type, &self.payload)
    }

    /// Verify the envelope with `verification_key`: the payload is returned
    /// as soon as one of the signatures is valid.
    pub fn verify(&self, verification_key: &CosignVerificationKey) -> Result<&[u8]> {
        let pae = self.pae();
        let mut last_error = None;

        for signature in &self.signatures {
            match crypto::verify_signature(verification_key, &signature.sig, &pae) {
                Ok(_) => return Ok(&self.payload),
                Err(e) => {
                    debug!(keyid = %signature.keyid, error = ?e, "envelope signature rejected");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            PolicyError::SignatureInvalid("envelope holds no signatures".to_string())
        }))
    }
}

/// "DSSEv1" + SP + LEN(type) + SP + type + SP + LEN(body) + SP + body
pub fn pae(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut pae = format!("DSSEv1 {} {} ", payload_type.len(), payload_type).into_bytes();
    pae.extend_from_slice(format!("{} ", payload.len()).as_bytes());
    pae.extend_from_slice(payload);
    pae
}
