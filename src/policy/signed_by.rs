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

use std::fmt;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use super::{check_claim, AcceptanceResult, IdentityMatchPolicy, KeySource};
use crate::errors::{PolicyError, Result};
use crate::image::ImageSource;
use crate::signature::{Envelope, Signature};
use crate::simple_signing::{SimpleSigning, ATOMIC_SIGNATURE_TYPE};

/// Requires the image to carry a simple signing signature made with a given
/// key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedBy {
    key: KeySource,
    signed_identity: IdentityMatchPolicy,
}

impl SignedBy {
    pub fn new(key: KeySource, signed_identity: IdentityMatchPolicy) -> Self {
        SignedBy {
            key,
            signed_identity,
        }
    }

    pub fn with_key_path(path: impl Into<PathBuf>, signed_identity: IdentityMatchPolicy) -> Self {
        Self::new(KeySource::Path(path.into()), signed_identity)
    }

    pub fn with_key_data(data: impl Into<Vec<u8>>, signed_identity: IdentityMatchPolicy) -> Self {
        Self::new(KeySource::Data(data.into()), signed_identity)
    }

    pub fn key_source(&self) -> &KeySource {
        &self.key
    }

    pub fn signed_identity(&self) -> &IdentityMatchPolicy {
        &self.signed_identity
    }

    pub fn applies_to(&self, signature: &Signature) -> bool {
        matches!(signature, Signature::SimpleSigning(_))
    }

    pub fn is_signature_accepted(
        &self,
        image: &dyn ImageSource,
        signature: &Signature,
        cancel: &CancellationToken,
    ) -> Result<AcceptanceResult> {
        AcceptanceResult::from_check(self.check_signature(image, signature, cancel))
    }

    fn check_signature(
        &self,
        image: &dyn ImageSource,
        signature: &Signature,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let Signature::SimpleSigning(blob) = signature else {
            return Err(PolicyError::SignatureFormatError(format!(
                "wrong signature kind {} for this requirement",
                signature.kind()
            )));
        };
        let key = self.key.load(cancel)?;
        let envelope = Envelope::from_json(blob)?;
        let payload = envelope.verify(&key)?;
        let claim = SimpleSigning::decode_claim(payload, ATOMIC_SIGNATURE_TYPE)?;

        check_claim(image, &claim, &self.signed_identity, cancel)
    }
}

impl fmt::Display for SignedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signedBy(")?;
        match &self.key {
            KeySource::Path(path) => write!(f, "keyPath: {}", path.display())?,
            KeySource::Data(_) => write!(f, "keyData")?,
        }
        write!(f, ", signedIdentity: {})", self.signed_identity)
    }
}
