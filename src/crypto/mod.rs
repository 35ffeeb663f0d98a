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

//! Structures required to verify detached signatures.

use crate::errors::Result;

pub mod verification_key;
pub use verification_key::CosignVerificationKey;

/// Verify that the raw `signature` has been produced by `verification_key` over
/// `payload`.
///
/// On success the payload is handed back, so that callers only ever look at
/// bytes that went through verification.
pub fn verify_signature<'a>(
    verification_key: &CosignVerificationKey,
    signature: &[u8],
    payload: &'a [u8],
) -> Result<&'a [u8]> {
    verification_key.verify_signature(signature, payload)?;
    Ok(payload)
}
