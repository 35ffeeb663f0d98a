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

use pkcs8::DecodePublicKey;
use rsa::pkcs1v15;
use sha2::{Digest, Sha256, Sha384};
use signature::{DigestVerifier, Verifier};

use crate::errors::*;

/// PEM label of a SubjectPublicKeyInfo document
const PUBLIC_KEY_PEM_TAG: &str = "PUBLIC KEY";

/// A key that can be used to verify signatures.
///
/// The verification algorithm is implied by the key type:
///
///   * RSA keys, using PKCS1 padding and SHA-256 as the digest algorithm
///   * Ed25519 keys, and SHA-512 as the digest algorithm
///   * ECDSA keys, ASN.1 DER-encoded, using the P-256 curve and SHA-256 as digest algorithm
///   * ECDSA keys, ASN.1 DER-encoded, using the P-384 curve and SHA-384 as digest algorithm
#[allow(non_camel_case_types)]
#[derive(Debug, Clone)]
pub enum CosignVerificationKey {
    RSA_PKCS1_SHA256(pkcs1v15::VerifyingKey<sha2::Sha256>),
    ECDSA_P256_SHA256_ASN1(ecdsa::VerifyingKey<p256::NistP256>),
    ECDSA_P384_SHA384_ASN1(ecdsa::VerifyingKey<p384::NistP384>),
    ED25519(ed25519_dalek::VerifyingKey),
}

impl CosignVerificationKey {
    /// Builds a [`CosignVerificationKey`] from DER-encoded public key data. This function will
    /// set the verification algorithm due to the public key type, s.t.
    /// * `RSA public key`: `RSA_PKCS1_SHA256`
    /// * `EC public key with P-256 curve`: `ECDSA_P256_SHA256_ASN1`
    /// * `EC public key with P-384 curve`: `ECDSA_P384_SHA384_ASN1`
    /// * `Ed25519 public key`: `Ed25519`
    pub fn try_from_der(der_data: &[u8]) -> Result<Self> {
        if let Ok(p256vk) = ecdsa::VerifyingKey::<p256::NistP256>::from_public_key_der(der_data) {
            Ok(Self::ECDSA_P256_SHA256_ASN1(p256vk))
        } else if let Ok(p384vk) =
            ecdsa::VerifyingKey::<p384::NistP384>::from_public_key_der(der_data)
        {
            Ok(Self::ECDSA_P384_SHA384_ASN1(p384vk))
        } else if let Ok(ed25519bytes) =
            ed25519::pkcs8::PublicKeyBytes::from_public_key_der(der_data)
        {
            let key = ed25519_dalek::VerifyingKey::from_bytes(ed25519bytes.as_ref())
                .map_err(|e| PolicyError::KeyError(format!("invalid Ed25519 key: {e}")))?;
            Ok(Self::ED25519(key))
        } else if let Ok(rsapk) = rsa::RsaPublicKey::from_public_key_der(der_data) {
            Ok(Self::RSA_PKCS1_SHA256(pkcs1v15::VerifyingKey::new(rsapk)))
        } else {
            Err(PolicyError::KeyError(
                "failed to parse the public key".to_string(),
            ))
        }
    }

    /// Builds a [`CosignVerificationKey`] from PEM-encoded public key data.
    /// The algorithm is derived as documented in [`CosignVerificationKey::try_from_der`].
    pub fn try_from_pem(pem_data: &[u8]) -> Result<Self> {
        let key_pem = pem::parse(pem_data)
            .map_err(|e| PolicyError::KeyError(format!("invalid PEM data: {e}")))?;
        if key_pem.tag() != PUBLIC_KEY_PEM_TAG {
            return Err(PolicyError::KeyError(format!(
                "unexpected PEM block {}, expected {PUBLIC_KEY_PEM_TAG}",
                key_pem.tag()
            )));
        }
        Self::try_from_der(key_pem.contents())
    }

    /// Builds a [`CosignVerificationKey`] out of key material whose encoding
    /// is not known upfront: PEM documents are detected by their armor,
    /// everything else is handled as raw DER.
    pub fn try_from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(PolicyError::KeyError("no key material provided".to_string()));
        }

        let trimmed = data.trim_ascii_start();
        if trimmed.starts_with(b"-----BEGIN") {
            Self::try_from_pem(trimmed)
        } else {
            Self::try_from_der(data)
        }
    }

    /// Verify the raw signature provided has been actually generated by the
    /// given key when signing the provided message.
    pub fn verify_signature(&self, sig: &[u8], msg: &[u8]) -> Result<()> {

        match self {
            CosignVerificationKey::RSA_PKCS1_SHA256(inner) => {
                let sig = pkcs1v15::Signature::try_from(sig)
                    .map_err(|e| PolicyError::SignatureInvalid(e.to_string()))?;
                inner
                    .verify(msg, &sig)
                    .map_err(|e| PolicyError::SignatureInvalid(e.to_string()))
            }
            // ECDSA signatures are encoded in der.
            CosignVerificationKey::ECDSA_P256_SHA256_ASN1(inner) => {
                let mut hasher = Sha256::new();
                digest::Digest::update(&mut hasher, msg);
                let sig = ecdsa::Signature::from_der(sig)
                    .map_err(|e| PolicyError::SignatureInvalid(e.to_string()))?;
                inner
                    .verify_digest(hasher, &sig)
                    .map_err(|e| PolicyError::SignatureInvalid(e.to_string()))
            }
            CosignVerificationKey::ECDSA_P384_SHA384_ASN1(inner) => {
                let mut hasher = Sha384::new();
                digest::Digest::update(&mut hasher, msg);
                let sig = ecdsa::Signature::from_der(sig)
                    .map_err(|e| PolicyError::SignatureInvalid(e.to_string()))?;
                inner
                    .verify_digest(hasher, &sig)
                    .map_err(|e| PolicyError::SignatureInvalid(e.to_string()))
            }
            CosignVerificationKey::ED25519(inner) => {
                let sig = ed25519::Signature::from_slice(sig)
                    .map_err(|e| PolicyError::SignatureInvalid(e.to_string()))?;
                inner
                    .verify(msg, &sig)
                    .map_err(|e| PolicyError::SignatureInvalid(e.to_string()))
            }
        }
    }
}
