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

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD as BASE64_STD_ENGINE, Engine as _};
use p256::ecdsa::SigningKey;
use pkcs8::{EncodePublicKey, LineEnding};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::Path;
use tempfile::TempDir;

use signature_policy::image::{DirImageSource, OciReference};
use signature_policy::signature::constants::{
    SIGSTORE_OCI_MEDIA_TYPE, SIGSTORE_SIGNATURE_ANNOTATION, SIMPLE_SIGNING_PAYLOAD_TYPE,
};
use signature_policy::signature::envelope::{pae, EnvelopeSignature};
use signature_policy::signature::{Envelope, Signature, SigstoreAttachment};
use signature_policy::simple_signing::{
    SimpleSigning, ATOMIC_SIGNATURE_TYPE, COSIGN_SIGNATURE_TYPE,
};

pub const IMAGE_REFERENCE: &str = "registry-testing.svc.lan/busybox:latest";

/// A P-256 key producing the signatures of the tests.
pub struct TestSigner {
    key: SigningKey,
}

impl TestSigner {
    pub fn new(seed: u8) -> Self {
        TestSigner {
            key: SigningKey::from_slice(&[seed; 32]).expect("invalid signing key"),
        }
    }

    pub fn public_key_pem(&self) -> String {
        self.key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .expect("cannot encode public key")
    }

    pub fn write_public_key(&self, dir: &Path) -> std::path::PathBuf {
        let path = dir.join("key.pub");
        std::fs::write(&path, self.public_key_pem()).expect("cannot write public key");
        path
    }

    pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
        use signature::Signer;

        let signature: p256::ecdsa::Signature = self.key.sign(msg);
        signature.to_der().as_bytes().to_vec()
    }

    /// A cosign signature attachment claiming `identity` and `digest`.
    pub fn cosign_blob(&self, identity: &str, digest: &str) -> Vec<u8> {
        let payload = payload(COSIGN_SIGNATURE_TYPE, identity, digest);
        let signature = BASE64_STD_ENGINE.encode(self.sign(&payload));
        cosign_attachment(payload, Some(signature))
    }

    /// A simple signing envelope claiming `identity` and `digest`.
    pub fn simple_signing_blob(&self, identity: &str, digest: &str) -> Vec<u8> {
        let payload = payload(ATOMIC_SIGNATURE_TYPE, identity, digest);
        let sig = self.sign(&pae(SIMPLE_SIGNING_PAYLOAD_TYPE, &payload));
        let envelope = Envelope {
            payload_type: SIMPLE_SIGNING_PAYLOAD_TYPE.to_string(),
            payload,
            signatures: vec![EnvelopeSignature {
                keyid: String::new(),
                sig,
            }],
        };
        Signature::SimpleSigning(envelope.to_json().expect("cannot encode envelope"))
            .to_blob()
            .expect("cannot encode blob")
    }
}

pub fn payload(type_name: &str, identity: &str, digest: &str) -> Vec<u8> {
    serde_json::to_vec(&SimpleSigning::new(type_name, identity, digest))
        .expect("cannot encode payload")
}

pub fn cosign_attachment(payload: Vec<u8>, signature: Option<String>) -> Vec<u8> {
    let annotations = signature
        .map(|s| HashMap::from([(SIGSTORE_SIGNATURE_ANNOTATION.to_string(), s)]))
        .unwrap_or_default();
    Signature::SigstoreAttachment(SigstoreAttachment::new(
        SIGSTORE_OCI_MEDIA_TYPE,
        payload,
        annotations,
    ))
    .to_blob()
    .expect("cannot encode blob")
}

/// An image stored inside of a temporary directory.
pub struct TestImage {
    pub dir: TempDir,
    pub digest: String,
    signatures: usize,
}

impl TestImage {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("cannot create temporary directory");
        let manifest = br#"{"schemaVersion":2,"mediaType":"application/vnd.oci.image.manifest.v1+json"}"#;
        std::fs::write(dir.path().join("manifest.json"), manifest)
            .expect("cannot write manifest");
        let digest = format!("sha256:{}", hex::encode(Sha256::digest(manifest)));

        TestImage {
            dir,
            digest,
            signatures: 0,
        }
    }

    pub fn add_signature(&mut self, blob: &[u8]) {
        self.signatures += 1;
        let path = self.dir.path().join(format!("signature-{}", self.signatures));
        std::fs::write(path, blob).expect("cannot write signature");
    }

    pub fn source(&self, reference: &str) -> DirImageSource {
        let reference: OciReference = reference.parse().expect("invalid reference");
        DirImageSource::new(self.dir.path(), Some(reference))
    }
}
