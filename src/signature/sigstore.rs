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

use base64::{engine::general_purpose::STANDARD as BASE64_STD_ENGINE, Engine as _};
use serde::{Deserialize, Serialize};
use serde_with::base64::Base64;
use serde_with::serde_as;
use std::collections::HashMap;

use super::constants::{SIGSTORE_OCI_MEDIA_TYPE, SIGSTORE_SIGNATURE_ANNOTATION};
use crate::errors::{PolicyError, Result};

/// An attachment created by cosign: a payload with its MIME type, plus the
/// annotations of the layer it was stored into.
///
/// Nothing inside of it can be trusted before the cryptographic signature
/// held by the [`SIGSTORE_SIGNATURE_ANNOTATION`] annotation has been
/// verified.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SigstoreAttachment {
    pub mime_type: String,
    #[serde_as(as = "Base64")]
    pub payload: Vec<u8>,
    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

impl SigstoreAttachment {
    pub fn new(
        mime_type: impl Into<String>,
        payload: Vec<u8>,
        annotations: HashMap<String, String>,
    ) -> Self {
        SigstoreAttachment {
            mime_type: mime_type.into(),
            payload,
            annotations,
        }
    }

    /// Attachments with another MIME type (SBOMs, attestations,...) are
    /// not signatures.
    pub fn is_signature(&self) -> bool {
        self.mime_type == SIGSTORE_OCI_MEDIA_TYPE
    }

    /// The raw cryptographic signature of the payload.
    pub fn cryptographic_signature(&self) -> Result<Vec<u8>> {
        let encoded = self
            .annotations
            .get(SIGSTORE_SIGNATURE_ANNOTATION)
            .ok_or_else(|| {
                PolicyError::SignatureFormatError("missing cryptographic signature".to_string())
            })?;

        BASE64_STD_ENGINE.decode(encoded).map_err(|e| {
            PolicyError::SignatureFormatError(format!("missing cryptographic signature: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::tests::{SIGNATURE, SIGNED_PAYLOAD};

    fn attachment(annotations: HashMap<String, String>) -> SigstoreAttachment {
        SigstoreAttachment::new(
            SIGSTORE_OCI_MEDIA_TYPE,
            SIGNED_PAYLOAD.as_bytes().to_vec(),
            annotations,
        )
    }

    #[test]
    fn signature_from_annotation() {
        let attachment = attachment(HashMap::from([(
            SIGSTORE_SIGNATURE_ANNOTATION.to_string(),
            SIGNATURE.to_string(),
        )]));

        let signature = attachment
            .cryptographic_signature()
            .expect("signature should be found");
        assert_eq!(signature, BASE64_STD_ENGINE.decode(SIGNATURE).unwrap());
        assert!(attachment.is_signature());
    }

    #[test]
    fn missing_annotation() {
        let err = attachment(HashMap::new())
            .cryptographic_signature()
            .expect_err("Was expecting an error");
        assert!(
            matches!(&err, PolicyError::SignatureFormatError(msg) if msg.contains("missing cryptographic signature")),
            "Didn't get expected error, got {:?} instead",
            err
        );
    }

    #[test]
    fn annotation_is_not_base64() {
        let attachment = attachment(HashMap::from([(
            SIGSTORE_SIGNATURE_ANNOTATION.to_string(),
            "this is not base64!".to_string(),
        )]));

        let err = attachment
            .cryptographic_signature()
            .expect_err("Was expecting an error");
        assert!(matches!(err, PolicyError::SignatureFormatError(_)));
    }

    #[test]
    fn other_attachments_are_not_signatures() {
        let attachment = SigstoreAttachment::new(
            "application/vnd.cyclonedx+json",
            b"{}".to_vec(),
            HashMap::new(),
        );
        assert!(!attachment.is_signature());
    }

    #[test]
    fn json_encoding() {
        let json = r#"{"mimeType":"application/vnd.dev.cosign.simplesigning.v1+json","payload":"e30=","annotations":{"dev.cosignproject.cosign/signature":"c2ln"}}"#;

        let attachment: SigstoreAttachment = serde_json::from_str(json).expect("valid JSON");
        assert_eq!(attachment.payload, b"{}");
        assert_eq!(attachment.cryptographic_signature().unwrap(), b"sig");
    }
}
