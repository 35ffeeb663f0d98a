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

//! The requirements an image must satisfy, and their evaluation.
//!
//! A requirement looks at one signature at a time through
//! [`PolicyRequirement::is_signature_accepted`]. It is satisfied when at
//! least one of the signatures it applies to is accepted: all the
//! signatures are tried, the first accepted one ends the search.
//! Signatures the requirement does not apply to (other formats, attachments
//! that are not signatures, unrecognized blobs) are skipped.

use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub mod evaluator;
pub use evaluator::PolicyEvaluator;

pub mod identity;
pub use identity::IdentityMatchPolicy;

pub mod key_source;
pub use key_source::KeySource;

pub mod signed_by;
pub use signed_by::SignedBy;

pub mod sigstore_signed;
pub use sigstore_signed::SigstoreSigned;

use crate::errors::{PolicyError, Result};
use crate::image::ImageSource;
use crate::signature::Signature;
use crate::simple_signing::VerifiedClaim;

/// The outcome of checking one signature against one requirement.
#[derive(Debug)]
pub enum AcceptanceResult {
    Accepted,
    /// The reason of the rejection
    Rejected(PolicyError),
}

impl AcceptanceResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AcceptanceResult::Accepted)
    }

    /// The error a rejected signature was classified with.
    pub fn error(&self) -> Option<&PolicyError> {
        match self {
            AcceptanceResult::Accepted => None,
            AcceptanceResult::Rejected(e) => Some(e),
        }
    }

    /// Cancellation aborts the evaluation, every other failure rejects the
    /// signature.
    pub(crate) fn from_check(check: Result<()>) -> Result<Self> {
        match check {
            Ok(()) => Ok(AcceptanceResult::Accepted),
            Err(PolicyError::Cancelled) => Err(PolicyError::Cancelled),
            Err(e) => Ok(AcceptanceResult::Rejected(e)),
        }
    }
}

/// A single rule of a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyRequirement {
    /// Satisfied by any image, signed or not
    AcceptAnything,
    /// Never satisfied
    Reject,
    SignedBy(SignedBy),
    SigstoreSigned(SigstoreSigned),
}

impl PolicyRequirement {
    /// Whether the signatures of the image must be fetched to evaluate the
    /// requirement.
    pub fn needs_signatures(&self) -> bool {
        match self {
            PolicyRequirement::AcceptAnything | PolicyRequirement::Reject => false,
            PolicyRequirement::SignedBy(_) | PolicyRequirement::SigstoreSigned(_) => true,
        }
    }

    /// Whether `signature` is of the kind looked at by the requirement.
    pub fn applies_to(&self, signature: &Signature) -> bool {
        match self {
            PolicyRequirement::AcceptAnything | PolicyRequirement::Reject => false,
            PolicyRequirement::SignedBy(r) => r.applies_to(signature),
            PolicyRequirement::SigstoreSigned(r) => r.applies_to(signature),
        }
    }

    /// Check whether `signature` satisfies the requirement for `image`.
    ///
    /// An `Err` is returned only when the evaluation is cancelled.
    pub fn is_signature_accepted(
        &self,
        image: &dyn ImageSource,
        signature: &Signature,
        cancel: &CancellationToken,
    ) -> Result<AcceptanceResult> {
        match self {
            PolicyRequirement::AcceptAnything => Ok(AcceptanceResult::Accepted),
            PolicyRequirement::Reject => Ok(AcceptanceResult::Rejected(self.not_satisfied(
                "the policy rejects all the images in this scope".to_string(),
            ))),
            PolicyRequirement::SignedBy(r) => r.is_signature_accepted(image, signature, cancel),
            PolicyRequirement::SigstoreSigned(r) => {
                r.is_signature_accepted(image, signature, cancel)
            }
        }
    }

    /// Check whether `image` can be used according to this requirement
    /// alone. The signatures of the image are fetched only when needed.
    pub fn is_running_image_allowed(
        &self,
        image: &dyn ImageSource,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let signatures = if self.needs_signatures() {
            list_signatures(image, cancel)?
        } else {
            Vec::new()
        };
        self.is_satisfied_by(image, &signatures, cancel)
    }

    pub(crate) fn is_satisfied_by(
        &self,
        image: &dyn ImageSource,
        signatures: &[Signature],
        cancel: &CancellationToken,
    ) -> Result<()> {
        match self {
            PolicyRequirement::AcceptAnything => Ok(()),
            PolicyRequirement::Reject => Err(self.not_satisfied(
                "the policy rejects all the images in this scope".to_string(),
            )),
            PolicyRequirement::SignedBy(_) | PolicyRequirement::SigstoreSigned(_) => {
                let mut rejected = 0;
                for (index, signature) in signatures.iter().enumerate() {
                    if cancel.is_cancelled() {
                        return Err(PolicyError::Cancelled);
                    }
                    if !self.applies_to(signature) {
                        debug!(index, kind = signature.kind(), requirement = %self, "skipping signature");
                        continue;
                    }

                    match self.is_signature_accepted(image, signature, cancel)? {
                        AcceptanceResult::Accepted => {
                            debug!(index, requirement = %self, "signature accepted");
                            return Ok(());
                        }
                        AcceptanceResult::Rejected(error) => {
                            debug!(index, requirement = %self, %error, "signature rejected");
                            rejected += 1;
                        }
                    }
                }

                let reason = if rejected == 0 {
                    "no applicable signatures".to_string()
                } else {
                    format!("all the {rejected} applicable signatures were rejected")
                };
                Err(self.not_satisfied(reason))
            }
        }
    }

    fn not_satisfied(&self, reason: String) -> PolicyError {
        PolicyError::PolicyRequirementNotSatisfied {
            requirement: self.to_string(),
            reason,
        }
    }
}

impl fmt::Display for PolicyRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyRequirement::AcceptAnything => write!(f, "insecureAcceptAnything"),
            PolicyRequirement::Reject => write!(f, "reject"),
            PolicyRequirement::SignedBy(r) => fmt::Display::fmt(r, f),
            PolicyRequirement::SigstoreSigned(r) => fmt::Display::fmt(r, f),
        }
    }
}

/// Fetch and parse the signatures of `image`.
pub(crate) fn list_signatures(
    image: &dyn ImageSource,
    cancel: &CancellationToken,
) -> Result<Vec<Signature>> {
    if cancel.is_cancelled() {
        return Err(PolicyError::Cancelled);
    }
    let blobs = image
        .signatures()
        .map_err(PolicyError::into_image_read_error)?;
    Ok(blobs.iter().map(|blob| Signature::from_blob(blob)).collect())
}

/// Compare what a verified signature claims with the actual image.
pub(crate) fn check_claim(
    image: &dyn ImageSource,
    claim: &VerifiedClaim,
    signed_identity: &IdentityMatchPolicy,
    cancel: &CancellationToken,
) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(PolicyError::Cancelled);
    }
    let manifest = image
        .manifest()
        .map_err(PolicyError::into_image_read_error)?;

    if !manifest.matches_digest(&claim.claimed_manifest_digest) {
        return Err(PolicyError::DigestMismatch {
            claimed: claim.claimed_manifest_digest.clone(),
            actual: manifest.digest,
        });
    }

    let identity = image.identity();
    if !signed_identity.matches(&claim.claimed_identity, identity) {
        return Err(PolicyError::IdentityMismatch {
            claimed: claim.claimed_identity.whole(),
            image: identity.map_or_else(|| "<none>".to_string(), |r| r.whole()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::tests::{PUBLIC_KEY, SIGNATURE, SIGNED_MANIFEST_DIGEST, SIGNED_PAYLOAD};
    use crate::mock_image_source::test::MockImageSource;
    use crate::signature::constants::{SIGSTORE_OCI_MEDIA_TYPE, SIGSTORE_SIGNATURE_ANNOTATION};
    use crate::signature::SigstoreAttachment;
    use std::collections::HashMap;

    const IMAGE: &str = "registry-testing.svc.lan/busybox:latest";

    fn cosign_blob(annotations: HashMap<String, String>) -> Vec<u8> {
        Signature::SigstoreAttachment(SigstoreAttachment::new(
            SIGSTORE_OCI_MEDIA_TYPE,
            SIGNED_PAYLOAD.as_bytes().to_vec(),
            annotations,
        ))
        .to_blob()
        .unwrap()
    }

    fn valid_blob() -> Vec<u8> {
        cosign_blob(HashMap::from([(
            SIGSTORE_SIGNATURE_ANNOTATION.to_string(),
            SIGNATURE.to_string(),
        )]))
    }

    fn sigstore_requirement() -> PolicyRequirement {
        PolicyRequirement::SigstoreSigned(SigstoreSigned::with_key_data(
            PUBLIC_KEY,
            IdentityMatchPolicy::MatchRepository,
        ))
    }

    #[test]
    fn accept_anything_and_reject() {
        let image = MockImageSource::unreadable(IMAGE);
        let cancel = CancellationToken::new();

        let result = PolicyRequirement::AcceptAnything.is_signature_accepted(
            &image,
            &Signature::Unrecognized,
            &cancel,
        );
        assert!(result.unwrap().is_accepted());

        let result = PolicyRequirement::Reject
            .is_signature_accepted(&image, &Signature::Unrecognized, &cancel)
            .unwrap();
        assert!(matches!(
            result.error(),
            Some(PolicyError::PolicyRequirementNotSatisfied { .. })
        ));

        assert!(PolicyRequirement::AcceptAnything
            .is_running_image_allowed(&image, &cancel)
            .is_ok());
        assert!(matches!(
            PolicyRequirement::Reject.is_running_image_allowed(&image, &cancel),
            Err(PolicyError::PolicyRequirementNotSatisfied { .. })
        ));
        assert_eq!(image.signatures_calls.get(), 0);
    }

    fn signed_image(signatures: Vec<Vec<u8>>) -> MockImageSource {
        MockImageSource::new(IMAGE, b"{}", signatures).with_manifest_digest(SIGNED_MANIFEST_DIGEST)
    }

    #[test]
    fn later_acceptance_overrides_earlier_rejections() {
        let image = signed_image(vec![]);
        let signatures = vec![
            Signature::from_blob(&cosign_blob(HashMap::new())),
            Signature::Unrecognized,
            Signature::from_blob(&valid_blob()),
        ];

        let result =
            sigstore_requirement().is_satisfied_by(&image, &signatures, &CancellationToken::new());
        assert!(result.is_ok());
    }

    #[test]
    fn first_acceptance_ends_the_search() {
        let image = signed_image(vec![valid_blob(), valid_blob()]);

        let result = sigstore_requirement().is_running_image_allowed(&image, &CancellationToken::new());
        assert!(result.is_ok());
        assert_eq!(image.manifest_calls.get(), 1);
    }

    #[test]
    fn all_signatures_rejected() {
        let image = MockImageSource::new("this/doesnt:match", b"{}", vec![valid_blob(), valid_blob()])
            .with_manifest_digest(SIGNED_MANIFEST_DIGEST);

        let err = sigstore_requirement()
            .is_running_image_allowed(&image, &CancellationToken::new())
            .expect_err("Was expecting an error");
        assert!(
            matches!(&err, PolicyError::PolicyRequirementNotSatisfied { requirement, .. } if requirement.starts_with("sigstoreSigned")),
            "Didn't get expected error, got {:?} instead",
            err
        );
        assert_eq!(image.manifest_calls.get(), 2);
    }

    #[test]
    fn no_applicable_signatures() {
        let image = signed_image(vec![]);
        let signatures = vec![
            Signature::Unrecognized,
            Signature::SimpleSigning(b"{}".to_vec()),
        ];

        let err = sigstore_requirement()
            .is_satisfied_by(&image, &signatures, &CancellationToken::new())
            .expect_err("Was expecting an error");
        assert!(
            matches!(&err, PolicyError::PolicyRequirementNotSatisfied { reason, .. } if reason == "no applicable signatures"),
            "Didn't get expected error, got {:?} instead",
            err
        );
        assert_eq!(image.manifest_calls.get(), 0);
    }

    #[test]
    fn listing_failure_is_fatal() {
        let image = MockImageSource::unreadable(IMAGE);

        let err = sigstore_requirement()
            .is_running_image_allowed(&image, &CancellationToken::new())
            .expect_err("Was expecting an error");
        assert!(matches!(err, PolicyError::ImageReadError(_)));
        assert_eq!(image.manifest_calls.get(), 0);
    }

    #[test]
    fn cancelled_before_listing() {
        let image = MockImageSource::new(IMAGE, b"{}", vec![valid_blob()]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = sigstore_requirement()
            .is_running_image_allowed(&image, &cancel)
            .expect_err("Was expecting an error");
        assert!(matches!(err, PolicyError::Cancelled));
        assert_eq!(image.signatures_calls.get(), 0);
    }
}
