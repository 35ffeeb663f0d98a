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

//! The errors that can be raised while building or evaluating a policy

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PolicyError>;

/// Classified failures of policy construction and evaluation.
///
/// Only [`PolicyError::ConfigError`] (at construction time),
/// [`PolicyError::ImageReadError`] (while listing signatures) and
/// [`PolicyError::Cancelled`] abort an evaluation. All the other kinds are
/// produced per signature and end up inside of an
/// [`AcceptanceResult::Rejected`](crate::policy::AcceptanceResult::Rejected).
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("invalid policy configuration: {0}")]
    ConfigError(String),

    #[error("invalid public key: {0}")]
    KeyError(String),

    #[error("{0}")]
    SignatureFormatError(String),

    #[error("cryptographic signature verification failed: {0}")]
    SignatureInvalid(String),

    #[error("invalid signature payload: {0}")]
    PayloadInvalid(String),

    #[error("signature for a different manifest: claimed digest {claimed}, image digest {actual}")]
    DigestMismatch { claimed: String, actual: String },

    #[error("signature for identity {claimed} is not accepted for image {image}")]
    IdentityMismatch { claimed: String, image: String },

    #[error("cannot read image: {0}")]
    ImageReadError(String),

    #[error("requirement {requirement} is not satisfied: {reason}")]
    PolicyRequirementNotSatisfied { requirement: String, reason: String },

    #[error("policy evaluation cancelled")]
    Cancelled,
}

impl PolicyError {
    /// Whether the image was evaluated and refused, as opposed to an
    /// evaluation that could not be completed.
    pub fn is_rejection(&self) -> bool {
        matches!(self, PolicyError::PolicyRequirementNotSatisfied { .. })
    }

    /// Wraps a collaborator failure into an [`PolicyError::ImageReadError`],
    /// leaving cancellation and already classified read errors untouched.
    pub(crate) fn into_image_read_error(self) -> Self {
        match self {
            PolicyError::Cancelled | PolicyError::ImageReadError(_) => self,
            other => PolicyError::ImageReadError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for PolicyError {
    fn from(e: serde_json::Error) -> Self {
        PolicyError::ConfigError(e.to_string())
    }
}
