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

use crate::errors::{PolicyError, Result};
use crate::image::OciReference;

/// How the identity claimed by a signature is compared with the identity of
/// the image being evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityMatchPolicy {
    /// The claimed reference must be equal to the reference of the image,
    /// tag and digest included. Name-only references never match.
    MatchExact,
    /// Like [`IdentityMatchPolicy::MatchRepository`] when the image is
    /// referenced by digest, like [`IdentityMatchPolicy::MatchExact`]
    /// otherwise.
    MatchRepoDigestOrExact,
    /// Registry and repository must be the same, tag and digest are ignored.
    MatchRepository,
    /// The claimed reference must be equal to a fixed reference, the image
    /// reference is not looked at.
    ExactReference(OciReference),
    /// The claimed reference must be inside of a fixed repository, the image
    /// reference is not looked at.
    ExactRepository(OciReference),
}

impl IdentityMatchPolicy {
    /// Build an [`IdentityMatchPolicy::ExactReference`], the reference must
    /// have a tag or a digest.
    pub fn exact_reference(reference: &str) -> Result<Self> {
        let reference: OciReference = reference.parse()?;
        if reference.is_name_only() {
            return Err(PolicyError::ConfigError(format!(
                "reference {reference} has neither a tag nor a digest"
            )));
        }
        Ok(IdentityMatchPolicy::ExactReference(reference))
    }

    /// Build an [`IdentityMatchPolicy::ExactRepository`], the repository
    /// cannot carry a tag or a digest.
    pub fn exact_repository(repository: &str) -> Result<Self> {
        let repository: OciReference = repository.parse()?;
        if !repository.is_name_only() {
            return Err(PolicyError::ConfigError(format!(
                "repository {repository} must not have a tag or a digest"
            )));
        }
        Ok(IdentityMatchPolicy::ExactRepository(repository))
    }

    /// Whether the identity `claimed` by a signature is acceptable for an
    /// image evaluated under `actual`.
    pub fn matches(&self, claimed: &OciReference, actual: Option<&OciReference>) -> bool {
        match self {
            IdentityMatchPolicy::MatchExact => actual.is_some_and(|actual| exact_match(claimed, actual)),
            IdentityMatchPolicy::MatchRepoDigestOrExact => actual.is_some_and(|actual| {
                if actual.digest().is_some() {
                    claimed.same_repository(actual)
                } else {
                    exact_match(claimed, actual)
                }
            }),
            IdentityMatchPolicy::MatchRepository => {
                actual.is_some_and(|actual| claimed.same_repository(actual))
            }
            IdentityMatchPolicy::ExactReference(reference) => claimed == reference,
            IdentityMatchPolicy::ExactRepository(repository) => claimed.same_repository(repository),
        }
    }
}

fn exact_match(claimed: &OciReference, actual: &OciReference) -> bool {
    !claimed.is_name_only() && !actual.is_name_only() && claimed == actual
}

impl fmt::Display for IdentityMatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityMatchPolicy::MatchExact => write!(f, "matchExact"),
            IdentityMatchPolicy::MatchRepoDigestOrExact => write!(f, "matchRepoDigestOrExact"),
            IdentityMatchPolicy::MatchRepository => write!(f, "matchRepository"),
            IdentityMatchPolicy::ExactReference(r) => write!(f, "exactReference({r})"),
            IdentityMatchPolicy::ExactRepository(r) => {
                write!(f, "exactRepository({})", r.repository_name())
            }
        }
    }
}
