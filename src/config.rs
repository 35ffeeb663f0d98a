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

//! Policy documents.
//!
//! A policy is written as a JSON document, in the format of
//! `containers-policy.json`:
//!
//! ```json
//! {
//!   "default": [{"type": "reject"}],
//!   "transports": {
//!     "docker": {
//!       "registry.example.com/app": [
//!         {
//!           "type": "sigstoreSigned",
//!           "keyPath": "/etc/pki/cosign.pub",
//!           "signedIdentity": {"type": "matchRepository"}
//!         }
//!       ]
//!     }
//!   }
//! }
//! ```
//!
//! The requirements of an image are the ones of the most specific scope
//! matching its reference, see [`Policy::requirements_for`].

use serde::Deserialize;
use serde_with::base64::Base64;
use serde_with::serde_as;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::{PolicyError, Result};
use crate::image::OciReference;
use crate::policy::{IdentityMatchPolicy, KeySource, PolicyRequirement, SignedBy, SigstoreSigned};

/// Requirement lists indexed by transport name, then by scope.
pub type TransportScopes = HashMap<String, HashMap<String, Vec<PolicyRequirement>>>;

/// The scoped requirements images are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    default: Vec<PolicyRequirement>,
    transports: TransportScopes,
}

impl Policy {
    /// Create a policy whose requirements are `default` for every image.
    pub fn new(default: Vec<PolicyRequirement>) -> Result<Self> {
        ensure_not_empty(&default, "default")?;
        Ok(Policy {
            default,
            transports: HashMap::new(),
        })
    }

    /// Set the requirements of the images of `transport` falling inside of
    /// `scope`. The empty scope applies to all the images of the transport.
    pub fn with_scope(
        mut self,
        transport: &str,
        scope: &str,
        requirements: Vec<PolicyRequirement>,
    ) -> Result<Self> {
        if transport.is_empty() {
            return Err(PolicyError::ConfigError(
                "transport name cannot be empty".to_string(),
            ));
        }
        if scope.contains(char::is_whitespace) {
            return Err(PolicyError::ConfigError(format!(
                "invalid scope {scope:?}"
            )));
        }
        ensure_not_empty(&requirements, &format!("{transport}:{scope}"))?;

        self.transports
            .entry(transport.to_string())
            .or_default()
            .insert(scope.to_string(), requirements);
        Ok(self)
    }

    /// Parse a JSON policy document.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let document: PolicyDocument = serde_json::from_slice(data)?;

        let mut policy = Policy::new(into_requirements(document.default)?)?;
        for (transport, scopes) in document.transports {
            for (scope, requirements) in scopes {
                policy = policy.with_scope(&transport, &scope, into_requirements(requirements)?)?;
            }
        }
        Ok(policy)
    }

    /// Read and parse the JSON policy document stored at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            PolicyError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&data)
    }

    pub fn default_requirements(&self) -> &[PolicyRequirement] {
        &self.default
    }

    pub fn transports(&self) -> &TransportScopes {
        &self.transports
    }

    /// The requirements of an image accessed through `transport` under the
    /// reference `identity`.
    ///
    /// Scopes are looked up from the most specific to the least specific:
    /// the full reference, the repository, its parent namespaces, the
    /// registry, wildcard parent domains of the registry (`*.example.com`),
    /// the empty scope of the transport. The default requirements are used
    /// when none of them is configured.
    pub fn requirements_for(
        &self,
        transport: &str,
        identity: Option<&OciReference>,
    ) -> &[PolicyRequirement] {
        if let Some(scopes) = self.transports.get(transport) {
            let candidates = identity.map(OciReference::policy_scopes).unwrap_or_default();
            for scope in candidates.iter().map(String::as_str).chain([""]) {
                if let Some(requirements) = scopes.get(scope) {
                    debug!(transport, scope, "using requirements of scope");
                    return requirements;
                }
            }
        }

        debug!(transport, "using default requirements");
        &self.default
    }
}

fn ensure_not_empty(requirements: &[PolicyRequirement], scope: &str) -> Result<()> {
    if requirements.is_empty() {
        return Err(PolicyError::ConfigError(format!(
            "no requirements specified for {scope}"
        )));
    }
    Ok(())
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct PolicyDocument {
    default: Vec<RequirementDocument>,
    #[serde(default)]
    transports: HashMap<String, HashMap<String, Vec<RequirementDocument>>>,
}

#[serde_as]
#[derive(Deserialize, Debug)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase",
    deny_unknown_fields
)]
enum RequirementDocument {
    InsecureAcceptAnything,
    Reject,
    SignedBy {
        key_path: Option<PathBuf>,
        #[serde_as(as = "Option<Base64>")]
        key_data: Option<Vec<u8>>,
        signed_identity: Option<IdentityDocument>,
    },
    SigstoreSigned {
        key_path: Option<PathBuf>,
        #[serde_as(as = "Option<Base64>")]
        key_data: Option<Vec<u8>>,
        signed_identity: Option<IdentityDocument>,
    },
}

#[derive(Deserialize, Debug)]
#[serde(
    tag = "type",
    rename_all = "camelCase",
    rename_all_fields = "camelCase",
    deny_unknown_fields
)]
enum IdentityDocument {
    MatchExact,
    MatchRepoDigestOrExact,
    MatchRepository,
    ExactReference { docker_reference: String },
    ExactRepository { docker_repository: String },
}

fn into_requirements(documents: Vec<RequirementDocument>) -> Result<Vec<PolicyRequirement>> {
    documents.into_iter().map(into_requirement).collect()
}

fn into_requirement(document: RequirementDocument) -> Result<PolicyRequirement> {
    Ok(match document {
        RequirementDocument::InsecureAcceptAnything => PolicyRequirement::AcceptAnything,
        RequirementDocument::Reject => PolicyRequirement::Reject,
        RequirementDocument::SignedBy {
            key_path,
            key_data,
            signed_identity,
        } => PolicyRequirement::SignedBy(SignedBy::new(
            KeySource::new(key_path, key_data)?,
            into_identity(signed_identity)?,
        )),
        RequirementDocument::SigstoreSigned {
            key_path,
            key_data,
            signed_identity,
        } => PolicyRequirement::SigstoreSigned(SigstoreSigned::new(
            KeySource::new(key_path, key_data)?,
            into_identity(signed_identity)?,
        )),
    })
}

fn into_identity(document: Option<IdentityDocument>) -> Result<IdentityMatchPolicy> {
    match document {
        None => Ok(IdentityMatchPolicy::MatchRepoDigestOrExact),
        Some(IdentityDocument::MatchExact) => Ok(IdentityMatchPolicy::MatchExact),
        Some(IdentityDocument::MatchRepoDigestOrExact) => {
            Ok(IdentityMatchPolicy::MatchRepoDigestOrExact)
        }
        Some(IdentityDocument::MatchRepository) => Ok(IdentityMatchPolicy::MatchRepository),
        Some(IdentityDocument::ExactReference { docker_reference }) => {
            IdentityMatchPolicy::exact_reference(&docker_reference)
        }
        Some(IdentityDocument::ExactRepository { docker_repository }) => {
            IdentityMatchPolicy::exact_repository(&docker_repository)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::DOCKER_TRANSPORT;
    use rstest::rstest;
    use std::io::Write;

    const POLICY: &str = r#"{
        "default": [{"type": "reject"}],
        "transports": {
            "docker": {
                "registry.example.com:5000/ns/app:v1": [{"type": "insecureAcceptAnything"}],
                "registry.example.com:5000/ns": [
                    {
                        "type": "sigstoreSigned",
                        "keyPath": "/etc/pki/cosign.pub",
                        "signedIdentity": {"type": "matchRepository"}
                    }
                ],
                "*.example.com": [
                    {"type": "signedBy", "keyData": "YWJj"}
                ],
                "": [{"type": "insecureAcceptAnything"}, {"type": "reject"}]
            },
            "dir": {
                "": [{"type": "insecureAcceptAnything"}]
            }
        }
    }"#;

    fn reference(s: &str) -> OciReference {
        s.parse().expect("invalid reference")
    }

    #[test]
    fn parse_policy() {
        let policy = Policy::from_json(POLICY.as_bytes()).expect("cannot parse policy");

        assert_eq!(policy.default_requirements(), &[PolicyRequirement::Reject]);
        assert_eq!(policy.transports().len(), 2);
        assert_eq!(
            policy.transports()["docker"]["*.example.com"],
            vec![PolicyRequirement::SignedBy(SignedBy::with_key_data(
                "abc",
                IdentityMatchPolicy::MatchRepoDigestOrExact
            ))]
        );
    }

    #[rstest]
    #[case::full_reference("registry.example.com:5000/ns/app:v1", "insecureAcceptAnything")]
    #[case::namespace(
        "registry.example.com:5000/ns/app:v2",
        "sigstoreSigned(keyPath: /etc/pki/cosign.pub, signedIdentity: matchRepository)"
    )]
    #[case::wildcard_domain(
        "other.example.com/app:v1",
        "signedBy(keyData, signedIdentity: matchRepoDigestOrExact)"
    )]
    #[case::transport_default("quay.io/app:v1", "insecureAcceptAnything")]
    fn most_specific_scope_wins(#[case] image: &str, #[case] expected: &str) {
        let policy = Policy::from_json(POLICY.as_bytes()).expect("cannot parse policy");

        let requirements = policy.requirements_for(DOCKER_TRANSPORT, Some(&reference(image)));
        assert_eq!(requirements[0].to_string(), expected);
    }

    #[test]
    fn default_requirements() {
        let policy = Policy::from_json(POLICY.as_bytes()).expect("cannot parse policy");

        assert_eq!(
            policy.requirements_for("oci-archive", Some(&reference("quay.io/app:v1"))),
            &[PolicyRequirement::Reject]
        );
        assert_eq!(
            policy.requirements_for("dir", None),
            &[PolicyRequirement::AcceptAnything]
        );
    }

    #[rstest]
    #[case::not_json("this is not JSON")]
    #[case::no_default(r#"{"transports": {}}"#)]
    #[case::empty_default(r#"{"default": []}"#)]
    #[case::empty_scope(r#"{"default": [{"type": "reject"}], "transports": {"docker": {"example.com": []}}}"#)]
    #[case::unknown_type(r#"{"default": [{"type": "acceptEverything"}]}"#)]
    #[case::unknown_field(r#"{"default": [{"type": "sigstoreSigned", "keyPath": "/k", "extra": true}]}"#)]
    #[case::both_keys(r#"{"default": [{"type": "sigstoreSigned", "keyPath": "/foo/bar", "keyData": "YWJj"}]}"#)]
    #[case::no_key(r#"{"default": [{"type": "sigstoreSigned"}]}"#)]
    #[case::key_data_not_base64(r#"{"default": [{"type": "signedBy", "keyData": "!!"}]}"#)]
    #[case::name_only_exact_reference(r#"{"default": [{"type": "signedBy", "keyPath": "/k", "signedIdentity": {"type": "exactReference", "dockerReference": "example.com/app"}}]}"#)]
    #[case::unknown_identity(r#"{"default": [{"type": "signedBy", "keyPath": "/k", "signedIdentity": {"type": "matchAnything"}}]}"#)]
    fn invalid_documents(#[case] document: &str) {
        let err = Policy::from_json(document.as_bytes()).expect_err("Was expecting an error");
        assert!(
            matches!(err, PolicyError::ConfigError(_)),
            "Didn't get expected error, got {:?} instead",
            err
        );
    }

    #[test]
    fn identity_policies() {
        let policy = Policy::from_json(
            br#"{"default": [
                {"type": "sigstoreSigned", "keyPath": "/k", "signedIdentity": {"type": "matchExact"}},
                {"type": "sigstoreSigned", "keyPath": "/k", "signedIdentity": {"type": "exactReference", "dockerReference": "example.com/app:v1"}},
                {"type": "sigstoreSigned", "keyPath": "/k", "signedIdentity": {"type": "exactRepository", "dockerRepository": "example.com/app"}}
            ]}"#,
        )
        .expect("cannot parse policy");

        let identities: Vec<String> = policy
            .default_requirements()
            .iter()
            .map(|r| match r {
                PolicyRequirement::SigstoreSigned(r) => r.signed_identity().to_string(),
                other => panic!("unexpected requirement {other}"),
            })
            .collect();
        assert_eq!(
            identities,
            vec![
                "matchExact",
                "exactReference(example.com/app:v1)",
                "exactRepository(example.com/app)"
            ]
        );
    }

    #[test]
    fn read_policy_file() {
        let mut file = tempfile::NamedTempFile::new().expect("cannot create temp file");
        file.write_all(POLICY.as_bytes()).unwrap();

        assert!(Policy::from_file(file.path()).is_ok());
        assert!(matches!(
            Policy::from_file("/this/does/not/exist"),
            Err(PolicyError::ConfigError(_))
        ));
    }
}
