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

use crate::errors::PolicyError;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// `OciReference` provides a general type to represent any way of referencing images within an OCI registry.
///
/// Short names are normalized the way docker does it: `busybox` becomes
/// `docker.io/library/busybox`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciReference {
    pub(crate) oci_reference: oci_client::Reference,
}

impl FromStr for OciReference {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s.trim() != s {
            return Err(PolicyError::ConfigError(format!(
                "invalid image reference {s:?}"
            )));
        }
        s.parse::<oci_client::Reference>()
            .map_err(|e| PolicyError::ConfigError(format!("invalid image reference {s:?}: {e}")))
            .map(|oci_reference| OciReference { oci_reference })
    }
}

impl OciReference {
    /// registry returns the name of the registry.
    pub fn registry(&self) -> &str {
        self.oci_reference.registry()
    }

    /// repository returns the name of the repository
    pub fn repository(&self) -> &str {
        self.oci_reference.repository()
    }

    /// digest returns the object's digest, if present.
    pub fn digest(&self) -> Option<&str> {
        self.oci_reference.digest()
    }

    /// tag returns the object's tag, if present.
    pub fn tag(&self) -> Option<&str> {
        self.oci_reference.tag()
    }

    /// whole returns the whole reference.
    pub fn whole(&self) -> String {
        self.oci_reference.whole()
    }

    /// Registry and repository, without tag or digest.
    pub fn repository_name(&self) -> String {
        format!("{}/{}", self.registry(), self.repository())
    }

    /// A name-only reference carries neither a tag nor a digest.
    pub fn is_name_only(&self) -> bool {
        self.tag().is_none() && self.digest().is_none()
    }

    /// Whether `other` points to the same registry and repository,
    /// ignoring tags and digests.
    pub fn same_repository(&self, other: &OciReference) -> bool {
        self.registry() == other.registry() && self.repository() == other.repository()
    }

    /// The policy scopes this reference falls into, most specific first.
    ///
    /// For `example.com:5000/ns/app:v1` these are `example.com:5000/ns/app:v1`,
    /// `example.com:5000/ns/app`, `example.com:5000/ns`, `example.com:5000`
    /// and `*.com`.
    pub fn policy_scopes(&self) -> Vec<String> {
        let mut scopes = Vec::new();
        if !self.is_name_only() {
            scopes.push(self.whole());
        }

        let mut name = self.repository_name();
        while let Some(idx) = name.rfind('/') {
            scopes.push(name.clone());
            name.truncate(idx);
        }
        scopes.push(name);

        let host = self.registry();
        let mut domain = host.split_once(':').map_or(host, |(h, _port)| h);
        while let Some((_, parent)) = domain.split_once('.') {
            scopes.push(format!("*.{parent}"));
            domain = parent;
        }

        scopes
    }
}

impl Display for OciReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.oci_reference.fmt(f)
    }
}
