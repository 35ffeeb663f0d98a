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

//! This crate decides whether a container image can be used, according to
//! the signatures attached to it and to a trust policy.
//!
//! # Policies
//!
//! A [`Policy`](config::Policy) maps image scopes (a registry, a namespace,
//! a repository,...) to a list of requirements. An image can be used only
//! when all the requirements of its scope are satisfied:
//!
//! * `insecureAcceptAnything`: always satisfied
//! * `reject`: never satisfied
//! * `sigstoreSigned`: at least one cosign signature made with a given key
//!   must be valid for the image
//! * `signedBy`: at least one simple signing signature made with a given key
//!   must be valid for the image
//!
//! A signature is valid for an image when it verifies with the key, when it
//! claims the digest of the image manifest, and when the identity it claims
//! is accepted by the [`IdentityMatchPolicy`](policy::IdentityMatchPolicy)
//! of the requirement.
//!
//! # Example
//!
//! ```rust,no_run
//! use signature_policy::config::Policy;
//! use signature_policy::image::DirImageSource;
//! use signature_policy::policy::PolicyEvaluator;
//! use tokio_util::sync::CancellationToken;
//!
//! # fn main() -> signature_policy::errors::Result<()> {
//! let policy = Policy::from_file("/etc/containers/policy.json")?;
//! let evaluator = PolicyEvaluator::new(policy);
//!
//! let image = DirImageSource::new(
//!     "/var/lib/images/busybox",
//!     Some("registry.example.com/busybox:latest".parse()?),
//! );
//! match evaluator.is_running_image_allowed(&image, &CancellationToken::new()) {
//!     Ok(()) => println!("image allowed"),
//!     Err(e) => println!("image rejected: {e}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Evaluation is synchronous. Keys referenced by path and signatures are read
//! every time an image is evaluated, the [`CancellationToken`](tokio_util::sync::CancellationToken)
//! is checked before each of these reads.

pub mod config;
pub mod crypto;
pub mod errors;
pub mod image;
pub mod policy;
pub mod signature;
pub mod simple_signing;

mod mock_image_source;
