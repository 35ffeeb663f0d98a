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

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{list_signatures, PolicyRequirement};
use crate::config::Policy;
use crate::errors::Result;
use crate::image::ImageSource;

/// Decides whether images can be used according to a [`Policy`].
///
/// The evaluator holds no state besides the policy, it can be shared between
/// threads and used for any number of images.
#[derive(Debug, Clone)]
pub struct PolicyEvaluator {
    policy: Policy,
}

impl PolicyEvaluator {
    pub fn new(policy: Policy) -> Self {
        PolicyEvaluator { policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// The requirements `image` is evaluated against.
    pub fn requirements_for(&self, image: &dyn ImageSource) -> &[PolicyRequirement] {
        self.policy
            .requirements_for(image.transport_name(), image.identity())
    }

    /// Check whether `image` satisfies all the requirements of its scope.
    ///
    /// `Ok(())` means the image can be used. Requirements are evaluated in
    /// order, the first one that is not satisfied is reported.
    pub fn is_running_image_allowed(
        &self,
        image: &dyn ImageSource,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let image_name = image
            .identity()
            .map_or_else(|| "<none>".to_string(), |r| r.whole());
        let requirements = self.requirements_for(image);

        let signatures = if requirements.iter().any(PolicyRequirement::needs_signatures) {
            list_signatures(image, cancel).inspect_err(|error| {
                warn!(image = %image_name, %error, "cannot read signatures");
            })?
        } else {
            Vec::new()
        };

        for requirement in requirements {
            if let Err(error) = requirement.is_satisfied_by(image, &signatures, cancel) {
                info!(image = %image_name, %requirement, %error, "image rejected");
                return Err(error);
            }
        }

        info!(image = %image_name, "image allowed");
        Ok(())
    }
}
