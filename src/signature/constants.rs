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

pub const SIGSTORE_OCI_MEDIA_TYPE: &str = "application/vnd.dev.cosign.simplesigning.v1+json";
pub const SIGSTORE_SIGNATURE_ANNOTATION: &str = "dev.cosignproject.cosign/signature";

/// `payloadType` of the envelopes stored in simple signing blobs
pub const SIMPLE_SIGNING_PAYLOAD_TYPE: &str = SIGSTORE_OCI_MEDIA_TYPE;

pub(crate) const SIMPLE_SIGNING_FORMAT: &str = "simple-signing";
pub(crate) const SIGSTORE_JSON_FORMAT: &str = "sigstore-json";
