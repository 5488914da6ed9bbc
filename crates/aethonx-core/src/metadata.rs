// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed metadata: a closed discriminated union, not a subclass hierarchy.
//!
//! Encoded on the wire as the two-field envelope `{ type, data }` per
//! `spec.md` §9 ("Tagged metadata").

use serde::{Deserialize, Serialize};

/// Per-type structured metadata attached to an [`crate::artifact::Artifact`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TypedMetadata {
    Domain(DomainMetadata),
    Ip(IpMetadata),
    Certificate(CertificateMetadata),
    Service(ServiceMetadata),
    Waf(WafMetadata),
    Api(ApiMetadata),
    Repository(RepositoryMetadata),
    BackupFile(BackupFileMetadata),
    StorageBucket(StorageBucketMetadata),
    Webshell(WebshellMetadata),
    Technology(TechnologyMetadata),
}

impl TypedMetadata {
    /// The wire tag for this variant, e.g. `"certificate"`.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Domain(_) => "domain",
            Self::Ip(_) => "ip",
            Self::Certificate(_) => "certificate",
            Self::Service(_) => "service",
            Self::Waf(_) => "waf",
            Self::Api(_) => "api",
            Self::Repository(_) => "repository",
            Self::BackupFile(_) => "backup_file",
            Self::StorageBucket(_) => "storage_bucket",
            Self::Webshell(_) => "webshell",
            Self::Technology(_) => "technology",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DomainMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registrar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct IpMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CertificateMetadata {
    pub serial: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub san: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ServiceMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WafMetadata {
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ApiMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_scheme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct RepositoryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default)]
    pub public: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BackupFileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StorageBucketMetadata {
    pub provider: String,
    #[serde(default)]
    pub publicly_readable: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct WebshellMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TechnologyMetadata {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}
