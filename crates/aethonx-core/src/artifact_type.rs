// SPDX-License-Identifier: MIT OR Apache-2.0
//! The closed set of artifact types and their invariant categories.

use serde::{Deserialize, Serialize};

/// Broad grouping an [`ArtifactType`] always belongs to.
///
/// The mapping is fixed at compile time — it is a property of the type, not
/// something a source can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactCategory {
    /// Network- and host-level facts (domains, IPs, ports, DNS records).
    Infrastructure,
    /// Application-layer facts observed over HTTP.
    Web,
    /// Facts with direct security relevance.
    Security,
    /// Cloud-provider resources.
    Cloud,
    /// Loosely-structured supporting data.
    Data,
    /// Human or organizational contact facts.
    Contact,
}

/// The closed set of artifact types AethonX can represent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactType {
    Domain,
    Subdomain,
    Ip,
    Ipv6,
    Cidr,
    Asn,
    Port,
    Service,
    DnsRecord,
    Nameserver,
    MxRecord,
    Url,
    Endpoint,
    Api,
    Technology,
    HttpHeader,
    Cookie,
    Form,
    Parameter,
    Javascript,
    Redirect,
    Waf,
    Certificate,
    Vulnerability,
    SecurityHeader,
    TlsConfig,
    SshKey,
    CloudResource,
    CdnEndpoint,
    Container,
    StorageBucket,
    Credential,
    SensitiveFile,
    BackupFile,
    Repository,
    Webshell,
    Metadata,
    Email,
    Phone,
    SocialMedia,
    WhoisContact,
}

impl ArtifactType {
    /// The invariant [`ArtifactCategory`] this type belongs to.
    #[must_use]
    pub fn category(self) -> ArtifactCategory {
        use ArtifactCategory::{Cloud, Contact, Data, Infrastructure, Security, Web};
        use ArtifactType::{
            Api, Asn, BackupFile, CdnEndpoint, Certificate, Cidr, CloudResource, Container,
            Cookie, Credential, Domain, DnsRecord, Email, Endpoint, Form, HttpHeader, Ip, Ipv6,
            Javascript, Metadata, MxRecord, Nameserver, Parameter, Phone, Port, Redirect,
            Repository, SecurityHeader, SensitiveFile, Service, SocialMedia, SshKey,
            StorageBucket, Subdomain, Technology, TlsConfig, Url, Vulnerability, Waf, Webshell,
            WhoisContact,
        };
        match self {
            Domain | Subdomain | Ip | Ipv6 | Cidr | Asn | Port | Service | DnsRecord
            | Nameserver | MxRecord | TlsConfig => Infrastructure,
            Url | Endpoint | Api | Technology | HttpHeader | Cookie | Form | Parameter
            | Javascript | Redirect => Web,
            Waf | Certificate | Vulnerability | SecurityHeader | SshKey | Credential
            | SensitiveFile | BackupFile | Webshell => Security,
            CloudResource | CdnEndpoint | Container | StorageBucket => Cloud,
            Repository | Metadata => Data,
            Email | Phone | SocialMedia | WhoisContact => Contact,
        }
    }

    /// The wire tag used for this type, identical to its serde rendering.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Subdomain => "subdomain",
            Self::Ip => "ip",
            Self::Ipv6 => "ipv6",
            Self::Cidr => "cidr",
            Self::Asn => "asn",
            Self::Port => "port",
            Self::Service => "service",
            Self::DnsRecord => "dns_record",
            Self::Nameserver => "nameserver",
            Self::MxRecord => "mx_record",
            Self::Url => "url",
            Self::Endpoint => "endpoint",
            Self::Api => "api",
            Self::Technology => "technology",
            Self::HttpHeader => "http_header",
            Self::Cookie => "cookie",
            Self::Form => "form",
            Self::Parameter => "parameter",
            Self::Javascript => "javascript",
            Self::Redirect => "redirect",
            Self::Waf => "waf",
            Self::Certificate => "certificate",
            Self::Vulnerability => "vulnerability",
            Self::SecurityHeader => "security_header",
            Self::TlsConfig => "tls_config",
            Self::SshKey => "ssh_key",
            Self::CloudResource => "cloud_resource",
            Self::CdnEndpoint => "cdn_endpoint",
            Self::Container => "container",
            Self::StorageBucket => "storage_bucket",
            Self::Credential => "credential",
            Self::SensitiveFile => "sensitive_file",
            Self::BackupFile => "backup_file",
            Self::Repository => "repository",
            Self::Webshell => "webshell",
            Self::Metadata => "metadata",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::SocialMedia => "social_media",
            Self::WhoisContact => "whois_contact",
        }
    }
}

impl std::fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_is_infrastructure() {
        assert_eq!(ArtifactType::Domain.category(), ArtifactCategory::Infrastructure);
    }

    #[test]
    fn url_is_web() {
        assert_eq!(ArtifactType::Url.category(), ArtifactCategory::Web);
    }

    #[test]
    fn certificate_is_security() {
        assert_eq!(ArtifactType::Certificate.category(), ArtifactCategory::Security);
    }

    #[test]
    fn storage_bucket_is_cloud() {
        assert_eq!(ArtifactType::StorageBucket.category(), ArtifactCategory::Cloud);
    }

    #[test]
    fn email_is_contact() {
        assert_eq!(ArtifactType::Email.category(), ArtifactCategory::Contact);
    }

    #[test]
    fn as_str_matches_serde_tag() {
        let json = serde_json::to_string(&ArtifactType::DnsRecord).unwrap();
        assert_eq!(json, format!("\"{}\"", ArtifactType::DnsRecord.as_str()));
    }
}
