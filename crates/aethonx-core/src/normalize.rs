// SPDX-License-Identifier: MIT OR Apache-2.0
//! Type-specific value normalization.
//!
//! Every rule here must be idempotent: `normalize(normalize(v)) == normalize(v)`.
//! That property is exercised in `proptest` in [`crate::artifact`].

use std::net::{Ipv4Addr, Ipv6Addr};

use crate::artifact_type::ArtifactType;

/// Normalize `value` for `ty`, per `spec.md` §3.
///
/// Types without a bespoke rule fall back to trimming surrounding
/// whitespace, which is already idempotent.
#[must_use]
pub fn normalize(ty: ArtifactType, value: &str) -> String {
    match ty {
        ArtifactType::Domain | ArtifactType::Subdomain => normalize_domain(value),
        ArtifactType::Email => value.trim().to_lowercase(),
        ArtifactType::Ip => normalize_ipv4(value),
        ArtifactType::Ipv6 => normalize_ipv6(value),
        ArtifactType::Url => normalize_url(value).unwrap_or_default(),
        _ => value.trim().to_string(),
    }
}

fn normalize_domain(value: &str) -> String {
    let mut v = value.trim().to_lowercase();
    if let Some(stripped) = v.strip_suffix('.') {
        v = stripped.to_string();
    }
    if let Some(stripped) = v.strip_prefix("*.") {
        v = stripped.to_string();
    }
    if let Some(stripped) = v.strip_prefix("www.") {
        v = stripped.to_string();
    }
    v
}

fn normalize_ipv4(value: &str) -> String {
    value
        .trim()
        .parse::<Ipv4Addr>()
        .map(|ip| ip.to_string())
        .unwrap_or_default()
}

fn normalize_ipv6(value: &str) -> String {
    value
        .trim()
        .parse::<Ipv6Addr>()
        .map(|ip| ip.to_string())
        .unwrap_or_default()
}

/// Minimal absolute-URL parse: `scheme://host[:port][/path][?query][#fragment]`.
///
/// We deliberately do not pull in a dedicated URL crate for this — the
/// normalization rule is narrow enough (lowercase scheme/host, strip default
/// ports, strip a bare trailing slash) that hand-parsing keeps the surface
/// small and exact.
struct ParsedUrl<'a> {
    scheme: String,
    host: String,
    port: Option<&'a str>,
    rest: &'a str,
}

fn parse_url(value: &str) -> Option<ParsedUrl<'_>> {
    let (scheme, after_scheme) = value.split_once("://")?;
    if scheme.is_empty() {
        return None;
    }
    let authority_end = after_scheme
        .find(['/', '?', '#'])
        .unwrap_or(after_scheme.len());
    let (authority, rest) = after_scheme.split_at(authority_end);
    if authority.is_empty() {
        return None;
    }
    let (host, port) = match authority.rsplit_once(':') {
        Some((h, p)) if !h.is_empty() && p.chars().all(|c| c.is_ascii_digit()) && !p.is_empty() => {
            (h, Some(p))
        }
        _ => (authority, None),
    };
    Some(ParsedUrl {
        scheme: scheme.to_lowercase(),
        host: host.to_lowercase(),
        port,
        rest,
    })
}

fn normalize_url(value: &str) -> Option<String> {
    let parsed = parse_url(value.trim())?;
    let default_port = match parsed.scheme.as_str() {
        "http" => Some("80"),
        "https" => Some("443"),
        _ => None,
    };
    let keep_port = match (parsed.port, default_port) {
        (Some(p), Some(d)) => p != d,
        (Some(_), None) => true,
        (None, _) => false,
    };

    let mut out = format!("{}://{}", parsed.scheme, parsed.host);
    if keep_port {
        out.push(':');
        out.push_str(parsed.port.unwrap());
    }

    if parsed.rest.is_empty() || parsed.rest == "/" {
        // Bare path with no query/fragment: drop the trailing slash entirely.
    } else {
        out.push_str(parsed.rest);
    }

    Some(out)
}
