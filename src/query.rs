use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use std::fmt;

/// What a reverse-lookup target looks like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Domain,
    Ip,
}

impl TargetKind {
    /// Label written to the `查询类型` column.
    pub fn label(self) -> &'static str {
        match self {
            TargetKind::Domain => "域名",
            TargetKind::Ip => "IP地址",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Domain => f.write_str("domain"),
            TargetKind::Ip => f.write_str("IP"),
        }
    }
}

/// Classify a target as an IPv4 literal or something domain-like.
///
/// Only dotted quads with 1-3 digit groups in 0..=255 count as IPs; a
/// malformed quad such as `300.1.1.1` is treated as a domain.
pub fn classify(target: &str) -> TargetKind {
    let groups: Vec<&str> = target.split('.').collect();
    if groups.len() != 4 {
        return TargetKind::Domain;
    }
    let is_octet = |g: &str| {
        (1..=3).contains(&g.len())
            && g.bytes().all(|b| b.is_ascii_digit())
            && g.parse::<u16>().is_ok_and(|n| n <= 255)
    };
    if groups.iter().all(|&g| is_octet(g)) {
        TargetKind::Ip
    } else {
        TargetKind::Domain
    }
}

/// A single Hunter search expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Assets whose ICP record names this organization.
    IcpName(String),
    Domain(String),
    Ip(String),
}

impl Query {
    pub fn for_target(target: &str, kind: TargetKind) -> Self {
        match kind {
            TargetKind::Domain => Query::Domain(target.to_string()),
            TargetKind::Ip => Query::Ip(target.to_string()),
        }
    }

    /// The target value without the field name.
    pub fn target(&self) -> &str {
        match self {
            Query::IcpName(v) | Query::Domain(v) | Query::Ip(v) => v,
        }
    }

    /// Hunter query syntax, e.g. `icp.name="Example Ltd"`.
    pub fn expression(&self) -> String {
        match self {
            Query::IcpName(name) => format!("icp.name=\"{}\"", name),
            Query::Domain(domain) => format!("domain=\"{}\"", domain),
            Query::Ip(ip) => format!("ip=\"{}\"", ip),
        }
    }

    /// URL-safe, padded base64 of the expression, as the `search` parameter expects.
    pub fn encoded(&self) -> String {
        URL_SAFE.encode(self.expression().as_bytes())
    }
}
