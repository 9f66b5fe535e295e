//! Flattening of raw search assets into de-duplicated rows.
//!
//! Each lookup direction keys its rows on a single field: the domain for
//! organization lookups, the organization name for reverse lookups.

use crate::api::Asset;
use crate::query::TargetKind;
use serde_json::Value;
use std::collections::HashSet;

pub const NO_IP: &str = "未获取到IP";
pub const NO_ICP_NUMBER: &str = "未获取到备案号";
pub const NO_COMPANY: &str = "未获取到企业名称";

/// Title keywords that mark an educational institution (college, university, school).
const EDU_KEYWORDS: [&str; 3] = ["学院", "大学", "学校"];

/// A domain registered to the queried organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainAsset {
    pub domain: String,
    pub ip: Option<String>,
}

/// The organization behind a queried domain or IP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcpRecord {
    pub company: String,
    pub icp_number: String,
    pub domain: String,
    pub ip: String,
    pub title: String,
}

/// Everything found for one organization in a company lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyResult {
    pub company: String,
    pub assets: Vec<DomainAsset>,
}

/// Everything found for one domain or IP in a reverse lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseResult {
    pub target: String,
    pub kind: TargetKind,
    pub records: Vec<IcpRecord>,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Unique domains, first occurrence wins. Assets without a domain are dropped.
pub fn domain_assets(assets: &[Asset]) -> Vec<DomainAsset> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for asset in assets {
        let Some(domain) = non_empty(asset.domain.as_deref()) else {
            continue;
        };
        if seen.insert(domain.to_string()) {
            out.push(DomainAsset {
                domain: domain.to_string(),
                ip: non_empty(asset.ip.as_deref()).map(str::to_string),
            });
        }
    }
    out
}

/// `name` / `number` out of a nested ICP object; anything but an object yields nothing.
fn nested_icp(value: Option<&Value>) -> Option<(String, Option<String>)> {
    let obj = value?.as_object()?;
    let name = non_empty(obj.get("name").and_then(Value::as_str))?;
    let number = non_empty(obj.get("number").and_then(Value::as_str)).map(str::to_string);
    Some((name.to_string(), number))
}

/// Work out which organization owns an asset and its ICP number.
///
/// Sources in order: top-level `company`/`number`, the `icp` object, the
/// `icp_info` object, and finally an educational-looking web title.
pub fn resolve_owner(asset: &Asset) -> Option<(String, String)> {
    let title = non_empty(asset.web_title.as_deref());

    let owner = non_empty(asset.company.as_deref())
        .map(|name| (name.to_string(), non_empty(asset.number.as_deref()).map(str::to_string)))
        .or_else(|| nested_icp(asset.icp.as_ref()))
        .or_else(|| nested_icp(asset.icp_info.as_ref()))
        .or_else(|| {
            title
                .filter(|t| EDU_KEYWORDS.iter().any(|k| t.contains(k)))
                .map(|t| (t.to_string(), None))
        })?;

    let (name, number) = owner;
    Some((name, number.unwrap_or_else(|| NO_ICP_NUMBER.to_string())))
}

/// Owner records for a reverse lookup.
///
/// Resolved organizations are kept once each. Assets with no resolvable owner
/// are still listed by domain, as long as that domain isn't already present.
pub fn icp_records(assets: &[Asset]) -> Vec<IcpRecord> {
    let mut companies = HashSet::new();
    let mut domains = HashSet::new();
    let mut out = Vec::new();

    for asset in assets {
        let domain = non_empty(asset.domain.as_deref()).unwrap_or_default().to_string();
        let ip = non_empty(asset.ip.as_deref()).unwrap_or(NO_IP).to_string();
        let title = non_empty(asset.web_title.as_deref()).unwrap_or_default().to_string();

        match resolve_owner(asset) {
            Some((company, icp_number)) => {
                if !companies.insert(company.clone()) {
                    continue;
                }
                if !domain.is_empty() {
                    domains.insert(domain.clone());
                }
                out.push(IcpRecord { company, icp_number, domain, ip, title });
            }
            None => {
                if domain.is_empty() || !domains.insert(domain.clone()) {
                    continue;
                }
                let company = if title.is_empty() { NO_COMPANY.to_string() } else { title.clone() };
                out.push(IcpRecord {
                    company,
                    icp_number: NO_ICP_NUMBER.to_string(),
                    domain,
                    ip,
                    title,
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn asset(domain: &str, ip: &str) -> Asset {
        Asset {
            domain: Some(domain.into()),
            ip: Some(ip.into()),
            ..Asset::default()
        }
    }

    #[test]
    fn duplicate_domains_are_filtered() {
        let assets = vec![
            asset("a.example.cn", "1.1.1.1"),
            asset("b.example.cn", ""),
            asset("a.example.cn", "2.2.2.2"),
            asset("", "3.3.3.3"),
        ];
        let out = domain_assets(&assets);
        assert_eq!(
            out,
            vec![
                DomainAsset { domain: "a.example.cn".into(), ip: Some("1.1.1.1".into()) },
                DomainAsset { domain: "b.example.cn".into(), ip: None },
            ]
        );
    }

    #[test]
    fn top_level_company_wins() {
        let a = Asset {
            company: Some("甲公司".into()),
            number: Some("京ICP备1号".into()),
            icp: Some(json!({"name": "乙公司", "number": "沪ICP备2号"})),
            ..asset("a.cn", "1.1.1.1")
        };
        assert_eq!(resolve_owner(&a), Some(("甲公司".into(), "京ICP备1号".into())));
    }

    #[test]
    fn falls_back_through_nested_objects() {
        let legacy = Asset { icp: Some(json!({"name": "乙公司", "number": "沪ICP备2号"})), ..Asset::default() };
        assert_eq!(resolve_owner(&legacy), Some(("乙公司".into(), "沪ICP备2号".into())));

        let info = Asset {
            icp: Some(json!("not an object")),
            icp_info: Some(json!({"name": "丙公司"})),
            ..Asset::default()
        };
        assert_eq!(resolve_owner(&info), Some(("丙公司".into(), NO_ICP_NUMBER.into())));
    }

    #[test]
    fn educational_title_becomes_owner() {
        let a = Asset { web_title: Some("某某大学信息门户".into()), ..Asset::default() };
        assert_eq!(resolve_owner(&a), Some(("某某大学信息门户".into(), NO_ICP_NUMBER.into())));

        let plain = Asset { web_title: Some("登录".into()), ..Asset::default() };
        assert_eq!(resolve_owner(&plain), None);
    }

    #[test]
    fn duplicate_organizations_are_filtered() {
        let assets = vec![
            Asset { company: Some("甲公司".into()), ..asset("a.cn", "1.1.1.1") },
            Asset { company: Some("甲公司".into()), ..asset("b.cn", "1.1.1.2") },
            Asset { company: Some("乙公司".into()), ..asset("c.cn", "") },
        ];
        let out = icp_records(&assets);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].company, "甲公司");
        assert_eq!(out[0].domain, "a.cn");
        assert_eq!(out[1].company, "乙公司");
        assert_eq!(out[1].ip, NO_IP);
    }

    #[test]
    fn seen_organization_is_not_relisted_under_a_new_domain() {
        let assets = vec![
            Asset { company: Some("甲公司".into()), ..asset("a.cn", "1.1.1.1") },
            Asset {
                company: Some("甲公司".into()),
                web_title: Some("分站".into()),
                ..asset("b.cn", "1.1.1.2")
            },
        ];
        let out = icp_records(&assets);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].domain, "a.cn");
        assert!(out.iter().all(|r| r.company != "分站"));
    }

    #[test]
    fn unowned_assets_are_listed_once_per_domain() {
        let assets = vec![
            Asset { web_title: Some("Welcome".into()), ..asset("x.cn", "9.9.9.9") },
            asset("x.cn", "9.9.9.8"),
            asset("y.cn", ""),
            asset("", "7.7.7.7"),
        ];
        let out = icp_records(&assets);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].company, "Welcome");
        assert_eq!(out[0].icp_number, NO_ICP_NUMBER);
        assert_eq!(out[1].company, NO_COMPANY);
        assert_eq!(out[1].domain, "y.cn");
    }

    #[test]
    fn unowned_asset_skipped_when_domain_already_owned() {
        let assets = vec![
            Asset { company: Some("甲公司".into()), ..asset("a.cn", "1.1.1.1") },
            asset("a.cn", "1.1.1.1"),
        ];
        assert_eq!(icp_records(&assets).len(), 1);
    }
}
