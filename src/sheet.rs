use crate::query::TargetKind;
use crate::records::{CompanyResult, ReverseResult, NO_IP};
use std::collections::HashSet;

pub const COL_COMPANY: &str = "企业名称";
pub const COL_DOMAIN: &str = "域名";
pub const COL_IP: &str = "IP地址";
pub const COL_TARGET: &str = "查询目标";
pub const COL_KIND: &str = "查询类型";
pub const COL_ICP_NUMBER: &str = "备案号";
pub const COL_TITLE: &str = "网站标题";

pub const COMPANY_HEADERS: [&str; 3] = [COL_COMPANY, COL_DOMAIN, COL_IP];
pub const REVERSE_HEADERS: [&str; 7] =
    [COL_TARGET, COL_KIND, COL_COMPANY, COL_ICP_NUMBER, COL_DOMAIN, COL_IP, COL_TITLE];

const NO_DOMAIN_FOUND: &str = "未找到域名";
const NO_COMPANY_FOUND: &str = "未找到企业信息";
const NONE: &str = "无";

/// A single worksheet of string cells with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Reorder this sheet's columns to `headers`, blank where a column is missing.
    fn aligned_rows(&self, headers: &[String]) -> Vec<Vec<String>> {
        let index: Vec<Option<usize>> = headers
            .iter()
            .map(|h| self.headers.iter().position(|own| own == h))
            .collect();
        self.rows
            .iter()
            .map(|row| {
                index
                    .iter()
                    .map(|col| col.and_then(|c| row.get(c)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    /// Append `newer` below `self`, aligning columns by name, then drop exact duplicates.
    ///
    /// Columns only `newer` has are appended after this sheet's columns.
    pub fn merge(self, newer: Sheet) -> Sheet {
        let mut headers = self.headers.clone();
        for h in &newer.headers {
            if !headers.contains(h) {
                headers.push(h.clone());
            }
        }

        let mut rows = self.aligned_rows(&headers);
        rows.extend(newer.aligned_rows(&headers));

        let mut merged = Sheet { headers, rows };
        merged.dedup();
        merged
    }

    /// Remove rows identical to an earlier row.
    pub fn dedup(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.clone()));
    }
}

#[cfg(test)]
impl Sheet {
    /// Cell value by column name.
    pub fn cell(&self, row: usize, header: &str) -> Option<&str> {
        let col = self.headers.iter().position(|h| h == header)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

/// Rows for an organization lookup; an organization with no domains still gets a row.
pub fn company_sheet(results: &[CompanyResult]) -> Sheet {
    let mut sheet = Sheet::new(&COMPANY_HEADERS);
    for result in results {
        if result.assets.is_empty() {
            sheet.push(vec![result.company.clone(), NO_DOMAIN_FOUND.into(), NONE.into()]);
            continue;
        }
        for asset in &result.assets {
            sheet.push(vec![
                result.company.clone(),
                asset.domain.clone(),
                asset.ip.clone().unwrap_or_else(|| NO_IP.into()),
            ]);
        }
    }
    sheet
}

/// Rows for a domain/IP lookup; a target with no owner still gets a row.
pub fn reverse_sheet(results: &[ReverseResult]) -> Sheet {
    let mut sheet = Sheet::new(&REVERSE_HEADERS);
    for result in results {
        let kind = result.kind.label().to_string();
        if result.records.is_empty() {
            let (domain, ip) = match result.kind {
                TargetKind::Domain => (result.target.clone(), NONE.to_string()),
                TargetKind::Ip => (NONE.to_string(), result.target.clone()),
            };
            sheet.push(vec![
                result.target.clone(),
                kind,
                NO_COMPANY_FOUND.into(),
                NONE.into(),
                domain,
                ip,
                String::new(),
            ]);
            continue;
        }
        for record in &result.records {
            sheet.push(vec![
                result.target.clone(),
                kind.clone(),
                record.company.clone(),
                record.icp_number.clone(),
                record.domain.clone(),
                record.ip.clone(),
                record.title.clone(),
            ]);
        }
    }
    sheet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{DomainAsset, IcpRecord};

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn company_rows_include_placeholders() {
        let results = vec![
            CompanyResult {
                company: "甲公司".into(),
                assets: vec![
                    DomainAsset { domain: "a.cn".into(), ip: Some("1.1.1.1".into()) },
                    DomainAsset { domain: "b.cn".into(), ip: None },
                ],
            },
            CompanyResult { company: "乙公司".into(), assets: vec![] },
        ];
        let sheet = company_sheet(&results);
        assert_eq!(sheet.headers, row(&COMPANY_HEADERS));
        assert_eq!(
            sheet.rows,
            vec![
                row(&["甲公司", "a.cn", "1.1.1.1"]),
                row(&["甲公司", "b.cn", NO_IP]),
                row(&["乙公司", "未找到域名", "无"]),
            ]
        );
    }

    #[test]
    fn reverse_rows_for_empty_targets_echo_the_target() {
        let results = vec![
            ReverseResult { target: "1.2.3.4".into(), kind: TargetKind::Ip, records: vec![] },
            ReverseResult { target: "a.cn".into(), kind: TargetKind::Domain, records: vec![] },
        ];
        let sheet = reverse_sheet(&results);
        assert_eq!(sheet.cell(0, COL_KIND), Some("IP地址"));
        assert_eq!(sheet.cell(0, COL_IP), Some("1.2.3.4"));
        assert_eq!(sheet.cell(0, COL_DOMAIN), Some("无"));
        assert_eq!(sheet.cell(1, COL_DOMAIN), Some("a.cn"));
        assert_eq!(sheet.cell(1, COL_IP), Some("无"));
        assert_eq!(sheet.cell(1, COL_COMPANY), Some("未找到企业信息"));
    }

    #[test]
    fn reverse_rows_carry_record_fields() {
        let results = vec![ReverseResult {
            target: "a.cn".into(),
            kind: TargetKind::Domain,
            records: vec![IcpRecord {
                company: "甲公司".into(),
                icp_number: "京ICP备1号".into(),
                domain: "www.a.cn".into(),
                ip: "1.1.1.1".into(),
                title: "首页".into(),
            }],
        }];
        let sheet = reverse_sheet(&results);
        assert_eq!(sheet.rows, vec![row(&["a.cn", "域名", "甲公司", "京ICP备1号", "www.a.cn", "1.1.1.1", "首页"])]);
    }

    #[test]
    fn merge_preserves_prior_rows_and_drops_duplicates() {
        let mut existing = Sheet::new(&COMPANY_HEADERS);
        existing.push(row(&["甲公司", "old.cn", "9.9.9.9"]));
        existing.push(row(&["甲公司", "a.cn", "1.1.1.1"]));

        let mut fresh = Sheet::new(&COMPANY_HEADERS);
        fresh.push(row(&["甲公司", "a.cn", "1.1.1.1"]));
        fresh.push(row(&["甲公司", "new.cn", "2.2.2.2"]));

        let merged = existing.merge(fresh);
        assert_eq!(
            merged.rows,
            vec![
                row(&["甲公司", "old.cn", "9.9.9.9"]),
                row(&["甲公司", "a.cn", "1.1.1.1"]),
                row(&["甲公司", "new.cn", "2.2.2.2"]),
            ]
        );
    }

    #[test]
    fn merge_aligns_columns_by_name() {
        let mut existing = Sheet::new(&[COL_DOMAIN, COL_COMPANY]);
        existing.push(row(&["old.cn", "甲公司"]));

        let mut fresh = Sheet::new(&COMPANY_HEADERS);
        fresh.push(row(&["乙公司", "b.cn", "2.2.2.2"]));

        let merged = existing.merge(fresh);
        assert_eq!(merged.headers, row(&[COL_DOMAIN, COL_COMPANY, COL_IP]));
        assert_eq!(merged.rows[0], row(&["old.cn", "甲公司", ""]));
        assert_eq!(merged.rows[1], row(&["b.cn", "乙公司", "2.2.2.2"]));
    }

    #[test]
    fn dedup_within_existing_rows_too() {
        let mut existing = Sheet::new(&COMPANY_HEADERS);
        existing.push(row(&["甲公司", "a.cn", "1.1.1.1"]));
        existing.push(row(&["甲公司", "a.cn", "1.1.1.1"]));
        let merged = existing.merge(Sheet::new(&COMPANY_HEADERS));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn short_rows_are_padded() {
        let mut sheet = Sheet::new(&COMPANY_HEADERS);
        sheet.push(row(&["甲公司"]));
        assert_eq!(sheet.rows[0], row(&["甲公司", "", ""]));
    }
}
