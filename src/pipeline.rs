use crate::api::{HunterClient, SearchApi};
use crate::config::Config;
use crate::events::{EventSink, UiEvent};
use crate::query::{classify, Query, TargetKind};
use crate::records::{domain_assets, icp_records, CompanyResult, ReverseResult};
use crate::search::collect_assets;
use crate::sheet::{company_sheet, reverse_sheet, Sheet};
use crate::writer::{self, ExportOptions};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// How reverse-lookup targets are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindHint {
    Fixed(TargetKind),
    /// Classify each target on its own.
    Auto,
}

/// One lookup run.
#[derive(Debug, Clone)]
pub enum Job {
    /// Organization names -> registered domains and IPs.
    Company { targets: Vec<String>, output: PathBuf },
    /// Domains / IPs -> registered organizations.
    Reverse { targets: Vec<String>, kind: KindHint, output: PathBuf },
}

impl Job {
    fn output(&self) -> &Path {
        match self {
            Job::Company { output, .. } | Job::Reverse { output, .. } => output,
        }
    }

    fn fallback_prefix(&self) -> &'static str {
        match self {
            Job::Company { .. } => "hunter_results",
            Job::Reverse { .. } => "hunter_reverse_results",
        }
    }
}

/// Run a job against the live Hunter API.
pub fn run(config: &Config, job: &Job, sink: &dyn EventSink) -> Result<Option<PathBuf>> {
    config.validate()?;
    sink.send(UiEvent::Log(format!("Output: {}", job.output().display())));
    sink.send(UiEvent::Log(format!(
        "Page size: {}, max pages: {}, delay: {}ms",
        config.page_size,
        config.max_pages,
        config.delay.as_millis()
    )));
    let client = HunterClient::new(config);
    let written = run_with(config, job, &client, sink)?;
    sink.send(UiEvent::Finished);
    Ok(written)
}

/// Run a job with the given API and sink (used by `run` and tests).
///
/// Returns the spreadsheet path written, or `None` when there were no targets.
pub fn run_with(config: &Config, job: &Job, api: &dyn SearchApi, sink: &dyn EventSink) -> Result<Option<PathBuf>> {
    let sheet = match job {
        Job::Company { targets, .. } => {
            if targets.is_empty() {
                return Ok(None);
            }
            company_sheet(&lookup_companies(config, targets, api, sink))
        }
        Job::Reverse { targets, kind, .. } => {
            if targets.is_empty() {
                return Ok(None);
            }
            reverse_sheet(&lookup_owners(config, targets, *kind, api, sink))
        }
    };
    export(config, job, sheet, sink).map(Some)
}

fn lookup_companies(config: &Config, targets: &[String], api: &dyn SearchApi, sink: &dyn EventSink) -> Vec<CompanyResult> {
    let total = targets.len();
    targets
        .iter()
        .enumerate()
        .map(|(index, company)| {
            sink.send(UiEvent::TargetStarted { index, total, target: company.clone() });
            let query = Query::IcpName(company.clone());
            let assets = domain_assets(&collect_assets(api, &query, config, sink));
            info!(company = %company, domains = assets.len(), "organization lookup finished");
            sink.send(UiEvent::TargetFinished { target: company.clone(), found: assets.len() });
            CompanyResult { company: company.clone(), assets }
        })
        .collect()
}

fn lookup_owners(
    config: &Config,
    targets: &[String],
    hint: KindHint,
    api: &dyn SearchApi,
    sink: &dyn EventSink,
) -> Vec<ReverseResult> {
    let total = targets.len();
    targets
        .iter()
        .enumerate()
        .map(|(index, target)| {
            sink.send(UiEvent::TargetStarted { index, total, target: target.clone() });
            let kind = match hint {
                KindHint::Fixed(kind) => kind,
                KindHint::Auto => {
                    let kind = classify(target);
                    sink.send(UiEvent::KindDetected { target: target.clone(), kind: kind.label() });
                    kind
                }
            };
            let query = Query::for_target(target, kind);
            let records = icp_records(&collect_assets(api, &query, config, sink));
            info!(target_value = %target, %kind, owners = records.len(), "reverse lookup finished");
            sink.send(UiEvent::TargetFinished { target: target.clone(), found: records.len() });
            ReverseResult { target: target.clone(), kind, records }
        })
        .collect()
}

fn export(config: &Config, job: &Job, sheet: Sheet, sink: &dyn EventSink) -> Result<PathBuf> {
    let opts = ExportOptions {
        attempts: config.write_attempts,
        retry_delay: config.write_retry_delay,
        fallback_dir: PathBuf::from("."),
        fallback_prefix: job.fallback_prefix(),
    };
    writer::export(sheet, job.output(), &opts, sink)
}

/// Read one target per line, trimmed, skipping blank lines.
pub fn read_targets(path: &Path, sink: &dyn EventSink) -> Result<Vec<String>> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let targets: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    sink.send(UiEvent::TargetsLoaded { count: targets.len(), source: path.to_path_buf() });
    Ok(targets)
}
