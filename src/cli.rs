use crate::config::{Config, DEFAULT_API_URL};
use crate::events::EventSink;
use crate::pipeline::{read_targets, Job, KindHint};
use crate::query::TargetKind;
use anyhow::Result;
use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_COMPANY_OUTPUT: &str = "结果/反查域名.xlsx";
pub const DEFAULT_REVERSE_OUTPUT: &str = "结果/反查ICP.xlsx";

#[derive(Parser, Debug)]
#[command(name = "icp-hunter")]
#[command(about = "Reverse-map organizations, domains and IPs through ICP records on Hunter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub api: ApiArgs,

    /// Skip the start-up banner
    #[arg(long, global = true)]
    pub no_banner: bool,

    /// More diagnostics on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Args, Debug)]
pub struct ApiArgs {
    /// Hunter API key
    #[arg(long, env = "HUNTER_API_KEY", hide_env_values = true, global = true, default_value = "")]
    pub api_key: String,

    /// Search endpoint
    #[arg(long, default_value = DEFAULT_API_URL, global = true)]
    pub api_url: String,

    /// Results per page
    #[arg(long, default_value_t = 100, global = true)]
    pub page_size: u32,

    /// Maximum pages fetched per target
    #[arg(long, default_value_t = 5, global = true)]
    pub max_pages: u32,

    /// Pause between page requests, in milliseconds
    #[arg(long, default_value_t = 1000, global = true)]
    pub delay_ms: u64,

    /// Timeout for a single request, in seconds
    #[arg(long, default_value_t = 30, global = true)]
    pub timeout_secs: u64,

    /// Attempts at writing a locked spreadsheet before using a fallback file
    #[arg(long, default_value_t = 3, global = true)]
    pub write_attempts: u32,

    /// Pause between write attempts, in milliseconds
    #[arg(long, default_value_t = 2000, global = true)]
    pub write_retry_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find the domains and IPs registered to organizations
    #[command(alias = "c")]
    Company(CompanyArgs),
    /// Find the organizations behind domains or IPs
    #[command(alias = "r")]
    Reverse(ReverseArgs),
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["company", "file"])))]
pub struct CompanyArgs {
    /// A single organization name
    #[arg(short, long)]
    pub company: Option<String>,

    /// Text file with one organization name per line
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Output spreadsheet; merged into when it already exists
    #[arg(short, long, default_value = DEFAULT_COMPANY_OUTPUT)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("input").required(true).args(["domain", "ip", "auto", "file"])))]
pub struct ReverseArgs {
    /// A single domain
    #[arg(short, long)]
    pub domain: Option<String>,

    /// A single IP address
    #[arg(short, long)]
    pub ip: Option<String>,

    /// A single target, detected as domain or IP
    #[arg(short, long)]
    pub auto: Option<String>,

    /// Text file with one domain or IP per line
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// What the lines of --file are
    #[arg(short = 't', long = "type", value_enum, default_value_t = FileKind::Domain)]
    pub kind: FileKind,

    /// Output spreadsheet; merged into when it already exists
    #[arg(short, long, default_value = DEFAULT_REVERSE_OUTPUT)]
    pub output: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Domain,
    Ip,
    /// Detect per line
    Auto,
}

impl From<FileKind> for KindHint {
    fn from(kind: FileKind) -> Self {
        match kind {
            FileKind::Domain => KindHint::Fixed(TargetKind::Domain),
            FileKind::Ip => KindHint::Fixed(TargetKind::Ip),
            FileKind::Auto => KindHint::Auto,
        }
    }
}

impl Cli {
    /// Defaults overlaid with command-line values.
    pub fn config(&self) -> Config {
        let mut config = Config::hunter_defaults(self.api.api_key.trim());
        config.api_url = self.api.api_url.clone();
        config.page_size = self.api.page_size;
        config.max_pages = self.api.max_pages;
        config.delay = Duration::from_millis(self.api.delay_ms);
        config.request_timeout = Duration::from_secs(self.api.timeout_secs);
        config.write_attempts = self.api.write_attempts;
        config.write_retry_delay = Duration::from_millis(self.api.write_retry_ms);
        config
    }
}

impl Commands {
    /// Resolve the inputs into a job, reading target files as needed.
    pub fn into_job(self, sink: &dyn EventSink) -> Result<Job> {
        match self {
            Commands::Company(args) => {
                let targets = match (args.company, args.file) {
                    (Some(company), _) => vec![company.trim().to_string()],
                    (None, Some(file)) => read_targets(&file, sink)?,
                    (None, None) => Vec::new(),
                };
                Ok(Job::Company { targets, output: args.output })
            }
            Commands::Reverse(args) => {
                let (targets, kind) = if let Some(domain) = args.domain {
                    (vec![domain], KindHint::Fixed(TargetKind::Domain))
                } else if let Some(ip) = args.ip {
                    (vec![ip], KindHint::Fixed(TargetKind::Ip))
                } else if let Some(target) = args.auto {
                    (vec![target], KindHint::Auto)
                } else if let Some(file) = args.file {
                    (read_targets(&file, sink)?, args.kind.into())
                } else {
                    (Vec::new(), args.kind.into())
                };
                let targets = targets.into_iter().map(|t| t.trim().to_string()).collect();
                Ok(Job::Reverse { targets, kind, output: args.output })
            }
        }
    }
}
