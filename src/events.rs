use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ── Events from pipeline to console ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Log(String),

    TargetsLoaded { count: usize, source: PathBuf },
    TargetStarted { index: usize, total: usize, target: String },
    KindDetected { target: String, kind: &'static str },

    PageRequested { page: u32 },
    PageFetched { page: u32, assets: usize, total: u64 },
    /// Pagination for this target stopped on an error; earlier pages are kept.
    SearchAborted { reason: String },
    TargetFinished { target: String, found: usize },

    ExistingMerged { path: PathBuf, existing_rows: usize },
    ExistingUnreadable { path: PathBuf, reason: String, fallback: PathBuf },
    WriteRetry { path: PathBuf, attempt: u32, max_attempts: u32 },
    WriteFallback { path: PathBuf, fallback: PathBuf },
    Exported { path: PathBuf, rows: usize },

    Finished,
    Error(String),
}

// ── EventSink trait ─────────────────────────────────────────────────────────

/// Abstraction for reporting pipeline progress.
pub trait EventSink: Send + Sync {
    fn send(&self, event: UiEvent);
}

// ── Console sink ────────────────────────────────────────────────────────────

pub struct ConsoleSink {
    pb: Mutex<Option<ProgressBar>>,
}

impl ConsoleSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pb: Mutex::new(None),
        })
    }

    fn make_spinner(message: String) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("    {spinner:.green} [{elapsed_precise}] {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(message);
        pb
    }

    fn clear_spinner(&self) {
        if let Ok(mut guard) = self.pb.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }

    /// Print a line without tearing an active spinner.
    fn println(&self, line: String) {
        match self.pb.lock().ok().as_deref().and_then(Option::as_ref) {
            Some(pb) => pb.println(line),
            None => println!("{}", line),
        }
    }
}

impl EventSink for ConsoleSink {
    fn send(&self, event: UiEvent) {
        match event {
            UiEvent::Log(msg) => self.println(format!("  {}", msg)),

            UiEvent::TargetsLoaded { count, source } => {
                println!("  Read {} targets from {}", count, source.display());
            }
            UiEvent::TargetStarted { index, total, target } => {
                println!("\n━━━ [{}/{}] {} ━━━", index + 1, total, target);
            }
            UiEvent::KindDetected { target, kind } => {
                println!("  Detected {} as {}", target, kind);
            }

            UiEvent::PageRequested { page } => {
                let mut guard = match self.pb.lock() {
                    Ok(guard) => guard,
                    Err(_) => return,
                };
                let message = format!("Fetching page {}...", page);
                match guard.as_ref() {
                    Some(pb) => pb.set_message(message),
                    None => *guard = Some(Self::make_spinner(message)),
                }
            }
            UiEvent::PageFetched { page, assets, total } => {
                self.println(format!("  Page {}: {} assets ({} total reported)", page, assets, total));
            }
            UiEvent::SearchAborted { reason } => {
                self.clear_spinner();
                eprintln!("  ERROR: {}", reason);
            }
            UiEvent::TargetFinished { target, found } => {
                self.clear_spinner();
                if found > 0 {
                    println!("  Found {} records", found);
                } else {
                    println!("  WARNING: nothing found for {}", target);
                }
            }

            UiEvent::ExistingMerged { path, existing_rows } => {
                println!(
                    "  Appending to existing {} ({} rows already present)",
                    path.display(),
                    existing_rows
                );
            }
            UiEvent::ExistingUnreadable { path, reason, fallback } => {
                println!(
                    "  WARNING: cannot read existing {}: {}; writing a new file {}",
                    path.display(),
                    reason,
                    fallback.display()
                );
            }
            UiEvent::WriteRetry { path, attempt, max_attempts } => {
                println!(
                    "  WARNING: {} may be open in another program, retrying ({}/{})",
                    path.display(),
                    attempt,
                    max_attempts
                );
            }
            UiEvent::WriteFallback { path, fallback } => {
                eprintln!(
                    "  ERROR: cannot write {}; close any program holding it. Saving to {} instead",
                    path.display(),
                    fallback.display()
                );
            }
            UiEvent::Exported { path, rows } => {
                println!("\n  Exported {} rows to {}", rows, path.display());
            }

            UiEvent::Finished => println!("\n=== Complete ==="),
            UiEvent::Error(msg) => {
                self.clear_spinner();
                eprintln!("\n  ERROR: {}", msg);
            }
        }
    }
}

// ── Memory sink (tests) ─────────────────────────────────────────────────────

#[cfg(test)]
pub struct MemorySink {
    pub events: Mutex<Vec<UiEvent>>,
}

#[cfg(test)]
impl MemorySink {
    pub fn new() -> Self {
        Self { events: Mutex::new(Vec::new()) }
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl EventSink for MemorySink {
    fn send(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}
