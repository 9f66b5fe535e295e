use crate::events::{EventSink, UiEvent};
use crate::sheet::Sheet;
use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// How a sheet is persisted when the target file is busy.
pub struct ExportOptions {
    /// Total write attempts on a permission error.
    pub attempts: u32,
    pub retry_delay: Duration,
    /// Directory and name prefix of the last-resort file.
    pub fallback_dir: PathBuf,
    pub fallback_prefix: &'static str,
}

/// Merge `sheet` into the workbook at `path` and write it out.
///
/// Returns the path actually written, which differs from `path` when the
/// existing file could not be read or the target stayed locked.
pub fn export(sheet: Sheet, path: &Path, opts: &ExportOptions, sink: &dyn EventSink) -> Result<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let (sheet, target) = if path.exists() {
        match read_sheet(path) {
            Ok(existing) => {
                sink.send(UiEvent::ExistingMerged { path: path.to_path_buf(), existing_rows: existing.len() });
                (existing.merge(sheet), path.to_path_buf())
            }
            Err(e) => {
                let fallback = timestamped(path);
                sink.send(UiEvent::ExistingUnreadable {
                    path: path.to_path_buf(),
                    reason: format!("{:#}", e),
                    fallback: fallback.clone(),
                });
                (sheet, fallback)
            }
        }
    } else {
        (sheet, path.to_path_buf())
    };

    let bytes = encode_sheet(&sheet)?;
    let written = save_with_retry(&target, &bytes, opts, sink, |p, b| fs::write(p, b))?;
    sink.send(UiEvent::Exported { path: written.clone(), rows: sheet.len() });
    Ok(written)
}

/// Read the first worksheet; its first row becomes the headers.
pub fn read_sheet(path: &Path) -> Result<Sheet> {
    let mut workbook = open_workbook_auto(path).with_context(|| format!("Cannot open {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .context("Workbook has no worksheets")?
        .context("Cannot read first worksheet")?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Sheet::default());
    };
    let headers: Vec<String> = header_row.iter().map(cell_text).collect();
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();

    let mut sheet = Sheet::new(&header_refs);
    for row in rows {
        sheet.push(row.iter().map(cell_text).collect());
    }
    Ok(sheet)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Whole numbers come back as floats.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// Render a sheet as an .xlsx workbook with a bold header row.
pub fn encode_sheet(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &bold)?;
    }
    for (r, row) in sheet.rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            worksheet.write_string(r as u32 + 1, c as u16, value)?;
        }
    }

    workbook.save_to_buffer().context("Failed to build workbook")
}

/// Write `bytes` to `path`, retrying while the file is locked, then falling
/// back to a fresh timestamped file in `opts.fallback_dir`.
fn save_with_retry<F>(path: &Path, bytes: &[u8], opts: &ExportOptions, sink: &dyn EventSink, mut write: F) -> Result<PathBuf>
where
    F: FnMut(&Path, &[u8]) -> io::Result<()>,
{
    for attempt in 1..=opts.attempts {
        match write(path, bytes) {
            Ok(()) => return Ok(path.to_path_buf()),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                if attempt < opts.attempts {
                    sink.send(UiEvent::WriteRetry {
                        path: path.to_path_buf(),
                        attempt,
                        max_attempts: opts.attempts,
                    });
                    if !opts.retry_delay.is_zero() {
                        std::thread::sleep(opts.retry_delay);
                    }
                }
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to write {}", path.display())),
        }
    }

    let fallback = opts
        .fallback_dir
        .join(format!("{}_{}.xlsx", opts.fallback_prefix, unix_seconds()));
    sink.send(UiEvent::WriteFallback { path: path.to_path_buf(), fallback: fallback.clone() });
    write(&fallback, bytes).with_context(|| format!("Failed to write fallback file {}", fallback.display()))?;
    Ok(fallback)
}

/// `dir/name.xlsx` -> `dir/name_<unix-seconds>.xlsx`.
fn timestamped(path: &Path) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    path.with_file_name(format!("{}_{}{}", stem, unix_seconds(), ext))
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
