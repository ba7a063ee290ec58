//! CSV manifests: one stage's output is the next stage's input.
//!
//! Files are UTF-8 with a byte-order mark and a single header row. Writers
//! flush once per batch (one unit of work), so an interrupted run leaves a
//! valid, if incomplete, file behind.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::error::ManifestError;

/// UTF-8 byte-order mark written ahead of every header
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

/// A typed output row with a fixed column schema.
///
/// `COLUMNS` must list the serialized field names in declaration order; rows
/// are written without csv's own header handling.
pub trait Row: Serialize {
    const COLUMNS: &'static [&'static str];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Truncate, then write BOM + header
    Overwrite,
    /// Append; BOM + header only if the file is empty when opened
    Append,
}

/// Batch writer for one manifest file.
pub struct ManifestWriter<R> {
    writer: csv::Writer<File>,
    path: PathBuf,
    rows: usize,
    _row: PhantomData<fn(&R)>,
}

impl<R: Row> ManifestWriter<R> {
    pub fn open(path: &Path, mode: WriteMode) -> Result<Self, ManifestError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = match mode {
            WriteMode::Overwrite => File::create(path)?,
            WriteMode::Append => OpenOptions::new().create(true).append(true).open(path)?,
        };
        let needs_header = match mode {
            WriteMode::Overwrite => true,
            WriteMode::Append => file.metadata()?.len() == 0,
        };
        if needs_header {
            file.write_all(BOM)?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::CRLF)
            .from_writer(file);
        if needs_header {
            writer.write_record(R::COLUMNS)?;
            writer.flush()?;
        }
        log::debug!(
            "{}: opened ({mode:?}, header {})",
            path.display(),
            if needs_header { "written" } else { "kept" }
        );

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            rows: 0,
            _row: PhantomData,
        })
    }

    /// Write one batch and flush it to disk
    pub fn write_rows(&mut self, rows: &[R]) -> Result<usize, ManifestError> {
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        self.rows += rows.len();
        Ok(rows.len())
    }

    /// Rows written through this handle (excludes pre-existing rows)
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Open, write a single batch, close.
pub fn write<R: Row>(path: &Path, rows: &[R], mode: WriteMode) -> Result<usize, ManifestError> {
    ManifestWriter::open(path, mode)?.write_rows(rows)
}

/// Row selector for [`load_column`]: keep rows where `column == value`
#[derive(Debug, Clone, Copy)]
pub struct ColumnFilter<'a> {
    pub column: &'a str,
    pub value: &'a str,
}

/// Values of `column`, in file order, optionally restricted by `filter`.
///
/// Rows too short to hold the requested columns are skipped. A missing file
/// is reported as [`ManifestError::Missing`].
pub fn load_column(
    path: &Path,
    column: &str,
    filter: Option<ColumnFilter<'_>>,
) -> Result<Vec<String>, ManifestError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(ManifestError::Missing(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);
    let headers = reader.headers()?.clone();

    let value_idx = header_index(&headers, column, path)?;
    let filter_idx = filter
        .map(|f| header_index(&headers, f.column, path).map(|idx| (idx, f.value)))
        .transpose()?;

    let mut values = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some((idx, wanted)) = filter_idx {
            if record.get(idx).map(str::trim) != Some(wanted) {
                continue;
            }
        }
        if let Some(value) = record.get(value_idx) {
            values.push(value.trim().to_string());
        }
    }
    log::debug!("{}: {} '{column}' values", path.display(), values.len());
    Ok(values)
}

/// Like [`load_column`] with set semantics: first occurrence wins, blanks
/// are dropped.
pub fn load_unique_column(path: &Path, column: &str) -> Result<Vec<String>, ManifestError> {
    let all = load_column(path, column, None)?;
    let total = all.len();
    let mut seen = FxHashSet::default();
    let unique: Vec<String> = all
        .into_iter()
        .filter(|v| !v.is_empty() && seen.insert(v.clone()))
        .collect();
    if unique.len() < total {
        log::info!(
            "{}: {} distinct of {total} '{column}' values",
            path.display(),
            unique.len()
        );
    }
    Ok(unique)
}

fn header_index(
    headers: &csv::StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize, ManifestError> {
    headers
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == name)
        .ok_or_else(|| ManifestError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
}
