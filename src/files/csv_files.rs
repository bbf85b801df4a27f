use crate::error::{AppError, Result};
use crate::models::{EnvVar, EnvVarSet};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const IMPORT_DELIMITER: u8 = b';';
const EXPORT_HEADER: [&str; 2] = ["Name", "Value"];

/// One line of an import file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportRow {
    /// Exactly two fields, trimmed.
    Valid(EnvVar),
    /// Any other field count; carries the raw fields for reporting.
    Invalid(Vec<String>),
}

/// Reads every row of a `;`-delimited import file.
///
/// Rows are classified rather than rejected, so a bad row never stops the batch.
/// An empty line is an invalid row with no fields. A quoted field may span
/// lines. Bytes that are not valid UTF-8 are replaced rather than failing the row.
///
/// # Errors
///
/// Returns `AppError::InputFileMissing` if `path` is not an existing file,
/// `AppError::Io` if it cannot be read, or `AppError::Csv` if a row cannot be parsed.
pub fn read_import_file(path: &Path) -> Result<Vec<ImportRow>> {
    if !path.is_file() {
        warn!("Import file {} does not exist", path.display());
        return Err(AppError::InputFileMissing(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes);

    let mut rows = Vec::new();
    let mut pending = String::new();
    for line in text.lines() {
        if pending.is_empty() && line.is_empty() {
            rows.push(ImportRow::Invalid(Vec::new()));
            continue;
        }
        if !pending.is_empty() {
            pending.push('\n');
        }
        pending.push_str(line);
        if !ends_inside_quotes(&pending) {
            rows.push(parse_row(&pending)?);
            pending.clear();
        }
    }
    // Unterminated quote at end of file: let the parser take what is there.
    if !pending.is_empty() {
        rows.push(parse_row(&pending)?);
    }

    debug!("Read {} row(s) from {}", rows.len(), path.display());
    Ok(rows)
}

/// Parses one logical record and classifies it by field count.
fn parse_row(record: &str) -> Result<ImportRow> {
    let mut reader = ReaderBuilder::new()
        .delimiter(IMPORT_DELIMITER)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(record.as_bytes());

    let fields: Vec<String> = match reader.records().next() {
        Some(record) => record?.iter().map(str::to_string).collect(),
        None => Vec::new(),
    };

    Ok(match <[String; 2]>::try_from(fields) {
        Ok([name, value]) => ImportRow::Valid(EnvVar { name, value }),
        Err(fields) => ImportRow::Invalid(fields),
    })
}

/// Whether `text` stops inside a quoted field.
///
/// A quote opens a field only at the start of that field; `""` inside a quoted
/// field is an escaped quote.
fn ends_inside_quotes(text: &str) -> bool {
    let delimiter = char::from(IMPORT_DELIMITER);
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            at_field_start = false;
        } else if c == '"' && at_field_start {
            in_quotes = true;
            at_field_start = false;
        } else {
            at_field_start = c == delimiter || c == '\n';
        }
    }
    in_quotes
}

/// Writes `vars` to `path` as `Name,Value` CSV, overwriting any existing file.
///
/// The parent directory is created if needed. The header is written even when
/// `vars` is empty.
///
/// # Errors
///
/// Returns `AppError::Io` if the directory cannot be created, or `AppError::Csv`
/// if the file cannot be written.
pub fn write_export_file(path: &Path, vars: &EnvVarSet) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
    writer.write_record(EXPORT_HEADER)?;
    for var in vars {
        writer.serialize(var)?;
    }
    writer.flush()?;

    info!("Exported {} variable(s) to {}", vars.len(), path.display());
    Ok(())
}
