//! Placement ledger: one record per fragment
//!
//! Each record is written as
//!
//! ```text
//! fragment_0007: (120, 48.5); (97, 20); 213.75
//! ```
//!
//! followed by a blank line: identifier, anchor, offset and rotation angle in
//! degrees. The ledger is written once, after every fragment image exists,
//! and never modified afterwards.

use crate::geometry::Point;
use crate::io::configuration::{FRAGMENT_PREFIX, MIN_INDEX_WIDTH};
use crate::io::error::{FragmentationError, Result, file_system_error};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Everything needed to put one fragment image back in place
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentRecord {
    /// Fragment identifier, also the image file stem
    pub id: String,
    /// Logical fragment position
    pub anchor: Point<f64>,
    /// Top-left of the stored (rotated) image in source coordinates
    pub offset: Point<i64>,
    /// Rotation applied to the stored image, degrees in `[0, 360)`
    pub angle: f64,
}

impl fmt::Display for FragmentRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}; {}; {}",
            self.id, self.anchor, self.offset, self.angle
        )
    }
}

impl FromStr for FragmentRecord {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let (id, rest) = line
            .split_once(':')
            .ok_or_else(|| "missing ':' after identifier".to_string())?;
        let id = id.trim();
        if id.is_empty() {
            return Err("empty identifier".to_string());
        }

        let fields: Vec<&str> = rest.split(';').map(str::trim).collect();
        let [anchor, offset, angle] = fields.as_slice() else {
            return Err(format!("expected 3 ';'-separated fields, found {}", fields.len()));
        };

        let angle: f64 = angle
            .parse()
            .map_err(|e| format!("invalid angle '{angle}': {e}"))?;

        Ok(Self {
            id: id.to_string(),
            anchor: parse_tuple(anchor)?,
            offset: parse_tuple(offset)?,
            angle,
        })
    }
}

/// Parse `"(a, b)"` into a point
fn parse_tuple<T: FromStr>(text: &str) -> std::result::Result<Point<T>, String>
where
    T::Err: fmt::Display,
{
    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| format!("expected parenthesised pair, found '{text}'"))?;
    let (x, y) = inner
        .split_once(',')
        .ok_or_else(|| format!("expected two comma-separated numbers in '{text}'"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<T>()
            .map_err(|e| format!("invalid number '{}': {e}", part.trim()))
    };
    Ok(Point::new(parse(x)?, parse(y)?))
}

/// Identifier of fragment `index` in a dataset of `total` fragments
///
/// Indices are zero-padded to the width of the largest index, at least
/// [`MIN_INDEX_WIDTH`] digits.
pub fn fragment_id(index: usize, total: usize) -> String {
    let width = total
        .saturating_sub(1)
        .to_string()
        .len()
        .max(MIN_INDEX_WIDTH);
    format!("{FRAGMENT_PREFIX}{index:0width$}")
}

/// Render records in ledger format
pub fn format_ledger(records: &[FragmentRecord]) -> String {
    records.iter().map(|r| format!("{r}\n\n")).collect()
}

/// Parse ledger text, skipping blank lines
///
/// # Errors
///
/// Returns an error for the first line that is not a valid record
pub fn parse_ledger(text: &str) -> Result<Vec<FragmentRecord>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            line.trim()
                .parse()
                .map_err(|reason| FragmentationError::LedgerSyntax {
                    line: number + 1,
                    content: line.to_string(),
                    reason,
                })
        })
        .collect()
}

/// Read and parse a ledger file
///
/// # Errors
///
/// Returns an error if the file cannot be read or a line is malformed
pub fn read_ledger(path: &Path) -> Result<Vec<FragmentRecord>> {
    let text = fs::read_to_string(path).map_err(|e| file_system_error(path, "read ledger", e))?;
    parse_ledger(&text)
}

/// Write a complete ledger in one go
///
/// The text goes to a sibling `.partial` file first and is renamed into place
/// once flushed, so readers never see a half-written ledger.
///
/// # Errors
///
/// Returns an error if the file cannot be written or renamed
pub fn write_ledger(path: &Path, records: &[FragmentRecord]) -> Result<()> {
    let partial = path.with_extension("partial");
    {
        let file = File::create(&partial).map_err(|e| file_system_error(&partial, "create", e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(format_ledger(records).as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| file_system_error(&partial, "write ledger", e))?;
    }
    fs::rename(&partial, path).map_err(|e| file_system_error(path, "rename ledger", e))
}
