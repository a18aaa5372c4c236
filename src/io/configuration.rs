//! Pipeline constants and run configuration
//!
//! Runs are configured from a plain parameter file with one `key: value`
//! pair per line. The same format is used for the `fragmentation_info.txt`
//! written into every dataset, so a dataset's parameters can be fed back in
//! to regenerate it.

use crate::fragment::erosion::ErosionParameters;
use crate::io::error::{FragmentationError, Result, file_system_error, invalid_parameter};
use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::Path;

// Default values for configurable parameters
/// Fixed seed for reproducible datasets
pub const DEFAULT_SEED: u64 = 1000;
/// Number of sites requested per image
pub const DEFAULT_NUM_FRAGMENTS: usize = 500;
/// Minimum distance; sites end up at least twice this far apart
pub const DEFAULT_MIN_DISTANCE: u32 = 6;
/// Percentage of fragments discarded after combination
pub const DEFAULT_REMOVAL_PERCENTAGE: f64 = 20.0;
/// Chance that a fragment gets its outline chipped
pub const DEFAULT_EROSION_PROBABILITY: f64 = 0.6;
/// Chip size as a percentage of the fragment extent
pub const DEFAULT_EROSION_PERCENTAGE: f64 = 30.0;

// Bounded retries
/// Consecutive rejected draws after which site placement gives up
pub const SITE_REJECTION_LIMIT: usize = 100_000;

// Degradation calibration
/// Largest side of the chipping structuring element
pub const MAX_EROSION_KERNEL: usize = 25;
/// Range of the saturation scale factor
pub const SATURATION_FADE_RANGE: (f32, f32) = (0.5, 1.0);
/// Range of the value scale factor
pub const VALUE_FADE_RANGE: (f32, f32) = (0.8, 1.0);
/// Opacity of the grayscale backdrop under a reconstruction
pub const BACKDROP_ALPHA: u8 = 128;

// Dataset layout
/// Folder holding the parameter record and the ledger
pub const RESOURCES_DIR: &str = "resources";
/// Folder holding fragment images
pub const FRAGMENTS_DIR: &str = "fragments";
/// Parameters used for a run
pub const FRAGMENTATION_INFO_FILE: &str = "fragmentation_info.txt";
/// Placement ledger
pub const LEDGER_FILE: &str = "fragment_info.txt";
/// Reconstruction output inside a dataset folder
pub const RECONSTRUCTION_FILE: &str = "ricostructed_image.png";
/// Parameter template written on request
pub const TEMPLATE_FILE: &str = "example_info.txt";
/// Prefix of fragment identifiers and file names
pub const FRAGMENT_PREFIX: &str = "fragment_";
/// Minimum number of digits in a fragment index
pub const MIN_INDEX_WIDTH: usize = 4;
/// Timestamp appended to the image stem to name a run folder
pub const RUN_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";
/// Numbered suffixes tried before giving up on a taken run folder name
pub const RUN_FOLDER_ATTEMPTS: u32 = 100;
/// Input extensions picked up when the target is a directory
pub const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;

/// Parameters of one fragmentation run
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentationConfig {
    /// Master seed; `None` draws one per run
    pub seed: Option<u64>,
    /// Sites per image; `None` uses `⌊√(width·height)⌋`
    pub num_fragments: Option<usize>,
    /// Sites are placed at least twice this far apart
    pub min_distance: u32,
    /// Percentage of fragments dropped, `[0, 100]`
    pub removal_percentage: f64,
    /// Chance of chipping a fragment, `[0, 1]`
    pub erosion_probability: f64,
    /// Chip size percentage, `[0, 100]`
    pub erosion_percentage: f64,
    /// Number of fused pairs; `None` draws from `[1, ⌊√N⌋]`
    pub combined_fragments: Option<usize>,
}

impl Default for FragmentationConfig {
    fn default() -> Self {
        Self {
            seed: Some(DEFAULT_SEED),
            num_fragments: Some(DEFAULT_NUM_FRAGMENTS),
            min_distance: DEFAULT_MIN_DISTANCE,
            removal_percentage: DEFAULT_REMOVAL_PERCENTAGE,
            erosion_probability: DEFAULT_EROSION_PROBABILITY,
            erosion_percentage: DEFAULT_EROSION_PERCENTAGE,
            combined_fragments: None,
        }
    }
}

impl FragmentationConfig {
    /// Read a parameter file, starting from the defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, a line is malformed,
    /// a key is unknown, or the resulting values are out of range
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| file_system_error(path, "read parameter file", e))?;
        Self::parse(&text, path)
    }

    /// Parse parameter text; `origin` is only used in error messages
    ///
    /// Blank lines and lines starting with `#` are skipped. Keys not present
    /// keep their default value.
    ///
    /// # Errors
    ///
    /// Returns an error if a line is malformed, a key is unknown, or the
    /// resulting values are out of range
    pub fn parse(text: &str, origin: &Path) -> Result<Self> {
        let mut config = Self::default();

        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let syntax = |reason: String| FragmentationError::ConfigSyntax {
                path: origin.to_path_buf(),
                line: number + 1,
                reason,
            };

            let (key, value) = line
                .split_once(':')
                .ok_or_else(|| syntax("expected 'key: value'".to_string()))?;
            let (key, value) = (key.trim(), value.trim());

            match key {
                "seed" => config.seed = parse_optional(value).map_err(syntax)?,
                "num_fragments" => config.num_fragments = parse_optional(value).map_err(syntax)?,
                "combined_fragments" => {
                    config.combined_fragments = parse_optional(value).map_err(syntax)?;
                }
                "min_distance" => config.min_distance = parse_value(value).map_err(syntax)?,
                "removal_percentage" => {
                    config.removal_percentage = parse_value(value).map_err(syntax)?;
                }
                "erosion_probability" => {
                    config.erosion_probability = parse_value(value).map_err(syntax)?;
                }
                "erosion_percentage" => {
                    config.erosion_percentage = parse_value(value).map_err(syntax)?;
                }
                other => return Err(syntax(format!("unknown key '{other}'"))),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check every parameter against its allowed range
    ///
    /// # Errors
    ///
    /// Returns an error naming the first parameter out of range
    pub fn validate(&self) -> Result<()> {
        if self.num_fragments == Some(0) {
            return Err(invalid_parameter(
                "num_fragments",
                &0,
                &"at least one fragment is required",
            ));
        }
        if self.combined_fragments == Some(0) {
            return Err(invalid_parameter(
                "combined_fragments",
                &0,
                &"omit the key to draw the count instead",
            ));
        }
        if !(0.0..=100.0).contains(&self.removal_percentage) {
            return Err(invalid_parameter(
                "removal_percentage",
                &self.removal_percentage,
                &"must be within [0, 100]",
            ));
        }
        self.erosion_parameters().validate()
    }

    /// Erosion settings derived from this configuration
    pub const fn erosion_parameters(&self) -> ErosionParameters {
        ErosionParameters {
            min_distance: self.min_distance,
            probability: self.erosion_probability,
            percentage: self.erosion_percentage,
        }
    }

    /// Render as parameter file text
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        let _ = writeln!(text, "seed: {}", format_optional(self.seed));
        let _ = writeln!(text, "num_fragments: {}", format_optional(self.num_fragments));
        let _ = writeln!(text, "min_distance: {}", self.min_distance);
        let _ = writeln!(text, "removal_percentage: {}", self.removal_percentage);
        let _ = writeln!(text, "erosion_probability: {}", self.erosion_probability);
        let _ = writeln!(text, "erosion_percentage: {}", self.erosion_percentage);
        if let Some(count) = self.combined_fragments {
            let _ = writeln!(text, "combined_fragments: {count}");
        }
        text
    }

    /// Write as a parameter file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| file_system_error(path, "create", e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(self.to_text().as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| file_system_error(path, "write parameter file", e))
    }
}

fn parse_value<T: std::str::FromStr>(value: &str) -> std::result::Result<T, String>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| format!("invalid value '{value}': {e}"))
}

fn parse_optional<T: std::str::FromStr>(value: &str) -> std::result::Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    if value.eq_ignore_ascii_case("none") || value.is_empty() {
        Ok(None)
    } else {
        parse_value(value).map(Some)
    }
}

fn format_optional<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "none".to_string(), |v| v.to_string())
}
