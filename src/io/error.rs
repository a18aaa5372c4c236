//! Error types and context management for fragmentation runs

use std::fmt;
use std::path::{Path, PathBuf};

/// Broad failure classes a caller can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing parameter, or parameters that cannot be satisfied
    Configuration,
    /// Unreadable, corrupt or unsupported input image
    Input,
    /// Output location unwritable or already taken
    Io,
    /// Ledger and fragment folder disagree
    DataIntegrity,
    /// Internal numerical or shape failure
    Computation,
}

/// Main error type for all fragmentation operations
#[derive(Debug)]
pub enum FragmentationError {
    /// Failed to load an image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image loading error
        source: image::ImageError,
    },

    /// Failed to save an image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image export error
        source: image::ImageError,
    },

    /// Parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Rejection sampling could not place the requested number of sites
    InfeasibleSites {
        /// Number of sites requested
        requested: usize,
        /// Number of sites accepted before the attempt cap was hit
        accepted: usize,
        /// Image width
        width: u32,
        /// Image height
        height: u32,
        /// Minimum separation parameter
        min_distance: u32,
    },

    /// A parameter file line could not be understood
    ConfigSyntax {
        /// Parameter file path
        path: PathBuf,
        /// One-based line number
        line: usize,
        /// What is wrong with the line
        reason: String,
    },

    /// A ledger line does not follow the record grammar
    LedgerSyntax {
        /// One-based line number
        line: usize,
        /// Offending content
        content: String,
        /// What is wrong with the line
        reason: String,
    },

    /// Run folder already exists
    RunFolderExists {
        /// Folder that was about to be created
        path: PathBuf,
    },

    /// Ledger records and fragment images do not pair up
    DataIntegrity {
        /// Dataset folder that was checked
        path: PathBuf,
        /// Description of the mismatch
        reason: String,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Numerical computation produced invalid result
    Computation {
        /// Name of the computation that failed
        operation: &'static str,
        /// Description of the failure
        reason: String,
    },

    /// Failure annotated with the pipeline stage and the file being processed
    Stage {
        /// Stage name
        stage: &'static str,
        /// Image or dataset the stage was working on
        path: PathBuf,
        /// Underlying failure
        source: Box<FragmentationError>,
    },
}

impl FragmentationError {
    /// Classify the failure, looking through stage annotations
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. }
            | Self::InfeasibleSites { .. }
            | Self::ConfigSyntax { .. } => ErrorKind::Configuration,
            Self::ImageLoad { .. } => ErrorKind::Input,
            Self::ImageExport { .. } | Self::RunFolderExists { .. } | Self::FileSystem { .. } => {
                ErrorKind::Io
            }
            Self::LedgerSyntax { .. } | Self::DataIntegrity { .. } => ErrorKind::DataIntegrity,
            Self::Computation { .. } => ErrorKind::Computation,
            Self::Stage { source, .. } => source.kind(),
        }
    }
}

impl fmt::Display for FragmentationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::InfeasibleSites {
                requested,
                accepted,
                width,
                height,
                min_distance,
            } => {
                write!(
                    f,
                    "Cannot place {requested} sites at minimum distance {min_distance} in a {width}x{height} image (placed {accepted})"
                )
            }
            Self::ConfigSyntax { path, line, reason } => {
                write!(
                    f,
                    "Malformed parameter file '{}' at line {line}: {reason}",
                    path.display()
                )
            }
            Self::LedgerSyntax {
                line,
                content,
                reason,
            } => {
                write!(f, "Malformed ledger record at line {line} '{content}': {reason}")
            }
            Self::RunFolderExists { path } => {
                write!(f, "Run folder '{}' already exists", path.display())
            }
            Self::DataIntegrity { path, reason } => {
                write!(f, "Dataset '{}' is inconsistent: {reason}", path.display())
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
            Self::Computation { operation, reason } => {
                write!(f, "Computation error in {operation}: {reason}")
            }
            Self::Stage {
                stage,
                path,
                source,
            } => {
                write!(f, "Stage '{stage}' failed for '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for FragmentationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            Self::Stage { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Convenience type alias for fragmentation results
pub type Result<T> = std::result::Result<T, FragmentationError>;

/// Attaches the stage name and file path to failures
pub trait WithContext<T> {
    /// Wrap an error with the stage that produced it and the file it concerned
    ///
    /// # Errors
    ///
    /// Propagates the original error wrapped in [`FragmentationError::Stage`]
    fn in_stage(self, stage: &'static str, path: &Path) -> Result<T>;
}

impl<T, E> WithContext<T> for std::result::Result<T, E>
where
    E: Into<FragmentationError>,
{
    fn in_stage(self, stage: &'static str, path: &Path) -> Result<T> {
        self.map_err(|e| {
            let error = e.into();
            // One annotation is enough; nested stages would repeat the path
            if matches!(error, FragmentationError::Stage { .. }) {
                error
            } else {
                FragmentationError::Stage {
                    stage,
                    path: path.to_path_buf(),
                    source: Box::new(error),
                }
            }
        })
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> FragmentationError {
    FragmentationError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create a computation error
pub fn computation_error(operation: &'static str, reason: &impl ToString) -> FragmentationError {
    FragmentationError::Computation {
        operation,
        reason: reason.to_string(),
    }
}

/// Create a file system error for a known path
pub fn file_system_error(
    path: &Path,
    operation: &'static str,
    source: std::io::Error,
) -> FragmentationError {
    FragmentationError::FileSystem {
        path: path.to_path_buf(),
        operation,
        source,
    }
}
