//! Dataset folder layout, writing and integrity checks
//!
//! ```text
//! <output_dir>/<image-stem>-<timestamp>/
//!   resources/fragmentation_info.txt
//!   resources/fragment_info.txt
//!   fragments/fragment_<NNNN>.png
//!   ricostructed_image.png
//! ```

use crate::fragment::Fragment;
use crate::io::configuration::{
    FRAGMENTATION_INFO_FILE, FRAGMENTS_DIR, FragmentationConfig, LEDGER_FILE,
    RECONSTRUCTION_FILE, RESOURCES_DIR, RUN_FOLDER_ATTEMPTS, RUN_TIMESTAMP_FORMAT,
};
use crate::io::error::{FragmentationError, Result, file_system_error};
use crate::io::image::save_png;
use crate::io::ledger::{FragmentRecord, fragment_id, read_ledger, write_ledger};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Paths of one dataset folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    /// Dataset root
    pub root: PathBuf,
    /// Parameter record and ledger folder
    pub resources: PathBuf,
    /// Fragment image folder
    pub fragments: PathBuf,
}

impl RunLayout {
    /// Layout of an existing or future dataset rooted at `root`
    pub fn at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            resources: root.join(RESOURCES_DIR),
            fragments: root.join(FRAGMENTS_DIR),
        }
    }

    /// Layout for an image, named `<stem>-<timestamp>` under `output_dir`
    pub fn for_image(output_dir: &Path, image_path: &Path, timestamp: &str) -> Self {
        let stem = image_path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Self::at(&output_dir.join(format!("{stem}-{timestamp}")))
    }

    /// Create a fresh dataset folder for an image, numbering the name if taken
    ///
    /// Images sharing a stem (`vase.png`, `vase.jpg`) processed within the
    /// same second would otherwise claim the same `<stem>-<timestamp>`
    /// folder; later claimants get `<stem>-<timestamp>-2`, `-3` and so on.
    ///
    /// # Errors
    ///
    /// Returns an error if every candidate name is taken or a folder cannot
    /// be created
    pub fn create_for_image(
        output_dir: &Path,
        image_path: &Path,
        timestamp: &str,
    ) -> Result<Self> {
        let mut layout = Self::for_image(output_dir, image_path, timestamp);
        for attempt in 2..=RUN_FOLDER_ATTEMPTS {
            match layout.create() {
                Err(FragmentationError::RunFolderExists { path }) => {
                    warn!(path = %path.display(), attempt, "run folder taken, numbering");
                    let numbered = format!("{timestamp}-{attempt}");
                    layout = Self::for_image(output_dir, image_path, &numbered);
                }
                created => return created.map(|()| layout),
            }
        }
        layout.create().map(|()| layout)
    }

    /// Create the dataset folders
    ///
    /// # Errors
    ///
    /// Returns an error if the root already exists or a folder cannot be
    /// created
    pub fn create(&self) -> Result<()> {
        if let Some(parent) = self.root.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| file_system_error(parent, "create output directory", e))?;
            }
        }
        fs::create_dir(&self.root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                FragmentationError::RunFolderExists {
                    path: self.root.clone(),
                }
            } else {
                file_system_error(&self.root, "create run folder", e)
            }
        })?;
        for dir in [&self.resources, &self.fragments] {
            fs::create_dir(dir).map_err(|e| file_system_error(dir, "create directory", e))?;
        }
        info!(path = %self.root.display(), "created dataset folder");
        Ok(())
    }

    /// Parameter record path
    pub fn parameters_path(&self) -> PathBuf {
        self.resources.join(FRAGMENTATION_INFO_FILE)
    }

    /// Ledger path
    pub fn ledger_path(&self) -> PathBuf {
        self.resources.join(LEDGER_FILE)
    }

    /// Image path of a fragment identifier
    pub fn fragment_path(&self, id: &str) -> PathBuf {
        self.fragments.join(format!("{id}.png"))
    }

    /// Reconstruction output path
    pub fn reconstruction_path(&self) -> PathBuf {
        self.root.join(RECONSTRUCTION_FILE)
    }
}

/// Current local time formatted for run folder names
pub fn run_timestamp() -> String {
    chrono::Local::now().format(RUN_TIMESTAMP_FORMAT).to_string()
}

/// Write the fragment images, then the parameter record and the ledger
///
/// The ledger is written last and in one piece, so a failure part way
/// through leaves fragment images without a ledger rather than a ledger
/// pointing at missing images.
///
/// # Errors
///
/// Returns an error if any image or text file cannot be written
pub fn write_dataset(
    layout: &RunLayout,
    fragments: &[Fragment],
    parameters: &FragmentationConfig,
) -> Result<Vec<FragmentRecord>> {
    let mut records = Vec::with_capacity(fragments.len());

    for (index, fragment) in fragments.iter().enumerate() {
        let id = fragment_id(index, fragments.len());
        save_png(&fragment.pixels, &layout.fragment_path(&id))?;
        records.push(FragmentRecord {
            id,
            anchor: fragment.anchor,
            offset: fragment.offset,
            angle: fragment.rotation,
        });
    }
    debug!(count = records.len(), "fragment images written");

    parameters.write_to(&layout.parameters_path())?;
    write_ledger(&layout.ledger_path(), &records)?;
    info!(
        fragments = records.len(),
        ledger = %layout.ledger_path().display(),
        "dataset written"
    );

    Ok(records)
}

/// Identifiers of the fragment images in a folder, sorted
///
/// # Errors
///
/// Returns an error if the folder cannot be listed
pub fn fragment_image_ids(folder: &Path) -> Result<BTreeSet<String>> {
    let mut ids = BTreeSet::new();
    let entries = fs::read_dir(folder).map_err(|e| file_system_error(folder, "list", e))?;
    for entry in entries {
        let path = entry.map_err(|e| file_system_error(folder, "list", e))?.path();
        if path.is_file() && crate::io::image::has_extension(&path, &["png"]) {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                ids.insert(stem.to_string());
            }
        }
    }
    Ok(ids)
}

/// Outcome of a dataset integrity check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Records whose image is present
    pub paired: usize,
    /// Records without an image
    pub missing_images: Vec<String>,
    /// Images without a record
    pub unrecorded_images: Vec<String>,
}

impl IntegrityReport {
    /// Whether every record and image pair up
    pub fn is_consistent(&self) -> bool {
        self.missing_images.is_empty() && self.unrecorded_images.is_empty()
    }
}

/// Compare a dataset's ledger with its fragment folder
///
/// # Errors
///
/// Returns an error if the ledger cannot be read or the folder listed
pub fn check_integrity(layout: &RunLayout) -> Result<IntegrityReport> {
    let records = read_ledger(&layout.ledger_path())?;
    let images = fragment_image_ids(&layout.fragments)?;
    let recorded: BTreeSet<&str> = records.iter().map(|r| r.id.as_str()).collect();

    let mut report = IntegrityReport::default();
    for record in &records {
        if images.contains(&record.id) {
            report.paired += 1;
        } else {
            report.missing_images.push(record.id.clone());
        }
    }
    report.unrecorded_images = images
        .iter()
        .filter(|id| !recorded.contains(id.as_str()))
        .cloned()
        .collect();

    for id in &report.missing_images {
        warn!(id = %id, "ledger record has no fragment image");
    }
    for id in &report.unrecorded_images {
        warn!(id = %id, "fragment image has no ledger record");
    }
    Ok(report)
}

/// Fail unless the ledger and fragment folder of a dataset pair up exactly
///
/// # Errors
///
/// Returns a data integrity error listing the mismatched identifiers, or
/// any error from [`check_integrity`]
pub fn verify_dataset(layout: &RunLayout) -> Result<IntegrityReport> {
    let report = check_integrity(layout)?;
    if report.is_consistent() {
        Ok(report)
    } else {
        Err(FragmentationError::DataIntegrity {
            path: layout.root.clone(),
            reason: format!(
                "records without images: [{}]; images without records: [{}]",
                report.missing_images.join(", "),
                report.unrecorded_images.join(", ")
            ),
        })
    }
}
