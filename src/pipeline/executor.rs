use crate::fragment::Fragment;
use crate::fragment::combination::{combine_fragments, draw_combination_count};
use crate::fragment::erosion::erode_fragments;
use crate::fragment::extraction::extract_fragments;
use crate::fragment::removal::remove_fragments;
use crate::fragment::rotation::{draw_angles, rotate_fragments};
use crate::geometry::sites::generate_sites;
use crate::geometry::{Partition, Site};
use crate::io::configuration::FragmentationConfig;
use crate::io::error::{Result, WithContext};
use crate::io::image::load_rgba;
use crate::io::ledger::FragmentRecord;
use crate::io::output::{RunLayout, run_timestamp, write_dataset};
use crate::io::progress::ProgressReporter;
use crate::math::random::{resolve_seed, seeded};
use image::RgbaImage;
use std::path::Path;
use tracing::{debug, info};

/// Stage labels in execution order, as shown by progress reporters
pub const STAGES: [&str; 8] = [
    "sites",
    "partition",
    "extraction",
    "combination",
    "removal",
    "erosion",
    "rotation",
    "persistence",
];

const SITES: usize = 0;
const PARTITION: usize = 1;
const EXTRACTION: usize = 2;
const COMBINATION: usize = 3;
const REMOVAL: usize = 4;
const EROSION: usize = 5;
const ROTATION: usize = 6;
const PERSISTENCE: usize = 7;

fn report(progress: &mut dyn ProgressReporter, stage: usize) {
    progress.stage(stage, STAGES.len(), STAGES.get(stage).copied().unwrap_or(""));
}

/// Optional stages that can be switched off
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StageOptions {
    /// Run edge erosion and colour fading
    pub erode: bool,
    /// Rotate fragments by random angles; when off every angle is 0
    pub rotate: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self {
            erode: true,
            rotate: true,
        }
    }
}

/// In-memory result of fragmenting one image
#[derive(Debug, Clone)]
pub struct FragmentationOutcome {
    /// Seed the run RNG was created from
    pub seed: u64,
    /// Sites in generation order
    pub sites: Vec<Site>,
    /// Number of fused pairs
    pub combined: usize,
    /// Number of fragments discarded by removal
    pub removed: usize,
    /// Surviving fragments in output order
    pub fragments: Vec<Fragment>,
}

/// A dataset written to disk
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Folder layout of the run
    pub layout: RunLayout,
    /// Ledger records in file order
    pub records: Vec<FragmentRecord>,
    /// Parameters recorded in the dataset, with the seed resolved
    pub parameters: FragmentationConfig,
}

/// Runs the fragmentation stages for single images
#[derive(Debug, Clone)]
pub struct Fragmenter {
    config: FragmentationConfig,
    options: StageOptions,
}

impl Fragmenter {
    /// Create a fragmenter after validating the configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a parameter is out of range
    pub fn new(config: FragmentationConfig, options: StageOptions) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, options })
    }

    /// Configuration this fragmenter runs with
    pub const fn config(&self) -> &FragmentationConfig {
        &self.config
    }

    /// Enabled optional stages
    pub const fn options(&self) -> StageOptions {
        self.options
    }

    /// Fragment an image held in memory
    ///
    /// `origin` names the image in errors and logs only.
    ///
    /// # Errors
    ///
    /// Returns an error wrapped with the failing stage name if:
    /// - The sites cannot be placed at the configured separation
    /// - More fused pairs are requested than the fragments allow
    /// - A stage parameter is out of range
    pub fn fragment(
        &self,
        source: &RgbaImage,
        origin: &Path,
        progress: &mut dyn ProgressReporter,
    ) -> Result<FragmentationOutcome> {
        let (width, height) = source.dimensions();
        let seed = resolve_seed(self.config.seed);
        let mut rng = seeded(seed);

        report(progress, SITES);
        let sites = generate_sites(
            width,
            height,
            self.config.num_fragments,
            self.config.min_distance,
            &mut rng,
        )
        .in_stage("sites", origin)?;
        info!(seed, sites = sites.len(), width, height, "sites placed");

        report(progress, PARTITION);
        let partition = Partition::compute(&sites, width, height).in_stage("partition", origin)?;

        report(progress, EXTRACTION);
        let fragments =
            extract_fragments(&partition, &sites, source).in_stage("extraction", origin)?;
        debug!(fragments = fragments.len(), "fragments extracted");

        report(progress, COMBINATION);
        let combined = match self.config.combined_fragments {
            Some(count) => count,
            None => draw_combination_count(fragments.len(), &mut rng),
        };
        let fragments = combine_fragments(fragments, &partition, source, combined, &mut rng)
            .in_stage("combination", origin)?;
        debug!(combined, fragments = fragments.len(), "fragments combined");
        drop(partition);

        report(progress, REMOVAL);
        let before_removal = fragments.len();
        let fragments = remove_fragments(fragments, self.config.removal_percentage, &mut rng)
            .in_stage("removal", origin)?;
        let removed = before_removal - fragments.len();
        debug!(removed, fragments = fragments.len(), "fragments removed");

        report(progress, EROSION);
        let fragments = if self.options.erode {
            erode_fragments(fragments, &self.config.erosion_parameters(), &mut rng)
                .in_stage("erosion", origin)?
        } else {
            debug!("erosion disabled");
            fragments
        };

        report(progress, ROTATION);
        let fragments = if self.options.rotate {
            let angles = draw_angles(fragments.len(), &mut rng);
            rotate_fragments(fragments, &angles)
        } else {
            debug!("rotation disabled");
            fragments
        };

        info!(
            fragments = fragments.len(),
            combined, removed, "fragmentation finished"
        );
        Ok(FragmentationOutcome {
            seed,
            sites,
            combined,
            removed,
            fragments,
        })
    }

    /// Fragment an image file and write the dataset under `output_dir`
    ///
    /// The run folder is created only once fragmentation has succeeded, so
    /// configuration problems never leave an empty folder behind.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The image cannot be loaded
    /// - Any fragmentation stage fails
    /// - No free run folder name is left or the folder cannot be written
    pub fn generate_dataset(
        &self,
        image_path: &Path,
        output_dir: &Path,
        progress: &mut dyn ProgressReporter,
    ) -> Result<Dataset> {
        let source = load_rgba(image_path).in_stage("load", image_path)?;
        let outcome = self.fragment(&source, image_path, progress)?;

        report(progress, PERSISTENCE);
        let layout = RunLayout::create_for_image(output_dir, image_path, &run_timestamp())
            .in_stage("persistence", image_path)?;

        // Record what actually ran so the file regenerates the same dataset
        let parameters = FragmentationConfig {
            seed: Some(outcome.seed),
            num_fragments: Some(outcome.sites.len()),
            ..self.config.clone()
        };
        let records = write_dataset(&layout, &outcome.fragments, &parameters)
            .in_stage("persistence", image_path)?;

        Ok(Dataset {
            layout,
            records,
            parameters,
        })
    }
}
