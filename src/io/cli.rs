//! Command-line interface for generating, reconstructing and verifying datasets

use crate::io::configuration::{FragmentationConfig, IMAGE_EXTENSIONS, TEMPLATE_FILE};
use crate::io::error::{Result, WithContext, file_system_error, invalid_parameter};
use crate::io::image::has_extension;
use crate::io::output::{RunLayout, verify_dataset};
use crate::io::progress::{ProgressManager, ProgressReporter, SilentProgress};
use crate::pipeline::executor::{Dataset, Fragmenter, StageOptions};
use crate::pipeline::reconstruction::reconstruct_dataset;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{Level, info};

#[derive(Parser)]
#[command(name = "shardset")]
#[command(
    author,
    version,
    about = "Generate synthetic image fragment datasets for reassembly research"
)]
/// Command-line arguments for the dataset tool
pub struct Cli {
    /// Operation to run
    #[command(subcommand)]
    pub command: Command,

    /// Log stage progress and written files
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Default log level when `RUST_LOG` is not set
    pub const fn log_level(&self) -> Level {
        if self.verbose { Level::INFO } else { Level::WARN }
    }
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Fragment an image, or every image in a directory, into datasets
    Generate(GenerateArgs),
    /// Rebuild an image from one of its datasets
    Reconstruct(ReconstructArgs),
    /// Check that a dataset's ledger and fragment images match
    Verify(VerifyArgs),
}

/// Arguments of `generate`
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
#[derive(Args)]
pub struct GenerateArgs {
    /// Input image or directory of images
    #[arg(value_name = "TARGET")]
    pub target: PathBuf,

    /// Directory receiving one run folder per image
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Parameter file (`key: value` per line)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Random seed, overriding the parameter file
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Number of sites per image, overriding the parameter file
    #[arg(short = 'n', long)]
    pub fragments: Option<usize>,

    /// Minimum site distance, overriding the parameter file
    #[arg(short = 'd', long)]
    pub min_distance: Option<u32>,

    /// Number of fragment pairs to fuse, overriding the parameter file
    #[arg(short = 'k', long)]
    pub combine: Option<usize>,

    /// Skip edge erosion and colour fading
    #[arg(long)]
    pub no_erosion: bool,

    /// Skip random rotation; fragments are stored upright
    #[arg(long)]
    pub no_rotation: bool,

    /// Reconstruct each dataset right after writing it
    #[arg(short, long)]
    pub reconstruct: bool,

    /// Write a parameter template into the output directory if none exists
    #[arg(long)]
    pub write_template: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

impl GenerateArgs {
    /// Parameter file values (or defaults) with command-line overrides applied
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter file cannot be read or parsed, or if
    /// an overridden value is out of range
    pub fn resolve_config(&self) -> Result<FragmentationConfig> {
        let mut config = match &self.config {
            Some(path) => FragmentationConfig::from_file(path)?,
            None => FragmentationConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(count) = self.fragments {
            config.num_fragments = Some(count);
        }
        if let Some(distance) = self.min_distance {
            config.min_distance = distance;
        }
        if let Some(pairs) = self.combine {
            config.combined_fragments = Some(pairs);
        }
        config.validate()?;
        Ok(config)
    }

    /// Optional stages enabled by the flags
    pub const fn stage_options(&self) -> StageOptions {
        StageOptions {
            erode: !self.no_erosion,
            rotate: !self.no_rotation,
        }
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Arguments of `reconstruct`
#[derive(Args)]
pub struct ReconstructArgs {
    /// Original image the dataset was generated from
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// Dataset folder produced by `generate`
    #[arg(value_name = "DATASET_DIR")]
    pub dataset_dir: PathBuf,

    /// Suppress the summary line
    #[arg(short, long)]
    pub quiet: bool,
}

/// Arguments of `verify`
#[derive(Args)]
pub struct VerifyArgs {
    /// Dataset folder produced by `generate`
    #[arg(value_name = "DATASET_DIR")]
    pub dataset_dir: PathBuf,
}

/// Input images named by a target: the file itself, or the supported
/// images directly inside a directory, sorted by path
///
/// # Errors
///
/// Returns an error if the target is missing, is a file with an unsupported
/// extension, or the directory cannot be listed
pub fn collect_images(target: &Path) -> Result<Vec<PathBuf>> {
    if target.is_file() {
        if has_extension(target, &IMAGE_EXTENSIONS) {
            Ok(vec![target.to_path_buf()])
        } else {
            Err(invalid_parameter(
                "target",
                &target.display(),
                &format!("expected one of: {}", IMAGE_EXTENSIONS.join(", ")),
            ))
        }
    } else if target.is_dir() {
        let mut files = Vec::new();
        let entries =
            std::fs::read_dir(target).map_err(|e| file_system_error(target, "list", e))?;
        for entry in entries {
            let path = entry.map_err(|e| file_system_error(target, "list", e))?.path();
            if path.is_file() && has_extension(&path, &IMAGE_EXTENSIONS) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    } else {
        Err(invalid_parameter(
            "target",
            &target.display(),
            &"must be an image file or a directory",
        ))
    }
}

/// Orchestrates dataset generation for every image of a target
pub struct FileProcessor {
    args: GenerateArgs,
    fragmenter: Fragmenter,
    progress_manager: Option<ProgressManager>,
}

impl FileProcessor {
    /// Create a processor for the given `generate` arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be resolved
    pub fn new(args: GenerateArgs) -> Result<Self> {
        let fragmenter = Fragmenter::new(args.resolve_config()?, args.stage_options())?;
        let progress_manager = args.should_show_progress().then(ProgressManager::new);

        Ok(Self {
            args,
            fragmenter,
            progress_manager,
        })
    }

    /// Generate a dataset for every input image, in sorted order
    ///
    /// # Errors
    ///
    /// Returns the first error raised by any image; datasets already
    /// written stay on disk
    pub fn process(&mut self) -> Result<Vec<Dataset>> {
        let images = collect_images(&self.args.target)?;
        if images.is_empty() {
            info!(target = %self.args.target.display(), "no images to process");
            return Ok(Vec::new());
        }

        if self.args.write_template {
            self.write_template()?;
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(images.len());
        }

        let mut datasets = Vec::with_capacity(images.len());
        for (index, image) in images.iter().enumerate() {
            datasets.push(self.process_image(index, image)?);
        }

        if let Some(ref pm) = self.progress_manager {
            pm.finish();
        }

        Ok(datasets)
    }

    fn process_image(&mut self, index: usize, image: &Path) -> Result<Dataset> {
        let mut silent = SilentProgress;
        let progress: &mut dyn ProgressReporter = match self.progress_manager {
            Some(ref mut pm) => pm,
            None => &mut silent,
        };

        progress.start_image(index, image);
        let dataset = self
            .fragmenter
            .generate_dataset(image, &self.args.output_dir, progress)?;
        if self.args.reconstruct {
            reconstruct_dataset(image, &dataset.layout.root)?;
        }
        progress.finish_image(index);

        info!(
            image = %image.display(),
            dataset = %dataset.layout.root.display(),
            fragments = dataset.records.len(),
            "dataset generated"
        );
        Ok(dataset)
    }

    fn write_template(&self) -> Result<()> {
        let path = self.args.output_dir.join(TEMPLATE_FILE);
        if path.exists() {
            return Ok(());
        }
        std::fs::create_dir_all(&self.args.output_dir)
            .map_err(|e| file_system_error(&self.args.output_dir, "create output directory", e))?;
        FragmentationConfig::default().write_to(&path)?;
        info!(path = %path.display(), "parameter template written");
        Ok(())
    }
}

/// Run the parsed command line
///
/// # Errors
///
/// Returns the error of the failing subcommand
// Allow print for the user-facing summary of each subcommand
#[allow(clippy::print_stdout)]
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate(args) => {
            let quiet = args.quiet;
            let mut processor = FileProcessor::new(args)?;
            let datasets = processor.process()?;
            if !quiet {
                for dataset in &datasets {
                    println!(
                        "{} ({} fragments)",
                        dataset.layout.root.display(),
                        dataset.records.len()
                    );
                }
            }
        }
        Command::Reconstruct(args) => {
            let reconstruction = reconstruct_dataset(&args.image, &args.dataset_dir)?;
            if !args.quiet {
                println!(
                    "{} ({} painted, {} missing)",
                    RunLayout::at(&args.dataset_dir)
                        .reconstruction_path()
                        .display(),
                    reconstruction.painted,
                    reconstruction.skipped.len()
                );
            }
        }
        Command::Verify(args) => {
            let layout = RunLayout::at(&args.dataset_dir);
            let report = verify_dataset(&layout).in_stage("verify", &args.dataset_dir)?;
            println!(
                "{}: {} fragments consistent",
                args.dataset_dir.display(),
                report.paired
            );
        }
    }
    Ok(())
}
