//! pvmapper CLI - headless access to PV module thermal datasets.
//!
//! Lists sources and columns, prints map payloads, renders source frames
//! with the module overlay and runs the module temperature analysis.
#![allow(clippy::uninlined_format_args, clippy::too_many_lines)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use pvmapper_algorithms::ModuleTemperatureConfig;
use pvmapper_core::{Palette, MODULE_LAYOUT};
use pvmapper_io::is_valid_dataset;
use pvmapper_viewer::{
    default_analysis_name, render_frame, AnalysisJobRunner, DatasetModel, FrameSettings, JobState,
    MapBridge, MapSettings,
};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Core(#[from] pvmapper_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("{} is not a dataset (needs mapping, patches, patches_final and splitted)", .0.display())]
    InvalidDataset(PathBuf),

    #[error("source has no column {0:?}")]
    UnknownColumn(String),

    #[error("analysis did not complete: {0}")]
    Job(String),
}

/// Palette selection.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum PaletteArg {
    /// Grayscale (no palette)
    Gray,
    /// Plasma
    Plasma,
    /// Jet
    Jet,
    /// Viridis
    Viridis,
    /// Reds
    Reds,
}

impl From<PaletteArg> for Palette {
    fn from(arg: PaletteArg) -> Self {
        match arg {
            PaletteArg::Gray => Palette::Gray,
            PaletteArg::Plasma => Palette::Plasma,
            PaletteArg::Jet => Palette::Jet,
            PaletteArg::Viridis => Palette::Viridis,
            PaletteArg::Reds => Palette::Reds,
        }
    }
}

/// Inspection tool for thermal PV module datasets.
#[derive(Parser)]
#[command(name = "pvmapper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a summary of a dataset
    Info {
        /// Dataset directory
        dataset: PathBuf,
    },

    /// List the selectable sources
    Sources {
        /// Dataset directory
        dataset: PathBuf,
    },

    /// List the columns of a source
    Columns {
        /// Dataset directory
        dataset: PathBuf,

        /// Source name
        #[arg(short, long, default_value = MODULE_LAYOUT)]
        source: String,
    },

    /// Print the map renderer payload (features and colors) as JSON
    MapData {
        /// Dataset directory
        dataset: PathBuf,

        /// Source name
        #[arg(short, long, default_value = MODULE_LAYOUT)]
        source: String,

        /// Column to color by (first column if omitted)
        #[arg(short, long)]
        column: Option<String>,

        /// Palette
        #[arg(long, value_enum, default_value = "plasma")]
        palette: PaletteArg,

        /// Value mapped to the low end of the palette
        #[arg(long, default_value = "-5.0", allow_hyphen_values = true)]
        vmin: f64,

        /// Value mapped to the high end of the palette
        #[arg(long, default_value = "5.0", allow_hyphen_values = true)]
        vmax: f64,
    },

    /// Render the source frame of a module patch to PNG
    Render {
        /// Dataset directory
        dataset: PathBuf,

        /// Module track id
        #[arg(short, long)]
        track: String,

        /// Patch index within the module
        #[arg(short, long, default_value = "0")]
        patch: usize,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,

        /// Temperature mapped to the low end (°C)
        #[arg(long, default_value = "30.0", allow_hyphen_values = true)]
        min_temp: f64,

        /// Temperature mapped to the high end (°C)
        #[arg(long, default_value = "50.0", allow_hyphen_values = true)]
        max_temp: f64,

        /// Palette
        #[arg(long, value_enum, default_value = "gray")]
        palette: PaletteArg,
    },

    /// Compute module temperatures into a new analysis source
    Analyze {
        /// Dataset directory
        dataset: PathBuf,

        /// Analysis name (defaults to "Analysis <UTC timestamp>")
        #[arg(short, long)]
        name: Option<String>,

        /// Pixels ignored on every side of a patch
        #[arg(long, default_value = "5")]
        border_margin: u32,

        /// Neighborhood radius in meters
        #[arg(long, default_value = "7.0")]
        neighbor_radius: f64,
    },

    /// Delete an analysis source
    Delete {
        /// Dataset directory
        dataset: PathBuf,

        /// Analysis name
        name: String,
    },
}

fn open_dataset(path: &Path) -> Result<DatasetModel> {
    if !is_valid_dataset(path) {
        return Err(CliError::InvalidDataset(path.to_path_buf()));
    }
    let mut model = DatasetModel::new();
    model.open(path)?;
    Ok(model)
}

fn open_source(path: &Path, source: &str) -> Result<DatasetModel> {
    let mut model = open_dataset(path)?;
    if source != MODULE_LAYOUT {
        model.select_source(source)?;
    }
    Ok(model)
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { dataset } => {
            let model = open_dataset(&dataset)?;
            let modules = model.features().map_or(0, |f| f.len());
            let patches = model.geometry().map_or(0, |g| g.len());
            println!("Dataset:  {}", dataset.display());
            println!("Modules:  {}", modules);
            println!("Patches:  {}", patches);
            println!("Analyses: {}", model.source_names().len().saturating_sub(1));
        }

        Commands::Sources { dataset } => {
            let model = open_dataset(&dataset)?;
            for name in model.source_names() {
                println!("{}", name);
            }
        }

        Commands::Columns { dataset, source } => {
            let model = open_source(&dataset, &source)?;
            if let Some(label) = model.value_label().filter(|l| !l.is_empty()) {
                eprintln!("Values: {}", label);
            }
            for name in model.column_names() {
                println!("{}", name);
            }
        }

        Commands::MapData {
            dataset,
            source,
            column,
            palette,
            vmin,
            vmax,
        } => {
            let mut model = open_source(&dataset, &source)?;
            if let Some(column) = column {
                let index = model
                    .column_names()
                    .iter()
                    .position(|name| *name == column)
                    .ok_or(CliError::UnknownColumn(column))?;
                model.set_selected_column(Some(index));
            }
            let bridge = MapBridge::new(MapSettings {
                palette: palette.into(),
                vmin,
                vmax,
            });
            println!("{}", serde_json::to_string_pretty(&bridge.load_data(&model))?);
        }

        Commands::Render {
            dataset,
            track,
            patch,
            output,
            min_temp,
            max_temp,
            palette,
        } => {
            let model = open_dataset(&dataset)?;
            let (Some(layout), Some(geometry)) = (model.layout(), model.geometry()) else {
                return Err(CliError::InvalidDataset(dataset));
            };
            let settings = FrameSettings {
                min_temp,
                max_temp,
                palette: palette.into(),
            };
            let frame = render_frame(layout, &geometry, &track, patch, &settings)?;
            frame.image.save(&output)?;
            eprintln!(
                "Rendered frame {} for patch {} of {} ({}/{}) to {}",
                frame.frame_index,
                frame.patch,
                track,
                patch + 1,
                frame.patch_count,
                output.display()
            );
        }

        Commands::Analyze {
            dataset,
            name,
            border_margin,
            neighbor_radius,
        } => {
            let mut model = open_dataset(&dataset)?;
            let name = name.unwrap_or_else(default_analysis_name);
            let config = ModuleTemperatureConfig {
                border_margin,
                neighbor_radius,
            };

            let mut runner = AnalysisJobRunner::new();
            runner.start(&model, &name, config)?;
            log::info!("analyzing {} into {:?}", dataset.display(), name);
            while runner.is_running() {
                if runner.poll(&mut model) {
                    if let JobState::Running { .. } = runner.state() {
                        eprint!("\r{:<78}", runner.state().to_string());
                    }
                }
                std::thread::sleep(Duration::from_millis(100));
            }
            eprintln!();

            match runner.state() {
                JobState::Completed { name } => {
                    log::info!("analysis {:?} completed", name);
                    println!("{}", name);
                }
                other => return Err(CliError::Job(other.to_string())),
            }
        }

        Commands::Delete { dataset, name } => {
            let mut model = open_dataset(&dataset)?;
            if name == MODULE_LAYOUT {
                eprintln!("\"{}\" cannot be deleted", MODULE_LAYOUT);
            } else if !model.source_names().contains(&name) {
                return Err(pvmapper_core::Error::NotFound(format!("source {:?}", name)).into());
            } else {
                log::info!("deleting analysis {:?} from {}", name, dataset.display());
                model.delete_source(Some(name.as_str()))?;
                eprintln!("Deleted {}", name);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_map_data_defaults() {
        let cli = Cli::try_parse_from(["pvmapper", "map-data", "/data"]).unwrap();
        let Commands::MapData {
            source,
            column,
            vmin,
            vmax,
            ..
        } = cli.command
        else {
            panic!("expected map-data");
        };
        assert_eq!(source, MODULE_LAYOUT);
        assert!(column.is_none());
        assert!((vmin + 5.0).abs() < f64::EPSILON);
        assert!((vmax - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invalid_dataset_is_rejected() {
        let dir = std::env::temp_dir().join("pvmapper-cli-not-a-dataset");
        assert!(matches!(
            open_dataset(&dir),
            Err(CliError::InvalidDataset(_))
        ));
    }
}
