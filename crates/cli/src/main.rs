//! TileStack CLI - layer catalog stacking and sampling

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use tilestack_algorithms::sampling::{from_samples, read_predictions, to_samples, write_libsvm};
use tilestack_algorithms::stack::build_and_write;
use tilestack_catalog::{finest_zoom, AnyLayer, CatalogConfig, CatalogHandle};
use tilestack_core::{Error, LayerId, MultibandTileLayer};
use tilestack_parallel::ProcessingMode;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tilestack")]
#[command(author, version, about = "Raster layer catalog: stacking, sampling and reassembly", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Run single-threaded
    #[arg(long, global = true, conflicts_with = "threads")]
    local: bool,

    /// Worker threads (default: one per core)
    #[arg(short = 'j', long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stack layers into one multiband layer: <layer>... <output> <catalog>
    Stack {
        /// Input layer names, then the output layer name, then the catalog path
        #[arg(value_name = "ARGS")]
        args: Vec<String>,
    },
    /// Export per-pixel samples of a layer as LibSVM text
    Samples {
        /// Layer to sample
        layer: String,
        /// Output LibSVM file
        output: PathBuf,
        /// Catalog path
        catalog: PathBuf,
        /// Band used as the label
        #[arg(short, long, default_value = "0")]
        label_band: usize,
        /// Zoom level (default: finest stored)
        #[arg(short, long)]
        zoom: Option<u32>,
    },
    /// Rebuild a layer from `col,row,x,y,value` predictions
    Reassemble {
        /// Predictions CSV file
        predictions: PathBuf,
        /// Layer whose layout the predictions refer to
        template: String,
        /// Output layer name
        output: String,
        /// Catalog path
        catalog: PathBuf,
        /// Zoom level (default: finest stored for the template)
        #[arg(short, long)]
        zoom: Option<u32>,
    },
    /// List the layers of a catalog
    Info {
        /// Catalog path
        catalog: PathBuf,
    },
    /// Delete a layer, or one zoom level of it
    Delete {
        /// Layer name
        layer: String,
        /// Catalog path
        catalog: PathBuf,
        /// Only this zoom level
        #[arg(short, long)]
        zoom: Option<u32>,
    },
}

const STACK_USAGE: &str = "Usage: tilestack stack <layer>... <output> <catalog>";

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn done(name: &str, target: &str, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, target);
    println!("  Processing time: {:.2?}", elapsed);
}

fn processing_mode(local: bool, threads: Option<usize>) -> ProcessingMode {
    match (local, threads) {
        (true, _) => ProcessingMode::Sequential,
        (false, Some(n)) => ProcessingMode::ParallelWith(n),
        (false, None) => ProcessingMode::Parallel,
    }
}

fn open_catalog(path: &Path, mode: ProcessingMode) -> Result<CatalogHandle> {
    let config = CatalogConfig {
        mode,
        ..CatalogConfig::default()
    };
    match CatalogHandle::open(path, config) {
        Ok(handle) => Ok(handle),
        Err(e @ Error::Engine(_)) => {
            error!("{}", e);
            error!("try again with --local to run single-threaded");
            Err(e).context("Failed to configure the execution engine")
        }
        Err(e) => Err(e).with_context(|| format!("Failed to open catalog {}", path.display())),
    }
}

/// Split `<layer>... <output> <catalog>`; `None` if fewer than three values
fn split_stack_args(args: &[String]) -> Option<(&[String], &str, &str)> {
    match args {
        [layers @ .., output, catalog] if !layers.is_empty() => {
            Some((layers, output.as_str(), catalog.as_str()))
        }
        _ => None,
    }
}

fn resolve_zoom(handle: &CatalogHandle, name: &str, zoom: Option<u32>) -> Result<u32> {
    match zoom {
        Some(z) => Ok(z),
        None => finest_zoom(handle.catalog.attributes(), &[name])
            .with_context(|| format!("No zoom levels stored for layer {}", name)),
    }
}

fn describe(layer: &AnyLayer) -> String {
    let md = layer.metadata();
    let (rows, cols) = md.tile_shape();
    format!(
        "{} tiles, {}, {} x {} cells per tile, {}",
        layer.len(),
        md.cell_type,
        cols,
        rows,
        md.crs
    )
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;
    let mode = processing_mode(cli.local, cli.threads);

    match cli.command {
        // ── Stack ────────────────────────────────────────────────────
        Commands::Stack { args } => {
            let Some((layers, output, catalog)) = split_stack_args(&args) else {
                eprintln!("{}", STACK_USAGE);
                std::process::exit(2);
            };
            let handle = open_catalog(Path::new(catalog), mode)?;
            info!("Stacking {} layers with {} engine", layers.len(), mode);

            let pb = spinner("Stacking layers...");
            let start = Instant::now();
            let id = build_and_write(&handle, layers, output).context("Failed to build stack")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();
            done("Stack", &id.to_string(), elapsed);
        }

        // ── Samples ──────────────────────────────────────────────────
        Commands::Samples {
            layer,
            output,
            catalog,
            label_band,
            zoom,
        } => {
            let handle = open_catalog(&catalog, mode)?;
            let id = LayerId::new(layer.as_str(), resolve_zoom(&handle, &layer, zoom)?);

            let pb = spinner("Reading layer...");
            let stacked: MultibandTileLayer = handle
                .catalog
                .read(&id)
                .with_context(|| format!("Failed to read layer {}", id))?;
            pb.finish_and_clear();
            info!("Input: {} tiles", stacked.len());

            let start = Instant::now();
            let samples = to_samples(&stacked, label_band).context("Failed to extract samples")?;
            let file = File::create(&output)
                .with_context(|| format!("Failed to create {}", output.display()))?;
            let written =
                write_libsvm(samples, BufWriter::new(file)).context("Failed to write samples")?;
            let elapsed = start.elapsed();
            info!("{} samples written", written);
            done("Samples", &output.display().to_string(), elapsed);
        }

        // ── Reassemble ───────────────────────────────────────────────
        Commands::Reassemble {
            predictions,
            template,
            output,
            catalog,
            zoom,
        } => {
            let handle = open_catalog(&catalog, mode)?;
            let template_id = LayerId::new(template.as_str(), resolve_zoom(&handle, &template, zoom)?);
            let metadata = handle
                .catalog
                .metadata(&template_id)
                .with_context(|| format!("Failed to read metadata of {}", template_id))?;

            let file = File::open(&predictions)
                .with_context(|| format!("Failed to open {}", predictions.display()))?;
            let values = read_predictions(BufReader::new(file)).context("Failed to parse predictions")?;
            info!("Input: {} predictions", values.len());

            let start = Instant::now();
            let layer = from_samples(&handle.engine, values, &metadata)
                .context("Failed to reassemble tiles")?;
            let id = LayerId::new(output.as_str(), template_id.zoom);
            let pb = spinner("Writing layer...");
            handle
                .catalog
                .write(&id, &layer)
                .with_context(|| format!("Failed to write layer {}", id))?;
            pb.finish_and_clear();
            done("Layer", &id.to_string(), start.elapsed());
        }

        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { catalog } => {
            let handle = open_catalog(&catalog, mode)?;
            let ids = handle.catalog.layer_ids().context("Failed to list layers")?;
            println!("Catalog: {}", handle.catalog.root());
            println!("Layers: {}", ids.len());

            for id in ids {
                let header = handle
                    .catalog
                    .header(&id)
                    .with_context(|| format!("Failed to read header of {}", id))?;
                println!(
                    "\n{}  ({}/{}, index {})",
                    id, header.key_class, header.value_class, header.key_index
                );
                match handle.catalog.read_any(&id) {
                    Ok(layer) => println!("  {}", describe(&layer)),
                    Err(e) => println!("  unreadable: {}", e),
                }
                if let Ok(h) = handle.catalog.histogram(&id.name) {
                    if let (Some(min), Some(max)) = (h.min, h.max) {
                        println!("  Range: {:.4} - {:.4}", min, max);
                    }
                    println!("  Valid cells: {} (no-data {})", h.total, h.nodata);
                    let breaks = h.quantile_breaks(4);
                    if !breaks.is_empty() {
                        let breaks: Vec<String> = breaks.iter().map(|b| format!("{:.4}", b)).collect();
                        println!("  Quartile breaks: {}", breaks.join(", "));
                    }
                }
            }
        }

        // ── Delete ───────────────────────────────────────────────────
        Commands::Delete {
            layer,
            catalog,
            zoom,
        } => {
            let handle = open_catalog(&catalog, mode)?;
            match zoom {
                Some(z) => {
                    let id = LayerId::new(layer.as_str(), z);
                    handle
                        .catalog
                        .delete(&id)
                        .with_context(|| format!("Failed to delete {}", id))?;
                    println!("Deleted {}", id);
                }
                None => {
                    handle
                        .catalog
                        .delete_all(&layer)
                        .with_context(|| format!("Failed to delete {}", layer))?;
                    println!("Deleted every zoom level of {}", layer);
                }
            }
        }
    }

    Ok(())
}
