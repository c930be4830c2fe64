//! plant-export - procedural plant generator
//!
//! Grows plants or whole gardens from a seed and writes them as Wavefront OBJ
//! files, with per-vertex colours for bark and leaves.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use nether_plant::mesh::{build_leaf_mesh, write_obj};
use nether_plant::{
    Garden, GardenSettings, LeafCanopySettings, PlantSettings, build_plant, write_garden_obj,
    write_plant_obj,
};

#[derive(Parser)]
#[command(name = "plant-export")]
#[command(about = "Procedural plant generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a single plant
    Tree {
        /// Plant settings TOML (defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed (overrides the config)
        #[arg(short, long, conflicts_with = "random_seed")]
        seed: Option<u64>,

        /// Pick a fresh seed
        #[arg(long)]
        random_seed: bool,

        /// Leaf canopy settings TOML (defaults when omitted)
        #[arg(short, long, conflicts_with = "no_leaves")]
        leaves: Option<PathBuf>,

        /// Skip the leaf canopy
        #[arg(long)]
        no_leaves: bool,

        /// Output .obj file
        #[arg(short, long, default_value = "plant.obj")]
        output: PathBuf,
    },

    /// Generate a row of plants over a ground plane
    Garden {
        /// Garden settings TOML (defaults when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Master seed (overrides the config)
        #[arg(short, long, conflicts_with = "random_seed")]
        seed: Option<u64>,

        /// Pick a fresh master seed
        #[arg(long)]
        random_seed: bool,

        /// Number of plants (overrides the config)
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Output .obj file
        #[arg(short, long, default_value = "garden.obj")]
        output: PathBuf,
    },

    /// Export the default leaf blade
    Leaf {
        /// Output .obj file
        #[arg(short, long, default_value = "leaf.obj")]
        output: PathBuf,
    },

    /// Write default settings as TOML
    Defaults {
        /// Garden settings instead of plant settings
        #[arg(long)]
        garden: bool,

        /// Output .toml file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Tree {
            config,
            seed,
            random_seed,
            leaves,
            no_leaves,
            output,
        } => {
            let mut settings = match &config {
                Some(path) => PlantSettings::load(path)
                    .with_context(|| format!("Failed to load plant settings {:?}", path))?,
                None => PlantSettings::default(),
            };
            if let Some(seed) = pick_seed(seed, random_seed) {
                settings.seed = seed;
            }

            tracing::info!("Growing plant with seed {}", settings.seed);
            let mut plant = build_plant(&settings);
            if !no_leaves {
                let canopy = match &leaves {
                    Some(path) => LeafCanopySettings::load(path)
                        .with_context(|| format!("Failed to load leaf settings {:?}", path))?,
                    None => LeafCanopySettings::default(),
                };
                plant.decorate(&canopy);
            }
            tracing::info!(
                "{} branches, {} leaves",
                plant.branches.len(),
                plant.leaves.len()
            );

            write_plant_obj(&plant, &output)?;
            tracing::info!("Wrote {:?}", output);
        }

        Commands::Garden {
            config,
            seed,
            random_seed,
            count,
            output,
        } => {
            let mut settings = match &config {
                Some(path) => GardenSettings::load(path)
                    .with_context(|| format!("Failed to load garden settings {:?}", path))?,
                None => GardenSettings::default(),
            };
            if let Some(seed) = pick_seed(seed, random_seed) {
                settings.master_seed = seed;
            }
            if let Some(count) = count {
                settings.plant_count = count;
            }

            tracing::info!(
                "Growing {} plants with master seed {}",
                settings.plant_count,
                settings.master_seed
            );
            let garden = Garden::generate(&settings);
            write_garden_obj(&garden, &output)?;
            tracing::info!("Wrote {:?}", output);
        }

        Commands::Leaf { output } => {
            let leaf = build_leaf_mesh(&LeafCanopySettings::default().leaf_shape);
            write_obj(&leaf, &output, "leaf")?;
            tracing::info!(
                "Wrote {:?} ({} vertices, {} triangles)",
                output,
                leaf.vertex_count(),
                leaf.triangle_count()
            );
        }

        Commands::Defaults { garden, output } => {
            let text = if garden {
                GardenSettings::default().to_toml_string()?
            } else {
                PlantSettings::default().to_toml_string()?
            };
            match output {
                Some(path) => write_text(&path, &text)?,
                None => print!("{text}"),
            }
        }
    }

    Ok(())
}

/// Explicit seed, a random one, or none to keep the configured seed
fn pick_seed(seed: Option<u64>, random: bool) -> Option<u64> {
    if random {
        let seed = rand::random::<u64>();
        tracing::info!("Random seed {}", seed);
        Some(seed)
    } else {
        seed
    }
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("Failed to write {:?}", path))?;
    tracing::info!("Wrote {:?}", path);
    Ok(())
}
