//! Command-line argument parsing for the umbra shadow pass.

use std::path::PathBuf;

use clap::Parser;
use umbra_volume::SlicePolicy;

use crate::Config;

/// umbra command-line arguments.
///
/// CLI values override settings loaded from the config file.
#[derive(Parser, Debug, Default)]
#[command(
    name = "umbra",
    about = "Volumetric self-shadowing for tiled density atlases"
)]
pub struct CliArgs {
    /// Input atlas image.
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Output image.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Direction toward the light.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    pub light: Option<Vec<f32>>,

    /// Field dimensions in voxels.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
    pub data_shape: Option<Vec<u32>>,

    /// Atlas dimensions in pixels.
    #[arg(long, num_args = 2, value_names = ["W", "H"])]
    pub texture_shape: Option<Vec<u32>>,

    /// Tile grid.
    #[arg(long, num_args = 2, value_names = ["COLS", "ROWS"])]
    pub tile_layout: Option<Vec<u32>>,

    /// Samples per ray.
    #[arg(long)]
    pub steps: Option<u32>,

    /// Absorption scale.
    #[arg(long)]
    pub alpha_scale: Option<f32>,

    /// Spread more slices than tiles evenly over the atlas.
    #[arg(long)]
    pub resample: bool,

    /// RGBA channel holding density (0 = red).
    #[arg(long)]
    pub channel: Option<usize>,

    /// Worker threads (0 = one per CPU).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to the config file (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Save the effective config to this path and exit.
    #[arg(long)]
    pub write_config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref path) = args.input {
            self.input.path = path.clone();
        }
        if let Some(ref path) = args.output {
            self.output.path = path.clone();
        }
        if let Some(&[x, y, z]) = args.light.as_deref() {
            self.shadow.light_direction = [x, y, z];
        }
        if let Some(&[x, y, z]) = args.data_shape.as_deref() {
            self.atlas.data_shape = [x, y, z];
        }
        if let Some(&[w, h]) = args.texture_shape.as_deref() {
            self.atlas.texture_shape = [w, h];
        }
        if let Some(&[cols, rows]) = args.tile_layout.as_deref() {
            self.atlas.tile_layout = [cols, rows];
        }
        if let Some(steps) = args.steps {
            self.shadow.steps = steps;
        }
        if let Some(alpha) = args.alpha_scale {
            self.shadow.alpha_scale = alpha;
        }
        if args.resample {
            self.atlas.slice_policy = SlicePolicy::Resample;
        }
        if let Some(channel) = args.channel {
            self.input.density_channel = channel;
        }
        if let Some(threads) = args.threads {
            self.compute.threads = threads;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
