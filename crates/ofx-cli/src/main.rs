//! ofxfx - host simulator for OFX compositing kernels
//!
//! Plays the host side of a render call: loads raw images, builds the
//! clips, render scale and window, and runs one effect on them.

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use ofx_core::{BitDepth, ChannelLayout};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "ofxfx")]
#[command(author, version, about = "Host simulator for OFX compositing kernels")]
#[command(long_about = "
Runs the compositing kernels the way an OFX host would: raw images in,
render window and scale from the command line, parameters from JSON.

Raw images are little-endian f32, interleaved, rows bottom to top, with
the size and layout given on the command line.

Examples:
  ofxfx render bilateral in.raw -W 640 -H 480 -o out.raw -p soft.json
  ofxfx render wavelet in.raw -W 640 -H 480 -o out.raw --scale 0.5
  ofxfx render pik fg.raw -W 1920 -H 1080 --clean-plate c.raw -o key.raw
  ofxfx render hue-remap in.raw -W 64 -H 64 --mask m.raw --mix 0.5 -o out.raw
  ofxfx roi bilateral --window 0,0,256,256 -p soft.json
  ofxfx identity wavelet --window 0,0,256,256 --scale 0.125
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an effect on raw images
    #[command(visible_alias = "r")]
    Render(RenderArgs),

    /// Print the regions of interest of a render window
    Roi(RoiArgs),

    /// Print the identity decision for a render window
    #[command(visible_alias = "id")]
    Identity(IdentityArgs),
}

/// Effects the simulator can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EffectKind {
    /// Edge-preserving bilateral smoothing
    Bilateral,
    /// A trous wavelet denoise
    Wavelet,
    /// Hue-driven colour remap
    HueRemap,
    /// Colour-difference keyer
    Pik,
}

/// Channel layout of a raw image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    Alpha,
    Xy,
    Rgb,
    Rgba,
}

impl From<LayoutArg> for ChannelLayout {
    fn from(v: LayoutArg) -> Self {
        match v {
            LayoutArg::Alpha => ChannelLayout::Alpha,
            LayoutArg::Xy => ChannelLayout::Xy,
            LayoutArg::Rgb => ChannelLayout::Rgb,
            LayoutArg::Rgba => ChannelLayout::Rgba,
        }
    }
}

/// Sample depth the host hands to the effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DepthArg {
    U8,
    U16,
    F32,
}

impl From<DepthArg> for BitDepth {
    fn from(v: DepthArg) -> Self {
        match v {
            DepthArg::U8 => BitDepth::U8,
            DepthArg::U16 => BitDepth::U16,
            DepthArg::F32 => BitDepth::F32,
        }
    }
}

/// Effect selection and the settings shared by every command.
#[derive(Args, Clone, Debug)]
pub struct EffectArgs {
    /// Effect to run
    #[arg(value_enum)]
    effect: EffectKind,

    /// JSON parameter preset (defaults when omitted)
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Bilateral: steer the weights with input B
    #[arg(long)]
    guided: bool,

    /// Render scale, both axes
    #[arg(long, default_value = "1.0")]
    scale: f64,

    /// Amount of the effect, 0 keeps the source
    #[arg(long, default_value = "1.0")]
    mix: f32,

    /// Invert the mask
    #[arg(long)]
    mask_invert: bool,

    /// Channels to process, any of "rgba"
    #[arg(long, default_value = "rgba")]
    channels: String,
}

#[derive(Args)]
pub struct RenderArgs {
    #[command(flatten)]
    effect: EffectArgs,

    /// Input A (foreground for pik)
    input: PathBuf,

    /// Output image
    #[arg(short, long)]
    output: PathBuf,

    /// Image width
    #[arg(short = 'W', long)]
    width: usize,

    /// Image height
    #[arg(short = 'H', long)]
    height: usize,

    /// Layout of the colour inputs and the output
    #[arg(short, long, value_enum, default_value = "rgba")]
    layout: LayoutArg,

    /// Layout of mask inputs
    #[arg(long, value_enum, default_value = "alpha")]
    mask_layout: LayoutArg,

    /// Depth the effect renders at
    #[arg(short, long, value_enum, default_value = "f32")]
    depth: DepthArg,

    /// Render window as x1,y1,x2,y2 (whole image when omitted)
    #[arg(long)]
    window: Option<String>,

    /// Frame time
    #[arg(short, long, default_value = "0.0")]
    time: f64,

    /// Inputs carry straight colour rather than premultiplied
    #[arg(long)]
    straight: bool,

    /// Input B
    #[arg(long)]
    b: Option<PathBuf>,

    /// Mask input
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Pik: pre-processed foreground
    #[arg(long)]
    pfg: Option<PathBuf>,

    /// Pik: clean plate
    #[arg(long)]
    clean_plate: Option<PathBuf>,

    /// Pik: background
    #[arg(long)]
    bg: Option<PathBuf>,

    /// Pik: inside mask
    #[arg(long)]
    inside_mask: Option<PathBuf>,

    /// Pik: outside mask
    #[arg(long)]
    outside_mask: Option<PathBuf>,
}

#[derive(Args)]
pub struct RoiArgs {
    #[command(flatten)]
    effect: EffectArgs,

    /// Output window as x1,y1,x2,y2
    #[arg(long)]
    window: String,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
pub struct IdentityArgs {
    #[command(flatten)]
    effect: EffectArgs,

    /// Render window as x1,y1,x2,y2
    #[arg(long)]
    window: String,

    /// Region of definition of a connected mask, as x1,y1,x2,y2
    #[arg(long)]
    mask_rod: Option<String>,

    /// Machine-readable output (JSON)
    #[arg(long)]
    json: bool,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Render(args) => commands::render::run(args, cli.verbose),
        Commands::Roi(args) => commands::roi::run(args),
        Commands::Identity(args) => commands::identity::run(args),
    }
}
