use anyhow::bail;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub const MAX_SCALE: usize = 8;

#[derive(Parser, Debug, Clone)]
#[command(name = "melt_visualizer", version, about = "70s melt shader sketches, touch-reactive, in the terminal")]
pub struct Config {
    #[arg(long, value_enum, default_value_t = SketchMode::Touch)]
    pub sketch: SketchMode,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Pixel block edge; every shader evaluation fills `scale`×`scale` pixels.
    #[arg(long, default_value_t = 1)]
    pub scale: usize,

    /// Seconds added to the animation clock.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub time_offset: f32,

    #[arg(long, default_value_t = false)]
    pub demo: bool,

    /// Seed for the demo autopilot; random when omitted.
    #[arg(long)]
    pub demo_seed: Option<u64>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_probe: bool,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value_t = log::LevelFilter::Info)]
    pub log_level: log::LevelFilter,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fps == 0 {
            bail!("--fps must be at least 1");
        }
        if self.scale == 0 || self.scale > MAX_SCALE {
            bail!("--scale must be in 1..={MAX_SCALE}, got {}", self.scale);
        }
        if !self.time_offset.is_finite() {
            bail!("--time-offset must be finite");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SketchMode {
    #[value(alias = "plain", alias = "background")]
    Melt,
    #[value(alias = "interactive")]
    Touch,
}

impl SketchMode {
    pub fn toggled(self) -> Self {
        match self {
            Self::Melt => Self::Touch,
            Self::Touch => Self::Melt,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Melt => "melt",
            Self::Touch => "touch",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(alias = "ansi", alias = "text")]
    Ascii,
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "hires", alias = "dots")]
    Braille,
    Kitty,
}

impl RendererMode {
    /// Pixels packed into one terminal cell, as (columns, rows).
    pub fn cell_block(self) -> (usize, usize) {
        match self {
            Self::Ascii => (1, 1),
            Self::HalfBlock => (1, 2),
            Self::Braille | Self::Kitty => (2, 4),
        }
    }
}
