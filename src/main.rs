use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cfg = melt_visualizer::config::Config::parse();
    melt_visualizer::app::run(cfg)
}
