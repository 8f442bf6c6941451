mod app;
mod config;
mod effects;
mod files;
mod input;
mod render;

use clap::Parser;

fn main() -> anyhow::Result<()> {
    app::run(config::Cli::parse())
}
