use anyhow::Result;
use clap::Parser;

use dimmer::cli::OverlayArgs;
use dimmer::{overlay, Scale};

#[tokio::main]
async fn main() -> Result<()> {
    dimmer::init_logging();
    overlay::run(Scale::Coarse, OverlayArgs::parse()).await
}
