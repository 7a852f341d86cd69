use anyhow::Result;
use clap::Parser;

use dimmer::cli::OverlayArgs;
use dimmer::{overlay, Scale};

// 20 levels: 1 = 5% dark, 20 = fully black
#[tokio::main]
async fn main() -> Result<()> {
    dimmer::init_logging();
    overlay::run(Scale::Fine, OverlayArgs::parse()).await
}
