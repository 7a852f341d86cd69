use anyhow::Result;
use clap::Parser;

use dimmer::cli::{CtlArgs, CtlCommand};
use dimmer::control::Response;
use dimmer::hotkeys;
use dimmer::launcher::{Launcher, Outcome};
use dimmer::level::parse_level_arg;

#[tokio::main]
async fn main() -> Result<()> {
    dimmer::init_logging();
    let args = CtlArgs::parse();
    let launcher = Launcher::new(args.scale(), args.overlay_bin.clone(), args.socket_path());
    let display = args.display.clone();

    match args.command {
        CtlCommand::Set { level } => {
            match launcher.apply(parse_level_arg(&level)).await? {
                Outcome::Off => println!("off"),
                Outcome::Updated(level) | Outcome::Respawned(level) => {
                    let max = launcher.scale().max_level();
                    println!("{level}/{max} ({})", launcher.scale().opacity(level));
                }
            }
        }
        CtlCommand::Off => {
            launcher.off().await?;
            println!("off");
        }
        CtlCommand::Status => match launcher.status().await {
            Some(Response::Ok {
                level,
                max_level,
                opacity,
            }) => println!("{level}/{max_level} (opacity {opacity})"),
            Some(Response::Error { message }) => println!("error: {message}"),
            None => println!("no listening overlay"),
        },
        CtlCommand::Hotkeys => hotkeys::run(launcher, display).await?,
    }

    Ok(())
}
