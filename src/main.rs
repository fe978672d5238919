use std::process;

use anyhow::{Result, bail};

use paper_plane::{app::App, config::FlightConfig};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

const FLY_USAGE: &str = "paper-plane fly [config.json]";

fn run() -> Result<()> {
    let mut args = std::env::args().skip(1);

    match args.next().as_deref() {
        Some("fly") | None => {
            let config = match args.next() {
                Some(path) => FlightConfig::from_file(&path)?,
                None => FlightConfig::load(),
            };
            App::new(config)?.fly()
        }
        _ => bail!(
            "Paper Plane — terminal plane animation toy\n\nUsage:\n  {FLY_USAGE}"
        ),
    }
}
