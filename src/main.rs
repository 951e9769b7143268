use std::io;

use anyhow::Result;
use clap::Parser;

use crate::{
    app::App,
    config::{Config, Opts},
    tle::TleClient,
};

pub mod app;
pub mod config;
pub mod location;
pub mod map;
pub mod object;
pub mod telemetry;
pub mod tle;

fn main() -> Result<()> {
    let config = Config::from(Opts::parse());

    // Diagnostics stay installed for as long as the guard lives.
    let _telemetry = telemetry::init(&config.log_level);

    let client = TleClient::new(&config.fetcher)?;

    // Create an application.
    let mut app = App::new(client, config);

    // Start the main loop.
    app.run(io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}
