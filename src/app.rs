use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use strum::Display;
use thiserror::Error;
use tracing::{debug, info_span, warn};

use crate::{
    config::Config,
    location::Locator,
    map::{self, RenderError},
    object::{self, CalcError, GeodeticPosition},
    tle::{ElementSet, FetchError, TleSource},
};

pub const PROMPT: &str = "Enter the Satellite ID (NORAD ID) or 'exit' to quit: ";

/// One line of user input.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Command {
    Exit,
    Invalid,
    Track(u64),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let input = line.trim();
        if input.eq_ignore_ascii_case("exit") {
            return Self::Exit;
        }
        if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
            return Self::Invalid;
        }
        input.parse().map_or(Self::Invalid, Self::Track)
    }
}

/// Pipeline stage, displayed as the message shown when it fails.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum Stage {
    #[strum(to_string = "Failed to retrieve TLE data.")]
    Fetch,
    #[strum(to_string = "Failed to calculate satellite position.")]
    Calculate,
    #[strum(to_string = "Failed to create the map.")]
    Render,
}

#[derive(Error, Debug)]
pub enum TrackError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Calculate(#[from] CalcError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl TrackError {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Fetch(_) => Stage::Fetch,
            Self::Calculate(_) => Stage::Calculate,
            Self::Render(_) => Stage::Render,
        }
    }
}

/// Result of one successful pass through the pipeline.
#[derive(Debug)]
pub struct Tracked {
    pub element_set: ElementSet,
    pub position: GeodeticPosition,
    pub place: Option<String>,
    pub map_path: PathBuf,
}

/// Application.
pub struct App<S> {
    /// Is the application running?
    pub running: bool,

    source: S,
    locator: Locator,
    config: Config,
    clock: fn() -> DateTime<Utc>,
}

impl<S: TleSource> App<S> {
    /// Constructs a new instance of [`App`].
    pub fn new(source: S, config: Config) -> Self {
        Self {
            running: true,
            source,
            locator: Locator::new(),
            config,
            clock: Utc::now,
        }
    }

    /// Replaces the clock used to pick the propagation instant.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Set running to false to quit the application.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Prompts for satellite IDs until `exit` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, mut output: W) -> io::Result<()> {
        while self.running {
            write!(output, "{}", PROMPT)?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                self.quit();
                break;
            }
            self.handle(&line, &mut output)?;
        }
        Ok(())
    }

    pub fn handle<W: Write>(&mut self, line: &str, output: &mut W) -> io::Result<()> {
        match Command::parse(line) {
            Command::Exit => {
                writeln!(output, "Exiting the program. Goodbye!")?;
                self.quit();
            }
            Command::Invalid => {
                writeln!(output, "Invalid input. Please enter a numeric Satellite ID.")?;
            }
            Command::Track(satellite_id) => {
                let span = info_span!("track", satellite_id);
                let _enter = span.enter();

                match self.track(satellite_id) {
                    Ok(tracked) => {
                        report(&tracked, output)?;
                        if self.config.open_browser {
                            open_in_browser(&tracked.map_path);
                        }
                    }
                    Err(err) => {
                        debug!("{:?} stage failed: {err}", err.stage());
                        writeln!(output, "{}", err.stage())?;
                        if err.stage() == Stage::Fetch {
                            writeln!(output)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Fetches, locates and maps one satellite.
    pub fn track(&self, satellite_id: u64) -> Result<Tracked, TrackError> {
        let element_set = self.source.fetch(satellite_id)?;
        let position = object::locate(&element_set, (self.clock)())?;
        let place = self
            .locator
            .nearest_place(position.latitude_degrees, position.longitude_degrees);

        let artifact = map::render(
            &position,
            &element_set.name,
            place.as_deref(),
            &self.config.map,
        )?;
        let map_path = artifact.save(&self.config.output_dir, satellite_id)?;

        Ok(Tracked {
            element_set,
            position,
            place,
            map_path,
        })
    }
}

fn report<W: Write>(tracked: &Tracked, output: &mut W) -> io::Result<()> {
    let position = &tracked.position;

    writeln!(
        output,
        "\nTLE Data Retrieved Successfully for {}:",
        tracked.element_set.name
    )?;
    writeln!(output, "{}", tracked.element_set.to_json_pretty())?;
    write!(
        output,
        "\nSatellite position at {}: Lat: {:.2}°, Lon: {:.2}°, Elevation: {:.1} km",
        position.time.format("%Y-%m-%d %H:%M:%S UTC"),
        position.latitude_degrees,
        position.longitude_degrees,
        position.elevation_km
    )?;
    match &tracked.place {
        Some(place) => writeln!(output, " (near {})", place)?,
        None => writeln!(output)?,
    }
    writeln!(
        output,
        "\nSatellite location map has been saved to {}.",
        tracked.map_path.display()
    )
}

/// Opens the map in the default browser. Failures are only logged.
fn open_in_browser(path: &Path) {
    let url = match fs::canonicalize(path)
        .ok()
        .and_then(|path| url::Url::from_file_path(path).ok())
    {
        Some(url) => url,
        None => {
            warn!(path = %path.display(), "cannot build a file URL for the map");
            return;
        }
    };

    debug!(%url, "opening map in browser");
    if let Err(err) = open::that(url.as_str()) {
        warn!("failed to open {url}: {err}");
    }
}
