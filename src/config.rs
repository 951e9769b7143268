use std::{path::PathBuf, time::Duration};

use clap::Parser;

pub const DEFAULT_BASE_URL: &str = "https://tle.ivanstanojevic.me";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/58.0.3029.110 Safari/537.3";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_ZOOM: u8 = 4;

/// Look up a satellite by NORAD ID and show where it is right now.
#[derive(Parser, Debug)]
#[command(version)]
pub struct Opts {
    /// Base URL of the TLE API
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Request timeout in seconds
    #[arg(long = "timeout", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// User-Agent header sent with every request
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Verify the TLS certificate of the TLE API.
    ///
    /// Verification is skipped unless this flag is given.
    #[arg(long)]
    verify_tls: bool,

    /// Directory the map files are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Initial zoom level of the map
    #[arg(long, default_value_t = DEFAULT_ZOOM, value_parser = clap::value_parser!(u8).range(0..=18))]
    zoom: u8,

    /// Do not open the map in the default browser
    #[arg(long)]
    no_browser: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    log_level: String,
}

#[derive(Clone, Debug)]
pub struct FetcherConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout: Duration,
    pub skip_certificate_verification: bool,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            skip_certificate_verification: true,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MapConfig {
    pub zoom: u8,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self { zoom: DEFAULT_ZOOM }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub fetcher: FetcherConfig,
    pub map: MapConfig,
    pub output_dir: PathBuf,
    pub open_browser: bool,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            map: MapConfig::default(),
            output_dir: PathBuf::from("."),
            open_browser: true,
            log_level: "debug".to_string(),
        }
    }
}

impl From<Opts> for Config {
    fn from(opts: Opts) -> Self {
        Self {
            fetcher: FetcherConfig {
                base_url: opts.base_url,
                user_agent: opts.user_agent,
                timeout: Duration::from_secs(opts.timeout_secs),
                skip_certificate_verification: !opts.verify_tls,
            },
            map: MapConfig { zoom: opts.zoom },
            output_dir: opts.output_dir,
            open_browser: !opts.no_browser,
            log_level: opts.log_level,
        }
    }
}
