// crates/cli/src/args.rs
//! Command line definition.

use std::time::Duration;

use bulkadd_client::ClientConfig;
use bulkadd_core::TrackerConfig;
use bulkadd_types::{CompanyId, JobId};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "bulkadd", version, about = "Add companies to collections and track the job")]
pub struct Cli {
    /// Server root URL. Defaults to `BULKADD_BASE_URL`, then http://localhost:8000.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Run against an in-process simulated server instead of HTTP.
    #[arg(long, global = true)]
    pub simulate: bool,

    /// Companies seeded into the simulated server.
    #[arg(long, env = "BULKADD_SIM_COMPANIES", default_value_t = 1000, global = true)]
    pub sim_companies: usize,

    /// Overrides `BULKADD_POLL_INTERVAL_MS`.
    #[arg(long, global = true)]
    pub poll_interval_ms: Option<u64>,

    /// Overrides `BULKADD_WARNING_DELAY_MS`.
    #[arg(long, global = true)]
    pub warning_delay_ms: Option<u64>,

    /// Give up on a status request after this long. Overrides
    /// `BULKADD_FETCH_TIMEOUT_MS`; unset in both waits forever.
    #[arg(long, global = true)]
    pub fetch_timeout_ms: Option<u64>,

    /// Print JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List collections.
    Collections,

    /// List the companies in a collection.
    Items {
        /// Collection id or name.
        collection: String,
        #[arg(long, default_value_t = 0)]
        offset: u64,
        #[arg(long, default_value_t = 25)]
        limit: u64,
    },

    /// Add companies to a collection and track the job until it ends.
    Add {
        /// Destination collection id or name. With `--source` it defaults to
        /// the first other collection.
        #[arg(long, required_unless_present = "source")]
        target: Option<String>,
        #[command(flatten)]
        items: AddItems,
    },

    /// Show a job's status.
    Status { job_id: JobId },

    /// Cancel a running job.
    Cancel { job_id: JobId },
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct AddItems {
    /// Comma-separated company ids.
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<CompanyId>,

    /// Add every company of this collection (id or name).
    #[arg(long)]
    pub source: Option<String>,
}

impl Cli {
    /// Environment settings with command line flags on top.
    pub fn tracker_config(&self) -> TrackerConfig {
        let mut config = TrackerConfig::from_env();
        if let Some(ms) = self.fetch_timeout_ms {
            config = config.with_fetch_timeout(Some(Duration::from_millis(ms)));
        }
        if let Some(ms) = self.poll_interval_ms {
            config = config.with_poll_interval(Duration::from_millis(ms));
        }
        if let Some(ms) = self.warning_delay_ms {
            config = config.with_warning_delay(Duration::from_millis(ms));
        }
        config
    }

    pub fn client_config(&self) -> ClientConfig {
        match &self.base_url {
            Some(url) => ClientConfig::new(url),
            None => ClientConfig::from_env(),
        }
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("bulkadd").chain(args.iter().copied()))
    }

    #[test]
    fn test_add_with_ids() {
        let cli = parse(&["add", "--target", "Liked", "--ids", "3,1,2"]).unwrap();
        let Command::Add { target, items } = cli.command else {
            panic!("expected add");
        };
        assert_eq!(target.as_deref(), Some("Liked"));
        assert_eq!(items.ids, vec![3, 1, 2]);
        assert_eq!(items.source, None);
    }

    #[test]
    fn test_add_requires_exactly_one_item_source() {
        assert!(parse(&["add", "--target", "A"]).is_err());
        assert!(parse(&["add", "--target", "A", "--ids", "1", "--source", "B"]).is_err());
        assert!(parse(&["add", "--target", "A", "--source", "B"]).is_ok());
    }

    #[test]
    fn test_target_optional_only_with_source() {
        assert!(parse(&["add", "--ids", "1"]).is_err());
        let cli = parse(&["add", "--source", "B"]).unwrap();
        let Command::Add { target, items } = cli.command else {
            panic!("expected add");
        };
        assert_eq!(target, None);
        assert_eq!(items.source.as_deref(), Some("B"));
    }

    #[test]
    fn test_base_url_flag_wins() {
        let cli = parse(&["--base-url", "http://jam.local:9000/", "collections"]).unwrap();
        assert_eq!(cli.client_config().base_url, "http://jam.local:9000");
    }

    #[test]
    fn test_timing_flags_build_tracker_config() {
        let cli = parse(&[
            "--poll-interval-ms",
            "250",
            "--warning-delay-ms",
            "0",
            "--fetch-timeout-ms",
            "2000",
            "status",
            "4",
        ])
        .unwrap();
        let config = cli.tracker_config();
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.warning_delay, Duration::ZERO);
        assert_eq!(config.fetch_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["collections"]).unwrap().log_level(), "warn");
        assert_eq!(parse(&["-vv", "collections"]).unwrap().log_level(), "debug");
    }
}
