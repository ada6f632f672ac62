//! Monitor runtime configuration.

use std::time::Duration;

use anyerror::AnyError;
use clap::Parser;

use crate::alert::HeapThresholds;
use crate::config::errors::ConfigError;

/// The runtime configuration of a cluster [`Monitor`].
///
/// The defaults follow what an operator dashboard expects from a small
/// cluster: re-read the topology every 5 seconds, warn when less than 10% of
/// the committed heap is free and raise an error below 2%.
///
/// [`Monitor`]: crate::Monitor
#[derive(Clone, Debug, Parser)]
#[derive(serde::Deserialize, serde::Serialize)]
pub struct Config {
    /// The name of this monitor, used in log spans.
    #[clap(long, default_value = "clustermon")]
    pub name: String,

    /// The delay in milliseconds between the end of one reconciliation and
    /// the start of the next membership fetch.
    #[clap(long, default_value = "5000")]
    pub refresh_interval: u64,

    /// Whether to re-fetch the membership periodically.
    ///
    /// If disabled, the membership is fetched once at start up and then only
    /// when the application calls `Monitor::refresh()`. The value of this
    /// config is evaluated as follows:
    /// - being absent: true
    /// - `--enable-refresh`: true
    /// - `--enable-refresh=true`: true
    /// - `--enable-refresh=false`: false
    // clap 4 requires `num_args = 0..=1`, or it complains about missing arg
    // error https://github.com/clap-rs/clap/discussions/4374
    #[clap(long,
           default_value_t = true,
           action = clap::ArgAction::Set,
           num_args = 0..=1,
           default_missing_value = "true"
    )]
    pub enable_refresh: bool,

    /// The address of the local database, used as the only member when the
    /// database does not support cluster procedures.
    #[clap(long, default_value = "bolt://localhost:7687")]
    pub local_address: String,

    /// Emit an alert when the free fraction of the committed heap drops to
    /// or below this ratio.
    #[clap(long, default_value = "0.1")]
    pub heap_alert_free_ratio: f64,

    /// Emit an error when the free fraction of the committed heap drops to
    /// or below this ratio.
    #[clap(long, default_value = "0.02")]
    pub heap_error_free_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        <Self as Parser>::parse_from(Vec::<&'static str>::new())
    }
}

impl Config {
    /// The delay between two membership refreshes.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval)
    }

    /// The heap thresholds used by the alert evaluator.
    pub fn heap_thresholds(&self) -> HeapThresholds {
        HeapThresholds {
            alert_free_ratio: self.heap_alert_free_ratio,
            error_free_ratio: self.heap_error_free_ratio,
        }
    }

    /// Build a `Config` instance from a series of command line arguments.
    ///
    /// The first element in `args` must be the application name.
    pub fn build(args: &[&str]) -> Result<Config, ConfigError> {
        let config = <Self as Parser>::try_parse_from(args).map_err(|e| {
            ConfigError::ParseError {
                source: AnyError::from(&e),
                args: args.iter().map(|x| x.to_string()).collect(),
            }
        })?;
        config.validate()
    }

    /// Validate the state of this config.
    pub fn validate(self) -> Result<Config, ConfigError> {
        if self.refresh_interval == 0 {
            return Err(ConfigError::RefreshInterval {
                refresh_interval: self.refresh_interval,
            });
        }

        let alert = self.heap_alert_free_ratio;
        let error = self.heap_error_free_ratio;

        let in_range = |x: f64| (0.0..1.0).contains(&x);
        if !in_range(alert) || !in_range(error) || error > alert {
            return Err(ConfigError::HeapFreeRatio { alert, error });
        }

        if self.local_address.is_empty() {
            return Err(ConfigError::EmptyLocalAddress);
        }

        Ok(self)
    }
}
