use anyerror::AnyError;

/// Error variants related to configuration.
#[derive(Debug, thiserror::Error)]
#[derive(PartialEq)]
pub enum ConfigError {
    #[error("ParseError: {source} while parsing ({args:?})")]
    ParseError { source: AnyError, args: Vec<String> },

    /// Periodic refresh can not be scheduled with a zero delay.
    #[error("refresh_interval({refresh_interval}) must be > 0")]
    RefreshInterval { refresh_interval: u64 },

    #[error("heap free ratio: error({error}) must be <= alert({alert}), both in [0, 1)")]
    HeapFreeRatio { alert: f64, error: f64 },

    #[error("local_address must not be empty")]
    EmptyLocalAddress,
}
