//! Failures around the `umbra.ron` file.
//!
//! Validation of the values themselves happens later, when the config is
//! turned into a layout and pass; those failures are `ShadowError`s.

use std::io;

/// Loading or saving an umbra config file failed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `--config` or the default `umbra.ron` could not be opened.
    #[error("failed to read config: {0}")]
    ReadError(#[source] io::Error),

    /// `--write-config` or `load_or_create` could not write the file or its directory.
    #[error("failed to write config: {0}")]
    WriteError(#[source] io::Error),

    /// The file is not valid RON for [`Config`](crate::Config); the span points at the bad token.
    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),

    /// The platform has no config directory to hold `umbra/umbra.ron`.
    #[error("no config directory available; pass --config")]
    NoConfigDir,
}
