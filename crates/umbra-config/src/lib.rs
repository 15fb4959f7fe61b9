//! Configuration for the umbra shadow pass.
//!
//! Settings persist as RON, may be overridden from the command line via clap,
//! and convert into the validated [`umbra_volume`] types for one invocation.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AtlasConfig, ComputeConfig, Config, DebugConfig, InputConfig, OutputConfig, ShadowConfig,
    default_config_path,
};
pub use error::ConfigError;
