//! One shadow pass from a loaded config: read, march, write.

use clap::Parser;
use tracing::{info, warn};
use umbra_config::{CliArgs, Config, ConfigError, default_config_path};
use umbra_volume::{
    AtlasSink, AtlasSource, ImageFileSink, ImageFileSource, PassStats, ShadowError, dispatcher,
};

/// Anything that stops an invocation.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Shadow(#[from] ShadowError),
}

/// Resolve the effective config: file (explicit or default location), then CLI overrides.
pub fn resolve_config(args: &CliArgs) -> Result<Config, ConfigError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => match default_config_path() {
            Ok(path) if path.exists() => Config::load(&path)?,
            _ => Config::default(),
        },
    };
    config.apply_cli_overrides(args);
    Ok(config)
}

/// Run the pass described by `config` and publish its output.
///
/// Every input is validated before the atlas is read; the output file is only
/// written after the whole pass succeeded.
pub fn run_pass(config: &Config) -> Result<PassStats, ShadowError> {
    let layout = config.layout()?;
    let pass = config.pass()?;
    let source = ImageFileSource::new(&config.input.path, config.input.density_channel)?;
    let sink = ImageFileSink::new(&config.output.path);
    let dispatch = dispatcher(config.compute.threads)?;

    if layout.data_shape().z > layout.n_tiles() {
        warn!(
            slices = layout.data_shape().z,
            tiles = layout.n_tiles(),
            "Resampling field slices across atlas tiles"
        );
    }
    info!(
        input = %config.input.path.display(),
        output = %config.output.path.display(),
        light = ?pass.light().vec(),
        steps = pass.march().steps(),
        alpha_scale = pass.march().alpha_scale(),
        "Starting shadow pass"
    );

    let input = source.read(&layout)?;
    let (output, stats) = pass.run_with_stats(&input, dispatch.as_ref())?;
    sink.write(&output)?;
    Ok(stats)
}

/// Entry point shared by `main` and tests. Returns the process exit code.
pub fn run_cli<I, T>(argv: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let args = match CliArgs::try_parse_from(argv) {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() { 2 } else { 0 };
        }
    };

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("umbra: {e}");
            return 1;
        }
    };

    umbra_log::init_logging(Some(&config));

    match execute(&args, &config) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{}", error_chain(&e));
            1
        }
    }
}

fn execute(args: &CliArgs, config: &Config) -> Result<(), AppError> {
    if let Some(path) = &args.write_config {
        config.save(path)?;
        info!(path = %path.display(), "Wrote effective config");
        return Ok(());
    }
    let stats = run_pass(config)?;
    info!(
        covered = stats.covered_texels,
        elapsed_ms = stats.elapsed.as_secs_f64() * 1000.0,
        "Done"
    );
    Ok(())
}

/// Error and its sources joined with ": ".
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !chain.contains(&cause_text) {
            chain.push_str(": ");
            chain.push_str(&cause_text);
        }
        source = cause.source();
    }
    chain
}
