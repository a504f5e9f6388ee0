mod bootstrap;

use anyhow::Result;
use peaks_core::settings::Settings;
use peaks_data::pipeline::states_above_threshold_by_month;

fn main() -> Result<()> {
    // A broken config file is reported like any other run failure.
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            println!("Error: {}", e);
            return Ok(());
        }
    };

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("state-peaks v{} starting", env!("CARGO_PKG_VERSION"));

    let (default_input, default_output) = bootstrap::default_paths();
    let config = settings.to_pipeline_config(&default_input, &default_output);
    tracing::debug!(
        "Columns: date={}, region={}, value={}; strict={}",
        config.columns.date,
        config.columns.region,
        config.columns.value,
        config.strict
    );

    // The exit status does not distinguish failures; the message is the signal.
    match states_above_threshold_by_month(&config) {
        Ok(path) => println!("Wrote: {}", path.display()),
        Err(e) => {
            tracing::debug!("Run failed: {:?}", e);
            println!("Error: {}", e);
        }
    }

    Ok(())
}
