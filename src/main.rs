// src/main.rs

use anyhow::Context;
use log::{info, warn};
use once_cell::sync::Lazy;
use std::path::PathBuf;

use scanout_negotiator::config::Config;
use scanout_negotiator::geometry::{placement, scale_factors};
use scanout_negotiator::refresh::hz_to_mhz;
use scanout_negotiator::DisplayContext;

/// Environment variable naming the JSON configuration file.
const CONFIG_ENV_VAR: &str = "SCANOUT_CONFIG";

static CONFIG: Lazy<Config> = Lazy::new(|| {
    let path = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
    Config::load_or_default(path.as_deref())
});

/// Resolves the configured session once and prints the effective
/// configuration as JSON.
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting scanout-negotiator...");

    let mut context = DisplayContext::from_config(&CONFIG);
    let effective = context.refresh_effective();
    if !effective.is_hardware_native {
        info!(
            "Upscale filter {} needs compositor emulation",
            effective.upscale_filter
        );
    }

    let nested = context.geometry.nested_size();
    let output = context.geometry.output_size();
    let (sx, sy) = scale_factors(effective.scaler, nested, output);
    info!(
        "Nested {:?} -> output {:?}: scale {}x{}, placement {:?}",
        nested,
        output,
        sx,
        sy,
        placement(effective.scaler, nested, output)
    );

    match context.refresh.select_rate_hz(&[]) {
        Some(rate) => {
            context.refresh.record_output_refresh(hz_to_mhz(rate));
            info!("Selected output refresh {} Hz", rate);
        }
        None => warn!("No custom refresh rates configured and no display rates reported"),
    }
    info!(
        "Target nested refresh {} mHz",
        context.refresh.target_refresh_mhz()
    );

    let json = serde_json::to_string_pretty(&effective)
        .context("Failed to serialize effective configuration")?;
    println!("{}", json);

    context.request_shutdown();
    Ok(())
}
