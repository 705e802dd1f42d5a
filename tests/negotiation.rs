// tests/negotiation.rs

use scanout_negotiator::config::Config;
use scanout_negotiator::refresh::hz_to_mhz;
use scanout_negotiator::{
    CapabilityOracle, CapabilityTable, DisplayContext, DownscaleFilter, FilterRequest, Negotiator,
    UpscaleFilter, UpscaleScaler, WantedConfig, WantedState, WantedUpdate,
};
use std::sync::Arc;

/// Oracle that treats every filter as native, as a vendor with a full
/// hardware scaler would.
struct EverythingNative;

impl CapabilityOracle for EverythingNative {
    fn supports_native(&self, _filter: UpscaleFilter) -> bool {
        true
    }
}

#[test]
fn fsr_bicubic_fit_scenario() {
    let wanted = Arc::new(WantedState::new(WantedConfig::default(), 10));
    let mut negotiator = Negotiator::new(wanted, Arc::new(CapabilityTable::default()));

    negotiator.set_wanted(
        WantedUpdate::default()
            .upscale_filter(UpscaleFilter::Fsr)
            .downscale_filter(DownscaleFilter::Bicubic)
            .scaler(UpscaleScaler::Fit)
            .sharpness(5),
    );
    let effective = negotiator.resolve();

    assert_eq!(effective.upscale_filter, UpscaleFilter::Fsr);
    assert!(!effective.is_hardware_native);
    assert_eq!(effective.downscale_filter, DownscaleFilter::Bicubic);
    assert_eq!(effective.scaler, UpscaleScaler::Fit);
    assert_eq!(effective.sharpness, 5);
    assert_eq!(negotiator.resolve(), effective);
}

#[test]
fn custom_oracle_only_changes_the_native_flag() {
    let mut negotiator = Negotiator::new(
        Arc::new(WantedState::default()),
        Arc::new(EverythingNative),
    );
    negotiator.set_wanted(WantedUpdate::default().upscale_filter(UpscaleFilter::Pixel));
    let effective = negotiator.resolve();
    assert_eq!(effective.upscale_filter, UpscaleFilter::Pixel);
    assert!(effective.is_hardware_native);
}

#[test]
fn session_from_json_config() {
    let config = Config::from_json_str(
        r#"{
            "output": { "width": 2560, "height": 1600, "custom_refresh_rates": [90, 60] },
            "nested": { "width": 1280, "height": 800, "refresh_mhz": 60000,
                        "unfocused_refresh_mhz": 30000 },
            "filters": { "upscale_filter": "from_view", "sharpness": 99, "sharpness_max": 10 }
        }"#,
    )
    .unwrap();

    let mut context = DisplayContext::from_config(&config);
    assert_eq!(context.negotiator.wanted().sharpness, 10);
    assert_eq!(
        context.negotiator.wanted().upscale_filter,
        FilterRequest::InheritFromView
    );

    // No display mode known yet.
    assert_eq!(context.refresh_effective().upscale_filter, UpscaleFilter::Linear);

    // The renderer reports the active mode's native filter.
    context.negotiator.set_active_mode_filter(Some(UpscaleFilter::Nearest));
    let effective = context.refresh_effective();
    assert_eq!(effective.upscale_filter, UpscaleFilter::Nearest);
    assert!(!effective.is_hardware_native);

    // Custom list overrides whatever the display reports.
    assert_eq!(context.refresh.select_rate_hz(&[144, 120]), Some(60));
    context.refresh.set_focused(false);
    assert_eq!(context.refresh.select_rate_hz(&[144, 120]), Some(60));

    context.refresh.record_output_refresh(hz_to_mhz(60));
    assert_eq!(context.refresh.output_refresh_mhz(), Some(60_000));
}

#[test]
fn hotkey_thread_and_render_thread() {
    let mut context = DisplayContext::default();
    let wanted = context.wanted_handle();

    let writer = std::thread::spawn(move || {
        for sharpness in 0..=30 {
            wanted.set(
                WantedUpdate::default()
                    .upscale_filter(UpscaleFilter::Nis)
                    .sharpness(sharpness),
            );
        }
    });
    writer.join().unwrap();

    let effective = context.refresh_effective();
    assert_eq!(effective.upscale_filter, UpscaleFilter::Nis);
    assert_eq!(effective.sharpness, 20);
}
