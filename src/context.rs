// src/context.rs

//! The single owned configuration context for a nested display session.
//!
//! Built once at startup from [`Config`] and passed by reference to the
//! collaborators that need it. Tests build as many independent contexts as
//! they like.
//!
//! ## Threading
//! - Rendering thread: owns the [`Negotiator`] and calls `resolve()`.
//! - Input/event threads: write user intent through [`WantedState`] handles,
//!   toggle focus and HDR, request shutdown.
//! - Display thread: reads geometry/refresh, records the achieved refresh.
//!
//! Everything touched off the rendering thread is atomic.

use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capability::{CapabilityOracle, GpuPreference};
use crate::config::Config;
use crate::features::{AtomicFeatureFlags, DisplayFeatureFlags};
use crate::geometry::OutputGeometry;
use crate::negotiator::{EffectiveConfig, Negotiator, WantedState};
use crate::refresh::RefreshState;

#[derive(Debug)]
pub struct DisplayContext {
    running: AtomicBool,
    pub geometry: OutputGeometry,
    pub refresh: RefreshState,
    pub features: AtomicFeatureFlags,
    pub negotiator: Negotiator,
    pub gpu: GpuPreference,
    pub mouse_sensitivity: f32,
    pub xwayland_count: u32,
}

impl DisplayContext {
    pub fn from_config(config: &Config) -> Self {
        let geometry = OutputGeometry {
            output_width: config.output.width,
            output_height: config.output.height,
            nested_width: config.nested.width,
            nested_height: config.nested.height,
            display_index: config.nested.display_index,
            output_name: config.output.name.clone(),
        };

        let refresh = RefreshState::new(
            config.nested.refresh_mhz,
            config.nested.unfocused_refresh_mhz,
        )
        .with_custom_rates(config.output.custom_refresh_rates.iter().copied());

        let wanted = Arc::new(WantedState::new(
            config.filters.wanted(),
            config.filters.sharpness_max,
        ));
        let capabilities: Arc<dyn CapabilityOracle> = Arc::new(config.gpu.capabilities());
        let negotiator = Negotiator::new(wanted, capabilities);

        let features = config.features.flags();
        info!(
            "DisplayContext: nested {:?} on display {}, features {:?}",
            geometry.nested_size(),
            geometry.display_index,
            features
        );

        DisplayContext {
            running: AtomicBool::new(true),
            geometry,
            refresh,
            features: AtomicFeatureFlags::new(features),
            negotiator,
            gpu: config.gpu,
            mouse_sensitivity: config.input.mouse_sensitivity,
            xwayland_count: config.xwayland_count,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn request_shutdown(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("DisplayContext: shutdown requested");
        }
    }

    pub fn hdr_enabled(&self) -> bool {
        self.features.contains(DisplayFeatureFlags::HDR_ENABLED)
    }

    pub fn set_hdr_enabled(&self, enabled: bool) {
        let previous = self.features.set(DisplayFeatureFlags::HDR_ENABLED, enabled);
        if previous.contains(DisplayFeatureFlags::HDR_ENABLED) != enabled {
            info!("DisplayContext: HDR {}", if enabled { "on" } else { "off" });
        }
    }

    /// Handle for input threads that change filter settings at runtime.
    pub fn wanted_handle(&self) -> Arc<WantedState> {
        self.negotiator.wanted_handle()
    }

    /// Records a new output after hotplug or a mode change.
    pub fn update_output(&mut self, width: u32, height: u32, name: Option<String>) {
        info!(
            "DisplayContext: output {}x{} ({})",
            width,
            height,
            name.as_deref().unwrap_or("unnamed")
        );
        self.geometry.output_width = width;
        self.geometry.output_height = height;
        self.geometry.output_name = name;
    }

    /// Re-resolves the effective configuration if anything changed.
    pub fn refresh_effective(&mut self) -> EffectiveConfig {
        if self.negotiator.needs_resolve() {
            self.negotiator.resolve()
        } else {
            self.negotiator.effective()
        }
    }
}

impl Default for DisplayContext {
    fn default() -> Self {
        DisplayContext::from_config(&Config::default())
    }
}
