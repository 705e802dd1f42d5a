// src/config.rs

//! Configuration structures for the nested display pipeline.
//!
//! These structs are deserialized from a JSON file and seed the
//! [`DisplayContext`](crate::context::DisplayContext) at startup. Every field has
//! a default, so a partial (or empty) file is valid. Filter and scaler names use
//! the same spelling as the command line ("linear", "fsr", "from_view", "fit",
//! ...), matched case-insensitively; an unrecognised name falls back to that
//! field's default.

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use crate::capability::GpuPreference;
use crate::features::DisplayFeatureFlags;
use crate::filter::{BicubicParams, DownscaleFilter, FilterRequest, UpscaleScaler};
use crate::negotiator::{WantedConfig, DEFAULT_SHARPNESS, DEFAULT_SHARPNESS_MAX};

// --- Top-Level Configuration Structure ---

/// Complete configuration for the nested display pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Physical output settings.
    pub output: OutputConfig,
    /// Nested (guest) surface settings.
    pub nested: NestedConfig,
    /// Upscale/downscale filter requests.
    pub filters: FilterConfig,
    /// Boolean session features.
    pub features: FeaturesConfig,
    /// Pointer settings handed to the input collaborator.
    pub input: InputConfig,
    /// Preferred GPU by PCI ids.
    pub gpu: GpuPreference,
    /// Number of XWayland servers to start.
    pub xwayland_count: u32,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse display configuration")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Loads `path` if given, falling back to defaults on any error.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::load(path).unwrap_or_else(|e| {
                warn!("{:#}; using default configuration", e);
                Config::default()
            }),
            None => {
                info!("No config file given, using default configuration");
                Config::default()
            }
        }
    }
}

// --- Output Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// Output width in pixels. 0 lets the display pick.
    pub width: u32,
    /// Output height in pixels. 0 lets the display pick.
    pub height: u32,
    /// Connector or window name of the preferred output.
    pub name: Option<String>,
    /// Refresh rates (Hz) the output may switch between, highest priority
    /// first. Empty means any rate the display reports.
    pub custom_refresh_rates: Vec<u32>,
}

// --- Nested Surface Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct NestedConfig {
    /// Guest width in pixels. 0 derives it from the output.
    pub width: u32,
    /// Guest height in pixels. 0 derives it from the output.
    pub height: u32,
    /// Guest refresh rate in mHz. 0 follows the output.
    pub refresh_mhz: u32,
    /// Refresh rate in mHz while the guest is not focused. 0 disables.
    pub unfocused_refresh_mhz: u32,
    /// Index of the physical output to show the guest on.
    pub display_index: u32,
}

// --- Filter Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    #[serde(deserialize_with = "name_or_default")]
    pub upscale_filter: FilterRequest,
    #[serde(deserialize_with = "name_or_default")]
    pub downscale_filter: DownscaleFilter,
    #[serde(deserialize_with = "name_or_default")]
    pub scaler: UpscaleScaler,
    /// Sharpness for FSR/NIS, 0 (sharpest) to `sharpness_max`.
    pub sharpness: i32,
    pub sharpness_max: i32,
    pub bicubic: BicubicParams,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            upscale_filter: FilterRequest::default(),
            downscale_filter: DownscaleFilter::default(),
            scaler: UpscaleScaler::default(),
            sharpness: DEFAULT_SHARPNESS,
            sharpness_max: DEFAULT_SHARPNESS_MAX,
            bicubic: BicubicParams::default(),
        }
    }
}

impl FilterConfig {
    pub fn wanted(&self) -> WantedConfig {
        WantedConfig {
            upscale_filter: self.upscale_filter,
            downscale_filter: self.downscale_filter,
            scaler: self.scaler,
            sharpness: self.sharpness,
            bicubic: self.bicubic,
        }
    }
}

/// Parses a filter/scaler name, keeping the default for anything that is not
/// a recognised name. One bad entry must not discard the rest of the file.
fn name_or_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default + Display,
    T::Err: Display,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let parsed = match &value {
        serde_json::Value::String(name) => name.parse::<T>().map_err(|e| e.to_string()),
        other => Err(format!("expected a name, got {}", other)),
    };
    Ok(parsed.unwrap_or_else(|e| {
        let fallback = T::default();
        warn!("Config: {}; using {}", e, fallback);
        fallback
    }))
}

// --- Feature Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FeaturesConfig {
    pub hdr: bool,
    pub force_internal: bool,
    pub borderless: bool,
    pub rotation_shader: bool,
    pub drm_rotation_shader: bool,
    pub fullscreen: bool,
    pub grab: bool,
    pub force_relative_mouse: bool,
    pub expose_wayland: bool,
    pub realtime: bool,
}

impl FeaturesConfig {
    pub fn flags(&self) -> DisplayFeatureFlags {
        let mut flags = DisplayFeatureFlags::empty();
        flags.set(DisplayFeatureFlags::HDR_ENABLED, self.hdr);
        flags.set(DisplayFeatureFlags::FORCE_INTERNAL, self.force_internal);
        flags.set(DisplayFeatureFlags::BORDERLESS_WINDOW, self.borderless);
        flags.set(DisplayFeatureFlags::ROTATION_SHADER, self.rotation_shader);
        flags.set(DisplayFeatureFlags::DRM_ROTATION_SHADER, self.drm_rotation_shader);
        flags.set(DisplayFeatureFlags::FULLSCREEN, self.fullscreen);
        flags.set(DisplayFeatureFlags::GRABBED, self.grab);
        flags.set(DisplayFeatureFlags::FORCE_RELATIVE_MOUSE, self.force_relative_mouse);
        flags.set(DisplayFeatureFlags::EXPOSE_WAYLAND, self.expose_wayland);
        flags.set(DisplayFeatureFlags::REALTIME, self.realtime);
        flags
    }
}

// --- Input Configuration ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Multiplier applied to relative pointer motion.
    pub mouse_sensitivity: f32,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            mouse_sensitivity: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::UpscaleFilter;
    use test_log::test;

    #[test]
    fn empty_document_is_all_defaults() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config.filters.upscale_filter, FilterRequest::Explicit(UpscaleFilter::Linear));
        assert_eq!(config.filters.sharpness, DEFAULT_SHARPNESS);
        assert_eq!(config.filters.sharpness_max, DEFAULT_SHARPNESS_MAX);
        assert_eq!(config.input.mouse_sensitivity, 1.0);
        assert!(config.output.custom_refresh_rates.is_empty());
        assert_eq!(config.features.flags(), DisplayFeatureFlags::empty());
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = Config::from_json_str(
            r#"{
                "output": { "width": 1920, "height": 1080, "custom_refresh_rates": [40, 60] },
                "nested": { "refresh_mhz": 60000, "unfocused_refresh_mhz": 30000 },
                "filters": { "upscale_filter": "from_view", "scaler": "integer",
                             "downscale_filter": "bicubic", "bicubic": { "b": 0.0 } },
                "features": { "hdr": true, "fullscreen": true },
                "gpu": { "vendor_id": 4098 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.output.width, 1920);
        assert_eq!(config.output.custom_refresh_rates, vec![40, 60]);
        assert_eq!(config.nested.unfocused_refresh_mhz, 30_000);
        assert_eq!(config.filters.upscale_filter, FilterRequest::InheritFromView);
        assert_eq!(config.filters.scaler, UpscaleScaler::Integer);
        assert_eq!(config.filters.bicubic, BicubicParams { b: 0.0, c: 0.3 });
        assert_eq!(
            config.features.flags(),
            DisplayFeatureFlags::HDR_ENABLED | DisplayFeatureFlags::FULLSCREEN
        );
        assert_eq!(config.gpu.vendor_id, 0x1002);
    }

    #[test]
    fn bad_filter_names_keep_other_settings() {
        let config = Config::from_json_str(
            r#"{
                "output": { "width": 3840, "height": 2160 },
                "features": { "hdr": true },
                "filters": { "upscale_filter": "lanczos", "scaler": "Fit",
                             "downscale_filter": 7, "sharpness": 4 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.output.width, 3840);
        assert!(config.features.hdr);
        assert_eq!(config.filters.upscale_filter, FilterRequest::default());
        assert_eq!(config.filters.scaler, UpscaleScaler::Fit);
        assert_eq!(config.filters.downscale_filter, DownscaleFilter::Linear);
        assert_eq!(config.filters.sharpness, 4);
    }

    #[test]
    fn names_are_case_insensitive_in_files() {
        let config = Config::from_json_str(
            r#"{ "filters": { "upscale_filter": "FSR", "scaler": "Stretch",
                              "downscale_filter": "Bicubic" } }"#,
        )
        .unwrap();
        assert_eq!(config.filters.upscale_filter, FilterRequest::Explicit(UpscaleFilter::Fsr));
        assert_eq!(config.filters.scaler, UpscaleScaler::Stretch);
        assert_eq!(config.filters.downscale_filter, DownscaleFilter::Bicubic);
    }

    #[test]
    fn loaded_file_survives_bad_filter_name() {
        let path = std::env::temp_dir().join(format!(
            "scanout-negotiator-config-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{ "output": { "width": 3840 }, "features": { "hdr": true },
                 "filters": { "upscale_filter": "fsr", "scaler": "Fit" } }"#,
        )
        .unwrap();

        let config = Config::load_or_default(Some(&path));
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.output.width, 3840);
        assert!(config.features.hdr);
        assert_eq!(config.filters.upscale_filter, FilterRequest::Explicit(UpscaleFilter::Fsr));
        assert_eq!(config.filters.scaler, UpscaleScaler::Fit);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default(Some(Path::new("/nonexistent/scanout.json")));
        assert_eq!(config.xwayland_count, 0);
        assert_eq!(config.filters.scaler, UpscaleScaler::Auto);
    }
}
