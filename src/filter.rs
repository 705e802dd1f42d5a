// src/filter.rs

//! Filter, scaler and bicubic parameter types shared by the wanted and
//! effective sides of the negotiation.
//!
//! Every enum here has a stable raw `u32` encoding (used by hotkey handlers and
//! other collaborators that exchange plain integers) and a lowercase name
//! (used by the configuration file).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// String conversions backing the serde representation, so every enum here
/// accepts names through its case-insensitive `FromStr`.
macro_rules! name_conversions {
    ($ty:ty) => {
        impl TryFrom<String> for $ty {
            type Error = ConfigError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.to_string()
            }
        }
    };
}

/// Raw encoding of "inherit the filter from the current view".
pub const RAW_FROM_VIEW: u32 = 0xF;

/// Kernel used when the nested surface is scaled up to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[repr(u32)]
pub enum UpscaleFilter {
    Linear = 0,
    Nearest = 1,
    /// AMD FidelityFX Super Resolution.
    Fsr = 2,
    /// NVIDIA Image Scaling.
    Nis = 3,
    /// Sharp pixel-art filtering.
    Pixel = 4,
}

impl UpscaleFilter {
    pub const ALL: [UpscaleFilter; 5] = [
        UpscaleFilter::Linear,
        UpscaleFilter::Nearest,
        UpscaleFilter::Fsr,
        UpscaleFilter::Nis,
        UpscaleFilter::Pixel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            UpscaleFilter::Linear => "linear",
            UpscaleFilter::Nearest => "nearest",
            UpscaleFilter::Fsr => "fsr",
            UpscaleFilter::Nis => "nis",
            UpscaleFilter::Pixel => "pixel",
        }
    }

    /// Whether the filter takes a sharpness parameter.
    pub fn uses_sharpness(self) -> bool {
        matches!(self, UpscaleFilter::Fsr | UpscaleFilter::Nis)
    }
}

impl TryFrom<u32> for UpscaleFilter {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        UpscaleFilter::ALL
            .into_iter()
            .find(|f| *f as u32 == value)
            .ok_or_else(|| ConfigError::invalid_enum("upscale_filter", value))
    }
}

impl FromStr for UpscaleFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UpscaleFilter::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigError::invalid_enum("upscale_filter", s))
    }
}

impl fmt::Display for UpscaleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

name_conversions!(UpscaleFilter);

/// What the user asked for: a concrete filter, or whatever the active view uses.
///
/// Only ever found on the wanted side. Resolution always turns it into a
/// concrete [`UpscaleFilter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FilterRequest {
    Explicit(UpscaleFilter),
    InheritFromView,
}

impl FilterRequest {
    pub fn from_raw(value: u32) -> Result<Self, ConfigError> {
        if value == RAW_FROM_VIEW {
            return Ok(FilterRequest::InheritFromView);
        }
        UpscaleFilter::try_from(value).map(FilterRequest::Explicit)
    }

    pub fn to_raw(self) -> u32 {
        match self {
            FilterRequest::Explicit(filter) => filter as u32,
            FilterRequest::InheritFromView => RAW_FROM_VIEW,
        }
    }
}

impl Default for FilterRequest {
    fn default() -> Self {
        FilterRequest::Explicit(UpscaleFilter::Linear)
    }
}

impl From<UpscaleFilter> for FilterRequest {
    fn from(filter: UpscaleFilter) -> Self {
        FilterRequest::Explicit(filter)
    }
}

impl FromStr for FilterRequest {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("from_view") {
            return Ok(FilterRequest::InheritFromView);
        }
        s.parse().map(FilterRequest::Explicit)
    }
}

name_conversions!(FilterRequest);

impl fmt::Display for FilterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterRequest::Explicit(filter) => fmt::Display::fmt(filter, f),
            FilterRequest::InheritFromView => f.write_str("from_view"),
        }
    }
}

/// Kernel used when the nested surface is larger than the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[repr(u32)]
pub enum DownscaleFilter {
    #[default]
    Linear = 0,
    Bicubic = 1,
}

impl DownscaleFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            DownscaleFilter::Linear => "linear",
            DownscaleFilter::Bicubic => "bicubic",
        }
    }
}

impl fmt::Display for DownscaleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

name_conversions!(DownscaleFilter);

impl TryFrom<u32> for DownscaleFilter {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DownscaleFilter::Linear),
            1 => Ok(DownscaleFilter::Bicubic),
            _ => Err(ConfigError::invalid_enum("downscale_filter", value)),
        }
    }
}

impl FromStr for DownscaleFilter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(DownscaleFilter::Linear),
            "bicubic" => Ok(DownscaleFilter::Bicubic),
            _ => Err(ConfigError::invalid_enum("downscale_filter", s)),
        }
    }
}

/// Aspect and placement policy, independent of the filter kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[repr(u32)]
pub enum UpscaleScaler {
    #[default]
    Auto = 0,
    Integer = 1,
    Fit = 2,
    Fill = 3,
    Stretch = 4,
}

impl UpscaleScaler {
    pub fn as_str(self) -> &'static str {
        match self {
            UpscaleScaler::Auto => "auto",
            UpscaleScaler::Integer => "integer",
            UpscaleScaler::Fit => "fit",
            UpscaleScaler::Fill => "fill",
            UpscaleScaler::Stretch => "stretch",
        }
    }
}

impl fmt::Display for UpscaleScaler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

name_conversions!(UpscaleScaler);

impl TryFrom<u32> for UpscaleScaler {
    type Error = ConfigError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(UpscaleScaler::Auto),
            1 => Ok(UpscaleScaler::Integer),
            2 => Ok(UpscaleScaler::Fit),
            3 => Ok(UpscaleScaler::Fill),
            4 => Ok(UpscaleScaler::Stretch),
            _ => Err(ConfigError::invalid_enum("upscale_scaler", value)),
        }
    }
}

impl FromStr for UpscaleScaler {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(UpscaleScaler::Auto),
            "integer" => Ok(UpscaleScaler::Integer),
            "fit" => Ok(UpscaleScaler::Fit),
            "fill" => Ok(UpscaleScaler::Fill),
            "stretch" => Ok(UpscaleScaler::Stretch),
            _ => Err(ConfigError::invalid_enum("upscale_scaler", s)),
        }
    }
}

/// Mitchell-Netravali style B/C coefficients for bicubic downscaling.
///
/// Only meaningful when the downscale filter is [`DownscaleFilter::Bicubic`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BicubicParams {
    pub b: f32,
    pub c: f32,
}

impl BicubicParams {
    pub const MIN: f32 = 0.0;
    pub const MAX: f32 = 1.0;
}

impl Default for BicubicParams {
    fn default() -> Self {
        BicubicParams { b: 0.3, c: 0.3 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn raw_values_match_wire_encoding() {
        assert_eq!(UpscaleFilter::try_from(2u32), Ok(UpscaleFilter::Fsr));
        assert_eq!(FilterRequest::from_raw(0xF), Ok(FilterRequest::InheritFromView));
        assert_eq!(FilterRequest::InheritFromView.to_raw(), RAW_FROM_VIEW);
        assert_eq!(UpscaleScaler::try_from(4u32), Ok(UpscaleScaler::Stretch));
        assert_eq!(DownscaleFilter::try_from(1u32), Ok(DownscaleFilter::Bicubic));
    }

    #[test]
    fn unknown_raw_values_are_invalid_enum() {
        assert!(matches!(
            FilterRequest::from_raw(5),
            Err(ConfigError::InvalidEnum { field: "upscale_filter", .. })
        ));
        assert!(matches!(
            DownscaleFilter::try_from(7u32),
            Err(ConfigError::InvalidEnum { field: "downscale_filter", .. })
        ));
        assert!(UpscaleScaler::try_from(99u32).is_err());
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("FSR".parse::<UpscaleFilter>(), Ok(UpscaleFilter::Fsr));
        assert_eq!(
            "from_view".parse::<FilterRequest>(),
            Ok(FilterRequest::InheritFromView)
        );
        assert_eq!("Fill".parse::<UpscaleScaler>(), Ok(UpscaleScaler::Fill));
        assert!("lanczos".parse::<UpscaleFilter>().is_err());
    }

    #[test]
    fn filter_request_serializes_as_name() {
        let json = serde_json::to_string(&FilterRequest::Explicit(UpscaleFilter::Nis)).unwrap();
        assert_eq!(json, "\"nis\"");
        let parsed: FilterRequest = serde_json::from_str("\"from_view\"").unwrap();
        assert_eq!(parsed, FilterRequest::InheritFromView);
        assert!(serde_json::from_str::<FilterRequest>("\"bogus\"").is_err());
    }

    #[test]
    fn serde_and_from_str_agree_on_names() {
        for name in ["fit", "Fit", "FIT"] {
            let json = format!("\"{}\"", name);
            assert_eq!(serde_json::from_str::<UpscaleScaler>(&json).unwrap(), UpscaleScaler::Fit);
            assert_eq!(name.parse::<UpscaleScaler>(), Ok(UpscaleScaler::Fit));
        }
        for name in ["bicubic", "Bicubic", "BICUBIC"] {
            let json = format!("\"{}\"", name);
            assert_eq!(
                serde_json::from_str::<DownscaleFilter>(&json).unwrap(),
                DownscaleFilter::Bicubic
            );
            assert_eq!(name.parse::<DownscaleFilter>(), Ok(DownscaleFilter::Bicubic));
        }
        for name in ["fsr", "Fsr", "FSR"] {
            let json = format!("\"{}\"", name);
            assert_eq!(
                serde_json::from_str::<FilterRequest>(&json).unwrap(),
                FilterRequest::Explicit(UpscaleFilter::Fsr)
            );
            assert_eq!(serde_json::from_str::<UpscaleFilter>(&json).unwrap(), UpscaleFilter::Fsr);
        }

        assert_eq!(serde_json::to_string(&UpscaleScaler::Stretch).unwrap(), "\"stretch\"");
        assert_eq!(serde_json::to_string(&DownscaleFilter::Linear).unwrap(), "\"linear\"");
        assert_eq!(serde_json::to_string(&UpscaleFilter::Pixel).unwrap(), "\"pixel\"");
    }

    #[test]
    fn bicubic_defaults() {
        let params = BicubicParams::default();
        assert_eq!(params.b, 0.3);
        assert_eq!(params.c, 0.3);
    }
}
