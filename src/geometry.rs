// src/geometry.rs

//! Output and nested surface geometry, plus the placement math behind each
//! [`UpscaleScaler`] policy.

use serde::{Deserialize, Serialize};

use crate::filter::UpscaleScaler;

/// Size used when nothing else is known about the output.
pub const FALLBACK_WIDTH: u32 = 1280;
pub const FALLBACK_HEIGHT: u32 = 720;

/// Physical output and guest surface dimensions, in pixels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputGeometry {
    pub output_width: u32,
    pub output_height: u32,
    /// 0 means "derive from the output".
    pub nested_width: u32,
    /// 0 means "derive from the output".
    pub nested_height: u32,
    /// Which physical output the nested session is shown on.
    pub display_index: u32,
    pub output_name: Option<String>,
}

impl OutputGeometry {
    /// Output size, or the fallback size while the output is unknown.
    pub fn output_size(&self) -> (u32, u32) {
        if self.output_width == 0 || self.output_height == 0 {
            (FALLBACK_WIDTH, FALLBACK_HEIGHT)
        } else {
            (self.output_width, self.output_height)
        }
    }

    /// Size of the nested surface with unset dimensions filled in.
    ///
    /// Both unset inherits the output size. A single unset dimension is derived
    /// from the other at 16:9, saturating at `u32::MAX`.
    pub fn nested_size(&self) -> (u32, u32) {
        match (self.nested_width, self.nested_height) {
            (0, 0) => self.output_size(),
            (0, h) => (u32::try_from(h as u64 * 16 / 9).unwrap_or(u32::MAX), h),
            (w, 0) => (w, u32::try_from(w as u64 * 9 / 16).unwrap_or(u32::MAX)),
            (w, h) => (w, h),
        }
    }
}

/// Horizontal and vertical scale applied to the nested surface so it is
/// placed on the output according to `scaler`.
pub fn scale_factors(
    scaler: UpscaleScaler,
    (src_w, src_h): (u32, u32),
    (dst_w, dst_h): (u32, u32),
) -> (f32, f32) {
    if src_w == 0 || src_h == 0 {
        return (1.0, 1.0);
    }
    let x = dst_w as f32 / src_w as f32;
    let y = dst_h as f32 / src_h as f32;

    match scaler {
        UpscaleScaler::Auto | UpscaleScaler::Fit => {
            let s = x.min(y);
            (s, s)
        }
        UpscaleScaler::Fill => {
            let s = x.max(y);
            (s, s)
        }
        UpscaleScaler::Stretch => (x, y),
        UpscaleScaler::Integer => {
            let fit = x.min(y);
            // Sources larger than the output can't be scaled by a whole
            // factor, so they shrink like Fit.
            let s = if fit < 1.0 { fit } else { fit.floor() };
            (s, s)
        }
    }
}

/// Destination rectangle `(x, y, width, height)` of the scaled nested surface,
/// centered on the output. Offsets are negative when `Fill` crops.
///
/// The scaled size saturates at `u32::MAX` and the offsets at the `i32` range,
/// so extreme aspect ratios give a clamped rectangle rather than a wrapped one.
pub fn placement(scaler: UpscaleScaler, src: (u32, u32), dst: (u32, u32)) -> (i32, i32, u32, u32) {
    let (sx, sy) = scale_factors(scaler, src, dst);
    let width = scaled_extent(src.0, sx);
    let height = scaled_extent(src.1, sy);
    (centered_offset(dst.0, width), centered_offset(dst.1, height), width, height)
}

fn scaled_extent(len: u32, scale: f32) -> u32 {
    (len as f64 * scale as f64).round().clamp(0.0, u32::MAX as f64) as u32
}

fn centered_offset(dst: u32, len: u32) -> i32 {
    let offset = (dst as i64 - len as i64) / 2;
    offset.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
