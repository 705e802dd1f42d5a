// src/refresh.rs

//! Refresh-rate and focus model.
//!
//! Rates are tracked in millihertz (60 Hz = 60_000 mHz). The custom refresh list
//! is configured in whole hertz, in priority order. The focus flag and the
//! achieved output rate are written from the input and display threads, so
//! they are stored atomically.

use log::{debug, trace};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Used when neither a nested nor an output refresh rate is known.
pub const DEFAULT_REFRESH_MHZ: u32 = 60_000;

pub fn mhz_to_hz(mhz: u32) -> u32 {
    mhz.saturating_add(500) / 1000
}

pub fn hz_to_mhz(hz: u32) -> u32 {
    hz.saturating_mul(1000)
}

#[derive(Debug)]
pub struct RefreshState {
    /// 0 means "follow the output".
    nested_refresh_mhz: AtomicU32,
    /// 0 means "same as focused".
    unfocused_refresh_mhz: AtomicU32,
    /// 0 until the display collaborator reports what it achieved.
    output_refresh_mhz: AtomicU32,
    focused: AtomicBool,
    custom_rates_hz: Vec<u32>,
}

impl RefreshState {
    pub fn new(nested_refresh_mhz: u32, unfocused_refresh_mhz: u32) -> Self {
        RefreshState {
            nested_refresh_mhz: AtomicU32::new(nested_refresh_mhz),
            unfocused_refresh_mhz: AtomicU32::new(unfocused_refresh_mhz),
            output_refresh_mhz: AtomicU32::new(0),
            focused: AtomicBool::new(true),
            custom_rates_hz: Vec::new(),
        }
    }

    pub fn with_custom_rates(mut self, rates_hz: impl IntoIterator<Item = u32>) -> Self {
        self.set_custom_rates(rates_hz);
        self
    }

    pub fn nested_refresh_mhz(&self) -> u32 {
        self.nested_refresh_mhz.load(Ordering::Acquire)
    }

    pub fn set_nested_refresh_mhz(&self, mhz: u32) {
        self.nested_refresh_mhz.store(mhz, Ordering::Release);
    }

    pub fn unfocused_refresh_mhz(&self) -> u32 {
        self.unfocused_refresh_mhz.load(Ordering::Acquire)
    }

    /// Not checked against the nested rate; the display side clamps if it must.
    pub fn set_unfocused_refresh_mhz(&self, mhz: u32) {
        self.unfocused_refresh_mhz.store(mhz, Ordering::Release);
    }

    pub fn is_focused(&self) -> bool {
        self.focused.load(Ordering::Acquire)
    }

    pub fn set_focused(&self, focused: bool) {
        let was = self.focused.swap(focused, Ordering::AcqRel);
        if was != focused {
            debug!(
                "RefreshState: focus {} -> target {} mHz",
                if focused { "gained" } else { "lost" },
                self.target_refresh_mhz()
            );
        }
    }

    /// Rate the output actually achieved, once the display has reported one.
    pub fn output_refresh_mhz(&self) -> Option<u32> {
        match self.output_refresh_mhz.load(Ordering::Acquire) {
            0 => None,
            mhz => Some(mhz),
        }
    }

    pub fn record_output_refresh(&self, mhz: u32) {
        trace!("RefreshState: output refresh now {} mHz", mhz);
        self.output_refresh_mhz.store(mhz, Ordering::Release);
    }

    /// Refresh the nested surface should run at right now.
    ///
    /// Unfocused sessions use the unfocused rate when one is set. An unset
    /// nested rate follows the output, then [`DEFAULT_REFRESH_MHZ`].
    pub fn target_refresh_mhz(&self) -> u32 {
        let unfocused = self.unfocused_refresh_mhz();
        if !self.is_focused() && unfocused != 0 {
            return unfocused;
        }
        match self.nested_refresh_mhz() {
            0 => self.output_refresh_mhz().unwrap_or(DEFAULT_REFRESH_MHZ),
            mhz => mhz,
        }
    }

    pub fn custom_rates_hz(&self) -> &[u32] {
        &self.custom_rates_hz
    }

    /// Replaces the custom list. Duplicates and zero rates are dropped; the
    /// first occurrence keeps its priority.
    pub fn set_custom_rates(&mut self, rates_hz: impl IntoIterator<Item = u32>) {
        self.custom_rates_hz.clear();
        for rate in rates_hz {
            if rate != 0 && !self.custom_rates_hz.contains(&rate) {
                self.custom_rates_hz.push(rate);
            }
        }
    }

    /// Rates the output may pick from: the custom list when one is set,
    /// otherwise whatever the display reports.
    pub fn allowed_rates_hz<'a>(&'a self, reported_hz: &'a [u32]) -> &'a [u32] {
        if self.custom_rates_hz.is_empty() {
            reported_hz
        } else {
            &self.custom_rates_hz
        }
    }

    /// Picks the allowed rate matching the current target, or the closest one.
    /// Ties go to the rate earlier in priority order.
    pub fn select_rate_hz(&self, reported_hz: &[u32]) -> Option<u32> {
        let target = mhz_to_hz(self.target_refresh_mhz());
        let allowed = self.allowed_rates_hz(reported_hz);

        allowed
            .iter()
            .copied()
            .find(|rate| *rate == target)
            .or_else(|| {
                allowed
                    .iter()
                    .copied()
                    .min_by_key(|rate| rate.abs_diff(target))
            })
    }
}

impl Default for RefreshState {
    fn default() -> Self {
        RefreshState::new(0, 0)
    }
}
