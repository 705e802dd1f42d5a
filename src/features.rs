// src/features.rs

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

bitflags! {
    /// Boolean output/session features.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DisplayFeatureFlags: u32 {
        const HDR_ENABLED = 1 << 0;
        /// Prefer the internal panel even when an external output is connected.
        const FORCE_INTERNAL = 1 << 1;
        const BORDERLESS_WINDOW = 1 << 2;
        /// Rotate the output with a compositor shader.
        const ROTATION_SHADER = 1 << 3;
        /// Force the rotation shader on the DRM (direct scanout) path too.
        const DRM_ROTATION_SHADER = 1 << 4;
        const FULLSCREEN = 1 << 5;
        /// Input is captured by the nested window.
        const GRABBED = 1 << 6;
        const FORCE_RELATIVE_MOUSE = 1 << 7;
        /// Expose the nested Wayland socket to clients.
        const EXPOSE_WAYLAND = 1 << 8;
        /// Realtime scheduling was requested.
        const REALTIME = 1 << 9;
    }
}

/// Lock-free holder for feature flags toggled from non-rendering threads
/// (e.g. HDR switched by a hotkey).
#[derive(Debug, Default)]
pub struct AtomicFeatureFlags(AtomicU32);

impl AtomicFeatureFlags {
    pub fn new(flags: DisplayFeatureFlags) -> Self {
        AtomicFeatureFlags(AtomicU32::new(flags.bits()))
    }

    pub fn load(&self) -> DisplayFeatureFlags {
        DisplayFeatureFlags::from_bits_truncate(self.0.load(Ordering::Acquire))
    }

    pub fn contains(&self, flags: DisplayFeatureFlags) -> bool {
        self.load().contains(flags)
    }

    /// Sets or clears `flags`, returning the previous value.
    pub fn set(&self, flags: DisplayFeatureFlags, enabled: bool) -> DisplayFeatureFlags {
        let previous = if enabled {
            self.0.fetch_or(flags.bits(), Ordering::AcqRel)
        } else {
            self.0.fetch_and(!flags.bits(), Ordering::AcqRel)
        };
        DisplayFeatureFlags::from_bits_truncate(previous)
    }
}
