// src/negotiator.rs

//! Reconciles what the user asked for with what the output path can do.
//!
//! The *wanted* side is written by input/event threads (hotkeys, startup
//! configuration) and is therefore stored atomically in [`WantedState`]. The
//! *effective* side is owned by the rendering thread: it calls
//! [`Negotiator::resolve`] whenever the wanted values, the display mode, or the
//! hardware capabilities change, and reads [`EffectiveConfig`] from then on.
//!
//! Resolution never substitutes a different filter than the one requested. The
//! capability oracle only decides whether the filter is flagged as hardware
//! native or left to a compositor shader pass.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI32, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use crate::capability::{CapabilityOracle, CapabilityTable};
use crate::error::ConfigError;
use crate::filter::{BicubicParams, DownscaleFilter, FilterRequest, UpscaleFilter, UpscaleScaler};

pub const DEFAULT_SHARPNESS: i32 = 2;
pub const DEFAULT_SHARPNESS_MAX: i32 = 20;

/// Snapshot of the user's requested rendering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WantedConfig {
    pub upscale_filter: FilterRequest,
    pub downscale_filter: DownscaleFilter,
    pub scaler: UpscaleScaler,
    pub sharpness: i32,
    pub bicubic: BicubicParams,
}

impl Default for WantedConfig {
    fn default() -> Self {
        WantedConfig {
            upscale_filter: FilterRequest::default(),
            downscale_filter: DownscaleFilter::default(),
            scaler: UpscaleScaler::default(),
            sharpness: DEFAULT_SHARPNESS,
            bicubic: BicubicParams::default(),
        }
    }
}

/// A partial change to the wanted configuration. `None` fields are left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WantedUpdate {
    pub upscale_filter: Option<FilterRequest>,
    pub downscale_filter: Option<DownscaleFilter>,
    pub scaler: Option<UpscaleScaler>,
    pub sharpness: Option<i32>,
    pub bicubic: Option<BicubicParams>,
}

impl WantedUpdate {
    pub fn upscale_filter(mut self, request: impl Into<FilterRequest>) -> Self {
        self.upscale_filter = Some(request.into());
        self
    }

    pub fn downscale_filter(mut self, filter: DownscaleFilter) -> Self {
        self.downscale_filter = Some(filter);
        self
    }

    pub fn scaler(mut self, scaler: UpscaleScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    pub fn sharpness(mut self, sharpness: i32) -> Self {
        self.sharpness = Some(sharpness);
        self
    }

    pub fn bicubic(mut self, params: BicubicParams) -> Self {
        self.bicubic = Some(params);
        self
    }
}

/// Wanted enum fields as plain integers, straight from an external source
/// that has not validated them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawWanted {
    pub upscale_filter: Option<u32>,
    pub downscale_filter: Option<u32>,
    pub scaler: Option<u32>,
}

/// Atomically stored wanted configuration, shared between the threads that
/// write user intent and the rendering thread that resolves it.
///
/// Each field is independently consistent. There is no transaction spanning
/// several fields; a reader may observe a mix of old and new values while a
/// writer is mid-update, and the bumped generation makes it resolve again.
#[derive(Debug)]
pub struct WantedState {
    upscale_filter: AtomicU32,
    downscale_filter: AtomicU32,
    scaler: AtomicU32,
    sharpness: AtomicI32,
    bicubic_b: AtomicU32,
    bicubic_c: AtomicU32,
    sharpness_max: i32,
    generation: AtomicU64,
}

impl WantedState {
    /// Creates the state from initial values. The initial sharpness and bicubic
    /// coefficients go through the same clamping as later updates.
    pub fn new(initial: WantedConfig, sharpness_max: i32) -> Self {
        let defaults = WantedConfig::default();
        let state = WantedState {
            upscale_filter: AtomicU32::new(initial.upscale_filter.to_raw()),
            downscale_filter: AtomicU32::new(initial.downscale_filter as u32),
            scaler: AtomicU32::new(initial.scaler as u32),
            sharpness: AtomicI32::new(defaults.sharpness.clamp(0, sharpness_max.max(0))),
            bicubic_b: AtomicU32::new(defaults.bicubic.b.to_bits()),
            bicubic_c: AtomicU32::new(defaults.bicubic.c.to_bits()),
            sharpness_max: sharpness_max.max(0),
            generation: AtomicU64::new(0),
        };
        for err in state.set(
            WantedUpdate::default()
                .sharpness(initial.sharpness)
                .bicubic(initial.bicubic),
        ) {
            warn!("Initial wanted configuration adjusted: {}", err);
        }
        state
    }

    pub fn sharpness_max(&self) -> i32 {
        self.sharpness_max
    }

    /// Monotonic counter bumped after every applied change.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Reads a fresh snapshot of every wanted field.
    pub fn snapshot(&self) -> WantedConfig {
        // Only valid encodings are ever stored.
        let defaults = WantedConfig::default();
        WantedConfig {
            upscale_filter: FilterRequest::from_raw(self.upscale_filter.load(Ordering::Acquire))
                .unwrap_or(defaults.upscale_filter),
            downscale_filter: DownscaleFilter::try_from(
                self.downscale_filter.load(Ordering::Acquire),
            )
            .unwrap_or(defaults.downscale_filter),
            scaler: UpscaleScaler::try_from(self.scaler.load(Ordering::Acquire))
                .unwrap_or(defaults.scaler),
            sharpness: self.sharpness.load(Ordering::Acquire),
            bicubic: BicubicParams {
                b: f32::from_bits(self.bicubic_b.load(Ordering::Acquire)),
                c: f32::from_bits(self.bicubic_c.load(Ordering::Acquire)),
            },
        }
    }

    /// Records user intent. Never fails: out-of-range values are clamped and
    /// reported back as [`ConfigError::OutOfRange`].
    pub fn set(&self, update: WantedUpdate) -> Vec<ConfigError> {
        let mut adjustments = Vec::new();

        if let Some(request) = update.upscale_filter {
            self.upscale_filter.store(request.to_raw(), Ordering::Release);
        }
        if let Some(filter) = update.downscale_filter {
            self.downscale_filter.store(filter as u32, Ordering::Release);
        }
        if let Some(scaler) = update.scaler {
            self.scaler.store(scaler as u32, Ordering::Release);
        }
        if let Some(requested) = update.sharpness {
            let clamped = requested.clamp(0, self.sharpness_max);
            if clamped != requested {
                adjustments.push(ConfigError::OutOfRange {
                    field: "sharpness",
                    requested: requested as f64,
                    clamped: clamped as f64,
                });
            }
            self.sharpness.store(clamped, Ordering::Release);
        }
        if let Some(params) = update.bicubic {
            Self::store_coefficient(&self.bicubic_b, "bicubic.b", params.b, &mut adjustments);
            Self::store_coefficient(&self.bicubic_c, "bicubic.c", params.c, &mut adjustments);
        }

        if update != WantedUpdate::default() {
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        for adjustment in &adjustments {
            warn!("Wanted configuration adjusted: {}", adjustment);
        }
        adjustments
    }

    /// Applies integer-encoded enum fields. Unknown encodings are reported as
    /// [`ConfigError::InvalidEnum`] and the previous value is kept.
    pub fn set_raw(&self, raw: RawWanted) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut update = WantedUpdate::default();

        if let Some(value) = raw.upscale_filter {
            match FilterRequest::from_raw(value) {
                Ok(request) => update.upscale_filter = Some(request),
                Err(err) => errors.push(err),
            }
        }
        if let Some(value) = raw.downscale_filter {
            match DownscaleFilter::try_from(value) {
                Ok(filter) => update.downscale_filter = Some(filter),
                Err(err) => errors.push(err),
            }
        }
        if let Some(value) = raw.scaler {
            match UpscaleScaler::try_from(value) {
                Ok(scaler) => update.scaler = Some(scaler),
                Err(err) => errors.push(err),
            }
        }

        errors.extend(self.set(update));
        errors
    }

    fn store_coefficient(
        slot: &AtomicU32,
        field: &'static str,
        requested: f32,
        adjustments: &mut Vec<ConfigError>,
    ) {
        if requested.is_nan() {
            let kept = f32::from_bits(slot.load(Ordering::Acquire));
            adjustments.push(ConfigError::OutOfRange {
                field,
                requested: requested as f64,
                clamped: kept as f64,
            });
            return;
        }
        let clamped = requested.clamp(BicubicParams::MIN, BicubicParams::MAX);
        if clamped != requested {
            adjustments.push(ConfigError::OutOfRange {
                field,
                requested: requested as f64,
                clamped: clamped as f64,
            });
        }
        slot.store(clamped.to_bits(), Ordering::Release);
    }
}

impl Default for WantedState {
    fn default() -> Self {
        WantedState::new(WantedConfig::default(), DEFAULT_SHARPNESS_MAX)
    }
}

/// The configuration the rendering pipeline actually uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EffectiveConfig {
    pub upscale_filter: UpscaleFilter,
    /// False means the renderer has to emulate `upscale_filter` with a shader pass.
    pub is_hardware_native: bool,
    pub downscale_filter: DownscaleFilter,
    pub scaler: UpscaleScaler,
    pub sharpness: i32,
    pub bicubic: BicubicParams,
}

/// Owns the effective configuration and recomputes it from the wanted state.
pub struct Negotiator {
    wanted: Arc<WantedState>,
    capabilities: Arc<dyn CapabilityOracle>,
    active_mode_filter: Option<UpscaleFilter>,
    effective: EffectiveConfig,
    resolved_generation: u64,
    environment_changed: bool,
}

impl Negotiator {
    pub fn new(wanted: Arc<WantedState>, capabilities: Arc<dyn CapabilityOracle>) -> Self {
        let resolved_generation = wanted.generation();
        let (effective, _) = Self::compute(&wanted.snapshot(), None, &*capabilities);
        info!(
            "Negotiator: initial upscale={} (native={}), scaler={:?}",
            effective.upscale_filter, effective.is_hardware_native, effective.scaler
        );
        Negotiator {
            wanted,
            capabilities,
            active_mode_filter: None,
            effective,
            resolved_generation,
            environment_changed: false,
        }
    }

    /// Negotiator over default wanted values and the linear-only capability table.
    pub fn with_defaults() -> Self {
        Negotiator::new(
            Arc::new(WantedState::default()),
            Arc::new(CapabilityTable::default()),
        )
    }

    /// Handle for threads that write user intent.
    pub fn wanted_handle(&self) -> Arc<WantedState> {
        Arc::clone(&self.wanted)
    }

    pub fn set_wanted(&self, update: WantedUpdate) -> Vec<ConfigError> {
        self.wanted.set(update)
    }

    pub fn set_wanted_raw(&self, raw: RawWanted) -> Vec<ConfigError> {
        self.wanted.set_raw(raw)
    }

    pub fn wanted(&self) -> WantedConfig {
        self.wanted.snapshot()
    }

    pub fn effective(&self) -> EffectiveConfig {
        self.effective
    }

    /// Replaces the capability oracle, e.g. after a GPU or output switch.
    pub fn set_capabilities(&mut self, capabilities: Arc<dyn CapabilityOracle>) {
        self.capabilities = capabilities;
        self.environment_changed = true;
    }

    /// Records the native filter of the currently active display mode, or
    /// `None` when no mode is known yet.
    pub fn set_active_mode_filter(&mut self, filter: Option<UpscaleFilter>) {
        if self.active_mode_filter != filter {
            self.active_mode_filter = filter;
            self.environment_changed = true;
        }
    }

    pub fn active_mode_filter(&self) -> Option<UpscaleFilter> {
        self.active_mode_filter
    }

    /// Whether anything changed since the last [`resolve`](Self::resolve).
    pub fn needs_resolve(&self) -> bool {
        self.environment_changed || self.wanted.generation() != self.resolved_generation
    }

    /// Recomputes the effective configuration from a fresh wanted snapshot.
    pub fn resolve(&mut self) -> EffectiveConfig {
        self.resolved_generation = self.wanted.generation();
        let wanted = self.wanted.snapshot();

        let (effective, diagnostic) =
            Self::compute(&wanted, self.active_mode_filter, &*self.capabilities);
        if let Some(err) = diagnostic {
            debug!("Negotiator: {}", err);
        }

        if effective != self.effective {
            info!(
                "Negotiator: effective upscale={} (native={}), downscale={:?}, scaler={:?}, sharpness={}",
                effective.upscale_filter,
                effective.is_hardware_native,
                effective.downscale_filter,
                effective.scaler,
                effective.sharpness
            );
        }

        self.effective = effective;
        self.environment_changed = false;
        effective
    }

    fn compute(
        wanted: &WantedConfig,
        active_mode_filter: Option<UpscaleFilter>,
        capabilities: &dyn CapabilityOracle,
    ) -> (EffectiveConfig, Option<ConfigError>) {
        let (upscale_filter, diagnostic) = match wanted.upscale_filter {
            FilterRequest::Explicit(filter) => (filter, None),
            FilterRequest::InheritFromView => match active_mode_filter {
                Some(filter) => (filter, None),
                None => (UpscaleFilter::Linear, Some(ConfigError::NoActiveMode)),
            },
        };

        let effective = EffectiveConfig {
            upscale_filter,
            is_hardware_native: capabilities.supports_native(upscale_filter),
            downscale_filter: wanted.downscale_filter,
            scaler: wanted.scaler,
            sharpness: wanted.sharpness,
            bicubic: wanted.bicubic,
        };
        (effective, diagnostic)
    }
}

impl std::fmt::Debug for Negotiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Negotiator")
            .field("wanted", &self.wanted.snapshot())
            .field("active_mode_filter", &self.active_mode_filter)
            .field("effective", &self.effective)
            .finish_non_exhaustive()
    }
}
