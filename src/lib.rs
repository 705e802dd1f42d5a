//! Display configuration and capability negotiation for a nested compositor
//! output.
//!
//! User intent (upscale/downscale filter, scaler, sharpness, bicubic
//! coefficients) is recorded on the *wanted* side, reconciled against what the
//! output hardware can do, and exposed as a single *effective* configuration
//! for the rendering pipeline. The refresh/focus model and output geometry live
//! alongside it in one [`DisplayContext`](context::DisplayContext).

pub mod capability;
pub mod config;
pub mod context;
pub mod error;
pub mod features;
pub mod filter;
pub mod geometry;
pub mod negotiator;
pub mod refresh;

pub use capability::{CapabilityOracle, CapabilityTable, GpuPreference, GpuVendor};
pub use context::DisplayContext;
pub use error::ConfigError;
pub use filter::{BicubicParams, DownscaleFilter, FilterRequest, UpscaleFilter, UpscaleScaler};
pub use negotiator::{EffectiveConfig, Negotiator, RawWanted, WantedConfig, WantedState, WantedUpdate};
