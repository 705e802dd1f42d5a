// src/capability.rs

//! Hardware capability detection for the output scaling path.
//!
//! Display-controller scalers usually only do simple linear resampling. Every
//! other filter has to run as a compositor shader pass. Which filters a given
//! backend handles natively is data in a [`CapabilityTable`], not branching
//! logic at the call sites.

use serde::{Deserialize, Serialize};

use crate::filter::UpscaleFilter;

/// Answers whether the active output path scales with a filter natively.
///
/// Implementations must be pure: no side effects, callable from any thread.
pub trait CapabilityOracle: Send + Sync {
    fn supports_native(&self, filter: UpscaleFilter) -> bool;
}

/// Immutable per-backend table mapping each upscale filter to native support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityTable {
    native: [bool; UpscaleFilter::ALL.len()],
}

impl CapabilityTable {
    /// Only linear scaling is native. Everything else is emulated.
    pub const fn linear_only() -> Self {
        CapabilityTable {
            native: [true, false, false, false, false],
        }
    }

    /// Nothing is native; every filter goes through a shader pass.
    pub const fn none() -> Self {
        CapabilityTable {
            native: [false; UpscaleFilter::ALL.len()],
        }
    }

    /// Returns a copy of the table with `filter` marked as (un)supported.
    pub fn with_filter(mut self, filter: UpscaleFilter, supported: bool) -> Self {
        self.native[filter as usize] = supported;
        self
    }

    /// Picks the table for a detected GPU vendor.
    pub fn for_vendor(vendor: GpuVendor) -> Self {
        // AMDGPU DC supports custom tap placement to an extent, so nearest
        // could move here once the kernel interface exposes it.
        match vendor {
            GpuVendor::Amd | GpuVendor::Intel | GpuVendor::Nvidia | GpuVendor::Other(_) => {
                Self::linear_only()
            }
        }
    }

    pub fn native_filters(&self) -> impl Iterator<Item = UpscaleFilter> + '_ {
        UpscaleFilter::ALL
            .into_iter()
            .filter(move |f| self.native[*f as usize])
    }
}

impl Default for CapabilityTable {
    fn default() -> Self {
        Self::linear_only()
    }
}

impl CapabilityOracle for CapabilityTable {
    fn supports_native(&self, filter: UpscaleFilter) -> bool {
        self.native[filter as usize]
    }
}

/// GPU vendor, identified by PCI vendor id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuVendor {
    Amd,
    Intel,
    Nvidia,
    Other(u32),
}

impl GpuVendor {
    pub const AMD_VENDOR_ID: u32 = 0x1002;
    pub const INTEL_VENDOR_ID: u32 = 0x8086;
    pub const NVIDIA_VENDOR_ID: u32 = 0x10de;

    pub fn from_pci_id(vendor_id: u32) -> Self {
        match vendor_id {
            Self::AMD_VENDOR_ID => GpuVendor::Amd,
            Self::INTEL_VENDOR_ID => GpuVendor::Intel,
            Self::NVIDIA_VENDOR_ID => GpuVendor::Nvidia,
            other => GpuVendor::Other(other),
        }
    }
}

/// Preferred GPU, by PCI vendor/device id. Zero means "no preference".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GpuPreference {
    pub vendor_id: u32,
    pub device_id: u32,
}

impl GpuPreference {
    pub fn vendor(&self) -> Option<GpuVendor> {
        (self.vendor_id != 0).then(|| GpuVendor::from_pci_id(self.vendor_id))
    }

    /// Whether a device with the given ids satisfies this preference.
    pub fn matches(&self, vendor_id: u32, device_id: u32) -> bool {
        (self.vendor_id == 0 || self.vendor_id == vendor_id)
            && (self.device_id == 0 || self.device_id == device_id)
    }

    /// Capability table for the preferred device, or the default policy.
    pub fn capabilities(&self) -> CapabilityTable {
        self.vendor()
            .map(CapabilityTable::for_vendor)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn default_table_is_linear_only() {
        let table = CapabilityTable::default();
        assert!(table.supports_native(UpscaleFilter::Linear));
        for filter in UpscaleFilter::ALL {
            if filter != UpscaleFilter::Linear {
                assert!(!table.supports_native(filter), "{} should be emulated", filter);
            }
        }
    }

    #[test]
    fn tables_extend_without_touching_callers() {
        let table = CapabilityTable::linear_only().with_filter(UpscaleFilter::Nearest, true);
        let native: Vec<_> = table.native_filters().collect();
        assert_eq!(native, vec![UpscaleFilter::Linear, UpscaleFilter::Nearest]);

        let oracle: &dyn CapabilityOracle = &CapabilityTable::none();
        assert!(!oracle.supports_native(UpscaleFilter::Linear));
    }

    #[test]
    fn vendor_ids_resolve() {
        assert_eq!(GpuVendor::from_pci_id(0x1002), GpuVendor::Amd);
        assert_eq!(GpuVendor::from_pci_id(0x10de), GpuVendor::Nvidia);
        assert_eq!(GpuVendor::from_pci_id(0x1234), GpuVendor::Other(0x1234));
    }

    #[test]
    fn preference_matching() {
        let any = GpuPreference::default();
        assert!(any.matches(0x8086, 0x46a6));
        assert_eq!(any.vendor(), None);
        assert_eq!(any.capabilities(), CapabilityTable::linear_only());

        let amd = GpuPreference {
            vendor_id: 0x1002,
            device_id: 0,
        };
        assert!(amd.matches(0x1002, 0x163f));
        assert!(!amd.matches(0x8086, 0x163f));
        assert_eq!(amd.vendor(), Some(GpuVendor::Amd));
    }
}
