//! Startup configuration of a band.
//!
//! A [`BandConfig`] is applied once by [`BandConfig::build`]; the resulting band is read-only from
//! then on.

use heapless::Vec;

use crate::band::{new_band, Band, Error, Region, RegionBand};
use crate::band::types::DR;

/// Maximum number of extra channels in a configuration.
pub const MAX_EXTRA_CHANNELS: usize = 16;
/// Maximum number of disabled uplink channels in a configuration.
pub const MAX_DISABLED_CHANNELS: usize = 16;

/// A channel added on top of the band's fixed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtraChannel {
    /// Frequency in Hz.
    pub frequency: u32,
    /// Lowest data rate index.
    pub min_dr: u8,
    /// Highest data rate index.
    pub max_dr: u8,
}

/// Band configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BandConfig {
    /// Region to build.
    pub region: Region,
    /// Lower payload limits so a repeater's overhead fits.
    #[cfg_attr(feature = "serde", serde(default))]
    pub repeater_compatible: bool,
    /// Channels added after the fixed ones, in order.
    #[cfg_attr(feature = "serde", serde(default))]
    pub extra_channels: Vec<ExtraChannel, MAX_EXTRA_CHANNELS>,
    /// Uplink channel indices to disable once the extra channels are added.
    #[cfg_attr(feature = "serde", serde(default))]
    pub disabled_uplink_channels: Vec<usize, MAX_DISABLED_CHANNELS>,
}

impl BandConfig {
    /// Configuration with the region's defaults only.
    pub fn new(region: Region) -> Self {
        Self {
            region,
            repeater_compatible: false,
            extra_channels: Vec::new(),
            disabled_uplink_channels: Vec::new(),
        }
    }

    /// Build the configured band.
    pub fn build(&self) -> Result<RegionBand, Error> {
        let mut band = new_band(self.region, self.repeater_compatible)?;
        for channel in &self.extra_channels {
            let min_dr = DR::try_from(channel.min_dr)?;
            let max_dr = DR::try_from(channel.max_dr)?;
            band.add_channel(channel.frequency, min_dr, max_dr)?;
        }
        for &index in &self.disabled_uplink_channels {
            band.disable_uplink_channel_index(index)?;
        }
        info!(
            "band {} ready with {} uplink channels",
            band.name(),
            band.get_uplink_channel_indices().len()
        );
        Ok(band)
    }
}
