//! Functionality implemented by every supported LoRaWAN band.
//!
//! Callers hold a [`RegionBand`] (or anything implementing [`Band`]) built once at startup by
//! [`new_band`] and only read it afterwards.

use core::fmt;
use core::str::FromStr;
use core::time::Duration;

use encoding::parser::DevAddr;
use heapless::Vec;

use self::channel_plan::{Channel, ChannelIndices, CF_LIST_FREQUENCIES};
use self::tables::BandTables;
use self::types::{DataRate, MaxPayloadSize, DR};

pub mod channel_plan;
pub mod payload_size;
pub mod tables;
pub mod types;

pub mod kr920_fsk;

pub use kr920_fsk::KR920Fsk;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Error {
    InvalidChannelIndex(usize),
    UnknownFrequency(u32),
    UnsupportedDataRate(DR),
    InvalidDataRateIndex(u8),
    UnknownDataRate,
    InvalidTxPower(u8),
    ExtraChannelsNotSupported,
    ChannelPlanFull,
    InvalidChannelDataRateRange(DR, DR),
    InvalidBand,
    UnknownRegion,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidChannelIndex(index) => write!(f, "invalid channel index {}", index),
            Error::UnknownFrequency(frequency) => write!(f, "unknown frequency {} Hz", frequency),
            Error::UnsupportedDataRate(dr) => write!(f, "unsupported data rate {}", *dr as u8),
            Error::InvalidDataRateIndex(index) => write!(f, "invalid data rate index {}", index),
            Error::UnknownDataRate => f.write_str("data rate not found in band"),
            Error::InvalidTxPower(index) => write!(f, "invalid tx power index {}", index),
            Error::ExtraChannelsNotSupported => f.write_str("band does not support extra channels"),
            Error::ChannelPlanFull => f.write_str("channel plan is full"),
            Error::InvalidChannelDataRateRange(min, max) => {
                write!(f, "invalid channel data rate range DR{}..=DR{}", *min as u8, *max as u8)
            }
            Error::InvalidBand => f.write_str("band tables are inconsistent"),
            Error::UnknownRegion => f.write_str("unknown region"),
        }
    }
}

/// Fixed timing and RX2 defaults of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Defaults {
    /// Default RX2 frequency in Hz.
    pub rx2_frequency: u32,
    /// Default RX2 data rate.
    pub rx2_dr: DR,
    /// Largest frame-counter gap accepted before a device is considered out of sync.
    pub max_fcnt_gap: u32,
    /// Delay between the end of the uplink and the RX1 window.
    pub receive_delay1: Duration,
    /// Delay between the end of the uplink and the RX2 window.
    pub receive_delay2: Duration,
    /// Join-accept delay for the RX1 window.
    pub join_accept_delay1: Duration,
    /// Join-accept delay for the RX2 window.
    pub join_accept_delay2: Duration,
}

/// Identifier of a supported band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Region {
    /// KR920-923 with the FSK data rate.
    #[cfg_attr(feature = "serde", serde(rename = "KR920_FSK"))]
    KR920Fsk,
}

impl Region {
    /// Stable name of the region.
    pub fn name(&self) -> &'static str {
        match self {
            Region::KR920Fsk => kr920_fsk::NAME,
        }
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            kr920_fsk::NAME => Ok(Region::KR920Fsk),
            _ => Err(Error::UnknownRegion),
        }
    }
}

/// Operations every band implements.
///
/// The required methods carry the region specific rules; the provided methods are lookups over
/// the band's [`BandTables`].
pub trait Band {
    /// Stable region identifier.
    fn name(&self) -> &'static str;
    /// Tables backing the band.
    fn tables(&self) -> &BandTables;
    /// Tables backing the band, for startup configuration.
    fn tables_mut(&mut self) -> &mut BandTables;

    /// Fixed timing and RX2 defaults.
    fn get_defaults(&self) -> Defaults;
    /// Downlink EIRP ceiling in dBm for a frequency. Defined for every frequency.
    fn get_downlink_tx_power(&self, frequency: u32) -> i8;
    /// Uplink EIRP ceiling in dBm when nothing else has been negotiated.
    fn get_default_max_uplink_eirp(&self) -> f32;
    /// Frequency a class-B device listens on for a ping slot.
    fn get_ping_slot_frequency(
        &self,
        dev_addr: &DevAddr<[u8; 4]>,
        beacon_time: Duration,
    ) -> Result<u32, Error>;
    /// Downlink channel index used for RX1 after an uplink on `uplink_channel`.
    fn get_rx1_channel_index_for_uplink_channel_index(
        &self,
        uplink_channel: usize,
    ) -> Result<usize, Error>;
    /// Downlink frequency used for RX1 after an uplink on `uplink_frequency`.
    fn get_rx1_frequency_for_uplink_frequency(&self, uplink_frequency: u32) -> Result<u32, Error>;
    /// Does the band handle the TXParamSetup MAC command for the protocol version?
    fn implements_tx_param_setup(&self, protocol_version: &str) -> bool;

    /// Data rate behind an index.
    fn get_data_rate(&self, dr: DR) -> Result<DataRate, Error> {
        self.tables().data_rate(dr).cloned()
    }

    /// Index of a data rate usable in the given direction.
    fn get_data_rate_index(&self, uplink: bool, data_rate: &DataRate) -> Result<DR, Error> {
        self.tables().data_rate_index(uplink, data_rate)
    }

    /// RX1 data rate for an uplink data rate and RX1 data rate offset. Offsets beyond the
    /// band's table saturate at the lowest data rate of the row.
    fn get_rx1_data_rate_index(&self, uplink_dr: DR, rx1_dr_offset: u8) -> Result<DR, Error> {
        self.tables().rx1_data_rate_index(uplink_dr, rx1_dr_offset)
    }

    /// Largest RX1 data rate offset the band defines.
    fn get_max_rx1_dr_offset(&self) -> u8 {
        self.tables().rx1_data_rate_table.max_offset()
    }

    /// Maximum payload size for a data rate.
    fn get_max_payload_size_for_data_rate_index(
        &self,
        protocol_version: &str,
        reg_params_revision: &str,
        dr: DR,
    ) -> Result<MaxPayloadSize, Error> {
        self.tables().max_payload_size(protocol_version, reg_params_revision, dr)
    }

    /// TX power offset in dB for a TX power index.
    fn get_tx_power_offset(&self, tx_power: u8) -> Result<i8, Error> {
        self.tables().tx_power_offset(tx_power)
    }

    /// Number of TX power indices.
    fn get_tx_power_indices(&self) -> usize {
        self.tables().tx_power_offsets.len()
    }

    /// Add a channel on top of the fixed plan, returning its index.
    fn add_channel(&mut self, frequency: u32, min_dr: DR, max_dr: DR) -> Result<usize, Error> {
        self.tables_mut().add_channel(frequency, min_dr, max_dr)
    }

    /// Uplink channel at an index.
    fn get_uplink_channel(&self, index: usize) -> Result<Channel, Error> {
        self.tables().channels.uplink(index).copied()
    }

    /// Downlink channel at an index.
    fn get_downlink_channel(&self, index: usize) -> Result<Channel, Error> {
        self.tables().channels.downlink(index).copied()
    }

    /// Downlink channel used for RX1 after an uplink on `uplink_channel`.
    fn get_rx1_channel_for_uplink_channel_index(&self, uplink_channel: usize) -> Result<Channel, Error> {
        let index = self.get_rx1_channel_index_for_uplink_channel_index(uplink_channel)?;
        self.get_downlink_channel(index)
    }

    /// Index of the uplink channel on a frequency. With `default_channel` only the band's
    /// fixed channels are matched.
    fn get_uplink_channel_index(&self, frequency: u32, default_channel: bool) -> Result<usize, Error> {
        self.tables().channels.uplink_index(frequency, default_channel)
    }

    /// Index of the uplink channel on a frequency that supports a data rate.
    fn get_uplink_channel_index_for_frequency_dr(&self, frequency: u32, dr: DR) -> Result<usize, Error> {
        self.tables().channels.uplink_index_for_frequency_dr(frequency, dr)
    }

    /// Every uplink channel index.
    fn get_uplink_channel_indices(&self) -> ChannelIndices {
        self.tables().channels.uplink_indices_where(|_| true)
    }

    /// Uplink channel indices of the band's fixed channels.
    fn get_standard_uplink_channel_indices(&self) -> ChannelIndices {
        self.tables().channels.uplink_indices_where(|c| !c.is_custom())
    }

    /// Uplink channel indices of channels added on top of the fixed plan.
    fn get_custom_uplink_channel_indices(&self) -> ChannelIndices {
        self.tables().channels.uplink_indices_where(|c| c.is_custom())
    }

    /// Enabled uplink channel indices.
    fn get_enabled_uplink_channel_indices(&self) -> ChannelIndices {
        self.tables().channels.uplink_indices_where(|c| c.is_enabled())
    }

    /// Disabled uplink channel indices.
    fn get_disabled_uplink_channel_indices(&self) -> ChannelIndices {
        self.tables().channels.uplink_indices_where(|c| !c.is_enabled())
    }

    /// Enable an uplink channel.
    fn enable_uplink_channel_index(&mut self, index: usize) -> Result<(), Error> {
        self.tables_mut().channels.set_uplink_enabled(index, true)
    }

    /// Disable an uplink channel.
    fn disable_uplink_channel_index(&mut self, index: usize) -> Result<(), Error> {
        self.tables_mut().channels.set_uplink_enabled(index, false)
    }

    /// Frequencies of the extra channels for a type 0 CFList.
    fn get_cf_list(&self) -> Option<Vec<u32, CF_LIST_FREQUENCIES>> {
        self.tables().channels.cf_list()
    }

    /// Check the band's tables are consistent.
    fn validate(&self) -> Result<(), Error> {
        self.tables().validate()
    }
}

/// A band of any supported region.
#[derive(Debug, Clone, PartialEq)]
pub enum RegionBand {
    /// KR920-923 with the FSK data rate.
    KR920Fsk(KR920Fsk),
}

macro_rules! region_dispatch {
    ($s:expr, $t:ident $(, $arg:expr)*) => {
        match $s {
            RegionBand::KR920Fsk(band) => band.$t($($arg),*),
        }
    };
}

impl RegionBand {
    /// Region of the band.
    pub fn region(&self) -> Region {
        match self {
            RegionBand::KR920Fsk(_) => Region::KR920Fsk,
        }
    }
}

impl Band for RegionBand {
    fn name(&self) -> &'static str {
        region_dispatch!(self, name)
    }

    fn tables(&self) -> &BandTables {
        region_dispatch!(self, tables)
    }

    fn tables_mut(&mut self) -> &mut BandTables {
        region_dispatch!(self, tables_mut)
    }

    fn get_defaults(&self) -> Defaults {
        region_dispatch!(self, get_defaults)
    }

    fn get_downlink_tx_power(&self, frequency: u32) -> i8 {
        region_dispatch!(self, get_downlink_tx_power, frequency)
    }

    fn get_default_max_uplink_eirp(&self) -> f32 {
        region_dispatch!(self, get_default_max_uplink_eirp)
    }

    fn get_ping_slot_frequency(
        &self,
        dev_addr: &DevAddr<[u8; 4]>,
        beacon_time: Duration,
    ) -> Result<u32, Error> {
        region_dispatch!(self, get_ping_slot_frequency, dev_addr, beacon_time)
    }

    fn get_rx1_channel_index_for_uplink_channel_index(
        &self,
        uplink_channel: usize,
    ) -> Result<usize, Error> {
        region_dispatch!(self, get_rx1_channel_index_for_uplink_channel_index, uplink_channel)
    }

    fn get_rx1_frequency_for_uplink_frequency(&self, uplink_frequency: u32) -> Result<u32, Error> {
        region_dispatch!(self, get_rx1_frequency_for_uplink_frequency, uplink_frequency)
    }

    fn implements_tx_param_setup(&self, protocol_version: &str) -> bool {
        region_dispatch!(self, implements_tx_param_setup, protocol_version)
    }
}

/// Build the band of a region. `repeater_compatible` lowers the payload size limits so a
/// repeater's overhead fits.
pub fn new_band(region: Region, repeater_compatible: bool) -> Result<RegionBand, Error> {
    debug!("building band {} (repeater compatible: {})", region, repeater_compatible);
    let band = match region {
        Region::KR920Fsk => RegionBand::KR920Fsk(KR920Fsk::new(repeater_compatible)?),
    };
    band.validate()?;
    Ok(band)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_names() {
        assert_eq!("KR920_FSK".parse::<Region>(), Ok(Region::KR920Fsk));
        assert_eq!("KR920".parse::<Region>(), Err(Error::UnknownRegion));
        assert_eq!(Region::KR920Fsk.name(), "KR920_FSK");
    }

    #[test]
    fn factory_dispatches_on_region() {
        let band = new_band(Region::KR920Fsk, false).unwrap();
        assert_eq!(band.region(), Region::KR920Fsk);
        assert_eq!(band.name(), "KR920_FSK");
    }

    #[test]
    fn band_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RegionBand>();
    }

    #[test]
    fn error_display() {
        assert_eq!(Error::InvalidChannelIndex(4).to_string(), "invalid channel index 4");
        assert_eq!(Error::UnsupportedDataRate(DR::_9).to_string(), "unsupported data rate 9");
        assert_eq!(
            Error::InvalidChannelDataRateRange(DR::_0, DR::_9).to_string(),
            "invalid channel data rate range DR0..=DR9"
        );
    }
}
