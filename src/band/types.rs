//! Value types shared by every band: data-rate indices, modulation settings and payload limits.

use lora_modulation::{Bandwidth, SpreadingFactor};

use super::Error;

/// Number of data-rate indices a LoRaWAN band can address (DR0 to DR15).
pub const NUM_DATA_RATES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
#[repr(u8)]
pub enum DR {
    _0 = 0,
    _1 = 1,
    _2 = 2,
    _3 = 3,
    _4 = 4,
    _5 = 5,
    _6 = 6,
    _7 = 7,
    _8 = 8,
    _9 = 9,
    _10 = 10,
    _11 = 11,
    _12 = 12,
    _13 = 13,
    _14 = 14,
    _15 = 15,
}

impl DR {
    /// Is this DR within range?
    pub fn in_range(&self, range: (DR, DR)) -> bool {
        (range.0 as u8 <= *self as u8) && (*self as u8 <= range.1 as u8)
    }

    /// Position of this DR in a band's per-index tables.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for DR {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DR::_0),
            1 => Ok(DR::_1),
            2 => Ok(DR::_2),
            3 => Ok(DR::_3),
            4 => Ok(DR::_4),
            5 => Ok(DR::_5),
            6 => Ok(DR::_6),
            7 => Ok(DR::_7),
            8 => Ok(DR::_8),
            9 => Ok(DR::_9),
            10 => Ok(DR::_10),
            11 => Ok(DR::_11),
            12 => Ok(DR::_12),
            13 => Ok(DR::_13),
            14 => Ok(DR::_14),
            15 => Ok(DR::_15),
            _ => Err(Error::InvalidDataRateIndex(value)),
        }
    }
}

impl From<DR> for u8 {
    fn from(dr: DR) -> Self {
        dr as u8
    }
}

/// Modulation settings behind a data-rate index.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Modulation {
    /// Linear chirp (LoRa) modulation.
    LoRa {
        /// Chirp spreading factor.
        spreading_factor: SpreadingFactor,
        /// Channel bandwidth.
        bandwidth: Bandwidth,
    },
    /// Frequency shift keying.
    Fsk {
        /// Bit rate in bit/s.
        bit_rate: u32,
    },
}

/// A data rate as defined by a band's data-rate table.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DataRate {
    /// Modulation and its parameters.
    pub modulation: Modulation,
    pub(crate) uplink: bool,
    pub(crate) downlink: bool,
}

impl DataRate {
    /// LoRa data rate usable in both directions.
    pub const fn lora(spreading_factor: SpreadingFactor, bandwidth: Bandwidth) -> Self {
        Self {
            modulation: Modulation::LoRa { spreading_factor, bandwidth },
            uplink: true,
            downlink: true,
        }
    }

    /// FSK data rate usable in both directions.
    pub const fn fsk(bit_rate: u32) -> Self {
        Self { modulation: Modulation::Fsk { bit_rate }, uplink: true, downlink: true }
    }

    /// Restrict the data rate to the given directions.
    pub fn with_directions(mut self, uplink: bool, downlink: bool) -> Self {
        self.uplink = uplink;
        self.downlink = downlink;
        self
    }

    /// Can an end-device transmit with this data rate?
    pub fn is_uplink(&self) -> bool {
        self.uplink
    }

    /// Can the network reply with this data rate?
    pub fn is_downlink(&self) -> bool {
        self.downlink
    }

    /// Spreading factor, for LoRa data rates.
    pub fn spreading_factor(&self) -> Option<SpreadingFactor> {
        match self.modulation {
            Modulation::LoRa { spreading_factor, .. } => Some(spreading_factor),
            Modulation::Fsk { .. } => None,
        }
    }

    /// Bandwidth in Hz, for LoRa data rates.
    pub fn bandwidth_hz(&self) -> Option<u32> {
        match self.modulation {
            Modulation::LoRa { bandwidth, .. } => Some(bandwidth.hz()),
            Modulation::Fsk { .. } => None,
        }
    }

    /// Bandwidth in kHz, rounded down, for LoRa data rates.
    pub fn bandwidth_khz(&self) -> Option<u32> {
        self.bandwidth_hz().map(|hz| hz / 1000)
    }

    /// Bit rate in bit/s, for FSK data rates.
    pub fn bit_rate(&self) -> Option<u32> {
        match self.modulation {
            Modulation::Fsk { bit_rate } => Some(bit_rate),
            Modulation::LoRa { .. } => None,
        }
    }

    /// Do two data rates use the same modulation settings, ignoring direction?
    pub(crate) fn same_modulation(&self, other: &DataRate) -> bool {
        self.modulation == other.modulation
    }
}

/// Maximum MAC payload size for a data rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MaxPayloadSize {
    /// Maximum MACPayload size, FOpts included.
    pub m: u8,
    /// Maximum FRMPayload size (M minus the worst case header overhead).
    pub n: u8,
}

impl MaxPayloadSize {
    /// Creation.
    pub const fn new(m: u8, n: u8) -> Self {
        Self { m, n }
    }
}
