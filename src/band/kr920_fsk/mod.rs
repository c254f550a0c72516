//! Processing for the KR920-923 band, variant with the 50 kbit/s FSK data rate as DR7.
//!
//! Uplink and downlink use the same channels, so RX1 replies go out on the uplink's channel.

use core::time::Duration;

use encoding::parser::DevAddr;
use heapless::Vec;
use lora_modulation::{Bandwidth, SpreadingFactor};

use super::channel_plan::{Channel, ChannelPlan};
use super::payload_size::{MaxPayloadSizeTable, PayloadSizes};
use super::tables::{data_rates, BandTables, Rx1DataRateTable};
use super::types::{DataRate, MaxPayloadSize, DR, NUM_DATA_RATES};
use super::{Band, Defaults, Error};

/// Region name.
pub const NAME: &str = "KR920_FSK";

const DEFAULT_MAX_UPLINK_EIRP: f32 = 14.0;
const PING_SLOT_FREQUENCY: u32 = 923_100_000;

// ~200 mW
const HIGH_POWER_DBM: i8 = 23;
const HIGH_POWER_FREQUENCIES: [u32; 13] = [
    920_900_000,
    921_100_000,
    921_300_000,
    921_500_000,
    921_700_000,
    921_900_000,
    922_100_000,
    922_300_000,
    922_500_000,
    922_700_000,
    922_900_000,
    923_100_000,
    923_300_000,
];

// ~10 mW
const REDUCED_POWER_DBM: i8 = 10;
const REDUCED_POWER_FREQUENCIES: [u32; 7] =
    [917_300_000, 917_900_000, 918_500_000, 919_100_000, 919_700_000, 920_300_000, 920_700_000];

// ~3 mW
const LOW_POWER_DBM: i8 = 4;

const DEFAULT_CHANNELS: [Channel; 3] = [
    Channel::new(922_100_000, DR::_0, DR::_5),
    Channel::new(922_300_000, DR::_0, DR::_5),
    Channel::new(922_500_000, DR::_0, DR::_5),
];

const TX_POWER_OFFSETS: [i8; 8] = [0, -2, -4, -6, -8, -10, -12, -14];

/// KR920-923 band with the FSK data rate.
#[derive(Debug, Clone, PartialEq)]
pub struct KR920Fsk {
    tables: BandTables,
}

impl KR920Fsk {
    /// Build the band. `repeater_compatible` caps DR4 to DR7 payloads at 230 bytes.
    pub fn new(repeater_compatible: bool) -> Result<Self, Error> {
        let tables = BandTables {
            supports_extra_channels: true,
            data_rates: data_rates(&[
                DataRate::lora(SpreadingFactor::_12, Bandwidth::_125KHz),
                DataRate::lora(SpreadingFactor::_11, Bandwidth::_125KHz),
                DataRate::lora(SpreadingFactor::_10, Bandwidth::_125KHz),
                DataRate::lora(SpreadingFactor::_9, Bandwidth::_125KHz),
                DataRate::lora(SpreadingFactor::_8, Bandwidth::_125KHz),
                DataRate::lora(SpreadingFactor::_7, Bandwidth::_125KHz),
                DataRate::lora(SpreadingFactor::_7, Bandwidth::_250KHz),
                DataRate::fsk(50_000),
            ]),
            rx1_data_rate_table: Rx1DataRateTable::from_rows(&[
                &[DR::_0, DR::_0, DR::_0, DR::_0, DR::_0, DR::_0],
                &[DR::_1, DR::_0, DR::_0, DR::_0, DR::_0, DR::_0],
                &[DR::_2, DR::_1, DR::_0, DR::_0, DR::_0, DR::_0],
                &[DR::_3, DR::_2, DR::_1, DR::_0, DR::_0, DR::_0],
                &[DR::_4, DR::_3, DR::_2, DR::_1, DR::_0, DR::_0],
                &[DR::_5, DR::_4, DR::_3, DR::_2, DR::_1, DR::_0],
                &[DR::_6, DR::_5, DR::_4, DR::_3, DR::_2, DR::_1],
                &[DR::_7, DR::_6, DR::_5, DR::_4, DR::_3, DR::_2],
            ])?,
            tx_power_offsets: Vec::from_slice(&TX_POWER_OFFSETS).map_err(|_| Error::InvalidBand)?,
            channels: ChannelPlan::new(&DEFAULT_CHANNELS, &DEFAULT_CHANNELS)?,
            max_payload_size_per_dr: MaxPayloadSizeTable::latest(max_payload_sizes(
                repeater_compatible,
            )),
        };
        Ok(Self { tables })
    }
}

fn max_payload_sizes(repeater_compatible: bool) -> PayloadSizes {
    let fast = if repeater_compatible {
        MaxPayloadSize::new(230, 222)
    } else {
        MaxPayloadSize::new(250, 242)
    };
    let mut sizes = [None; NUM_DATA_RATES];
    sizes[0] = Some(MaxPayloadSize::new(59, 51));
    sizes[1] = Some(MaxPayloadSize::new(59, 51));
    sizes[2] = Some(MaxPayloadSize::new(59, 51));
    sizes[3] = Some(MaxPayloadSize::new(123, 115));
    for size in &mut sizes[4..=7] {
        *size = Some(fast);
    }
    sizes
}

impl Band for KR920Fsk {
    fn name(&self) -> &'static str {
        NAME
    }

    fn tables(&self) -> &BandTables {
        &self.tables
    }

    fn tables_mut(&mut self) -> &mut BandTables {
        &mut self.tables
    }

    fn get_defaults(&self) -> Defaults {
        Defaults {
            rx2_frequency: 921_900_000,
            rx2_dr: DR::_0,
            max_fcnt_gap: 16384,
            receive_delay1: Duration::from_secs(1),
            receive_delay2: Duration::from_secs(2),
            join_accept_delay1: Duration::from_secs(5),
            join_accept_delay2: Duration::from_secs(6),
        }
    }

    fn get_downlink_tx_power(&self, frequency: u32) -> i8 {
        if HIGH_POWER_FREQUENCIES.contains(&frequency) {
            HIGH_POWER_DBM
        } else if REDUCED_POWER_FREQUENCIES.contains(&frequency) {
            REDUCED_POWER_DBM
        } else {
            trace!("no power tier for {}, using {} dBm", frequency, LOW_POWER_DBM);
            LOW_POWER_DBM
        }
    }

    fn get_default_max_uplink_eirp(&self) -> f32 {
        DEFAULT_MAX_UPLINK_EIRP
    }

    fn get_ping_slot_frequency(
        &self,
        _dev_addr: &DevAddr<[u8; 4]>,
        _beacon_time: Duration,
    ) -> Result<u32, Error> {
        Ok(PING_SLOT_FREQUENCY)
    }

    fn get_rx1_channel_index_for_uplink_channel_index(
        &self,
        uplink_channel: usize,
    ) -> Result<usize, Error> {
        self.tables.channels.uplink(uplink_channel)?;
        self.tables.channels.downlink(uplink_channel)?;
        Ok(uplink_channel)
    }

    fn get_rx1_frequency_for_uplink_frequency(&self, uplink_frequency: u32) -> Result<u32, Error> {
        if self.tables.channels.uplink_channels().iter().any(|c| c.frequency == uplink_frequency) {
            Ok(uplink_frequency)
        } else {
            warn!("uplink frequency {} is not part of the channel plan", uplink_frequency);
            Err(Error::UnknownFrequency(uplink_frequency))
        }
    }

    fn implements_tx_param_setup(&self, _protocol_version: &str) -> bool {
        false
    }
}
