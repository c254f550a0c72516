//! Tables shared by every band and the lookups that only depend on them.

use heapless::Vec;

use super::channel_plan::ChannelPlan;
use super::payload_size::{MaxPayloadSizeTable, LATEST};
use super::types::{DataRate, MaxPayloadSize, DR, NUM_DATA_RATES};
use super::Error;

/// Upper bound on the number of RX1 data rate offsets a band can define.
pub const MAX_RX1_DR_OFFSETS: usize = 8;
/// Upper bound on the number of TX power indices a band can define.
pub const MAX_TX_POWER_INDICES: usize = 16;

/// Data rate table indexed by DR.
pub type DataRates = [Option<DataRate>; NUM_DATA_RATES];

/// Build a data rate table from consecutive data rates starting at DR0.
pub fn data_rates(rates: &[DataRate]) -> DataRates {
    core::array::from_fn(|i| rates.get(i).cloned())
}

/// RX1 data rate per uplink data rate and RX1 data rate offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rx1DataRateTable {
    rows: [Option<Vec<DR, MAX_RX1_DR_OFFSETS>>; NUM_DATA_RATES],
}

impl Rx1DataRateTable {
    /// Build the table from rows indexed by uplink data rate, starting at DR0. Each row lists
    /// the downlink data rate for offset 0, 1, ...
    pub fn from_rows(rows: &[&[DR]]) -> Result<Self, Error> {
        let mut table = Self { rows: core::array::from_fn(|_| None) };
        if rows.len() > NUM_DATA_RATES {
            return Err(Error::InvalidBand);
        }
        for (slot, row) in table.rows.iter_mut().zip(rows) {
            *slot = Some(Vec::from_slice(row).map_err(|_| Error::InvalidBand)?);
        }
        Ok(table)
    }

    /// Downlink data rate for RX1. Offsets past the end of the row saturate at the last entry.
    pub fn get(&self, uplink_dr: DR, rx1_dr_offset: u8) -> Result<DR, Error> {
        let row = self.row(uplink_dr).ok_or(Error::UnsupportedDataRate(uplink_dr))?;
        let last = row.len().checked_sub(1).ok_or(Error::UnsupportedDataRate(uplink_dr))?;
        let index = rx1_dr_offset as usize;
        if index > last {
            trace!("rx1 dr offset {} clamped to {}", rx1_dr_offset, last);
        }
        Ok(row[index.min(last)])
    }

    /// Largest RX1 data rate offset the table defines.
    pub fn max_offset(&self) -> u8 {
        self.rows.iter().flatten().map(|r| r.len().saturating_sub(1)).max().unwrap_or(0) as u8
    }

    fn row(&self, uplink_dr: DR) -> Option<&Vec<DR, MAX_RX1_DR_OFFSETS>> {
        self.rows[uplink_dr.index()].as_ref()
    }

    fn rows(&self) -> impl Iterator<Item = (DR, &Vec<DR, MAX_RX1_DR_OFFSETS>)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| Some((DR::try_from(i as u8).ok()?, r.as_ref()?)))
    }
}

/// The static part of a band: data rates, RX1 mapping, TX power offsets, channels and
/// payload sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct BandTables {
    pub(crate) supports_extra_channels: bool,
    pub(crate) data_rates: DataRates,
    pub(crate) rx1_data_rate_table: Rx1DataRateTable,
    pub(crate) tx_power_offsets: Vec<i8, MAX_TX_POWER_INDICES>,
    pub(crate) channels: ChannelPlan,
    pub(crate) max_payload_size_per_dr: MaxPayloadSizeTable,
}

impl BandTables {
    pub(crate) fn data_rate(&self, dr: DR) -> Result<&DataRate, Error> {
        self.data_rates[dr.index()].as_ref().ok_or_else(|| {
            warn!("unsupported data rate {}", dr);
            Error::UnsupportedDataRate(dr)
        })
    }

    pub(crate) fn data_rate_index(&self, uplink: bool, data_rate: &DataRate) -> Result<DR, Error> {
        self.data_rates
            .iter()
            .enumerate()
            .find_map(|(i, candidate)| match candidate {
                Some(c)
                    if c.same_modulation(data_rate)
                        && ((uplink && c.uplink) || (!uplink && c.downlink)) =>
                {
                    DR::try_from(i as u8).ok()
                }
                _ => None,
            })
            .ok_or(Error::UnknownDataRate)
    }

    pub(crate) fn rx1_data_rate_index(&self, uplink_dr: DR, rx1_dr_offset: u8) -> Result<DR, Error> {
        self.rx1_data_rate_table.get(uplink_dr, rx1_dr_offset).inspect_err(|_| {
            warn!("no rx1 data rate for uplink {}", uplink_dr);
        })
    }

    pub(crate) fn max_payload_size(
        &self,
        protocol_version: &str,
        reg_params_revision: &str,
        dr: DR,
    ) -> Result<MaxPayloadSize, Error> {
        self.max_payload_size_per_dr.get(protocol_version, reg_params_revision, dr).inspect_err(
            |_| {
                warn!("no max payload size for {}", dr);
            },
        )
    }

    pub(crate) fn tx_power_offset(&self, tx_power: u8) -> Result<i8, Error> {
        self.tx_power_offsets.get(tx_power as usize).copied().ok_or(Error::InvalidTxPower(tx_power))
    }

    pub(crate) fn add_channel(&mut self, frequency: u32, min_dr: DR, max_dr: DR) -> Result<usize, Error> {
        if !self.supports_extra_channels {
            warn!("band does not support extra channels");
            return Err(Error::ExtraChannelsNotSupported);
        }
        self.check_data_rate_range(min_dr, max_dr)?;
        self.channels.add_channel(frequency, min_dr, max_dr)
    }

    fn check_data_rate_range(&self, min_dr: DR, max_dr: DR) -> Result<(), Error> {
        let known = (min_dr.index()..=max_dr.index()).all(|i| self.data_rates[i].is_some());
        if min_dr > max_dr || !known {
            return Err(Error::InvalidChannelDataRateRange(min_dr, max_dr));
        }
        Ok(())
    }

    /// Check the invariants every band must hold.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        let channels = self.channels.uplink_channels().iter().chain(self.channels.downlink_channels());
        for channel in channels {
            self.check_data_rate_range(channel.min_dr, channel.max_dr)?;
        }

        // one RX1 row per uplink data rate, all rows equally wide and non-increasing
        let width = self.rx1_data_rate_table.max_offset() as usize + 1;
        for (i, rate) in self.data_rates.iter().enumerate() {
            if let (Some(rate), Ok(dr)) = (rate, DR::try_from(i as u8)) {
                if rate.uplink && self.rx1_data_rate_table.row(dr).is_none() {
                    error!("missing rx1 row for {}", dr);
                    return Err(Error::InvalidBand);
                }
                if self.max_payload_size_per_dr.get(LATEST, LATEST, dr).is_err() {
                    error!("missing max payload size for {}", dr);
                    return Err(Error::InvalidBand);
                }
            }
        }
        if let Some(dr) =
            self.max_payload_size_per_dr.data_rates().find(|dr| self.data_rates[dr.index()].is_none())
        {
            error!("max payload size for unknown {}", dr);
            return Err(Error::InvalidBand);
        }
        for (dr, row) in self.rx1_data_rate_table.rows() {
            let known = row.iter().all(|d| self.data_rates[d.index()].is_some());
            let non_increasing = row.windows(2).all(|w| w[0] >= w[1]);
            if row.len() != width || !known || !non_increasing {
                error!("invalid rx1 row for {}", dr);
                return Err(Error::InvalidBand);
            }
        }

        let starts_at_zero = self.tx_power_offsets.first() == Some(&0);
        let non_increasing = self.tx_power_offsets.windows(2).all(|w| w[0] >= w[1]);
        if !starts_at_zero || !non_increasing {
            error!("invalid tx power offsets");
            return Err(Error::InvalidBand);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use lora_modulation::{Bandwidth, SpreadingFactor};

    use super::*;
    use crate::band::channel_plan::Channel;
    use crate::band::payload_size::PayloadSizes;

    fn tables() -> BandTables {
        let channels = [Channel::new(868_100_000, DR::_0, DR::_2)];
        let mut sizes: PayloadSizes = [None; NUM_DATA_RATES];
        for size in sizes.iter_mut().take(3) {
            *size = Some(MaxPayloadSize::new(59, 51));
        }
        BandTables {
            supports_extra_channels: true,
            data_rates: data_rates(&[
                DataRate::lora(SpreadingFactor::_12, Bandwidth::_125KHz),
                DataRate::lora(SpreadingFactor::_11, Bandwidth::_125KHz),
                DataRate::lora(SpreadingFactor::_10, Bandwidth::_125KHz),
            ]),
            rx1_data_rate_table: Rx1DataRateTable::from_rows(&[
                &[DR::_0, DR::_0],
                &[DR::_1, DR::_0],
                &[DR::_2, DR::_1],
            ])
            .unwrap(),
            tx_power_offsets: Vec::from_slice(&[0, -3, -6]).unwrap(),
            channels: ChannelPlan::new(&channels, &channels).unwrap(),
            max_payload_size_per_dr: MaxPayloadSizeTable::latest(sizes),
        }
    }

    #[test]
    fn valid_tables() {
        assert_eq!(tables().validate(), Ok(()));
    }

    #[test]
    fn rx1_offset_saturates() {
        let t = tables();
        assert_eq!(t.rx1_data_rate_index(DR::_2, 1), Ok(DR::_1));
        assert_eq!(t.rx1_data_rate_index(DR::_2, 7), Ok(DR::_1));
        assert_eq!(t.rx1_data_rate_index(DR::_3, 0), Err(Error::UnsupportedDataRate(DR::_3)));
        assert_eq!(t.rx1_data_rate_table.max_offset(), 1);
    }

    #[test]
    fn data_rate_reverse_lookup() {
        let mut t = tables();
        let sf11 = DataRate::lora(SpreadingFactor::_11, Bandwidth::_125KHz);
        assert_eq!(t.data_rate_index(true, &sf11), Ok(DR::_1));

        t.data_rates[1] = Some(sf11.clone().with_directions(true, false));
        assert_eq!(t.data_rate_index(false, &sf11), Err(Error::UnknownDataRate));
        assert_eq!(t.data_rate_index(true, &sf11), Ok(DR::_1));
    }

    #[test]
    fn tx_power_offsets() {
        let t = tables();
        assert_eq!(t.tx_power_offset(0), Ok(0));
        assert_eq!(t.tx_power_offset(2), Ok(-6));
        assert_eq!(t.tx_power_offset(3), Err(Error::InvalidTxPower(3)));
    }

    #[test]
    fn add_channel_checks_data_rates() {
        let mut t = tables();
        assert_eq!(t.add_channel(867_100_000, DR::_0, DR::_2), Ok(1));
        assert_eq!(
            t.add_channel(867_300_000, DR::_0, DR::_5),
            Err(Error::InvalidChannelDataRateRange(DR::_0, DR::_5))
        );
        assert_eq!(
            t.add_channel(867_300_000, DR::_2, DR::_1),
            Err(Error::InvalidChannelDataRateRange(DR::_2, DR::_1))
        );

        t.supports_extra_channels = false;
        assert_eq!(t.add_channel(867_300_000, DR::_0, DR::_2), Err(Error::ExtraChannelsNotSupported));
    }

    #[test]
    fn invalid_rx1_table() {
        let mut t = tables();
        // ragged rows
        t.rx1_data_rate_table =
            Rx1DataRateTable::from_rows(&[&[DR::_0, DR::_0], &[DR::_1], &[DR::_2, DR::_1]]).unwrap();
        assert_eq!(t.validate(), Err(Error::InvalidBand));

        // increasing with the offset
        t.rx1_data_rate_table =
            Rx1DataRateTable::from_rows(&[&[DR::_0, DR::_0], &[DR::_0, DR::_1], &[DR::_2, DR::_1]])
                .unwrap();
        assert_eq!(t.validate(), Err(Error::InvalidBand));

        // missing row for an uplink data rate
        t.rx1_data_rate_table =
            Rx1DataRateTable::from_rows(&[&[DR::_0, DR::_0], &[DR::_1, DR::_0]]).unwrap();
        assert_eq!(t.validate(), Err(Error::InvalidBand));
    }

    #[test]
    fn invalid_tx_power_offsets() {
        let mut t = tables();
        t.tx_power_offsets = Vec::from_slice(&[0, -2, -1]).unwrap();
        assert_eq!(t.validate(), Err(Error::InvalidBand));
        t.tx_power_offsets = Vec::from_slice(&[-1, -2]).unwrap();
        assert_eq!(t.validate(), Err(Error::InvalidBand));
    }

    #[test]
    fn invalid_payload_sizes() {
        let mut t = tables();
        let mut sizes: PayloadSizes = [None; NUM_DATA_RATES];
        sizes[0] = Some(MaxPayloadSize::new(59, 51));
        sizes[1] = Some(MaxPayloadSize::new(59, 51));
        t.max_payload_size_per_dr = MaxPayloadSizeTable::latest(sizes);
        // DR2 is in the data-rate table but has no size
        assert_eq!(t.validate(), Err(Error::InvalidBand));

        // a size for DR5, which the data-rate table does not know
        let mut t = tables();
        sizes[2] = Some(MaxPayloadSize::new(59, 51));
        sizes[5] = Some(MaxPayloadSize::new(250, 242));
        t.max_payload_size_per_dr = MaxPayloadSizeTable::latest(sizes);
        assert_eq!(t.validate(), Err(Error::InvalidBand));

        sizes[5] = None;
        t.max_payload_size_per_dr = MaxPayloadSizeTable::latest(sizes);
        assert_eq!(t.validate(), Ok(()));
    }

    #[test]
    fn invalid_channel_data_rates() {
        let mut t = tables();
        let channels = [Channel::new(868_100_000, DR::_0, DR::_5)];
        t.channels = ChannelPlan::new(&channels, &channels).unwrap();
        assert_eq!(t.validate(), Err(Error::InvalidChannelDataRateRange(DR::_0, DR::_5)));
    }
}
