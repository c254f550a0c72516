//! Uplink and downlink channel sequences of a band.

use heapless::Vec;

use super::types::DR;
use super::Error;

/// Upper bound on the number of channels in one direction.
pub const MAX_CHANNELS: usize = 80;
/// Number of frequencies carried by a CFList of type 0.
pub const CF_LIST_FREQUENCIES: usize = 5;

/// A single channel of a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel {
    /// Center frequency in Hz.
    pub frequency: u32,
    /// Lowest usable data rate.
    pub min_dr: DR,
    /// Highest usable data rate.
    pub max_dr: DR,
    pub(crate) enabled: bool,
    pub(crate) custom: bool,
}

impl Channel {
    /// Enabled, non-custom channel.
    pub const fn new(frequency: u32, min_dr: DR, max_dr: DR) -> Self {
        Self { frequency, min_dr, max_dr, enabled: true, custom: false }
    }

    /// Is the channel enabled?
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Was the channel added on top of the band's fixed plan?
    pub fn is_custom(&self) -> bool {
        self.custom
    }

    /// Can the channel be used with the data rate?
    pub fn supports(&self, dr: DR) -> bool {
        dr.in_range((self.min_dr, self.max_dr))
    }
}

/// Channel indices, in plan order.
pub type ChannelIndices = Vec<usize, MAX_CHANNELS>;

/// Uplink and downlink channels. A channel's position is its identity when pairing uplink and
/// downlink channels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelPlan {
    uplink: Vec<Channel, MAX_CHANNELS>,
    downlink: Vec<Channel, MAX_CHANNELS>,
}

impl ChannelPlan {
    /// Build a plan from the band's fixed channels.
    pub fn new(uplink: &[Channel], downlink: &[Channel]) -> Result<Self, Error> {
        Ok(Self {
            uplink: Vec::from_slice(uplink).map_err(|_| Error::ChannelPlanFull)?,
            downlink: Vec::from_slice(downlink).map_err(|_| Error::ChannelPlanFull)?,
        })
    }

    /// Append a custom channel to both directions, returning its index.
    pub fn add_channel(&mut self, frequency: u32, min_dr: DR, max_dr: DR) -> Result<usize, Error> {
        let channel = Channel { custom: true, ..Channel::new(frequency, min_dr, max_dr) };
        if self.uplink.is_full() || self.downlink.is_full() {
            warn!("channel plan full, cannot add {}", frequency);
            return Err(Error::ChannelPlanFull);
        }
        self.uplink.push(channel).map_err(|_| Error::ChannelPlanFull)?;
        self.downlink.push(channel).map_err(|_| Error::ChannelPlanFull)?;
        debug!("added channel {} at {} Hz", self.uplink.len() - 1, frequency);
        Ok(self.uplink.len() - 1)
    }

    /// Uplink channels in index order.
    pub fn uplink_channels(&self) -> &[Channel] {
        &self.uplink
    }

    /// Downlink channels in index order.
    pub fn downlink_channels(&self) -> &[Channel] {
        &self.downlink
    }

    pub(crate) fn uplink(&self, index: usize) -> Result<&Channel, Error> {
        self.uplink.get(index).ok_or_else(|| {
            warn!("no uplink channel {}", index);
            Error::InvalidChannelIndex(index)
        })
    }

    pub(crate) fn downlink(&self, index: usize) -> Result<&Channel, Error> {
        self.downlink.get(index).ok_or_else(|| {
            warn!("no downlink channel {}", index);
            Error::InvalidChannelIndex(index)
        })
    }

    pub(crate) fn set_uplink_enabled(&mut self, index: usize, enabled: bool) -> Result<(), Error> {
        let channel = self.uplink.get_mut(index).ok_or(Error::InvalidChannelIndex(index))?;
        channel.enabled = enabled;
        debug!("uplink channel {} enabled: {}", index, enabled);
        Ok(())
    }

    /// Index of the uplink channel on `frequency`. With `default_channel` only the band's fixed
    /// channels are considered.
    pub(crate) fn uplink_index(&self, frequency: u32, default_channel: bool) -> Result<usize, Error> {
        self.uplink
            .iter()
            .position(|c| c.frequency == frequency && (!default_channel || !c.custom))
            .ok_or_else(|| {
                warn!("no uplink channel on {}", frequency);
                Error::UnknownFrequency(frequency)
            })
    }

    pub(crate) fn uplink_index_for_frequency_dr(&self, frequency: u32, dr: DR) -> Result<usize, Error> {
        self.uplink
            .iter()
            .position(|c| c.frequency == frequency && c.supports(dr))
            .ok_or(Error::UnknownFrequency(frequency))
    }

    pub(crate) fn uplink_indices_where(&self, f: impl Fn(&Channel) -> bool) -> ChannelIndices {
        self.uplink.iter().enumerate().filter(|(_, c)| f(c)).map(|(i, _)| i).collect()
    }

    /// Frequencies of the custom channels as carried by a CFList. `None` without custom channels.
    pub(crate) fn cf_list(&self) -> Option<Vec<u32, CF_LIST_FREQUENCIES>> {
        let frequencies: Vec<u32, CF_LIST_FREQUENCIES> = self
            .uplink
            .iter()
            .filter(|c| c.custom)
            .take(CF_LIST_FREQUENCIES)
            .map(|c| c.frequency)
            .collect();
        if frequencies.is_empty() {
            None
        } else {
            Some(frequencies)
        }
    }
}
