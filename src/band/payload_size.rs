//! Maximum payload size lookup keyed by protocol version, regional parameters revision and data rate.
//!
//! Bands whose limits do not depend on the protocol version or the regional parameters revision
//! register a single set of sizes under [`LATEST`] for both keys.

use heapless::Vec;

use super::types::{MaxPayloadSize, DR, NUM_DATA_RATES};
use super::Error;

/// Key matching any protocol version or regional parameters revision without a dedicated entry.
pub const LATEST: &str = "latest";

/// LoRaWAN 1.0.0.
pub const LORAWAN_1_0_0: &str = "1.0.0";
/// LoRaWAN 1.0.1.
pub const LORAWAN_1_0_1: &str = "1.0.1";
/// LoRaWAN 1.0.2.
pub const LORAWAN_1_0_2: &str = "1.0.2";
/// LoRaWAN 1.0.3.
pub const LORAWAN_1_0_3: &str = "1.0.3";
/// LoRaWAN 1.1.0.
pub const LORAWAN_1_1_0: &str = "1.1.0";

/// Regional parameters revision A.
pub const REG_PARAMS_REVISION_A: &str = "A";
/// Regional parameters revision B.
pub const REG_PARAMS_REVISION_B: &str = "B";

const MAX_ENTRIES: usize = 8;

/// Payload sizes per data rate for one (protocol version, revision) pair.
pub type PayloadSizes = [Option<MaxPayloadSize>; NUM_DATA_RATES];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    protocol_version: &'static str,
    reg_params_revision: &'static str,
    sizes: PayloadSizes,
}

/// Payload size table of a band.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MaxPayloadSizeTable {
    entries: Vec<Entry, MAX_ENTRIES>,
}

impl MaxPayloadSizeTable {
    /// Table with one set of sizes registered under [`LATEST`] for both keys.
    pub fn latest(sizes: PayloadSizes) -> Self {
        let entry = Entry { protocol_version: LATEST, reg_params_revision: LATEST, sizes };
        Self { entries: core::iter::once(entry).collect() }
    }

    /// Register sizes for a (protocol version, revision) pair, replacing any previous entry.
    pub fn insert(
        &mut self,
        protocol_version: &'static str,
        reg_params_revision: &'static str,
        sizes: PayloadSizes,
    ) -> Result<(), Error> {
        if let Some(entry) = self.entries.iter_mut().find(|e| {
            e.protocol_version == protocol_version && e.reg_params_revision == reg_params_revision
        }) {
            entry.sizes = sizes;
            return Ok(());
        }
        self.entries
            .push(Entry { protocol_version, reg_params_revision, sizes })
            .map_err(|_| Error::InvalidBand)
    }

    /// Resolve the payload size for a data rate.
    ///
    /// The protocol version falls back to [`LATEST`] when it has no entries at all; within the
    /// selected version the revision falls back to [`LATEST`] the same way. A data rate missing
    /// from the selected sizes is an error, there is no default size.
    pub fn get(
        &self,
        protocol_version: &str,
        reg_params_revision: &str,
        dr: DR,
    ) -> Result<MaxPayloadSize, Error> {
        let version = if self.has_version(protocol_version) { protocol_version } else { LATEST };
        let sizes = self
            .find(version, reg_params_revision)
            .or_else(|| self.find(version, LATEST))
            .ok_or(Error::UnsupportedDataRate(dr))?;
        sizes[dr.index()].ok_or(Error::UnsupportedDataRate(dr))
    }

    /// Iterate over every data rate with a registered size, across all entries.
    pub(crate) fn data_rates(&self) -> impl Iterator<Item = DR> + '_ {
        self.entries.iter().flat_map(|e| {
            e.sizes
                .iter()
                .enumerate()
                .filter(|(_, s)| s.is_some())
                .filter_map(|(i, _)| DR::try_from(i as u8).ok())
        })
    }

    fn has_version(&self, protocol_version: &str) -> bool {
        self.entries.iter().any(|e| e.protocol_version == protocol_version)
    }

    fn find(&self, protocol_version: &str, reg_params_revision: &str) -> Option<&PayloadSizes> {
        self.entries
            .iter()
            .find(|e| {
                e.protocol_version == protocol_version
                    && e.reg_params_revision == reg_params_revision
            })
            .map(|e| &e.sizes)
    }
}
