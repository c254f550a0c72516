#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

mod fmt;

pub mod band;
pub mod config;

pub use band::types::{DataRate, MaxPayloadSize, Modulation, DR};
pub use band::{new_band, Band, Defaults, Error, Region, RegionBand};
pub use config::{BandConfig, ExtraChannel};
