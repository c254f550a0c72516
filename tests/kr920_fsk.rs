use std::sync::Arc;
use std::thread;
use std::time::Duration;

use encoding::parser::DevAddr;
use lorawan_band::band::payload_size::{LATEST, LORAWAN_1_0_3, LORAWAN_1_1_0, REG_PARAMS_REVISION_A};
use lorawan_band::{new_band, Band, MaxPayloadSize, Region, RegionBand, DR};
use rand::Rng;

const HIGH_POWER: [u32; 13] = [
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
const REDUCED_POWER: [u32; 7] =
    [917_300_000, 917_900_000, 918_500_000, 919_100_000, 919_700_000, 920_300_000, 920_700_000];

fn band(repeater_compatible: bool) -> RegionBand {
    new_band(Region::KR920Fsk, repeater_compatible).unwrap()
}

fn uplink_data_rates(band: &RegionBand) -> Vec<DR> {
    (0..16u8)
        .filter_map(|i| DR::try_from(i).ok())
        .filter(|dr| band.get_data_rate(*dr).map(|d| d.is_uplink()).unwrap_or(false))
        .collect()
}

#[test]
fn rx1_data_rate_non_increasing_with_offset() {
    let band = band(false);
    let drs = uplink_data_rates(&band);
    assert_eq!(drs.len(), 8);
    for dr in drs {
        let mut previous = band.get_rx1_data_rate_index(dr, 0).unwrap();
        assert!(previous <= dr);
        for offset in 1..=band.get_max_rx1_dr_offset() + 2 {
            let rx1 = band.get_rx1_data_rate_index(dr, offset).unwrap();
            assert!(rx1 <= previous, "DR{} offset {}", dr as u8, offset);
            assert!(band.get_data_rate(rx1).is_ok());
            previous = rx1;
        }
    }
}

#[test]
fn downlink_tx_power_is_total() {
    let band = band(false);
    for f in HIGH_POWER {
        assert_eq!(band.get_downlink_tx_power(f), 23);
    }
    for f in REDUCED_POWER {
        assert_eq!(band.get_downlink_tx_power(f), 10);
    }
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let f: u32 = rng.gen();
        let expected = if HIGH_POWER.contains(&f) {
            23
        } else if REDUCED_POWER.contains(&f) {
            10
        } else {
            4
        };
        assert_eq!(band.get_downlink_tx_power(f), expected);
    }
    assert_eq!(band.get_downlink_tx_power(u32::MAX), 4);
}

#[test]
fn ping_slot_frequency_is_constant() {
    let band = band(false);
    let mut rng = rand::thread_rng();
    for _ in 0..1000 {
        let dev_addr = DevAddr::from(rng.gen::<[u8; 4]>());
        let beacon_time = Duration::from_secs(rng.gen::<u32>() as u64);
        assert_eq!(band.get_ping_slot_frequency(&dev_addr, beacon_time), Ok(923_100_000));
    }
}

#[test]
fn rx1_mapping_is_identity() {
    let mut band = band(false);
    band.add_channel(922_700_000, DR::_0, DR::_7).unwrap();
    for index in band.get_uplink_channel_indices() {
        assert_eq!(band.get_rx1_channel_index_for_uplink_channel_index(index), Ok(index));
        let frequency = band.get_uplink_channel(index).unwrap().frequency;
        assert_eq!(band.get_rx1_frequency_for_uplink_frequency(frequency), Ok(frequency));
    }
}

#[test]
fn defaults() {
    let defaults = band(true).get_defaults();
    assert_eq!(defaults.rx2_frequency, 921_900_000);
    assert_eq!(defaults.rx2_dr, DR::_0);
    assert_eq!(defaults.max_fcnt_gap, 16384);
    assert_eq!(defaults.receive_delay1, Duration::from_secs(1));
    assert_eq!(defaults.receive_delay2, Duration::from_secs(2));
    assert_eq!(defaults.join_accept_delay1, Duration::from_secs(5));
    assert_eq!(defaults.join_accept_delay2, Duration::from_secs(6));
}

#[test]
fn payload_sizes_follow_repeater_flag() {
    for repeater_compatible in [false, true] {
        let band = band(repeater_compatible);
        let fast = if repeater_compatible {
            MaxPayloadSize::new(230, 222)
        } else {
            MaxPayloadSize::new(250, 242)
        };
        for (version, revision) in
            [(LATEST, LATEST), (LORAWAN_1_0_3, REG_PARAMS_REVISION_A), (LORAWAN_1_1_0, "RP002-1.0.3")]
        {
            let size = |dr| band.get_max_payload_size_for_data_rate_index(version, revision, dr);
            for dr in [DR::_0, DR::_1, DR::_2] {
                assert_eq!(size(dr), Ok(MaxPayloadSize::new(59, 51)));
            }
            assert_eq!(size(DR::_3), Ok(MaxPayloadSize::new(123, 115)));
            for dr in [DR::_4, DR::_5, DR::_6, DR::_7] {
                assert_eq!(size(dr), Ok(fast));
            }
        }
    }
}

#[test]
fn no_tx_param_setup() {
    let band = band(false);
    for version in [LATEST, "1.0.0", "1.0.2", "1.0.3", "1.1.0"] {
        assert!(!band.implements_tx_param_setup(version));
    }
}

#[test]
fn construction_is_deterministic() {
    assert_eq!(band(false), band(false));
    assert_eq!(band(true), band(true));
    assert_ne!(band(false), band(true));
}

#[test]
fn shared_between_threads() {
    let band = Arc::new(band(false));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let band = Arc::clone(&band);
            thread::spawn(move || {
                let index = i % 3;
                let rx1 = band.get_rx1_channel_for_uplink_channel_index(index).unwrap();
                (rx1.frequency, band.get_downlink_tx_power(rx1.frequency))
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        let (frequency, power) = handle.join().unwrap();
        assert_eq!(frequency, 922_100_000 + (i % 3) as u32 * 200_000);
        assert_eq!(power, 23);
    }
}
