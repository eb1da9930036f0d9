#![cfg_attr(not(test), no_std)]

pub mod hw;
pub mod instrument;
pub mod metronome;
pub mod mode;
pub mod notes;
pub mod sensor;

/// Number of capacitive touch pads on the keyboard
pub const NUM_CHANNELS: usize = 4;

/// One of the four touch pads, numbered left to right as printed on the board
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Channel {
    T1 = 0,
    T2 = 1,
    T3 = 2,
    T4 = 3,
}

impl Channel {
    pub const ALL: [Channel; NUM_CHANNELS] = [Channel::T1, Channel::T2, Channel::T3, Channel::T4];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Configuration for the adaptive touch sensing
#[derive(Clone, Copy, Debug)]
pub struct TouchConfig {
    /// Number of raw readings averaged per channel to form the initial baseline
    pub calibration_samples: u16,
    /// A channel trips when its count falls below `baseline - baseline / trip_divisor`
    pub trip_divisor: u16,
    /// Weight of the exponential smoothing step applied to an untouched baseline.
    /// Each pass moves the baseline `1 / filter_divisor` of the way toward the reading.
    pub filter_divisor: u16,
}

impl TouchConfig {
    const fn default() -> Self {
        Self {
            calibration_samples: 16,
            trip_divisor: 8,
            filter_divisor: 16,
        }
    }
}

pub const DEFAULT_TOUCH_CONFIG: TouchConfig = TouchConfig::default();

/// Snapshot of which pads were tripped during one complete sensing pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TouchVector([bool; NUM_CHANNELS]);

impl TouchVector {
    pub const fn new(touched: [bool; NUM_CHANNELS]) -> Self {
        Self(touched)
    }

    pub fn is_touched(&self, channel: Channel) -> bool {
        self.0[channel.index()]
    }

    /// Number of tripped channels
    pub fn active(&self) -> usize {
        self.0.iter().filter(|t| **t).count()
    }

    /// Pack the vector into a nibble, T1 in bit 0 through T4 in bit 3
    pub fn bits(&self) -> u8 {
        self.0
            .iter()
            .enumerate()
            .fold(0, |acc, (i, t)| if *t { acc | (1 << i) } else { acc })
    }
}
