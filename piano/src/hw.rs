//! Narrow interfaces to the hardware services the instrument runs on.
//!
//! Everything register-level lives behind these traits so the sensing,
//! decoding, and sequencing logic can run against real peripherals on the
//! board or against scripted stand-ins on the host. Blocking delays use the
//! `embedded-hal` delay traits directly, since every HAL already provides them.

use embedded_hal::blocking::delay::DelayMs;

use crate::Channel;

/// Source of raw capacitive oscillator counts.
///
/// A higher count means lower capacitance, i.e. an untouched pad.
pub trait RawSensor {
    /// Take one reading of `channel` over the fixed sensing window.
    ///
    /// Returns None if the acquisition did not produce a count.
    fn read(&mut self, channel: Channel) -> Option<u16>;

    /// Power up the sensing peripheral
    fn enable(&mut self);

    /// Power down the sensing peripheral
    fn disable(&mut self);
}

/// A PWM period and on-time, in the tone timer's tick units
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tone {
    pub period: u16,
    pub duty: u16,
}

impl Tone {
    pub const fn new(period: u16, duty: u16) -> Self {
        Self { period, duty }
    }
}

/// Square wave output driving the piezo beeper
pub trait ToneDriver {
    fn set_tone(&mut self, tone: Tone);
    fn start(&mut self);
    fn stop(&mut self);
}

/// The mode push button. Reads are raw; edge latching happens in software.
pub trait Button {
    fn is_pressed(&mut self) -> bool;
}

pub trait PowerManager {
    /// Suspend until the next periodic wake-up (roughly every 128 ms)
    fn enter_low_power(&mut self);
}

/// All of the hardware services the instrument needs, owned together
pub struct Board<S, T, B, P, D> {
    pub sensor: S,
    pub tone: T,
    pub button: B,
    pub power: P,
    pub delay: D,
}

impl<S, T, B, P, D> Board<S, T, B, P, D>
where
    S: RawSensor,
    T: ToneDriver,
    B: Button,
    P: PowerManager,
    D: DelayMs<u16>,
{
    pub fn new(sensor: S, tone: T, button: B, power: P, delay: D) -> Self {
        Self {
            sensor,
            tone,
            button,
            power,
            delay,
        }
    }
}
