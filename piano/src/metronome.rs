use embedded_hal::blocking::delay::DelayMs;

use crate::hw::{Tone, ToneDriver};
use crate::{Channel, TouchVector};

pub const MIN_BPM: u8 = 60;
pub const MAX_BPM: u8 = 240;
pub const BPM_STEP: u8 = 5;
pub const DEFAULT_BPM: u8 = 100;
pub const MAX_BEATS: u8 = 8;

/// Length of the audible click
pub const PULSE_MS: u16 = 25;
/// Subtracted from the table delay to account for the click and loop overhead
pub const DELAY_CORRECTION_MS: u16 = 20;

/// First BPM covered by `BEAT_DELAY_MS`
pub const TABLE_BASE_BPM: u8 = 40;

/// Milliseconds between beats, 40 BPM to 240 BPM in steps of 5
pub const BEAT_DELAY_MS: [u16; 41] = [
    1500, 1333, 1200, 1091, 1000, 923, 857, 800,
    750, 706, 667, 632, 600, 571, 545, 522,
    500, 480, 462, 444, 429, 414, 400, 387,
    375, 364, 353, 343, 333, 324, 316, 308,
    300, 293, 286, 279, 273, 267, 261, 255,
    250,
];

/// Click on the first beat of each measure
pub const ACCENT_TONE: Tone = Tone::new(93, 47);
/// Click on every other beat
pub const BEAT_TONE: Tone = Tone::new(111, 56);

/// Silent time following the click at `bpm`
pub fn beat_delay_ms(bpm: u8) -> u16 {
    let bpm = bpm.clamp(TABLE_BASE_BPM, MAX_BPM);
    let index = ((bpm - TABLE_BASE_BPM) / BPM_STEP) as usize;
    BEAT_DELAY_MS[index] - DELAY_CORRECTION_MS
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Metronome {
    pub bpm: u8,
    /// Beats per measure, 1 to 8
    pub beats: u8,
    /// Position of the next beat within the measure
    pub beat: u8,
    pub running: bool,
    /// Set by the beats and start/stop pads until every pad is released
    setting_change: bool,
}

impl Metronome {
    pub const fn new() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            beats: 1,
            beat: 0,
            running: true,
            setting_change: false,
        }
    }

    /// Play one beat and wait out the rest of the beat period.
    ///
    /// Does nothing while stopped.
    pub fn tick<T: ToneDriver, D: DelayMs<u16>>(&mut self, tone: &mut T, delay: &mut D) {
        if !self.running {
            return;
        }

        let click = if self.beat == 0 { ACCENT_TONE } else { BEAT_TONE };
        tone.set_tone(click);
        tone.start();
        delay.delay_ms(PULSE_MS);
        tone.stop();

        self.beat += 1;
        if self.beat >= self.beats {
            self.beat = 0;
        }

        delay.delay_ms(beat_delay_ms(self.bpm));
    }

    /// Apply the settings pads.
    ///
    /// T1 steps the beats per measure, T2 and T3 raise and lower the tempo
    /// while held, and T4 starts or stops the clicks. Only the first matching
    /// pad acts on each pass.
    pub fn handle_touch(&mut self, vector: TouchVector) {
        if vector.active() == 0 {
            self.setting_change = false;
            return;
        }

        if vector.is_touched(Channel::T1) && !self.setting_change {
            self.setting_change = true;
            self.beats += 1;
            if self.beats > MAX_BEATS {
                self.beats = 1;
                self.beat = 0;
            }
        } else if vector.is_touched(Channel::T2) {
            if self.bpm < MAX_BPM {
                self.bpm = (self.bpm + BPM_STEP).min(MAX_BPM);
            }
        } else if vector.is_touched(Channel::T3) {
            if self.bpm > MIN_BPM {
                self.bpm = self.bpm.saturating_sub(BPM_STEP).max(MIN_BPM);
            }
        } else if vector.is_touched(Channel::T4) && !self.setting_change {
            self.setting_change = true;
            self.running = !self.running;
        }
    }

    /// Full length of one beat, click included
    pub fn beat_period_ms(&self) -> u16 {
        PULSE_MS + beat_delay_ms(self.bpm)
    }
}

impl Default for Metronome {
    fn default() -> Self {
        Self::new()
    }
}
