//! The main loop: one owned state structure for the whole instrument, stepped
//! once per iteration and dispatched on the active mode.

use embedded_hal::blocking::delay::DelayMs;

use crate::hw::{Board, Button, PowerManager, RawSensor, ToneDriver};
use crate::metronome::Metronome;
use crate::mode::{Mode, ModeSwitch};
use crate::notes::{Note, NoteDecoder};
use crate::sensor::TouchSensor;
use crate::TouchConfig;

pub struct Instrument<'a, S, T, B, P, D> {
    pub board: Board<S, T, B, P, D>,
    pub touch: TouchSensor<'a>,
    pub decoder: NoteDecoder,
    pub metronome: Metronome,
    pub mode: ModeSwitch,
    /// Note currently driven on the tone output in piano mode
    sounding: Note,
}

impl<'a, S, T, B, P, D> Instrument<'a, S, T, B, P, D>
where
    S: RawSensor,
    T: ToneDriver,
    B: Button,
    P: PowerManager,
    D: DelayMs<u16>,
{
    /// Take ownership of the board and calibrate the touch pads.
    ///
    /// Starts in piano mode with sensing enabled.
    pub fn new(mut board: Board<S, T, B, P, D>, config: Option<&'a TouchConfig>) -> Self {
        let mut touch = TouchSensor::new(config);
        board.sensor.enable();
        touch.calibrate(&mut board.sensor);
        board.tone.stop();

        Self {
            board,
            touch,
            decoder: NoteDecoder::new(),
            metronome: Metronome::new(),
            mode: ModeSwitch::new(),
            sounding: Note::Silence,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode.mode
    }

    /// Run one iteration of the active mode. Returns the new mode if the
    /// button changed it during this iteration.
    pub fn step(&mut self) -> Option<Mode> {
        match self.mode.mode {
            Mode::Off => self.step_off(),
            Mode::Piano => self.step_piano(),
            Mode::Metronome => self.step_metronome(),
        }
    }

    fn step_off(&mut self) -> Option<Mode> {
        self.board.power.enter_low_power();
        self.check_button()
    }

    fn step_piano(&mut self) -> Option<Mode> {
        let vector = self.touch.update(&mut self.board.sensor);
        let note = self.decoder.select(vector);

        let change = self.check_button();
        if change.is_none() {
            self.play(note);
        }
        change
    }

    fn step_metronome(&mut self) -> Option<Mode> {
        self.metronome.tick(&mut self.board.tone, &mut self.board.delay);

        let change = self.check_button();
        if change.is_none() {
            let vector = self.touch.update(&mut self.board.sensor);
            self.metronome.handle_touch(vector);
        }
        change
    }

    fn check_button(&mut self) -> Option<Mode> {
        let pressed = self.board.button.is_pressed();
        let change = self.mode.poll(pressed);
        if let Some(mode) = change {
            self.enter(mode);
        }
        change
    }

    fn enter(&mut self, mode: Mode) {
        match mode {
            Mode::Off => {
                self.silence();
                self.board.sensor.disable();
            }
            Mode::Piano => {
                self.board.sensor.enable();
            }
            Mode::Metronome => {
                self.silence();
                self.metronome.running = true;
            }
        }
    }

    fn play(&mut self, note: Note) {
        if note == self.sounding {
            return;
        }
        match note.tone() {
            Some(tone) => {
                self.board.tone.set_tone(tone);
                self.board.tone.start();
            }
            None => self.board.tone.stop(),
        }
        self.sounding = note;
    }

    fn silence(&mut self) {
        self.board.tone.stop();
        self.sounding = Note::Silence;
    }
}
