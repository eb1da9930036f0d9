/// Operating modes, in the order the button steps through them
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Low power nap, woken periodically to check the button
    Off,
    Piano,
    Metronome,
}

impl Mode {
    pub const fn next(self) -> Self {
        match self {
            Mode::Piano => Mode::Metronome,
            Mode::Metronome => Mode::Off,
            Mode::Off => Mode::Piano,
        }
    }
}

/// Mode selection with press/release latching on the button
#[derive(Clone, Copy, Debug)]
pub struct ModeSwitch {
    pub mode: Mode,
    /// Set by a press that changed mode, cleared once the button is seen released
    latched: bool,
}

impl ModeSwitch {
    pub const fn new() -> Self {
        Self {
            mode: Mode::Piano,
            latched: false,
        }
    }

    /// Feed one button observation. Returns the new mode if it changed.
    pub fn poll(&mut self, pressed: bool) -> Option<Mode> {
        if !pressed {
            self.latched = false;
            return None;
        }

        if self.latched {
            return None;
        }

        self.latched = true;
        self.mode = self.mode.next();
        Some(self.mode)
    }

    pub fn latched(&self) -> bool {
        self.latched
    }
}

impl Default for ModeSwitch {
    fn default() -> Self {
        Self::new()
    }
}
