//! Mapping from the four overlapping pads to the eight notes of the scale.
//!
//! The pads sit side by side, and touching the gap between two of them
//! trips both, so four pads give seven notes. Touching both outer pads
//! together plays the octave:
//!
//! ```text
//!     |  T1   | |  T2   | |  T3   | |  T4   |
//!     | Note7 | | Note5 | | Note3 | | Note1 |
//!     +-------+ +-------+ +-------+ +-------+
//!              |         |         |
//!            Note6     Note4     Note2        Note8 = T1 + T4
//! ```

use crate::hw::Tone;
use crate::TouchVector;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Note {
    Silence,
    /// A4
    Note1,
    /// B4
    Note2,
    /// C#5
    Note3,
    /// D5
    Note4,
    /// E5
    Note5,
    /// F#5
    Note6,
    /// G#5
    Note7,
    /// A5, both end pads together
    Note8,
}

impl Note {
    /// PWM settings for this note, or None for silence.
    ///
    /// Tick units assume a 62.5 kHz tone timer; each duty is half the period.
    pub const fn tone(self) -> Option<Tone> {
        match self {
            Note::Silence => None,
            Note::Note1 => Some(Tone::new(140, 71)),
            Note::Note2 => Some(Tone::new(125, 63)),
            Note::Note3 => Some(Tone::new(111, 56)),
            Note::Note4 => Some(Tone::new(105, 53)),
            Note::Note5 => Some(Tone::new(93, 47)),
            Note::Note6 => Some(Tone::new(83, 42)),
            Note::Note7 => Some(Tone::new(74, 38)),
            Note::Note8 => Some(Tone::new(69, 35)),
        }
    }
}

/// One row of the decode table. Matches when the touch bits selected by
/// `mask` equal `value` (T1 is bit 0).
#[derive(Clone, Copy, Debug)]
pub struct Pattern {
    pub mask: u8,
    pub value: u8,
    pub note: Note,
}

impl Pattern {
    const fn new(mask: u8, value: u8, note: Note) -> Self {
        Self { mask, value, note }
    }

    pub fn matches(&self, vector: &TouchVector) -> bool {
        vector.bits() & self.mask == self.value
    }
}

const T1: u8 = 1 << 0;
const T2: u8 = 1 << 1;
const T3: u8 = 1 << 2;
const T4: u8 = 1 << 3;

/// Decode table, highest priority first
pub const PATTERNS: [Pattern; 8] = [
    Pattern::new(T1 | T4, T1 | T4, Note::Note8),
    Pattern::new(T1 | T2, T1, Note::Note7),
    Pattern::new(T1 | T2, T1 | T2, Note::Note6),
    Pattern::new(T1 | T2 | T3, T2, Note::Note5),
    Pattern::new(T2 | T3, T2 | T3, Note::Note4),
    Pattern::new(T2 | T3 | T4, T3, Note::Note3),
    Pattern::new(T3 | T4, T3 | T4, Note::Note2),
    Pattern::new(T3 | T4, T4, Note::Note1),
];

/// First matching note in the pattern table
pub fn decode(vector: TouchVector) -> Option<Note> {
    PATTERNS.iter().find(|p| p.matches(&vector)).map(|p| p.note)
}

/// Tracks the note currently selected in piano mode
#[derive(Clone, Copy, Debug)]
pub struct NoteDecoder {
    pub note: Note,
}

impl NoteDecoder {
    pub const fn new() -> Self {
        Self {
            note: Note::Silence,
        }
    }

    /// Update the selected note from a new touch vector.
    ///
    /// No touch selects silence. A touch combination with no table entry keeps
    /// whatever note was already selected.
    pub fn select(&mut self, vector: TouchVector) -> Note {
        if vector.active() == 0 {
            self.note = Note::Silence;
        } else if let Some(note) = decode(vector) {
            self.note = note;
        }
        self.note
    }
}

impl Default for NoteDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub mod test {
    use super::*;

    fn v(t1: bool, t2: bool, t3: bool, t4: bool) -> TouchVector {
        TouchVector::new([t1, t2, t3, t4])
    }

    #[test]
    fn test_single_and_adjacent_pads() {
        assert_eq!(decode(v(false, false, false, true)), Some(Note::Note1));
        assert_eq!(decode(v(false, false, true, true)), Some(Note::Note2));
        assert_eq!(decode(v(false, false, true, false)), Some(Note::Note3));
        assert_eq!(decode(v(false, true, true, false)), Some(Note::Note4));
        assert_eq!(decode(v(false, true, false, false)), Some(Note::Note5));
        assert_eq!(decode(v(true, true, false, false)), Some(Note::Note6));
        assert_eq!(decode(v(true, false, false, false)), Some(Note::Note7));
        assert_eq!(decode(v(true, false, false, true)), Some(Note::Note8));
    }

    #[test]
    fn test_priority_order() {
        // Both ends beat everything else that includes T1
        assert_eq!(decode(v(true, true, true, true)), Some(Note::Note8));
        assert_eq!(decode(v(true, true, false, true)), Some(Note::Note8));
        // T2 + T3 wins over T3 + T4 when three adjacent pads are held
        assert_eq!(decode(v(false, true, true, true)), Some(Note::Note4));
        assert_eq!(decode(v(true, true, true, false)), Some(Note::Note6));
        // T2 and T4 apart
        assert_eq!(decode(v(false, true, false, true)), Some(Note::Note5));
    }

    #[test]
    fn test_table_covers_every_touch() {
        for bits in 1u8..16 {
            let vector = v(bits & 1 != 0, bits & 2 != 0, bits & 4 != 0, bits & 8 != 0);
            assert!(decode(vector).is_some(), "no note for {:04b}", bits);
        }
        assert_eq!(decode(TouchVector::default()), None);
    }

    #[test]
    fn test_select_silence_on_release() {
        let mut decoder = NoteDecoder::new();
        assert_eq!(decoder.select(v(false, true, true, false)), Note::Note4);
        assert_eq!(decoder.note, Note::Note4);
        assert_eq!(decoder.select(TouchVector::default()), Note::Silence);
    }

    #[test]
    fn test_tone_table() {
        assert_eq!(Note::Silence.tone(), None);
        assert_eq!(Note::Note1.tone(), Some(Tone::new(140, 71)));
        assert_eq!(Note::Note8.tone(), Some(Tone::new(69, 35)));

        // Pitch rises with every step up the scale
        let scale = [
            Note::Note1,
            Note::Note2,
            Note::Note3,
            Note::Note4,
            Note::Note5,
            Note::Note6,
            Note::Note7,
            Note::Note8,
        ];
        for pair in scale.windows(2) {
            let lo = pair[0].tone().unwrap();
            let hi = pair[1].tone().unwrap();
            assert!(hi.period < lo.period);
        }
    }
}
