//! Camelot wheel key representation and harmonic compatibility
//!
//! A Camelot code combines a wheel position (1-12) with a mode letter
//! (A = minor, B = major). Two keys mix well when they are identical,
//! adjacent on the wheel in the same mode (a perfect-fifth apart), or at
//! the same position in opposite modes (relative major/minor).
//!
//! Malformed codes never produce an error: they parse to `None` and are
//! reported as incompatible with everything, matching how string-typed
//! metadata flows through the feature store.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Key mode: the letter half of a Camelot code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// Minor keys (Camelot "A" ring)
    Minor,

    /// Major keys (Camelot "B" ring)
    Major,
}

impl KeyMode {
    /// The opposite ring (relative major/minor)
    pub fn relative(&self) -> KeyMode {
        match self {
            KeyMode::Minor => KeyMode::Major,
            KeyMode::Major => KeyMode::Minor,
        }
    }

    fn letter(&self) -> char {
        match self {
            KeyMode::Minor => 'A',
            KeyMode::Major => 'B',
        }
    }
}

/// A parsed Camelot key: wheel position 1-12 plus mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CamelotKey {
    position: u8,
    mode: KeyMode,
}

/// Musical key name (sharps, minor suffixed with 'm') to Camelot code.
///
/// Same table the feature extraction stage uses when deriving codes from
/// detected key + scale.
static MUSICAL_KEY_TABLE: Lazy<HashMap<&'static str, CamelotKey>> = Lazy::new(|| {
    let entries = [
        ("C", 8, KeyMode::Major),
        ("C#", 3, KeyMode::Major),
        ("D", 10, KeyMode::Major),
        ("D#", 5, KeyMode::Major),
        ("E", 12, KeyMode::Major),
        ("F", 7, KeyMode::Major),
        ("F#", 2, KeyMode::Major),
        ("G", 9, KeyMode::Major),
        ("G#", 4, KeyMode::Major),
        ("A", 11, KeyMode::Major),
        ("A#", 6, KeyMode::Major),
        ("B", 1, KeyMode::Major),
        ("Cm", 5, KeyMode::Minor),
        ("C#m", 12, KeyMode::Minor),
        ("Dm", 7, KeyMode::Minor),
        ("D#m", 2, KeyMode::Minor),
        ("Em", 9, KeyMode::Minor),
        ("Fm", 4, KeyMode::Minor),
        ("F#m", 11, KeyMode::Minor),
        ("Gm", 6, KeyMode::Minor),
        ("G#m", 1, KeyMode::Minor),
        ("Am", 8, KeyMode::Minor),
        ("A#m", 3, KeyMode::Minor),
        ("Bm", 10, KeyMode::Minor),
    ];

    entries
        .into_iter()
        .map(|(name, position, mode)| (name, CamelotKey { position, mode }))
        .collect()
});

impl CamelotKey {
    /// Construct from a wheel position (1-12) and mode
    ///
    /// Returns `None` when the position is outside the wheel.
    pub fn new(position: u8, mode: KeyMode) -> Option<Self> {
        if (1..=12).contains(&position) {
            Some(Self { position, mode })
        } else {
            None
        }
    }

    /// Parse a Camelot code such as "8B" or "12A"
    ///
    /// Case-insensitive on the mode letter. Returns `None` for anything
    /// that is not a valid code; parsing never fails loudly.
    pub fn parse(code: &str) -> Option<Self> {
        let mut chars = code.trim().chars();
        let mode = match chars.next_back()? {
            'A' | 'a' => KeyMode::Minor,
            'B' | 'b' => KeyMode::Major,
            _ => return None,
        };
        let position: u8 = chars.as_str().parse().ok()?;

        Self::new(position, mode)
    }

    /// Derive a Camelot key from a musical key name and scale
    ///
    /// Flat spellings are normalized to their sharp equivalents before
    /// lookup (Db -> C#, Eb -> D#, Gb -> F#, Ab -> G#, Bb -> A#).
    /// Unknown key names yield `None`.
    pub fn from_musical_key(name: &str, mode: KeyMode) -> Option<Self> {
        let normalized = match name {
            "Db" => "C#",
            "Eb" => "D#",
            "Gb" => "F#",
            "Ab" => "G#",
            "Bb" => "A#",
            other => other,
        };

        let lookup = match mode {
            KeyMode::Major => normalized.to_string(),
            KeyMode::Minor => format!("{normalized}m"),
        };

        MUSICAL_KEY_TABLE.get(lookup.as_str()).copied()
    }

    /// Wheel position, 1-12
    pub fn position(&self) -> u8 {
        self.position
    }

    /// Key mode (wheel ring)
    pub fn mode(&self) -> KeyMode {
        self.mode
    }

    /// Whether `target` harmonically follows this key
    ///
    /// True for the identical key, the two adjacent wheel positions in the
    /// same mode (position 12 wraps to 1), and the same position in the
    /// opposite mode.
    pub fn is_compatible_with(&self, target: &CamelotKey) -> bool {
        if self.position == target.position {
            return true; // same or relative major/minor
        }

        if self.mode == target.mode {
            // 1-based wheel arithmetic with wraparound
            let up = self.position % 12 + 1;
            let down = (self.position + 10) % 12 + 1;
            return target.position == up || target.position == down;
        }

        false
    }
}

impl fmt::Display for CamelotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.position, self.mode.letter())
    }
}

/// Compatibility over raw code strings
///
/// Parses both sides; any malformed code is reported incompatible rather
/// than raised as an error.
pub fn keys_compatible(source: &str, target: &str) -> bool {
    match (CamelotKey::parse(source), CamelotKey::parse(target)) {
        (Some(s), Some(t)) => s.is_compatible_with(&t),
        _ => false,
    }
}
