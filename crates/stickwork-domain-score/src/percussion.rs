//! Notation percussion codes → General MIDI drum-kit numbers.

pub const KICK: u8 = 36;
pub const SNARE: u8 = 38;
pub const HIHAT_CLOSED: u8 = 42;
pub const HIHAT_OPEN: u8 = 46;
pub const CRASH: u8 = 49;
pub const RIDE: u8 = 51;
pub const TOM_HIGH: u8 = 48;
pub const TOM_MID: u8 = 45;
pub const TOM_FLOOR: u8 = 43;

// Codes that already equal their kit number are listed too so the table
// documents the full kit.
const PERCUSSION_TABLE: &[(i32, u8)] = &[
    (35, KICK),
    (36, KICK),
    (38, SNARE),
    (40, SNARE),
    (42, HIHAT_CLOSED),
    (46, HIHAT_OPEN),
    (92, HIHAT_OPEN),
    (49, CRASH),
    (57, CRASH),
    (51, RIDE),
    (59, RIDE),
    (93, RIDE),
    (50, TOM_HIGH),
    (48, TOM_HIGH),
    (47, TOM_MID),
    (45, TOM_MID),
    (43, TOM_FLOOR),
    (41, TOM_FLOOR),
];

/// Canonical drum-kit number for a notation code.
///
/// Unknown codes pass through unchanged; `None` when the result is outside
/// the MIDI note range and could never be struck on a device.
pub fn canonical_pitch(code: i32) -> Option<u8> {
    let mapped = PERCUSSION_TABLE
        .iter()
        .find(|(from, _)| *from == code)
        .map(|(_, to)| *to as i32)
        .unwrap_or(code);
    u8::try_from(mapped).ok().filter(|pitch| *pitch <= 127)
}
