//! Spell slot, cantrip and spells-known progressions, indexed by caster level.

use crate::templates::{CantripProgression, KnownSpellsTable};

/// Highest caster level any table covers.
pub const MAX_CASTER_LEVEL: u32 = 20;

/// Standard slots per spell level (1st..9th), row 0 is "no casting".
const STANDARD_SLOTS: [[u32; 9]; 21] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0],
    [2, 0, 0, 0, 0, 0, 0, 0, 0],
    [3, 0, 0, 0, 0, 0, 0, 0, 0],
    [4, 2, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 0, 0, 0, 0, 0, 0, 0],
    [4, 3, 2, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 0, 0, 0, 0, 0, 0],
    [4, 3, 3, 1, 0, 0, 0, 0, 0],
    [4, 3, 3, 2, 0, 0, 0, 0, 0],
    [4, 3, 3, 3, 1, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 0, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 0, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 0, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 0],
    [4, 3, 3, 3, 2, 1, 1, 1, 1],
    [4, 3, 3, 3, 3, 1, 1, 1, 1],
    [4, 3, 3, 3, 3, 2, 1, 1, 1],
    [4, 3, 3, 3, 3, 2, 2, 1, 1],
];

/// Pact magic: (slot count, shared slot level).
const PACT_SLOTS: [(u32, u8); 21] = [
    (0, 0),
    (1, 1),
    (2, 1),
    (2, 2),
    (2, 2),
    (2, 3),
    (2, 3),
    (2, 4),
    (2, 4),
    (2, 5),
    (2, 5),
    (3, 5),
    (3, 5),
    (3, 5),
    (3, 5),
    (3, 5),
    (3, 5),
    (4, 5),
    (4, 5),
    (4, 5),
    (4, 5),
];

const BARD_KNOWN: [u32; 21] = [
    0, 4, 5, 6, 7, 8, 9, 10, 11, 12, 14, 15, 15, 16, 18, 19, 19, 20, 22, 22, 22,
];
const SORCERER_KNOWN: [u32; 21] = [
    0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 12, 13, 13, 14, 14, 15, 15, 15, 15,
];
const WARLOCK_KNOWN: [u32; 21] = [
    0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 10, 11, 11, 12, 12, 13, 13, 14, 14, 15, 15,
];
const RANGER_KNOWN: [u32; 21] = [
    0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11, 11,
];

fn row(caster_level: u32) -> usize {
    caster_level.min(MAX_CASTER_LEVEL) as usize
}

/// Slots per spell level; index 0 of the result is 1st-level slots.
pub fn standard_slots(caster_level: u32) -> [u32; 9] {
    STANDARD_SLOTS[row(caster_level)]
}

/// Pact slots as (count, slot level).
pub fn pact_slots(caster_level: u32) -> (u32, u8) {
    PACT_SLOTS[row(caster_level)]
}

/// Cantrips known at a caster level.
pub fn cantrips_known(progression: CantripProgression, caster_level: u32) -> u32 {
    if caster_level == 0 {
        return 0;
    }
    let base = match progression {
        CantripProgression::None => return 0,
        CantripProgression::Minor => 2,
        CantripProgression::Standard => 3,
        CantripProgression::Major => 4,
    };
    match caster_level {
        1..=3 => base,
        4..=9 => base + 1,
        _ => base + 2,
    }
}

/// Fixed number of leveled spells known at a caster level.
pub fn spells_known(table: KnownSpellsTable, caster_level: u32) -> u32 {
    let values = match table {
        KnownSpellsTable::Bard => &BARD_KNOWN,
        KnownSpellsTable::Sorcerer => &SORCERER_KNOWN,
        KnownSpellsTable::Warlock => &WARLOCK_KNOWN,
        KnownSpellsTable::Ranger => &RANGER_KNOWN,
    };
    values[row(caster_level)]
}
