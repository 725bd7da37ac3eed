//! Reference tables: challenge ratings and spellcasting progressions.

mod spellcasting;

pub use spellcasting::*;

use serde::Serialize;

/// One row of the challenge-rating reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrRow {
    pub label: &'static str,
    pub xp: u32,
    pub proficiency: i32,
    pub armor_class: i32,
    /// Upper bound of the row's hit point band.
    pub hit_points: i32,
    pub attack_bonus: i32,
    /// Upper bound of the row's damage-per-round band.
    pub damage_per_round: i32,
    pub save_dc: i32,
}

const fn row(
    label: &'static str,
    xp: u32,
    proficiency: i32,
    armor_class: i32,
    hit_points: i32,
    attack_bonus: i32,
    damage_per_round: i32,
    save_dc: i32,
) -> CrRow {
    CrRow {
        label,
        xp,
        proficiency,
        armor_class,
        hit_points,
        attack_bonus,
        damage_per_round,
        save_dc,
    }
}

/// Expected statistics by challenge rating, lowest first.
pub const CR_TABLE: [CrRow; 34] = [
    row("0", 10, 2, 13, 6, 3, 1, 13),
    row("1/8", 25, 2, 13, 35, 3, 3, 13),
    row("1/4", 50, 2, 13, 49, 3, 5, 13),
    row("1/2", 100, 2, 13, 70, 3, 8, 13),
    row("1", 200, 2, 13, 85, 3, 14, 13),
    row("2", 450, 2, 13, 100, 3, 20, 13),
    row("3", 700, 2, 13, 115, 4, 26, 13),
    row("4", 1100, 2, 14, 130, 5, 32, 14),
    row("5", 1800, 3, 15, 145, 6, 38, 15),
    row("6", 2300, 3, 15, 160, 6, 44, 15),
    row("7", 2900, 3, 15, 175, 6, 50, 15),
    row("8", 3900, 3, 16, 190, 7, 56, 16),
    row("9", 5000, 4, 16, 205, 7, 62, 16),
    row("10", 5900, 4, 17, 220, 7, 68, 16),
    row("11", 7200, 4, 17, 235, 8, 74, 17),
    row("12", 8400, 4, 17, 250, 8, 80, 17),
    row("13", 10000, 5, 18, 265, 8, 86, 18),
    row("14", 11500, 5, 18, 280, 8, 92, 18),
    row("15", 13000, 5, 18, 295, 8, 98, 18),
    row("16", 15000, 5, 18, 310, 9, 104, 18),
    row("17", 18000, 6, 19, 325, 10, 110, 19),
    row("18", 20000, 6, 19, 340, 10, 116, 19),
    row("19", 22000, 6, 19, 355, 10, 122, 19),
    row("20", 25000, 6, 19, 400, 10, 140, 19),
    row("21", 33000, 7, 19, 445, 11, 158, 20),
    row("22", 41000, 7, 19, 490, 11, 176, 20),
    row("23", 50000, 7, 19, 535, 11, 194, 20),
    row("24", 62000, 7, 19, 580, 12, 212, 21),
    row("25", 75000, 8, 19, 625, 12, 230, 21),
    row("26", 90000, 8, 19, 670, 12, 248, 21),
    row("27", 105000, 8, 19, 715, 13, 266, 22),
    row("28", 120000, 8, 19, 760, 13, 284, 22),
    row("29", 135000, 9, 19, 805, 13, 302, 22),
    row("30", 155000, 9, 19, 850, 14, 320, 23),
];

/// Last valid row index.
pub const CR_MAX_INDEX: i32 = CR_TABLE.len() as i32 - 1;

/// Row at `index`, clamped into the table.
pub fn cr_row(index: i32) -> &'static CrRow {
    &CR_TABLE[index.clamp(0, CR_MAX_INDEX) as usize]
}

/// Lowest row index whose `column` exceeds `value`, or the last row when no
/// row does.
pub fn first_row_exceeding(value: f64, column: impl Fn(&CrRow) -> i32) -> i32 {
    CR_TABLE
        .iter()
        .position(|r| column(r) as f64 > value)
        .map(|i| i as i32)
        .unwrap_or(CR_MAX_INDEX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_monotonic() {
        for pair in CR_TABLE.windows(2) {
            assert!(pair[0].hit_points < pair[1].hit_points);
            assert!(pair[0].damage_per_round < pair[1].damage_per_round);
            assert!(pair[0].xp < pair[1].xp);
            assert!(pair[0].proficiency <= pair[1].proficiency);
        }
    }

    #[test]
    fn test_cr_row_clamps() {
        assert_eq!(cr_row(-5).label, "0");
        assert_eq!(cr_row(1000).label, "30");
        assert_eq!(cr_row(4).label, "1");
    }

    #[test]
    fn test_first_row_exceeding() {
        assert_eq!(first_row_exceeding(0.0, |r| r.hit_points), 0);
        assert_eq!(first_row_exceeding(6.0, |r| r.hit_points), 1);
        assert_eq!(first_row_exceeding(50.0, |r| r.hit_points), 3);
        assert_eq!(first_row_exceeding(10_000.0, |r| r.hit_points), CR_MAX_INDEX);
    }
}
