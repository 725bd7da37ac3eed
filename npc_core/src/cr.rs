//! Challenge rating estimation.
//!
//! The estimate is a table-driven heuristic:
//! 1. **Best signals**: the highest-damage attack and the highest-level ability
//! 2. **Defense**: HP band lookup, shifted by AC against the band's expected AC
//! 3. **Offense**: damage band shifted by to-hit, and ability level shifted by DC
//! 4. **Combine**: average the two, then nudge by proficiency
//!
//! All shifts floor toward negative infinity.

use serde::Serialize;
use tracing::debug;

use npc_rules::{cr_row, first_row_exceeding, CR_MAX_INDEX};

/// One combat-relevant signal contributed by a weapon or feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CrFactor {
    /// A repeatable attack: to-hit and damage per round.
    Attack { to_hit: i32, damage: f64 },
    /// A save-based ability: a table row index and its DC.
    Ability { level: i32, dc: i32 },
    EffectiveDamageMod(f64),
    EffectiveAcMod(i32),
    EffectiveHpMod(i32),
}

/// The defensive inputs read from the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrInputs {
    pub hit_points: i32,
    pub armor_class: i32,
    pub proficiency: i32,
}

/// Result of an estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrEstimate {
    /// Row index into the CR table, always within bounds.
    pub index: i32,
    pub label: String,
    pub xp: u32,
    pub defensive: i32,
    pub offensive: i32,
}

impl CrEstimate {
    /// `"2 (450 XP)"`.
    pub fn display(&self) -> String {
        format!("{} ({} XP)", self.label, format_thousands(self.xp))
    }
}

fn format_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn halved_shift(actual: i32, expected: i32) -> i32 {
    (actual - expected).div_euclid(2)
}

/// Estimate a challenge rating from the character's defenses and its
/// collected factors.
pub fn estimate_cr(inputs: CrInputs, factors: &[CrFactor]) -> CrEstimate {
    // Step 1: best signals, first seen wins ties
    let mut best_attack: Option<(i32, f64)> = None;
    let mut best_ability: Option<(i32, i32)> = None;
    let mut hp_mod = 0;
    let mut ac_mod = 0;
    let mut damage_mod = 0.0;

    for factor in factors {
        match *factor {
            CrFactor::Attack { to_hit, damage } => {
                if best_attack.map_or(true, |(_, best)| damage > best) {
                    best_attack = Some((to_hit, damage));
                }
            }
            CrFactor::Ability { level, dc } => {
                if best_ability.map_or(true, |(best, _)| level > best) {
                    best_ability = Some((level, dc));
                }
            }
            CrFactor::EffectiveDamageMod(v) => damage_mod += v,
            CrFactor::EffectiveAcMod(v) => ac_mod += v,
            CrFactor::EffectiveHpMod(v) => hp_mod += v,
        }
    }

    // Step 2: defensive rating
    let effective_hp = (inputs.hit_points + hp_mod) as f64;
    let hp_index = first_row_exceeding(effective_hp, |r| r.hit_points);
    let effective_ac = inputs.armor_class + ac_mod;
    let defensive = hp_index + halved_shift(effective_ac, cr_row(hp_index).armor_class);

    // Step 3: offensive rating from attacks
    let attack_rating = best_attack.map(|(to_hit, damage)| {
        let index = first_row_exceeding(damage + damage_mod, |r| r.damage_per_round);
        index + halved_shift(to_hit, cr_row(index).attack_bonus)
    });

    // Step 4: offensive rating from abilities
    let ability_rating = best_ability.map(|(level, dc)| {
        let index = level.max(0);
        index + halved_shift(dc, cr_row(index).save_dc)
    });

    // Step 5: well-rounded bonus
    let offensive = match (attack_rating, ability_rating) {
        (Some(a), Some(b)) if (a - b).abs() <= 2 => a.max(b) + 1,
        (Some(a), Some(b)) => a.max(b),
        (Some(a), None) | (None, Some(a)) => a,
        (None, None) => 0,
    };

    // Step 6: combine and adjust by proficiency
    let mut index = (defensive + offensive).div_euclid(2);
    let expected_proficiency = cr_row(index).proficiency;
    if inputs.proficiency > expected_proficiency {
        index += 1;
    } else if inputs.proficiency < expected_proficiency {
        index -= 1;
    }
    let index = index.clamp(0, CR_MAX_INDEX);
    let row = cr_row(index);

    debug!(defensive, offensive, index, cr = row.label, "estimated challenge rating");

    CrEstimate {
        index,
        label: row.label.to_string(),
        xp: row.xp,
        defensive,
        offensive,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(hit_points: i32, armor_class: i32, proficiency: i32) -> CrInputs {
        CrInputs {
            hit_points,
            armor_class,
            proficiency,
        }
    }

    #[test]
    fn test_defense_only() {
        // 50 HP falls in the 1/2 band (index 3); AC 13 matches, no attack.
        // (3 + 0) / 2 = 1, expected proficiency 2 matches.
        let cr = estimate_cr(inputs(50, 13, 2), &[]);
        assert_eq!(cr.defensive, 3);
        assert_eq!(cr.offensive, 0);
        assert_eq!(cr.index, 1);
        assert_eq!(cr.label, "1/8");
    }

    #[test]
    fn test_attack_and_ac_shifts() {
        // HP 90 -> index 5, AC 17 vs 13 -> +2 => 7.
        // Damage 15 -> index 5, to-hit 5 vs 3 -> +1 => 6.
        // (7 + 6) / 2 = 6, expected proficiency 2 vs 3 -> +1 => 7 (CR 4).
        let cr = estimate_cr(
            inputs(90, 17, 3),
            &[CrFactor::Attack { to_hit: 5, damage: 15.0 }],
        );
        assert_eq!(cr.defensive, 7);
        assert_eq!(cr.offensive, 6);
        assert_eq!(cr.index, 7);
        assert_eq!(cr.display(), "4 (1,100 XP)");
    }

    #[test]
    fn test_negative_shift_floors() {
        // AC 10 vs expected 13: (10 - 13) / 2 floors to -2.
        let cr = estimate_cr(inputs(50, 10, 2), &[]);
        assert_eq!(cr.defensive, 1);
    }

    #[test]
    fn test_best_attack_wins_and_ties_keep_first() {
        let factors = [
            CrFactor::Attack { to_hit: 9, damage: 10.0 },
            CrFactor::Attack { to_hit: 3, damage: 10.0 },
            CrFactor::Attack { to_hit: 3, damage: 4.0 },
        ];
        let cr = estimate_cr(inputs(1, 13, 2), &factors);
        // Damage 10 -> index 4 (CR 1 band), to-hit 9 vs 3 -> +3 => 7.
        assert_eq!(cr.offensive, 7);
    }

    #[test]
    fn test_well_rounded_bonus() {
        let factors = [
            CrFactor::Attack { to_hit: 3, damage: 10.0 },
            CrFactor::Ability { level: 5, dc: 13 },
        ];
        let cr = estimate_cr(inputs(1, 13, 2), &factors);
        // attack 4, ability 5: within 2 so max + 1.
        assert_eq!(cr.offensive, 6);
    }

    #[test]
    fn test_modifiers_apply() {
        let plain = estimate_cr(inputs(30, 13, 2), &[]);
        let boosted = estimate_cr(
            inputs(30, 13, 2),
            &[CrFactor::EffectiveHpMod(60), CrFactor::EffectiveAcMod(4)],
        );
        assert!(boosted.defensive > plain.defensive);
    }

    #[test]
    fn test_clamps_to_table() {
        let weak = estimate_cr(
            inputs(1, 0, 0),
            &[CrFactor::Attack { to_hit: -20, damage: 0.0 }],
        );
        assert_eq!(weak.index, 0);
        assert_eq!(weak.label, "0");

        let strong = estimate_cr(
            inputs(5_000, 40, 12),
            &[
                CrFactor::Attack { to_hit: 30, damage: 900.0 },
                CrFactor::Ability { level: 60, dc: 40 },
            ],
        );
        assert_eq!(strong.index, CR_MAX_INDEX);
        assert_eq!(strong.display(), "30 (155,000 XP)");
    }
}
