//! Attribute rolling.
//!
//! Six values are rolled (or taken from a fixed array), shuffled into the
//! canonical attribute order, swapped so the class's priority attributes get
//! first claim on the high rolls, and finally adjusted by racial bonuses and
//! floating racial points.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use npc_rules::Attribute;

use crate::character::Character;
use crate::config::GeneratorConfig;
use crate::error::BuildError;
use crate::random::{choose, seeded_rng, SeededRng};

/// Preset used when a request names none.
pub const DEFAULT_ROLL_METHOD: &str = "4d6";

/// Every preset name accepted by [`AttributeRollMethod::preset`].
pub const ROLL_METHOD_PRESETS: [&str; 6] =
    ["3d6", "4d6", "5d6", "standard_array", "heroic", "average"];

/// Stat holding unassigned racial attribute points.
pub const FLOATING_POINTS_STAT: &str = "floating_attribute_points";

/// How the six attribute values are produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeRollMethod {
    pub name: String,
    pub die_size: u32,
    /// Dice summed per value, after drops.
    pub dice: u32,
    pub drop_lowest: u32,
    pub drop_highest: u32,
    /// Whole-set rerolls allowed while the total is below `min_total`. The
    /// configured reroll cap bounds this further.
    pub rerolls: u32,
    pub min_total: i32,
    /// Values used before any dice are rolled.
    pub fixed: Vec<i32>,
    pub no_swap: bool,
    /// Let a priority attribute take values from later priority slots too.
    pub force_optimize: bool,
    pub no_racial_bonus: bool,
}

impl Default for AttributeRollMethod {
    fn default() -> Self {
        Self {
            name: "3d6".to_string(),
            die_size: 6,
            dice: 3,
            drop_lowest: 0,
            drop_highest: 0,
            rerolls: 0,
            min_total: 0,
            fixed: Vec::new(),
            no_swap: false,
            force_optimize: false,
            no_racial_bonus: false,
        }
    }
}

impl AttributeRollMethod {
    /// Look up a named preset.
    pub fn preset(name: &str) -> Result<Self, BuildError> {
        let base = Self {
            name: name.to_string(),
            ..Self::default()
        };
        let method = match name {
            "3d6" => base,
            "4d6" => Self {
                drop_lowest: 1,
                ..base
            },
            "5d6" => Self {
                drop_lowest: 1,
                drop_highest: 1,
                ..base
            },
            "standard_array" => Self {
                fixed: vec![15, 14, 13, 12, 10, 8],
                force_optimize: true,
                ..base
            },
            "heroic" => Self {
                drop_lowest: 1,
                rerolls: u32::MAX,
                min_total: 75,
                ..base
            },
            "average" => Self {
                fixed: vec![13, 13, 12, 12, 11, 10],
                ..base
            },
            _ => {
                return Err(BuildError::UnknownRollMethod {
                    name: name.to_string(),
                })
            }
        };
        Ok(method)
    }

    /// Lowest and highest single value this method can produce, before
    /// bonuses.
    pub fn value_bounds(&self) -> (i32, i32) {
        let rolled = (self.dice as i32, (self.dice * self.die_size) as i32);
        if self.fixed.len() >= 6 {
            let fixed = &self.fixed[..6];
            let min = fixed.iter().copied().min().unwrap_or(rolled.0);
            let max = fixed.iter().copied().max().unwrap_or(rolled.1);
            return (min, max);
        }
        match (self.fixed.iter().min(), self.fixed.iter().max()) {
            (Some(lo), Some(hi)) => (rolled.0.min(*lo), rolled.1.max(*hi)),
            _ => rolled,
        }
    }

    /// One value: roll every die, drop the extremes, sum the rest.
    fn roll_value(&self, rng: &mut SeededRng) -> i32 {
        let total_dice = self.dice + self.drop_lowest + self.drop_highest;
        let mut rolls: Vec<i32> = (0..total_dice)
            .map(|_| rng.gen_range(1..=self.die_size.max(1)) as i32)
            .collect();
        rolls.sort_unstable();
        let end = rolls.len() - self.drop_highest as usize;
        rolls[self.drop_lowest as usize..end].iter().sum()
    }

    /// Six values, rerolling the whole set while it falls short.
    pub fn roll_values(&self, rng: &mut SeededRng, reroll_cap: u32) -> Vec<i32> {
        let mut budget = self.rerolls.min(reroll_cap);
        loop {
            let mut values: Vec<i32> = self.fixed.iter().take(6).copied().collect();
            while values.len() < 6 {
                values.push(self.roll_value(rng));
            }
            let total: i32 = values.iter().sum();
            if total >= self.min_total || budget == 0 {
                return values;
            }
            budget -= 1;
        }
    }
}

/// Swap high values into priority attributes, in priority order.
///
/// Each priority attribute may take a strictly larger value from any slot
/// that is not already finalized and, unless `force_optimize`, not reserved
/// for a later priority attribute. Ties between equal maxima are broken at
/// random.
pub fn prioritize(
    values: &mut [i32; 6],
    priority: &[Attribute],
    force_optimize: bool,
    rng: &mut SeededRng,
) {
    let mut finalized: Vec<Attribute> = Vec::new();
    for (position, attribute) in priority.iter().enumerate() {
        if finalized.contains(attribute) {
            continue;
        }
        let later = &priority[position + 1..];
        let eligible: Vec<Attribute> = Attribute::ALL
            .iter()
            .copied()
            .filter(|a| a != attribute && !finalized.contains(a))
            .filter(|a| force_optimize || !later.contains(a))
            .collect();

        let own = values[attribute.index()];
        let best = eligible.iter().map(|a| values[a.index()]).max();
        if let Some(best) = best.filter(|b| *b > own) {
            let tied: Vec<Attribute> = eligible
                .iter()
                .copied()
                .filter(|a| values[a.index()] == best)
                .collect();
            if let Some(other) = choose(rng, &tied) {
                values.swap(attribute.index(), other.index());
            }
        }
        finalized.push(*attribute);
    }
}

/// Hand out floating points one per attribute: priority attributes first,
/// then random picks. Attributes with a flat racial bonus are skipped.
/// Returns the attributes that received a point.
pub fn spend_floating_points(
    values: &mut [i32; 6],
    priority: &[Attribute],
    bonused: &[Attribute],
    points: u32,
    rng: &mut SeededRng,
) -> Vec<Attribute> {
    let mut eligible: Vec<Attribute> = Attribute::ALL
        .iter()
        .copied()
        .filter(|a| !bonused.contains(a))
        .collect();
    let mut remaining = points;
    let mut spent = Vec::new();

    for attribute in priority {
        if remaining == 0 {
            break;
        }
        if let Some(pos) = eligible.iter().position(|a| a == attribute) {
            eligible.remove(pos);
            values[attribute.index()] += 1;
            spent.push(*attribute);
            remaining -= 1;
        }
    }
    while remaining > 0 && !eligible.is_empty() {
        let pos = rng.gen_range(0..eligible.len());
        let attribute = eligible.remove(pos);
        values[attribute.index()] += 1;
        spent.push(attribute);
        remaining -= 1;
    }
    spent
}

/// Roll, arrange and write the six attribute scores onto the character.
pub fn roll_attributes(
    character: &mut Character,
    method: &AttributeRollMethod,
    config: &GeneratorConfig,
) {
    let mut rng = seeded_rng(&character.seed, "attribute rolling");
    let mut rolled = method.roll_values(&mut rng, config.reroll_cap);
    rolled.shuffle(&mut seeded_rng(&character.seed, "attribute shuffle"));

    let mut values = [0i32; 6];
    values.copy_from_slice(&rolled[..6]);
    character.raw_attribute_rolls = values.to_vec();

    if !method.no_swap {
        let mut rng = seeded_rng(&character.seed, "attribute swap");
        prioritize(
            &mut values,
            &character.priority_attributes,
            method.force_optimize,
            &mut rng,
        );
    }

    if !method.no_racial_bonus {
        let mut bonused = Vec::new();
        for (attribute, bonus) in &character.attribute_bonuses {
            values[attribute.index()] += bonus;
            if *bonus != 0 {
                bonused.push(*attribute);
            }
        }
        let points = character.stats.get(FLOATING_POINTS_STAT).max(0) as u32;
        if points > 0 {
            let mut rng = seeded_rng(&character.seed, "floating attribute points");
            spend_floating_points(
                &mut values,
                &character.priority_attributes,
                &bonused,
                points,
                &mut rng,
            );
        }
    }

    for attribute in Attribute::ALL {
        character.stats.set(attribute.key(), values[attribute.index()]);
    }
    debug!(method = %method.name, rolls = ?character.raw_attribute_rolls, "rolled attributes");
}
