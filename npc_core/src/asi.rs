//! Ability score improvements.
//!
//! The plan is a queue of attribute picks generated for a fixed planning
//! horizon, so it depends only on the seed and the starting scores. How much
//! of it is applied depends on the character's actual hit dice.

use tracing::debug;

use npc_rules::Attribute;

use crate::character::Character;
use crate::config::GeneratorConfig;
use crate::random::{seeded_rng, weighted_index, SeededRng};

/// Points an ASI schedule grants at `hit_dice`.
pub fn asi_points(hit_dice: u32, config: &GeneratorConfig) -> u32 {
    if config.asi_hit_dice_per_increase == 0 {
        return 0;
    }
    hit_dice / config.asi_hit_dice_per_increase * config.asi_points_per_increase
}

/// Sampling weight of each attribute, in [`Attribute::ALL`] order.
pub fn asi_weights(priority: &[Attribute], config: &GeneratorConfig) -> [f64; 6] {
    let mut weights = [1.0; 6];
    let mut seen: Vec<Attribute> = Vec::new();
    for attribute in priority {
        if seen.contains(attribute) {
            continue;
        }
        weights[attribute.index()] =
            config.asi_priority_weight * config.asi_priority_scale.powi(seen.len() as i32);
        seen.push(*attribute);
    }
    weights
}

/// Build the ordered queue of attribute picks.
///
/// The queue is twice as long as the planning horizon needs so that picks
/// discarded at apply time do not run it dry. An attribute leaves the pool
/// once its planned picks would carry it past the cap.
pub fn generate_asi_plan(
    scores: &[i32; 6],
    priority: &[Attribute],
    config: &GeneratorConfig,
    rng: &mut SeededRng,
) -> Vec<Attribute> {
    let length = 2 * asi_points(config.asi_planning_hit_dice, config) as usize;
    let mut weights = asi_weights(priority, config);
    let mut planned = [0i32; 6];
    let mut plan = Vec::with_capacity(length);

    while plan.len() < length {
        for attribute in Attribute::ALL {
            let i = attribute.index();
            if scores[i] + planned[i] + 1 > config.attribute_cap {
                weights[i] = 0.0;
            }
        }
        let Some(index) = weighted_index(rng, &weights) else {
            break;
        };
        planned[index] += 1;
        plan.push(Attribute::ALL[index]);
    }
    plan
}

/// Apply the character's share of the plan. Picks of attributes already at
/// the cap are discarded. Returns the attributes raised, in order.
pub fn apply_asi(
    character: &mut Character,
    plan: &[Attribute],
    config: &GeneratorConfig,
) -> Vec<Attribute> {
    let mut points = asi_points(character.hit_dice(), config);
    let mut applied = Vec::new();
    for attribute in plan {
        if points == 0 {
            break;
        }
        if character.stats.score(*attribute) >= config.attribute_cap {
            continue;
        }
        character.stats.add(attribute.key(), 1);
        applied.push(*attribute);
        points -= 1;
    }
    applied
}

/// Plan and apply ASIs for a character whose scores are already rolled.
pub fn improve_attributes(character: &mut Character, config: &GeneratorConfig) {
    let mut scores = [0i32; 6];
    for attribute in Attribute::ALL {
        scores[attribute.index()] = character.stats.score(attribute);
    }
    let mut rng = seeded_rng(&character.seed, "asi planning");
    let plan = generate_asi_plan(&scores, &character.priority_attributes, config, &mut rng);
    let applied = apply_asi(character, &plan, config);
    debug!(planned = plan.len(), applied = applied.len(), "applied ability score improvements");
    character.asi_applied = applied;
}
