//! Loadout selection.

use tracing::debug;

use npc_rules::{Catalog, Loadout, LoadoutPool};

use crate::character::Character;
use crate::config::GeneratorConfig;
use crate::error::BuildError;
use crate::random::{seeded_rng, weighted_index};

/// Draw one loadout from a pool, proportionally to weight. `None` only for
/// an empty pool.
pub fn get_random_loadout<'a>(
    pool: &'a LoadoutPool,
    seed: &str,
    config: &GeneratorConfig,
) -> Option<&'a Loadout> {
    if pool.is_empty() {
        return None;
    }
    let weights: Vec<u32> = pool
        .loadouts
        .iter()
        .map(|l| l.weight_or(config.default_loadout_weight))
        .collect();
    let mut rng = seeded_rng(seed, &format!("{}loadout", pool.name));
    let index = weighted_index(&mut rng, &weights).unwrap_or(0);
    pool.loadouts.get(index)
}

/// Grant everything in a loadout.
pub fn equip_loadout(
    character: &mut Character,
    loadout: &Loadout,
    catalog: &Catalog,
) -> Result<(), BuildError> {
    for armor in &loadout.armors {
        character.add_armor(catalog.armor(armor)?);
    }
    for weapon in &loadout.weapons {
        character.add_weapon(catalog.weapon(weapon)?);
    }
    character.has_shield |= loadout.shield;
    debug!(armors = ?loadout.armors, weapons = ?loadout.weapons, shield = loadout.shield, "equipped loadout");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> LoadoutPool {
        let catalog = Catalog::from_toml_str(
            r#"
            [loadout_pool.guards]
            loadouts = [
                { weapons = ["spear"], armors = ["leather"], weight = 1 },
                { weapons = ["club"], armors = [], shield = true },
                { weapons = ["never"], weight = 0 },
            ]
            "#,
        )
        .unwrap();
        catalog.loadout_pool("guards").unwrap().as_ref().clone()
    }

    #[test]
    fn test_draw_is_seeded() {
        let pool = pool();
        let config = GeneratorConfig::default();
        let a = get_random_loadout(&pool, "s1", &config).unwrap();
        let b = get_random_loadout(&pool, "s1", &config).unwrap();
        assert_eq!(a.weapons, b.weapons);
    }

    #[test]
    fn test_zero_weight_is_never_drawn() {
        let pool = pool();
        let config = GeneratorConfig::default();
        for seed in 0..50 {
            let loadout = get_random_loadout(&pool, &seed.to_string(), &config).unwrap();
            assert_ne!(loadout.weapons, vec!["never".to_string()]);
        }
    }

    #[test]
    fn test_default_weight_dominates() {
        let pool = pool();
        let config = GeneratorConfig::default();
        let clubs = (0..200)
            .filter(|seed| {
                get_random_loadout(&pool, &seed.to_string(), &config)
                    .is_some_and(|l| l.shield)
            })
            .count();
        // Weight 10 against weight 1.
        assert!(clubs > 150);
    }

    #[test]
    fn test_empty_pool() {
        let pool = LoadoutPool::default();
        assert!(get_random_loadout(&pool, "s", &GeneratorConfig::default()).is_none());
    }

    #[test]
    fn test_equip_unknown_item_is_fatal() {
        let catalog = Catalog::new();
        let mut character = Character::new("seed", 1);
        let loadout = Loadout {
            weapons: vec!["spear".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            equip_loadout(&mut character, &loadout, &catalog),
            Err(BuildError::Catalog(_))
        ));
    }
}
