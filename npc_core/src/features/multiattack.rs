//! Multiple weapon attacks per round.

use super::{Feature, FeatureArgs, PassContext};
use crate::character::Character;
use crate::error::BuildError;
use crate::statblock::{number_word, EntryCategory, StatBlockEntry};

/// `multiattack(count[, "hd:count" ...])`: attacks per round by hit-dice
/// threshold.
#[derive(Debug, Clone)]
pub struct Multiattack {
    key: String,
    base: u32,
    /// `(minimum hit dice, attacks)`, ascending.
    thresholds: Vec<(u32, u32)>,
    attacks: u32,
}

impl Multiattack {
    pub fn construct(args: &FeatureArgs<'_>) -> Result<Box<dyn Feature>, BuildError> {
        let base: u32 = args.parse(0)?;
        let mut thresholds = Vec::new();
        for raw in &args.args[1..] {
            let (hd, count) = raw
                .split_once(':')
                .ok_or_else(|| args.malformed(format!("'{}' is not hd:count", raw)))?;
            let hd: u32 = hd
                .trim()
                .parse()
                .map_err(|_| args.malformed(format!("bad hit dice in '{}'", raw)))?;
            let count: u32 = count
                .trim()
                .parse()
                .map_err(|_| args.malformed(format!("bad count in '{}'", raw)))?;
            thresholds.push((hd, count));
        }
        thresholds.sort();

        Ok(Box::new(Self {
            key: args.key.to_string(),
            base,
            thresholds,
            attacks: base,
        }))
    }

    /// Attacks per round at a hit dice count.
    pub fn attacks_at(&self, hit_dice: u32) -> u32 {
        self.thresholds
            .iter()
            .filter(|(hd, _)| *hd <= hit_dice)
            .map(|(_, count)| *count)
            .last()
            .unwrap_or(self.base)
    }
}

impl Feature for Multiattack {
    fn key(&self) -> &str {
        &self.key
    }

    fn first_pass(&mut self, ctx: &mut PassContext<'_>) -> Result<(), BuildError> {
        self.attacks = self.attacks_at(ctx.character.hit_dice());
        let stats = &mut ctx.character.stats;
        if self.attacks > stats.get("attacks_per_round") as u32 {
            stats.set("attacks_per_round", self.attacks as i32);
        }
        Ok(())
    }

    fn stat_block_entries(&self, character: &Character) -> Vec<StatBlockEntry> {
        if self.attacks < 2 {
            return Vec::new();
        }
        let text = format!(
            "The {} makes {} weapon attacks.",
            character.short_name(),
            number_word(self.attacks)
        );
        vec![StatBlockEntry::new(EntryCategory::Multiattack, "Multiattack", text)]
    }
}
