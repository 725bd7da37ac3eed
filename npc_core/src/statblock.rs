//! The presentation view of a finished character.

use serde::Serialize;

use npc_rules::{Attribute, Dice, Skill};

use crate::character::{Character, SPEED_MODES};

/// Statblock section an entry is printed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryCategory {
    Passive,
    Multiattack,
    Spellcasting,
    Attack,
    Action,
    Reaction,
}

/// Visibility tier of an entry that sets none.
pub const DEFAULT_VISIBILITY: u8 = 1;

/// One titled block of statblock text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatBlockEntry {
    pub category: EntryCategory,
    pub title: String,
    pub text: String,
    /// Higher tiers are shown only to more detailed views.
    pub visibility: u8,
}

impl StatBlockEntry {
    pub fn new(category: EntryCategory, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            category,
            title: title.into(),
            text: text.into(),
            visibility: DEFAULT_VISIBILITY,
        }
    }

    pub fn with_visibility(mut self, visibility: u8) -> Self {
        self.visibility = visibility;
        self
    }
}

/// Capitalize the first letter of every word.
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Spelled-out small numbers for prose ("two weapon attacks").
pub fn number_word(n: u32) -> String {
    const WORDS: [&str; 11] = [
        "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    ];
    WORDS
        .get(n as usize)
        .map(|w| w.to_string())
        .unwrap_or_else(|| n.to_string())
}

/// Modifier with an explicit sign (`+3`, `-1`, `+0`).
pub fn signed(value: i32) -> String {
    format!("{:+}", value)
}

/// Title and body of one printed entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub title: String,
    pub text: String,
}

/// One ability score as printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbilityView {
    pub abbreviation: String,
    pub score: i32,
    pub display: String,
}

/// Everything a renderer needs, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatBlock {
    pub name: Option<String>,
    pub race: String,
    pub class: String,
    pub creature_type: String,
    pub size: String,
    pub armor_class: String,
    pub hit_points: String,
    pub speed: String,
    pub proficiency: String,
    pub abilities: Vec<AbilityView>,
    pub saves: String,
    pub skills: String,
    pub tools: String,
    pub challenge: String,
    pub senses: String,
    pub languages: String,
    pub damage_vulnerabilities: String,
    pub damage_resistances: String,
    pub damage_immunities: String,
    pub condition_immunities: String,
    pub passives: Vec<EntryView>,
    pub multiattack: Vec<EntryView>,
    pub spellcasting: Vec<EntryView>,
    pub attacks: Vec<EntryView>,
    pub actions: Vec<EntryView>,
    pub reactions: Vec<EntryView>,
    /// Titles of entries above the requested visibility.
    pub hidden: Vec<String>,
}

fn join_or_empty<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Character {
    /// `"16 (chain mail, shield)"`, `"12 (15 with mage armor)"`.
    pub fn armor_class_summary(&self) -> String {
        let mut notes = Vec::new();
        if let Some(armor) = self.chosen_armor().filter(|a| !a.is_natural()) {
            notes.push(armor.display_name.clone());
        }
        if self.has_shield {
            notes.push("shield".to_string());
        }
        let mut summary = self.armor_class().to_string();
        if !notes.is_empty() {
            summary.push_str(&format!(" ({})", notes.join(", ")));
        }
        if let Some((armor, ac)) = self.best_extra_armor() {
            summary.push_str(&format!(" ({} with {})", ac, armor.display_name));
        }
        summary
    }

    /// `"27 (5d8 + 5)"`.
    pub fn hit_points_summary(&self) -> String {
        let hit_dice = self.hit_dice();
        let size = self.stats.get("hit_dice_size").max(1) as u32;
        let total = self.stats.get("hit_points_total");
        let dice = Dice::new(hit_dice, size);
        match total - dice.average_floor() {
            0 => format!("{} ({})", total, dice),
            b if b > 0 => format!("{} ({} + {})", total, dice, b),
            b => format!("{} ({} - {})", total, dice, -b),
        }
    }

    /// `"30 ft., climb 20 ft."`.
    pub fn speed_summary(&self) -> String {
        let walk = self.stats.get("walk_speed");
        let mut parts = vec![format!("{} ft.", walk)];
        for mode in SPEED_MODES.iter().skip(1) {
            let speed = self.stats.get(&format!("{}_speed", mode));
            if speed > 0 {
                parts.push(format!("{} {} ft.", mode, speed));
            }
        }
        parts.join(", ")
    }

    /// Build the statblock, hiding entries above `visibility`.
    pub fn stat_block(&self, visibility: u8) -> StatBlock {
        let abilities = Attribute::ALL
            .iter()
            .map(|attr| {
                let score = self.stats.score(*attr);
                AbilityView {
                    abbreviation: attr.key().to_uppercase(),
                    score,
                    display: format!("{} ({})", score, signed(self.stats.modifier(*attr))),
                }
            })
            .collect();

        let saves = join_or_empty(
            Attribute::ALL
                .iter()
                .filter(|a| self.saves.contains(a))
                .map(|a| format!("{} {}", a.abbreviation(), signed(self.save_bonus(*a)))),
        );
        let skills = join_or_empty(
            Skill::ALL
                .iter()
                .filter(|s| self.skills.contains(s))
                .map(|s| format!("{} {}", s.name(), signed(self.skill_bonus(*s)))),
        );

        let mut senses = self.senses.clone();
        senses.push(format!(
            "passive Perception {}",
            self.stats.get("passive_perception")
        ));

        let languages = if self.languages.is_empty() {
            "—".to_string()
        } else {
            self.languages.join(", ")
        };

        let mut block = StatBlock {
            name: self.name.clone(),
            race: self.race_display.clone(),
            class: self.class_display.clone(),
            creature_type: self.creature_type.clone(),
            size: self.size.to_string(),
            armor_class: self.armor_class_summary(),
            hit_points: self.hit_points_summary(),
            speed: self.speed_summary(),
            proficiency: signed(self.proficiency()),
            abilities,
            saves,
            skills,
            tools: join_or_empty(&self.tool_proficiencies),
            challenge: self
                .cr
                .as_ref()
                .map(|cr| cr.display())
                .unwrap_or_else(|| "—".to_string()),
            senses: senses.join(", "),
            languages,
            damage_vulnerabilities: join_or_empty(
                self.damage_vulnerabilities.iter().map(|d| d.name()),
            ),
            damage_resistances: join_or_empty(self.damage_resistances.iter().map(|d| d.name())),
            damage_immunities: join_or_empty(self.damage_immunities.iter().map(|d| d.name())),
            condition_immunities: join_or_empty(&self.condition_immunities),
            passives: Vec::new(),
            multiattack: Vec::new(),
            spellcasting: Vec::new(),
            attacks: Vec::new(),
            actions: Vec::new(),
            reactions: Vec::new(),
            hidden: Vec::new(),
        };

        for entry in &self.entries {
            if entry.visibility > visibility {
                block.hidden.push(entry.title.clone());
                continue;
            }
            let view = EntryView {
                title: entry.title.clone(),
                text: entry.text.clone(),
            };
            match entry.category {
                EntryCategory::Passive => block.passives.push(view),
                EntryCategory::Multiattack => block.multiattack.push(view),
                EntryCategory::Spellcasting => block.spellcasting.push(view),
                EntryCategory::Attack => block.attacks.push(view),
                EntryCategory::Action => block.actions.push(view),
                EntryCategory::Reaction => block.reactions.push(view),
            }
        }
        block
    }
}
