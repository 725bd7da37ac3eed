//! Dice expressions such as `1d8` or `3d6`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error when parsing a dice expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceParseError {
    #[error("empty dice expression")]
    Empty,
    #[error("invalid dice expression '{0}', expected XdY")]
    InvalidFormat(String),
    #[error("die size must be at least 1 in '{0}'")]
    InvalidDieSize(String),
}

/// A count of same-sized dice (`count`d`size`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dice {
    pub count: u32,
    pub size: u32,
}

impl Dice {
    pub fn new(count: u32, size: u32) -> Self {
        Self { count, size }
    }

    /// Expected total of a roll.
    pub fn average(&self) -> f64 {
        self.count as f64 * (self.size as f64 + 1.0) / 2.0
    }

    /// Expected total, floored, the way statblocks print it.
    pub fn average_floor(&self) -> i32 {
        (self.count * (self.size + 1) / 2) as i32
    }

    /// Same count, different die.
    pub fn with_size(self, size: u32) -> Self {
        Self { size, ..self }
    }

    /// Same die, different count.
    pub fn with_count(self, count: u32) -> Self {
        Self { count, ..self }
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.size)
    }
}

impl FromStr for Dice {
    type Err = DiceParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim().to_ascii_lowercase();
        if input.is_empty() {
            return Err(DiceParseError::Empty);
        }

        let (count_str, size_str) = input
            .split_once('d')
            .ok_or_else(|| DiceParseError::InvalidFormat(input.clone()))?;

        // "d6" means "1d6"
        let count = if count_str.is_empty() {
            1
        } else {
            count_str
                .parse()
                .map_err(|_| DiceParseError::InvalidFormat(input.clone()))?
        };
        let size: u32 = size_str
            .parse()
            .map_err(|_| DiceParseError::InvalidFormat(input.clone()))?;
        if size == 0 {
            return Err(DiceParseError::InvalidDieSize(input));
        }

        Ok(Self { count, size })
    }
}

impl TryFrom<String> for Dice {
    type Error = DiceParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dice> for String {
    fn from(dice: Dice) -> Self {
        dice.to_string()
    }
}
