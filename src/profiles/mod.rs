//! Travel modes and the per-mode access filter

pub mod mode_filter;

pub use mode_filter::ModeFilter;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::Error;

/// Travel mode a link can be used by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Auto,
    Bike,
    Walk,
}

impl Mode {
    pub fn all() -> &'static [Mode] {
        &[Mode::Auto, Mode::Bike, Mode::Walk]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::Bike => "bike",
            Mode::Walk => "walk",
        }
    }

    /// Parse a comma separated mode list such as `auto,walk`
    pub fn parse_list(list: &str) -> Result<Vec<Mode>, Error> {
        let mut modes = Vec::new();
        for part in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let mode: Mode = part.parse()?;
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }
        if modes.is_empty() {
            return Err(Error::InvalidInput("no travel mode given".to_string()));
        }
        Ok(modes)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "car" => Ok(Mode::Auto),
            "bike" | "bicycle" => Ok(Mode::Bike),
            "walk" | "foot" => Ok(Mode::Walk),
            other => Err(Error::InvalidInput(format!("unknown travel mode '{other}'"))),
        }
    }
}
