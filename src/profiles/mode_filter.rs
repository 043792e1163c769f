//! Per-mode access rules
//!
//! Include rules win outright: a way matching any include row is open to
//! the mode even when an exclude row also matches. Otherwise any exclude
//! match closes it, and ways matching nothing stay open.

use std::collections::BTreeMap;

use super::Mode;
use crate::core::config::{ModeRules, NetworkConfig};
use crate::osm::RawWay;

pub struct ModeFilter<'a> {
    rules: &'a BTreeMap<Mode, ModeRules>,
}

impl<'a> ModeFilter<'a> {
    pub fn new(config: &'a NetworkConfig) -> Self {
        Self {
            rules: &config.mode_rules,
        }
    }

    pub fn allows(&self, way: &RawWay, mode: Mode) -> bool {
        let Some(rules) = self.rules.get(&mode) else {
            return true;
        };
        if rules.include.iter().any(|rule| rule.matches(way)) {
            return true;
        }
        !rules.exclude.iter().any(|rule| rule.matches(way))
    }

    /// Modes in `targets` the way is open to, in canonical mode order
    pub fn allowed_modes(&self, way: &RawWay, targets: &[Mode]) -> Vec<Mode> {
        Mode::all()
            .iter()
            .copied()
            .filter(|mode| targets.contains(mode) && self.allows(way, *mode))
            .collect()
    }
}
