//! Network construction configuration
//!
//! Every table the engine consults (highway mapping, per link type defaults,
//! exclusion sets and per-mode tag rules) lives in [`NetworkConfig`] and is
//! handed to each component explicitly. The defaults reproduce the tables the
//! network has always been built with; a JSON file can override any of them.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::core::error::{Error, Result};
use crate::osm::{RawWay, WayTag};
use crate::profiles::Mode;

/// Link type a highway value maps to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighwayType {
    pub link_type: String,
    pub is_link: bool,
}

/// Per link type defaults used when a way carries no explicit tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkTypeDefaults {
    /// Numeric link type code
    pub code: u8,
    pub oneway: bool,
    pub lanes: Option<u32>,
    /// km/h
    pub free_speed: Option<u32>,
    /// Vehicles per hour per lane
    pub capacity: Option<u32>,
}

/// One row of a mode rule table: the way matches when `tag` holds one of `values`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub tag: WayTag,
    pub values: BTreeSet<String>,
}

impl TagRule {
    pub fn new(tag: WayTag, values: &[&str]) -> Self {
        Self {
            tag,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn matches(&self, way: &RawWay) -> bool {
        way.tag(self.tag)
            .is_some_and(|value| self.values.contains(value))
    }
}

/// Ordered include and exclude tables for one travel mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeRules {
    #[serde(default)]
    pub include: Vec<TagRule>,
    #[serde(default)]
    pub exclude: Vec<TagRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Modes the network is built for; ways allowing none of them are dropped
    pub target_modes: Vec<Mode>,
    pub highway_types: BTreeMap<String, HighwayType>,
    pub link_types: BTreeMap<String, LinkTypeDefaults>,
    /// Highway values never turned into links
    pub excluded_highways: BTreeSet<String>,
    /// Highway values that make a way a POI
    pub poi_highways: BTreeSet<String>,
    pub mode_rules: BTreeMap<Mode, ModeRules>,
    /// Decimal places kept for longitude/latitude
    pub lonlat_precision: u32,
    /// Decimal places kept for planar metres
    pub xy_precision: u32,
    pub extract_pois: bool,
    /// Planar search radius (m) for linking POIs to their nearest node; `None` disables linking
    pub poi_link_radius: Option<f64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            target_modes: vec![Mode::Auto],
            highway_types: default_highway_types(),
            link_types: default_link_types(),
            excluded_highways: default_excluded_highways(),
            poi_highways: ["bus_stop", "platform"].iter().map(|s| s.to_string()).collect(),
            mode_rules: default_mode_rules(),
            lonlat_precision: 7,
            xy_precision: 2,
            extract_pois: true,
            poi_link_radius: Some(100.0),
        }
    }
}

impl NetworkConfig {
    /// Load a JSON configuration; absent fields keep their defaults
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let config: NetworkConfig = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Config(format!("{}: {e}", path.as_ref().display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_target_modes(mut self, modes: Vec<Mode>) -> Self {
        self.target_modes = modes;
        self
    }

    /// Reject configurations the builder cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.target_modes.is_empty() {
            return Err(Error::Config("target_modes must not be empty".to_string()));
        }
        for (highway, highway_type) in &self.highway_types {
            if !self.link_types.contains_key(&highway_type.link_type) {
                return Err(Error::Config(format!(
                    "highway '{highway}' maps to unknown link type '{}'",
                    highway_type.link_type
                )));
            }
        }
        if self.lonlat_precision > 12 || self.xy_precision > 6 {
            return Err(Error::Config("coordinate precision out of range".to_string()));
        }
        Ok(())
    }

    /// Resolve a highway value to its link type and defaults
    pub fn resolve_highway(&self, highway: &str) -> Option<(&HighwayType, &LinkTypeDefaults)> {
        let highway_type = self.highway_types.get(highway)?;
        let defaults = self.link_types.get(&highway_type.link_type)?;
        Some((highway_type, defaults))
    }

    pub fn link_defaults(&self, link_type: &str) -> Option<&LinkTypeDefaults> {
        self.link_types.get(link_type)
    }
}

pub fn default_highway_types() -> BTreeMap<String, HighwayType> {
    let entries: [(&str, &str, bool); 21] = [
        ("motorway", "motorway", false),
        ("motorway_link", "motorway", true),
        ("trunk", "trunk", false),
        ("trunk_link", "trunk", true),
        ("primary", "primary", false),
        ("primary_link", "primary", true),
        ("secondary", "secondary", false),
        ("secondary_link", "secondary", true),
        ("tertiary", "tertiary", false),
        ("tertiary_link", "tertiary", true),
        ("residential", "residential", false),
        ("residential_link", "residential", true),
        ("living_street", "living_street", false),
        ("service", "service", false),
        ("services", "service", false),
        ("cycleway", "cycleway", false),
        ("footway", "footway", false),
        ("pedestrian", "footway", false),
        ("steps", "footway", false),
        ("track", "track", false),
        ("unclassified", "unclassified", false),
    ];
    entries
        .iter()
        .map(|(highway, link_type, is_link)| {
            (
                highway.to_string(),
                HighwayType {
                    link_type: link_type.to_string(),
                    is_link: *is_link,
                },
            )
        })
        .collect()
}

pub fn default_link_types() -> BTreeMap<String, LinkTypeDefaults> {
    // name, code, oneway, lanes, free speed, capacity
    let entries: [(&str, u8, bool, u32, u32, u32); 12] = [
        ("motorway", 1, false, 4, 120, 2300),
        ("trunk", 2, false, 3, 100, 2200),
        ("primary", 3, false, 3, 80, 1800),
        ("secondary", 4, false, 2, 60, 1600),
        ("tertiary", 5, false, 2, 40, 1200),
        ("residential", 6, false, 1, 30, 1000),
        ("living_street", 7, false, 1, 30, 1000),
        ("service", 8, false, 1, 30, 800),
        ("cycleway", 9, true, 1, 5, 800),
        ("footway", 10, true, 1, 5, 800),
        ("track", 11, true, 1, 30, 800),
        ("unclassified", 20, false, 1, 30, 800),
    ];
    entries
        .iter()
        .map(|(name, code, oneway, lanes, speed, capacity)| {
            (
                name.to_string(),
                LinkTypeDefaults {
                    code: *code,
                    oneway: *oneway,
                    lanes: Some(*lanes),
                    free_speed: Some(*speed),
                    capacity: Some(*capacity),
                },
            )
        })
        .collect()
}

pub fn default_excluded_highways() -> BTreeSet<String> {
    [
        "footway",
        "cycleway",
        "pedestrian",
        "steps",
        "track",
        "corridor",
        "elevator",
        "escalator",
        "service",
        "living_street",
        "path",
        "construction",
        "proposed",
        "raceway",
        "bridleway",
        "rest_area",
        "road",
        "abandoned",
        "planned",
        "trailhead",
        "stairs",
        "dismantled",
        "disused",
        "razed",
        "access",
        "stop",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn default_mode_rules() -> BTreeMap<Mode, ModeRules> {
    let mut rules = BTreeMap::new();
    rules.insert(
        Mode::Auto,
        ModeRules {
            include: vec![
                TagRule::new(WayTag::MotorVehicle, &["yes"]),
                TagRule::new(WayTag::Motorcar, &["yes"]),
            ],
            exclude: vec![
                TagRule::new(
                    WayTag::Highway,
                    &[
                        "cycleway",
                        "footway",
                        "pedestrian",
                        "steps",
                        "track",
                        "corridor",
                        "elevator",
                        "escalator",
                        "service",
                        "living_street",
                    ],
                ),
                TagRule::new(WayTag::MotorVehicle, &["no"]),
                TagRule::new(WayTag::Motorcar, &["no"]),
                TagRule::new(WayTag::Access, &["private"]),
                TagRule::new(
                    WayTag::Service,
                    &["parking", "parking_aisle", "driveway", "private", "emergency_access"],
                ),
            ],
        },
    );
    rules.insert(
        Mode::Bike,
        ModeRules {
            include: vec![TagRule::new(WayTag::Bicycle, &["yes"])],
            exclude: vec![
                TagRule::new(
                    WayTag::Highway,
                    &[
                        "footway",
                        "steps",
                        "corridor",
                        "elevator",
                        "escalator",
                        "motor",
                        "motorway",
                        "motorway_link",
                    ],
                ),
                TagRule::new(WayTag::Bicycle, &["no"]),
                TagRule::new(WayTag::Service, &["private"]),
                TagRule::new(WayTag::Access, &["private"]),
            ],
        },
    );
    rules.insert(
        Mode::Walk,
        ModeRules {
            include: vec![TagRule::new(WayTag::Foot, &["yes"])],
            exclude: vec![
                TagRule::new(
                    WayTag::Highway,
                    &["cycleway", "motor", "motorway", "motorway_link"],
                ),
                TagRule::new(WayTag::Foot, &["no"]),
                TagRule::new(WayTag::Service, &["private"]),
                TagRule::new(WayTag::Access, &["private"]),
            ],
        },
    );
    rules
}
