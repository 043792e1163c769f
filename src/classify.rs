//! Way classification
//!
//! Splits ways into link-ways (become graph links), POI-ways (become POI
//! polygons) and everything else, and flags crossing nodes and cycles.

use log::{debug, info};
use std::collections::BTreeMap;

use crate::core::config::NetworkConfig;
use crate::osm::{OsmData, RawWay, WayIdx};
use crate::profiles::{Mode, ModeFilter};

/// Why a way did not make it into the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IgnoreReason {
    NoHighway,
    Area,
    ExcludedHighway,
    TooFewNodes,
    UnknownHighway,
    NoAllowedMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WayClass {
    /// `kind` is the highway value for bus stops and platforms
    Poi { kind: Option<String> },
    Link {
        link_type: String,
        link_type_code: u8,
        is_link: bool,
        allowed_modes: Vec<Mode>,
        oneway: bool,
    },
    Ignored(IgnoreReason),
}

/// A way accepted for link construction
#[derive(Debug, Clone, PartialEq)]
pub struct LinkWay {
    pub way: WayIdx,
    pub link_type: String,
    pub link_type_code: u8,
    pub is_link: bool,
    pub allowed_modes: Vec<Mode>,
    pub oneway: bool,
    pub is_reversed: bool,
    pub is_cycle: bool,
    /// Closed loop touching the rest of the network nowhere but its endpoints
    pub is_pure_cycle: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoiWay {
    pub way: WayIdx,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub link_ways: Vec<LinkWay>,
    pub poi_ways: Vec<PoiWay>,
    pub ignored: BTreeMap<IgnoreReason, usize>,
}

pub struct WayClassifier<'a> {
    config: &'a NetworkConfig,
    filter: ModeFilter<'a>,
}

impl<'a> WayClassifier<'a> {
    pub fn new(config: &'a NetworkConfig) -> Self {
        Self {
            config,
            filter: ModeFilter::new(config),
        }
    }

    /// Classify one way on its tags and reference count alone
    pub fn classify_way(&self, way: &RawWay) -> WayClass {
        if way.building.is_some() || way.amenity.is_some() || way.leisure.is_some() {
            return WayClass::Poi { kind: None };
        }

        let Some(highway) = way.highway.as_deref() else {
            return WayClass::Ignored(IgnoreReason::NoHighway);
        };
        if self.config.poi_highways.contains(highway) {
            return WayClass::Poi {
                kind: Some(highway.to_string()),
            };
        }
        if way.area.as_deref().is_some_and(|area| area != "no") {
            return WayClass::Ignored(IgnoreReason::Area);
        }
        if self.config.excluded_highways.contains(highway) {
            return WayClass::Ignored(IgnoreReason::ExcludedHighway);
        }
        if way.refs.len() < 2 {
            return WayClass::Ignored(IgnoreReason::TooFewNodes);
        }
        let Some((highway_type, defaults)) = self.config.resolve_highway(highway) else {
            return WayClass::Ignored(IgnoreReason::UnknownHighway);
        };

        let allowed_modes = self.filter.allowed_modes(way, &self.config.target_modes);
        if allowed_modes.is_empty() {
            return WayClass::Ignored(IgnoreReason::NoAllowedMode);
        }

        let oneway = match way.oneway {
            Some(oneway) => oneway,
            None if matches!(way.junction.as_deref(), Some("roundabout" | "circular")) => true,
            None => defaults.oneway,
        };

        WayClass::Link {
            link_type: highway_type.link_type.clone(),
            link_type_code: defaults.code,
            is_link: highway_type.is_link,
            allowed_modes,
            oneway,
        }
    }

    /// Classify every way and flag crossing nodes and pure cycles
    pub fn classify(&self, data: &mut OsmData) -> Classification {
        let mut result = Classification::default();

        for (idx, way) in data.ways.iter().enumerate() {
            match self.classify_way(way) {
                WayClass::Poi { kind } => result.poi_ways.push(PoiWay { way: idx, kind }),
                WayClass::Link {
                    link_type,
                    link_type_code,
                    is_link,
                    allowed_modes,
                    oneway,
                } => {
                    let (first, last) = (way.refs[0], way.refs[way.refs.len() - 1]);
                    data.nodes[first].is_crossing = true;
                    data.nodes[last].is_crossing = true;
                    for &node in &way.refs {
                        data.nodes[node].usage_count += 1;
                    }

                    result.link_ways.push(LinkWay {
                        way: idx,
                        link_type,
                        link_type_code,
                        is_link,
                        allowed_modes,
                        oneway,
                        is_reversed: way.is_reversed,
                        is_cycle: first == last,
                        is_pure_cycle: false,
                    });
                }
                WayClass::Ignored(reason) => {
                    debug!("Way {} ignored: {:?}", way.osm_id, reason);
                    *result.ignored.entry(reason).or_insert(0) += 1;
                }
            }
        }

        // Crossings must be global before any cycle can be called pure
        for node in data.nodes.iter_mut() {
            if node.usage_count >= 2 || node.is_signal() {
                node.is_crossing = true;
            }
        }

        for link_way in result.link_ways.iter_mut().filter(|w| w.is_cycle) {
            let refs = &data.ways[link_way.way].refs;
            link_way.is_pure_cycle = !refs[1..refs.len() - 1]
                .iter()
                .any(|&node| data.nodes[node].is_crossing);
        }

        let pure_cycles = result.link_ways.iter().filter(|w| w.is_pure_cycle).count();
        info!(
            "Classified {} link-ways ({} pure cycles), {} POI-ways, {} ignored",
            result.link_ways.len(),
            pure_cycles,
            result.poi_ways.len(),
            result.ignored.values().sum::<usize>()
        );

        result
    }
}
