//! Raw OSM element arenas
//!
//! Nodes, ways and relations as they come out of ingestion. Ways and
//! relations reference other elements by arena index, never by pointer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::spatial::{GeoProjector, Region};

/// OSM element id as found in the source extract
pub type OsmId = i64;
/// Index into [`OsmData::nodes`]
pub type NodeIdx = usize;
/// Index into [`OsmData::ways`]
pub type WayIdx = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlType {
    Signal,
}

impl ControlType {
    pub fn name(&self) -> &'static str {
        match self {
            ControlType::Signal => "signal",
        }
    }

    /// Control type implied by a node's highway tag
    pub fn from_highway(highway: Option<&str>) -> Option<Self> {
        match highway {
            Some(value) if value.contains("signal") => Some(ControlType::Signal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawNode {
    /// `None` for boundary nodes synthesized while clipping
    pub osm_id: Option<OsmId>,
    pub lon: f64,
    pub lat: f64,
    pub x: f64,
    pub y: f64,
    pub name: Option<String>,
    pub highway: Option<String>,
    pub ctrl_type: Option<ControlType>,
    /// Number of accepted link-ways referencing this node
    pub usage_count: u32,
    pub in_region: bool,
    pub is_crossing: bool,
    pub is_boundary: bool,
}

impl RawNode {
    pub fn is_signal(&self) -> bool {
        self.ctrl_type == Some(ControlType::Signal)
    }
}

/// Way tags the mode rules can test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WayTag {
    Highway,
    Junction,
    Area,
    MotorVehicle,
    Motorcar,
    Service,
    Foot,
    Bicycle,
    Access,
    Building,
    Amenity,
    Leisure,
}

impl WayTag {
    pub const ALL: [WayTag; 12] = [
        WayTag::Highway,
        WayTag::Junction,
        WayTag::Area,
        WayTag::MotorVehicle,
        WayTag::Motorcar,
        WayTag::Service,
        WayTag::Foot,
        WayTag::Bicycle,
        WayTag::Access,
        WayTag::Building,
        WayTag::Amenity,
        WayTag::Leisure,
    ];

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| tag.key() == key)
    }

    /// OSM key carrying this tag
    pub fn key(&self) -> &'static str {
        match self {
            WayTag::Highway => "highway",
            WayTag::Junction => "junction",
            WayTag::Area => "area",
            WayTag::MotorVehicle => "motor_vehicle",
            WayTag::Motorcar => "motorcar",
            WayTag::Service => "service",
            WayTag::Foot => "foot",
            WayTag::Bicycle => "bicycle",
            WayTag::Access => "access",
            WayTag::Building => "building",
            WayTag::Amenity => "amenity",
            WayTag::Leisure => "leisure",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawWay {
    pub osm_id: OsmId,
    pub refs: Vec<NodeIdx>,
    pub name: Option<String>,
    pub highway: Option<String>,
    pub lanes: Option<u32>,
    pub forward_lanes: Option<u32>,
    pub backward_lanes: Option<u32>,
    /// km/h
    pub maxspeed: Option<u32>,
    /// Unset when the source carried no usable oneway tag
    pub oneway: Option<bool>,
    /// `oneway=-1`: traffic flows against the node order
    pub is_reversed: bool,
    pub junction: Option<String>,
    pub area: Option<String>,
    pub motor_vehicle: Option<String>,
    pub motorcar: Option<String>,
    pub service: Option<String>,
    pub foot: Option<String>,
    pub bicycle: Option<String>,
    pub access: Option<String>,
    pub building: Option<String>,
    pub amenity: Option<String>,
    pub leisure: Option<String>,
}

impl RawWay {
    pub fn new(osm_id: OsmId, refs: Vec<NodeIdx>) -> Self {
        Self {
            osm_id,
            refs,
            ..Default::default()
        }
    }

    /// Typed accessor used by the mode rules
    pub fn tag(&self, tag: WayTag) -> Option<&str> {
        let value = match tag {
            WayTag::Highway => &self.highway,
            WayTag::Junction => &self.junction,
            WayTag::Area => &self.area,
            WayTag::MotorVehicle => &self.motor_vehicle,
            WayTag::Motorcar => &self.motorcar,
            WayTag::Service => &self.service,
            WayTag::Foot => &self.foot,
            WayTag::Bicycle => &self.bicycle,
            WayTag::Access => &self.access,
            WayTag::Building => &self.building,
            WayTag::Amenity => &self.amenity,
            WayTag::Leisure => &self.leisure,
        };
        value.as_deref()
    }

    pub fn tag_mut(&mut self, tag: WayTag) -> &mut Option<String> {
        match tag {
            WayTag::Highway => &mut self.highway,
            WayTag::Junction => &mut self.junction,
            WayTag::Area => &mut self.area,
            WayTag::MotorVehicle => &mut self.motor_vehicle,
            WayTag::Motorcar => &mut self.motorcar,
            WayTag::Service => &mut self.service,
            WayTag::Foot => &mut self.foot,
            WayTag::Bicycle => &mut self.bicycle,
            WayTag::Access => &mut self.access,
            WayTag::Building => &mut self.building,
            WayTag::Amenity => &mut self.amenity,
            WayTag::Leisure => &mut self.leisure,
        }
    }

    /// First and last reference are the same node
    pub fn is_closed(&self) -> bool {
        self.refs.len() > 1 && self.refs.first() == self.refs.last()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRef {
    Node(NodeIdx),
    Way(WayIdx),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMember {
    pub member: MemberRef,
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRelation {
    pub osm_id: OsmId,
    pub name: Option<String>,
    pub building: Option<String>,
    pub amenity: Option<String>,
    pub leisure: Option<String>,
    pub members: Vec<RelationMember>,
}

/// Everything read from one extract, linked and projected
#[derive(Debug, Clone)]
pub struct OsmData {
    pub nodes: Vec<RawNode>,
    pub node_index: HashMap<OsmId, NodeIdx>,
    pub ways: Vec<RawWay>,
    pub relations: Vec<RawRelation>,
    pub projector: GeoProjector,
    pub region: Region,
}

impl OsmData {
    pub fn node(&self, idx: NodeIdx) -> &RawNode {
        &self.nodes[idx]
    }

    pub fn node_by_osm_id(&self, osm_id: OsmId) -> Option<&RawNode> {
        self.node_index.get(&osm_id).map(|&idx| &self.nodes[idx])
    }
}
