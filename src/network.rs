//! The built network: nodes, links and POIs in id-keyed arenas
//!
//! Adjacency is kept as link id lists on each node. Ids come from counters
//! that only ever move forward.

use geo::{Area, LineString, MultiPolygon};
use std::collections::BTreeMap;

use crate::core::error::{Error, Result};
use crate::osm::{ControlType, OsmId};
use crate::profiles::Mode;
use crate::spatial::{round_to, Region};

pub type NodeId = u64;
pub type LinkId = u64;
pub type PoiId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// `None` for boundary nodes
    pub osm_id: Option<OsmId>,
    pub name: Option<String>,
    pub osm_highway: Option<String>,
    pub ctrl_type: Option<ControlType>,
    pub lon: f64,
    pub lat: f64,
    pub x: f64,
    pub y: f64,
    pub is_boundary: bool,
    /// First POI linked to this node
    pub poi_id: Option<PoiId>,
    pub incoming: Vec<LinkId>,
    pub outgoing: Vec<LinkId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub osm_way_id: OsmId,
    pub name: Option<String>,
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub lanes: Option<u32>,
    /// km/h
    pub free_speed: Option<u32>,
    pub capacity: Option<u32>,
    pub link_type: String,
    pub link_type_code: u8,
    pub is_link: bool,
    pub allowed_modes: Vec<Mode>,
    /// Built from a way open in both directions
    pub from_bidirectional_way: bool,
    pub dir_flag: i8,
    pub ctrl_type: Option<ControlType>,
    /// lon/lat
    pub geometry: LineString<f64>,
    /// Planar metres
    pub geometry_xy: LineString<f64>,
}

impl Link {
    /// Planar length in metres, 2 decimals
    pub fn length(&self) -> f64 {
        let length: f64 = self
            .geometry_xy
            .lines()
            .map(|line| {
                let d = line.delta();
                d.x.hypot(d.y)
            })
            .sum();
        round_to(length, 2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoiSource {
    Way(OsmId),
    Relation(OsmId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Poi {
    pub id: PoiId,
    pub source: PoiSource,
    pub name: Option<String>,
    pub building: Option<String>,
    pub amenity: Option<String>,
    pub leisure: Option<String>,
    /// `bus_stop` or `platform` for highway POI-ways
    pub kind: Option<String>,
    pub geometry: MultiPolygon<f64>,
    pub geometry_xy: MultiPolygon<f64>,
    /// (lon, lat)
    pub centroid: (f64, f64),
    /// (x, y)
    pub centroid_xy: (f64, f64),
    /// Nearest built node, when linking is enabled
    pub node_id: Option<NodeId>,
}

impl Poi {
    /// Planar area in square metres
    pub fn area(&self) -> f64 {
        self.geometry_xy.unsigned_area()
    }
}

#[derive(Debug, Clone)]
pub struct Network {
    region: Region,
    nodes: BTreeMap<NodeId, Node>,
    links: BTreeMap<LinkId, Link>,
    pois: BTreeMap<PoiId, Poi>,
    next_node_id: NodeId,
    next_link_id: LinkId,
    next_poi_id: PoiId,
}

impl Network {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            pois: BTreeMap::new(),
            next_node_id: 0,
            next_link_id: 0,
            next_poi_id: 0,
        }
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Allocate the next node id and store the node built for it
    pub fn push_node<F>(&mut self, build: F) -> NodeId
    where
        F: FnOnce(NodeId) -> Node,
    {
        let id = self.next_node_id;
        self.next_node_id += 1;
        let mut node = build(id);
        node.id = id;
        self.nodes.insert(id, node);
        id
    }

    /// Allocate the next link id, store the link and wire it into its endpoints
    ///
    /// Both endpoints must already exist; the id is not consumed otherwise.
    pub fn push_link<F>(&mut self, build: F) -> Result<LinkId>
    where
        F: FnOnce(LinkId) -> Link,
    {
        let id = self.next_link_id;
        let mut link = build(id);
        link.id = id;

        for endpoint in [link.from_node, link.to_node] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(Error::MissingEndpoint {
                    link_id: id,
                    node_id: endpoint,
                });
            }
        }

        self.next_link_id += 1;
        if let Some(from) = self.nodes.get_mut(&link.from_node) {
            from.outgoing.push(id);
        }
        if let Some(to) = self.nodes.get_mut(&link.to_node) {
            to.incoming.push(id);
        }
        self.links.insert(id, link);
        Ok(id)
    }

    pub fn push_poi<F>(&mut self, build: F) -> PoiId
    where
        F: FnOnce(PoiId) -> Poi,
    {
        let id = self.next_poi_id;
        self.next_poi_id += 1;
        let mut poi = build(id);
        poi.id = id;
        self.pois.insert(id, poi);
        id
    }

    /// Record that `poi` is served by `node`; a node keeps its first POI
    pub fn link_poi(&mut self, poi: PoiId, node: NodeId) {
        if !self.nodes.contains_key(&node) {
            return;
        }
        if let Some(p) = self.pois.get_mut(&poi) {
            p.node_id = Some(node);
            if let Some(n) = self.nodes.get_mut(&node) {
                n.poi_id.get_or_insert(poi);
            }
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    pub fn poi(&self, id: PoiId) -> Option<&Poi> {
        self.pois.get(&id)
    }

    /// Nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn pois(&self) -> impl Iterator<Item = &Poi> {
        self.pois.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn poi_count(&self) -> usize {
        self.pois.len()
    }

    pub fn next_node_id(&self) -> NodeId {
        self.next_node_id
    }

    pub fn next_link_id(&self) -> LinkId {
        self.next_link_id
    }

    pub fn next_poi_id(&self) -> PoiId {
        self.next_poi_id
    }
}
