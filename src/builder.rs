//! Node and link construction from classified link-ways

use geo::LineString;
use log::info;
use std::collections::HashMap;

use crate::classify::{Classification, LinkWay};
use crate::clip::BoundaryClipper;
use crate::core::config::NetworkConfig;
use crate::core::error::Result;
use crate::network::{Link, Network, Node, NodeId};
use crate::osm::{ControlType, NodeIdx, OsmData, RawNode, RawWay};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub link_ways: usize,
    pub pure_cycles: usize,
    pub segments: usize,
    /// Segments with no usable part inside the region
    pub segments_clipped_away: usize,
    pub nodes: usize,
    pub links: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

pub struct NetworkBuilder<'a> {
    config: &'a NetworkConfig,
    /// Raw node -> built node, one to one
    built: HashMap<NodeIdx, NodeId>,
}

impl<'a> NetworkBuilder<'a> {
    pub fn new(config: &'a NetworkConfig) -> Self {
        Self {
            config,
            built: HashMap::new(),
        }
    }

    /// Build nodes and links for every link-way that is not a pure cycle
    pub fn build(
        &mut self,
        data: &mut OsmData,
        classification: &Classification,
        network: &mut Network,
    ) -> Result<BuildStats> {
        let mut stats = BuildStats::default();
        let nodes_before = network.node_count();
        let links_before = network.link_count();

        for link_way in &classification.link_ways {
            stats.link_ways += 1;
            if link_way.is_pure_cycle {
                stats.pure_cycles += 1;
                continue;
            }

            let way = &data.ways[link_way.way];
            let clipper = BoundaryClipper::new(&data.region, &data.projector);
            for mut segment in split_segments(way, &data.nodes) {
                stats.segments += 1;
                if link_way.is_reversed {
                    segment.reverse();
                }

                let parts = clipper.clip(&segment, &mut data.nodes);
                if parts.is_empty() {
                    stats.segments_clipped_away += 1;
                }
                for part in parts {
                    self.build_links(&part, way, link_way, &data.nodes, network)?;
                }
            }
        }

        stats.nodes = network.node_count() - nodes_before;
        stats.links = network.link_count() - links_before;
        info!(
            "Built {} nodes and {} links from {} link-ways ({} pure cycles skipped)",
            stats.nodes, stats.links, stats.link_ways, stats.pure_cycles
        );
        Ok(stats)
    }

    fn build_links(
        &mut self,
        part: &[NodeIdx],
        way: &RawWay,
        link_way: &LinkWay,
        nodes: &[RawNode],
        network: &mut Network,
    ) -> Result<()> {
        if part.len() < 2 {
            return Ok(());
        }
        let (first, last) = (part[0], part[part.len() - 1]);

        let from = self.ensure_node(first, nodes, network);
        let to = self.ensure_node(last, nodes, network);

        let forward = self.make_link(part, from, to, Direction::Forward, way, link_way, nodes);
        network.push_link(|id| Link { id, ..forward })?;

        if !link_way.oneway {
            let reversed: Vec<NodeIdx> = part.iter().rev().copied().collect();
            let backward =
                self.make_link(&reversed, to, from, Direction::Backward, way, link_way, nodes);
            network.push_link(|id| Link { id, ..backward })?;
        }
        Ok(())
    }

    /// Built node for a raw node, creating it on first use
    fn ensure_node(&mut self, idx: NodeIdx, nodes: &[RawNode], network: &mut Network) -> NodeId {
        if let Some(&id) = self.built.get(&idx) {
            return id;
        }
        let raw = &nodes[idx];
        let id = network.push_node(|id| Node {
            id,
            osm_id: raw.osm_id,
            name: raw.name.clone(),
            osm_highway: raw.highway.clone(),
            ctrl_type: raw.ctrl_type,
            lon: raw.lon,
            lat: raw.lat,
            x: raw.x,
            y: raw.y,
            is_boundary: raw.is_boundary,
            poi_id: None,
            incoming: Vec::new(),
            outgoing: Vec::new(),
        });
        self.built.insert(idx, id);
        id
    }

    #[allow(clippy::too_many_arguments)]
    fn make_link(
        &self,
        part: &[NodeIdx],
        from_node: NodeId,
        to_node: NodeId,
        direction: Direction,
        way: &RawWay,
        link_way: &LinkWay,
        nodes: &[RawNode],
    ) -> Link {
        let defaults = self.config.link_defaults(&link_way.link_type);

        let lanes = resolve_lanes(way, link_way.oneway, direction)
            .or_else(|| defaults.and_then(|d| d.lanes));
        let free_speed = way.maxspeed.or_else(|| defaults.and_then(|d| d.free_speed));
        let capacity = defaults.and_then(|d| d.capacity);

        let interior = &part[1..part.len() - 1];
        let ctrl_type = interior
            .iter()
            .any(|&n| nodes[n].is_signal())
            .then_some(ControlType::Signal);

        let geometry: LineString<f64> = part
            .iter()
            .map(|&n| (nodes[n].lon, nodes[n].lat))
            .collect::<Vec<_>>()
            .into();
        let geometry_xy: LineString<f64> = part
            .iter()
            .map(|&n| (nodes[n].x, nodes[n].y))
            .collect::<Vec<_>>()
            .into();

        Link {
            id: 0,
            osm_way_id: way.osm_id,
            name: way.name.clone(),
            from_node,
            to_node,
            lanes,
            free_speed,
            capacity,
            link_type: link_way.link_type.clone(),
            link_type_code: link_way.link_type_code,
            is_link: link_way.is_link,
            allowed_modes: link_way.allowed_modes.clone(),
            from_bidirectional_way: !link_way.oneway,
            dir_flag: 1,
            ctrl_type,
            geometry,
            geometry_xy,
        }
    }
}

/// Lane count from the way's own tags
///
/// A oneway uses the total; otherwise the directional tag wins, then half
/// the total rounded up.
fn resolve_lanes(way: &RawWay, oneway: bool, direction: Direction) -> Option<u32> {
    if oneway {
        return way.lanes;
    }
    let directional = match direction {
        Direction::Forward => way.forward_lanes,
        Direction::Backward => way.backward_lanes,
    };
    directional.or_else(|| way.lanes.map(|lanes| lanes.div_ceil(2)))
}

/// Split a way at its interior crossing nodes
///
/// Consecutive segments share their joining node.
pub fn split_segments(way: &RawWay, nodes: &[RawNode]) -> Vec<Vec<NodeIdx>> {
    let refs = &way.refs;
    if refs.len() < 2 {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut start = 0;
    for i in 1..refs.len() - 1 {
        if nodes[refs[i]].is_crossing {
            segments.push(refs[start..=i].to_vec());
            start = i;
        }
    }
    segments.push(refs[start..].to_vec());
    segments
}
