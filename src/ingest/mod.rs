//! PBF ingestion
//!
//! Elements are buffered as they stream past and only linked once the whole
//! extract has been read, so a way may reference a node that arrives later.

use log::{debug, info};
use osmpbf::{BlobDecode, BlobReader, Element, ElementReader, RelMemberType};
use std::collections::HashMap;
use std::path::Path;

use crate::core::config::NetworkConfig;
use crate::core::error::Result;
use crate::osm::{
    ControlType, MemberRef, NodeIdx, OsmData, OsmId, RawNode, RawRelation, RawWay,
    RelationMember, WayIdx, WayTag,
};
use crate::spatial::{GeoProjector, Region};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Node,
    Way,
}

/// Unresolved relation member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub role: String,
    pub kind: MemberKind,
    pub ref_id: OsmId,
}

struct PendingWay {
    way: RawWay,
    ref_ids: Vec<OsmId>,
}

struct PendingRelation {
    relation: RawRelation,
    members: Vec<Member>,
}

/// Two-phase builder for [`OsmData`]
pub struct Ingestor {
    lonlat_precision: u32,
    xy_precision: u32,
    nodes: Vec<RawNode>,
    node_index: HashMap<OsmId, NodeIdx>,
    ways: Vec<PendingWay>,
    relations: Vec<PendingRelation>,
}

impl Ingestor {
    pub fn new(config: &NetworkConfig) -> Self {
        Self {
            lonlat_precision: config.lonlat_precision,
            xy_precision: config.xy_precision,
            nodes: Vec::new(),
            node_index: HashMap::new(),
            ways: Vec::new(),
            relations: Vec::new(),
        }
    }

    pub fn add_node<I, K, V>(&mut self, id: OsmId, lon: f64, lat: f64, tags: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut node = RawNode {
            osm_id: Some(id),
            lon,
            lat,
            ..Default::default()
        };
        for (key, value) in tags {
            match key.as_ref() {
                "name" => node.name = Some(value.as_ref().to_string()),
                "highway" => node.highway = Some(value.as_ref().to_string()),
                _ => {}
            }
        }
        node.ctrl_type = ControlType::from_highway(node.highway.as_deref());

        if let Some(&idx) = self.node_index.get(&id) {
            debug!("Duplicate node {id}, keeping the last occurrence");
            self.nodes[idx] = node;
        } else {
            self.node_index.insert(id, self.nodes.len());
            self.nodes.push(node);
        }
    }

    pub fn add_way<I, K, V>(&mut self, id: OsmId, refs: Vec<OsmId>, tags: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut way = RawWay::new(id, Vec::new());
        for (key, value) in tags {
            apply_way_tag(&mut way, key.as_ref(), value.as_ref());
        }
        self.ways.push(PendingWay { way, ref_ids: refs });
    }

    /// Buffer a relation; only building and amenity relations are kept
    pub fn add_relation<I, K, V>(&mut self, id: OsmId, members: Vec<Member>, tags: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut relation = RawRelation {
            osm_id: id,
            ..Default::default()
        };
        for (key, value) in tags {
            let value = Some(value.as_ref().to_string());
            match key.as_ref() {
                "name" => relation.name = value,
                "building" => relation.building = value,
                "amenity" => relation.amenity = value,
                "leisure" => relation.leisure = value,
                _ => {}
            }
        }
        if relation.building.is_none() && relation.amenity.is_none() {
            return;
        }
        self.relations.push(PendingRelation { relation, members });
    }

    /// Link everything read so far
    ///
    /// Without an explicit region the extent of all nodes is used.
    pub fn finish(self, region: Option<Region>) -> Result<OsmData> {
        let Ingestor {
            lonlat_precision,
            xy_precision,
            mut nodes,
            node_index,
            ways: pending_ways,
            relations: pending_relations,
        } = self;

        let projector = GeoProjector::from_coordinates(nodes.iter().map(|n| (n.lon, n.lat)))?
            .with_precision(lonlat_precision, xy_precision);
        let region = match region {
            Some(region) => region,
            None => Region::from_extent(nodes.iter().map(|n| (n.lon, n.lat)))?,
        };

        for node in nodes.iter_mut() {
            let (x, y) = projector.to_planar(node.lon, node.lat);
            node.x = x;
            node.y = y;
            node.in_region = region.contains(node.lon, node.lat);
        }

        let mut missing_refs = 0usize;
        let mut way_index: HashMap<OsmId, WayIdx> = HashMap::with_capacity(pending_ways.len());
        let mut ways = Vec::with_capacity(pending_ways.len());
        for PendingWay { mut way, ref_ids } in pending_ways {
            for ref_id in ref_ids {
                match node_index.get(&ref_id) {
                    Some(&idx) => way.refs.push(idx),
                    None => {
                        debug!("Way {} references missing node {ref_id}", way.osm_id);
                        missing_refs += 1;
                    }
                }
            }
            way_index.insert(way.osm_id, ways.len());
            ways.push(way);
        }

        let mut missing_members = 0usize;
        let mut relations = Vec::with_capacity(pending_relations.len());
        for PendingRelation {
            mut relation,
            members,
        } in pending_relations
        {
            for member in members {
                let resolved = match member.kind {
                    MemberKind::Node => node_index.get(&member.ref_id).map(|&i| MemberRef::Node(i)),
                    MemberKind::Way => way_index.get(&member.ref_id).map(|&i| MemberRef::Way(i)),
                };
                match resolved {
                    Some(member_ref) => relation.members.push(RelationMember {
                        member: member_ref,
                        role: member.role,
                    }),
                    None => {
                        debug!(
                            "Relation {} references missing {:?} {}",
                            relation.osm_id, member.kind, member.ref_id
                        );
                        missing_members += 1;
                    }
                }
            }
            relations.push(relation);
        }

        info!(
            "Ingested {} nodes, {} ways, {} relations",
            nodes.len(),
            ways.len(),
            relations.len()
        );
        if missing_refs > 0 || missing_members > 0 {
            info!(
                "Dropped {missing_refs} dangling node references and {missing_members} dangling relation members"
            );
        }

        Ok(OsmData {
            nodes,
            node_index,
            ways,
            relations,
            projector,
            region,
        })
    }
}

fn apply_way_tag(way: &mut RawWay, key: &str, value: &str) {
    match key {
        "name" => way.name = Some(value.to_string()),
        "lanes" => way.lanes = first_number(value).map(|n| n as u32),
        "lanes:forward" => way.forward_lanes = value.trim().parse().ok(),
        "lanes:backward" => way.backward_lanes = value.trim().parse().ok(),
        "maxspeed" => way.maxspeed = first_number(value).map(|n| n as u32),
        "oneway" => match value {
            "yes" | "1" => way.oneway = Some(true),
            "no" | "0" => way.oneway = Some(false),
            "-1" => {
                way.oneway = Some(true);
                way.is_reversed = true;
            }
            "reversible" | "alternating" => way.oneway = Some(false),
            _ => {}
        },
        _ => {
            if let Some(tag) = WayTag::from_key(key) {
                *way.tag_mut(tag) = Some(value.to_string());
            }
        }
    }
}

/// First decimal number appearing in a tag value, e.g. `2;3` -> 2, `50 mph` -> 50
fn first_number(value: &str) -> Option<f64> {
    let start = value.find(|c: char| c.is_ascii_digit())?;
    let rest = &value[start..];
    let mut end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if rest[end..].starts_with('.') {
        end += 1;
        end += rest[end..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len() - end);
    }
    rest[..end].trim_end_matches('.').parse().ok()
}

/// Bounding box stored in the PBF header, if any
pub fn read_header_region<P: AsRef<Path>>(path: P) -> Result<Option<Region>> {
    let reader = BlobReader::from_path(path)?;
    for blob in reader {
        if let BlobDecode::OsmHeader(header) = blob?.decode()? {
            return match header.bbox() {
                Some(bbox) => Ok(Some(Region::from_bbox(
                    bbox.left,
                    bbox.bottom,
                    bbox.right,
                    bbox.top,
                )?)),
                None => Ok(None),
            };
        }
    }
    Ok(None)
}

/// Read a PBF extract into linked, projected [`OsmData`]
///
/// The region is `bbox` when given, else the header bounding box, else the
/// extent of all nodes.
pub fn read_pbf<P: AsRef<Path>>(
    path: P,
    bbox: Option<Region>,
    config: &NetworkConfig,
) -> Result<OsmData> {
    let path = path.as_ref();
    let region = match bbox {
        Some(region) => Some(region),
        None => read_header_region(path)?,
    };
    if region.is_none() {
        debug!("No bounding box in {}, using the node extent", path.display());
    }

    let mut ingestor = Ingestor::new(config);
    let reader = ElementReader::from_path(path)?;
    reader.for_each(|element| match element {
        Element::Node(node) => ingestor.add_node(node.id(), node.lon(), node.lat(), node.tags()),
        Element::DenseNode(node) => {
            ingestor.add_node(node.id(), node.lon(), node.lat(), node.tags())
        }
        Element::Way(way) => ingestor.add_way(way.id(), way.refs().collect(), way.tags()),
        Element::Relation(relation) => {
            let members = relation
                .members()
                .filter_map(|member| {
                    let kind = match member.member_type {
                        RelMemberType::Node => MemberKind::Node,
                        RelMemberType::Way => MemberKind::Way,
                        RelMemberType::Relation => return None,
                    };
                    Some(Member {
                        role: member.role().unwrap_or("").to_string(),
                        kind,
                        ref_id: member.member_id,
                    })
                })
                .collect();
            ingestor.add_relation(relation.id(), members, relation.tags());
        }
    })?;

    ingestor.finish(region)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_TAGS: [(&str, &str); 0] = [];

    #[test]
    fn test_first_number() {
        assert_eq!(first_number("2"), Some(2.0));
        assert_eq!(first_number("2;3"), Some(2.0));
        assert_eq!(first_number("50 mph"), Some(50.0));
        assert_eq!(first_number("2.5"), Some(2.5));
        assert_eq!(first_number("none"), None);
    }

    #[test]
    fn test_way_tag_parsing() {
        let mut way = RawWay::new(1, Vec::new());
        apply_way_tag(&mut way, "lanes", "3;2");
        apply_way_tag(&mut way, "lanes:forward", "two");
        apply_way_tag(&mut way, "lanes:backward", "1");
        apply_way_tag(&mut way, "maxspeed", "60.7");
        apply_way_tag(&mut way, "oneway", "-1");
        apply_way_tag(&mut way, "motor_vehicle", "no");

        assert_eq!(way.lanes, Some(3));
        assert_eq!(way.forward_lanes, None);
        assert_eq!(way.backward_lanes, Some(1));
        assert_eq!(way.maxspeed, Some(60));
        assert_eq!(way.oneway, Some(true));
        assert!(way.is_reversed);
        assert_eq!(way.motor_vehicle.as_deref(), Some("no"));
    }

    #[test]
    fn test_oneway_values() {
        for (value, expected) in [
            ("yes", Some(true)),
            ("1", Some(true)),
            ("no", Some(false)),
            ("0", Some(false)),
            ("reversible", Some(false)),
            ("alternating", Some(false)),
            ("maybe", None),
        ] {
            let mut way = RawWay::new(1, Vec::new());
            apply_way_tag(&mut way, "oneway", value);
            assert_eq!(way.oneway, expected, "oneway={value}");
            assert!(!way.is_reversed);
        }
    }

    #[test]
    fn test_finish_links_and_projects() {
        let config = NetworkConfig::default();
        let mut ingestor = Ingestor::new(&config);
        ingestor.add_node(10, 4.35, 50.85, [("highway", "traffic_signals")]);
        ingestor.add_node(11, 4.36, 50.86, NO_TAGS);
        ingestor.add_node(12, 5.00, 50.86, NO_TAGS);
        ingestor.add_way(100, vec![10, 11, 99], [("highway", "primary")]);
        ingestor.add_relation(
            200,
            vec![
                Member {
                    role: "outer".to_string(),
                    kind: MemberKind::Way,
                    ref_id: 100,
                },
                Member {
                    role: "outer".to_string(),
                    kind: MemberKind::Way,
                    ref_id: 404,
                },
            ],
            [("building", "yes")],
        );
        ingestor.add_relation(201, Vec::new(), [("leisure", "park")]);

        let region = Region::from_bbox(4.3, 50.8, 4.4, 50.9).unwrap();
        let data = ingestor.finish(Some(region)).unwrap();

        assert_eq!(data.nodes.len(), 3);
        assert_eq!(data.ways[0].refs, vec![0, 1]);
        assert_eq!(data.relations.len(), 1);
        assert_eq!(data.relations[0].members.len(), 1);
        assert_eq!(data.relations[0].members[0].member, MemberRef::Way(0));

        let signal = data.node_by_osm_id(10).unwrap();
        assert!(signal.is_signal());
        assert!(signal.in_region);
        assert!(!data.node_by_osm_id(12).unwrap().in_region);
        assert!(signal.x > 0.0 && signal.y > 0.0);
    }

    #[test]
    fn test_finish_without_nodes_fails() {
        let config = NetworkConfig::default();
        let ingestor = Ingestor::new(&config);
        assert!(ingestor.finish(None).is_err());
    }
}
