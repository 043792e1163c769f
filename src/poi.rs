//! POI polygons from ways and multipolygon-style relations

use geo::{Centroid, Intersects, LineString, MultiPolygon, Polygon};
use log::{debug, info};
use rstar::primitives::GeomWithData;
use rstar::RTree;
use std::collections::HashSet;

use crate::classify::PoiWay;
use crate::core::config::NetworkConfig;
use crate::network::{Network, NodeId, Poi, PoiId, PoiSource};
use crate::osm::{MemberRef, NodeIdx, OsmData, RawNode, RawRelation};
use crate::spatial::{round_to, Region};

/// A POI found but not yet numbered
#[derive(Debug, Clone, PartialEq)]
pub struct PoiCandidate {
    pub source: PoiSource,
    pub name: Option<String>,
    pub building: Option<String>,
    pub amenity: Option<String>,
    pub leisure: Option<String>,
    pub kind: Option<String>,
    pub geometry: MultiPolygon<f64>,
    pub geometry_xy: MultiPolygon<f64>,
    pub centroid: (f64, f64),
    pub centroid_xy: (f64, f64),
}

impl PoiCandidate {
    pub fn into_poi(self, id: PoiId) -> Poi {
        Poi {
            id,
            source: self.source,
            name: self.name,
            building: self.building,
            amenity: self.amenity,
            leisure: self.leisure,
            kind: self.kind,
            geometry: self.geometry,
            geometry_xy: self.geometry_xy,
            centroid: self.centroid,
            centroid_xy: self.centroid_xy,
            node_id: None,
        }
    }
}

/// POIs numbered by [`PoiExtractor::extract`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoiExtraction {
    pub ids: Vec<PoiId>,
    /// Relations with no closed ring, or none touching the region
    pub relations_dropped: usize,
}

/// Outcome of stitching one relation's outer members
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stitched {
    pub rings: Vec<Vec<NodeIdx>>,
    /// Open chains thrown away
    pub discarded: usize,
}

/// Join member node lists end to end into closed rings
///
/// A member extends the open chain at whichever end it shares; a chain whose
/// ends meet becomes a ring. A member that fits neither end replaces the open
/// chain, which is discarded, as is any chain still open at the end.
pub fn stitch_rings<'m, I>(members: I) -> Stitched
where
    I: IntoIterator<Item = &'m [NodeIdx]>,
{
    let mut out = Stitched::default();
    let mut chain: Vec<NodeIdx> = Vec::new();

    for member in members {
        if member.is_empty() {
            continue;
        }
        if !chain.is_empty() {
            match join(&chain, member) {
                Some(combined) if is_closed(&combined) => {
                    out.rings.push(combined);
                    chain.clear();
                    continue;
                }
                Some(combined) => {
                    chain = combined;
                    continue;
                }
                None => {
                    out.discarded += 1;
                    chain.clear();
                }
            }
        }
        if is_closed(member) {
            out.rings.push(member.to_vec());
        } else {
            chain = member.to_vec();
        }
    }

    if !chain.is_empty() {
        out.discarded += 1;
    }
    out
}

fn is_closed(nodes: &[NodeIdx]) -> bool {
    nodes.len() > 1 && nodes.first() == nodes.last()
}

fn join(chain: &[NodeIdx], member: &[NodeIdx]) -> Option<Vec<NodeIdx>> {
    let (c_first, c_last) = (chain[0], chain[chain.len() - 1]);
    let (m_first, m_last) = (member[0], member[member.len() - 1]);

    let mut combined = Vec::with_capacity(chain.len() + member.len());
    if c_last == m_first {
        combined.extend_from_slice(chain);
        combined.extend_from_slice(&member[1..]);
    } else if c_last == m_last {
        combined.extend_from_slice(chain);
        combined.extend(member[..member.len() - 1].iter().rev());
    } else if c_first == m_first {
        combined.extend(chain.iter().rev());
        combined.extend_from_slice(&member[1..]);
    } else if c_first == m_last {
        combined.extend(chain.iter().rev());
        combined.extend(member[..member.len() - 1].iter().rev());
    } else {
        return None;
    }
    Some(combined)
}

/// Closed with at least three distinct nodes
fn is_valid_ring(ring: &[NodeIdx]) -> bool {
    is_closed(ring) && ring.iter().collect::<HashSet<_>>().len() >= 3
}

fn ring_polygons(ring: &[NodeIdx], nodes: &[RawNode]) -> (Polygon<f64>, Polygon<f64>) {
    let lonlat: LineString<f64> = ring
        .iter()
        .map(|&n| (nodes[n].lon, nodes[n].lat))
        .collect::<Vec<_>>()
        .into();
    let xy: LineString<f64> = ring
        .iter()
        .map(|&n| (nodes[n].x, nodes[n].y))
        .collect::<Vec<_>>()
        .into();
    (Polygon::new(lonlat, vec![]), Polygon::new(xy, vec![]))
}

pub struct PoiExtractor<'a> {
    config: &'a NetworkConfig,
}

impl<'a> PoiExtractor<'a> {
    pub fn new(config: &'a NetworkConfig) -> Self {
        Self { config }
    }

    /// Turn rings into a candidate, unless every ring lies outside `region`
    fn candidate(
        &self,
        rings: &[Vec<NodeIdx>],
        nodes: &[RawNode],
        region: &Region,
        source: PoiSource,
    ) -> Option<PoiCandidate> {
        let (polygons, polygons_xy): (Vec<_>, Vec<_>) =
            rings.iter().map(|ring| ring_polygons(ring, nodes)).unzip();
        if !polygons.iter().any(|p| region.polygon().intersects(p)) {
            return None;
        }

        let geometry = MultiPolygon::new(polygons);
        let geometry_xy = MultiPolygon::new(polygons_xy);
        let (Some(centroid), Some(centroid_xy)) = (geometry.centroid(), geometry_xy.centroid())
        else {
            debug!("POI {source:?} has no centroid");
            return None;
        };

        Some(PoiCandidate {
            source,
            name: None,
            building: None,
            amenity: None,
            leisure: None,
            kind: None,
            geometry,
            geometry_xy,
            centroid: (
                round_to(centroid.x(), self.config.lonlat_precision),
                round_to(centroid.y(), self.config.lonlat_precision),
            ),
            centroid_xy: (
                round_to(centroid_xy.x(), self.config.xy_precision),
                round_to(centroid_xy.y(), self.config.xy_precision),
            ),
        })
    }

    pub fn from_ways(&self, data: &OsmData, poi_ways: &[PoiWay]) -> Vec<PoiCandidate> {
        let mut candidates = Vec::new();
        for poi_way in poi_ways {
            let way = &data.ways[poi_way.way];
            if !is_valid_ring(&way.refs) {
                debug!("POI way {} is not a closed ring", way.osm_id);
                continue;
            }
            let rings = [way.refs.clone()];
            let Some(candidate) =
                self.candidate(&rings, &data.nodes, &data.region, PoiSource::Way(way.osm_id))
            else {
                continue;
            };
            candidates.push(PoiCandidate {
                name: way.name.clone(),
                building: way.building.clone(),
                amenity: way.amenity.clone(),
                leisure: way.leisure.clone(),
                kind: poi_way.kind.clone(),
                ..candidate
            });
        }
        candidates
    }

    pub fn from_relation(&self, data: &OsmData, relation: &RawRelation) -> Option<PoiCandidate> {
        let outer_members = relation.members.iter().filter_map(|m| match m.member {
            MemberRef::Way(way) if m.role == "outer" => Some(data.ways[way].refs.as_slice()),
            _ => None,
        });
        let stitched = stitch_rings(outer_members);
        if stitched.discarded > 0 {
            debug!(
                "Relation {}: discarded {} open chains",
                relation.osm_id, stitched.discarded
            );
        }

        let rings: Vec<Vec<NodeIdx>> = stitched
            .rings
            .into_iter()
            .filter(|ring| is_valid_ring(ring))
            .collect();
        if rings.is_empty() {
            debug!("Relation {} has no closed ring", relation.osm_id);
            return None;
        }

        let candidate = self.candidate(
            &rings,
            &data.nodes,
            &data.region,
            PoiSource::Relation(relation.osm_id),
        )?;
        Some(PoiCandidate {
            name: relation.name.clone(),
            building: relation.building.clone(),
            amenity: relation.amenity.clone(),
            leisure: relation.leisure.clone(),
            ..candidate
        })
    }

    /// Extract every POI and number them, way-derived first
    pub fn extract(&self, data: &OsmData, poi_ways: &[PoiWay], network: &mut Network) -> PoiExtraction {
        let from_ways = self.from_ways(data, poi_ways);
        let from_relations: Vec<PoiCandidate> = data
            .relations
            .iter()
            .filter_map(|relation| self.from_relation(data, relation))
            .collect();
        let relations_dropped = data.relations.len() - from_relations.len();

        info!(
            "Extracted {} POIs from ways and {} from {} relations ({} relations dropped: no closed ring or outside the region)",
            from_ways.len(),
            from_relations.len(),
            data.relations.len(),
            relations_dropped
        );

        let ids = from_ways
            .into_iter()
            .chain(from_relations)
            .map(|candidate| network.push_poi(|id| candidate.into_poi(id)))
            .collect();
        PoiExtraction {
            ids,
            relations_dropped,
        }
    }
}

/// Attach each POI to the nearest built node within `radius` metres
pub fn link_pois_to_nodes(network: &mut Network, radius: f64) -> usize {
    let points: Vec<GeomWithData<[f64; 2], NodeId>> = network
        .nodes()
        .map(|node| GeomWithData::new([node.x, node.y], node.id))
        .collect();
    if points.is_empty() {
        return 0;
    }
    let tree = RTree::bulk_load(points);

    let pairs: Vec<(PoiId, NodeId)> = network
        .pois()
        .filter_map(|poi| {
            let (x, y) = poi.centroid_xy;
            let nearest = tree.nearest_neighbor(&[x, y])?;
            let [nx, ny] = *nearest.geom();
            ((nx - x).hypot(ny - y) <= radius).then_some((poi.id, nearest.data))
        })
        .collect();

    let linked = pairs.len();
    for (poi, node) in pairs {
        network.link_poi(poi, node);
    }
    debug!("Linked {linked} POIs to nodes within {radius} m");
    linked
}
