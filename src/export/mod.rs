//! Flat output records for nodes, links and POIs
//!
//! The same records back the CSV tables and the graph document.

pub mod graph;
pub mod tables;

pub use graph::write_graph_document;
pub use tables::write_csv;

use geo::{Geometry, MapCoords, Point};
use serde::Serialize;
use wkt::ToWkt;

use crate::network::{Link, Network, Node, Poi, PoiSource};
use crate::spatial::round_to;

/// Decimal places of coordinates written as WKT
pub const WKT_PRECISION: u32 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    pub name: Option<String>,
    pub node_id: u64,
    pub osm_node_id: Option<i64>,
    pub osm_highway: Option<String>,
    pub ctrl_type: Option<&'static str>,
    pub is_boundary: u8,
    pub x_coord: f64,
    pub y_coord: f64,
    pub poi_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRecord {
    pub name: Option<String>,
    pub link_id: u64,
    pub osm_way_id: i64,
    pub from_node_id: u64,
    pub to_node_id: u64,
    pub dir_flag: i8,
    pub length: f64,
    pub lanes: Option<u32>,
    pub free_speed: Option<u32>,
    pub capacity: Option<u32>,
    pub link_type_name: String,
    pub link_type: u8,
    pub geometry: String,
    pub allowed_uses: String,
    pub from_biway: u8,
    pub is_link: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoiRecord {
    pub name: Option<String>,
    pub poi_id: u64,
    pub osm_way_id: Option<i64>,
    pub osm_relation_id: Option<i64>,
    pub building: Option<String>,
    pub amenity: Option<String>,
    pub leisure: Option<String>,
    pub way: Option<String>,
    pub geometry: String,
    pub centroid: String,
    pub area: f64,
    pub node_id: Option<u64>,
}

fn wkt<G>(geometry: G) -> String
where
    G: Into<Geometry<f64>>,
{
    let geometry: Geometry<f64> = geometry.into();
    geometry
        .map_coords(|c| geo::coord! { x: round_to(c.x, WKT_PRECISION), y: round_to(c.y, WKT_PRECISION) })
        .wkt_string()
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            node_id: node.id,
            osm_node_id: node.osm_id,
            osm_highway: node.osm_highway.clone(),
            ctrl_type: node.ctrl_type.map(|c| c.name()),
            is_boundary: u8::from(node.is_boundary),
            x_coord: round_to(node.lon, WKT_PRECISION),
            y_coord: round_to(node.lat, WKT_PRECISION),
            poi_id: node.poi_id,
        }
    }
}

impl From<&Link> for LinkRecord {
    fn from(link: &Link) -> Self {
        Self {
            name: link.name.clone(),
            link_id: link.id,
            osm_way_id: link.osm_way_id,
            from_node_id: link.from_node,
            to_node_id: link.to_node,
            dir_flag: link.dir_flag,
            length: link.length(),
            lanes: link.lanes,
            free_speed: link.free_speed,
            capacity: link.capacity,
            link_type_name: link.link_type.clone(),
            link_type: link.link_type_code,
            geometry: wkt(link.geometry.clone()),
            allowed_uses: link
                .allowed_modes
                .iter()
                .map(|m| m.name())
                .collect::<Vec<_>>()
                .join(";"),
            from_biway: u8::from(link.from_bidirectional_way),
            is_link: u8::from(link.is_link),
        }
    }
}

impl From<&Poi> for PoiRecord {
    fn from(poi: &Poi) -> Self {
        let (osm_way_id, osm_relation_id) = match poi.source {
            PoiSource::Way(id) => (Some(id), None),
            PoiSource::Relation(id) => (None, Some(id)),
        };
        let geometry = match poi.geometry.0.as_slice() {
            [single] => wkt(single.clone()),
            _ => wkt(poi.geometry.clone()),
        };
        Self {
            name: poi.name.clone(),
            poi_id: poi.id,
            osm_way_id,
            osm_relation_id,
            building: poi.building.clone(),
            amenity: poi.amenity.clone(),
            leisure: poi.leisure.clone(),
            way: poi.kind.clone(),
            geometry,
            centroid: wkt(Point::new(poi.centroid.0, poi.centroid.1)),
            area: round_to(poi.area(), 1),
            node_id: poi.node_id,
        }
    }
}

pub fn node_records(network: &Network) -> Vec<NodeRecord> {
    network.nodes().map(NodeRecord::from).collect()
}

pub fn link_records(network: &Network) -> Vec<LinkRecord> {
    network.links().map(LinkRecord::from).collect()
}

pub fn poi_records(network: &Network) -> Vec<PoiRecord> {
    network.pois().map(PoiRecord::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn test_wkt_rounding() {
        let line = line_string![(x: 116.123456789, y: 39.9), (x: 116.2, y: 39.987654321)];
        let text = wkt(line);
        assert!(text.starts_with("LINESTRING"));
        assert!(text.contains("116.1234568 39.9"));
        assert!(text.contains("39.9876543"));
        assert!(!text.contains("116.123456789"));

        let point = wkt(Point::new(1.5, -2.25));
        assert!(point.starts_with("POINT"));
        assert!(point.contains("1.5 -2.25"));
    }
}
