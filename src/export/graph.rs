//! Graph document for a property-graph store
//!
//! Nodes are labelled `pos` and edges `pos_pos`; each collection goes to
//! its own JSON array file.

use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::{link_records, node_records, poi_records, LinkRecord, NodeRecord, PoiRecord};
use crate::core::error::Result;
use crate::network::Network;

pub const NODE_LABEL: &str = "pos";
pub const EDGE_LABEL: &str = "pos_pos";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointDocument {
    pub name: Option<String>,
    pub id: u64,
    pub osm_node_id: Option<i64>,
    pub osm_highway: Option<String>,
    pub ctrl_type: Option<&'static str>,
    /// `[lon, lat]`
    pub poi: [f64; 2],
    pub label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeProperties {
    pub edge_name: Option<String>,
    pub osm_edge_id: i64,
    pub length: f64,
    pub lanes: Option<u32>,
    pub free_speed: Option<u32>,
    pub link_type: String,
    pub geometry: String,
    pub is_biway: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeDocument {
    pub id: u64,
    pub properties: EdgeProperties,
    pub src_node_id: u64,
    pub target_node_id: u64,
    pub edgelabel: &'static str,
    pub src_label: &'static str,
    pub target_label: &'static str,
}

impl From<NodeRecord> for PointDocument {
    fn from(record: NodeRecord) -> Self {
        Self {
            name: record.name,
            id: record.node_id,
            osm_node_id: record.osm_node_id,
            osm_highway: record.osm_highway,
            ctrl_type: record.ctrl_type,
            poi: [record.x_coord, record.y_coord],
            label: NODE_LABEL,
        }
    }
}

impl From<LinkRecord> for EdgeDocument {
    fn from(record: LinkRecord) -> Self {
        Self {
            id: record.link_id,
            properties: EdgeProperties {
                edge_name: record.name,
                osm_edge_id: record.osm_way_id,
                length: record.length,
                lanes: record.lanes,
                free_speed: record.free_speed,
                link_type: record.link_type_name,
                geometry: record.geometry,
                is_biway: record.from_biway == 1,
            },
            src_node_id: record.from_node_id,
            target_node_id: record.to_node_id,
            edgelabel: EDGE_LABEL,
            src_label: NODE_LABEL,
            target_label: NODE_LABEL,
        }
    }
}

/// Files written by [`write_graph_document`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphOutput {
    pub point_file: PathBuf,
    pub edge_file: PathBuf,
    pub poi_file: PathBuf,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, value)?;
    Ok(())
}

pub fn write_graph_document<P: AsRef<Path>>(network: &Network, dir: P) -> Result<GraphOutput> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let points: Vec<PointDocument> = node_records(network)
        .into_iter()
        .map(PointDocument::from)
        .collect();
    let edges: Vec<EdgeDocument> = link_records(network)
        .into_iter()
        .map(EdgeDocument::from)
        .collect();
    let pois: Vec<PoiRecord> = poi_records(network);

    let output = GraphOutput {
        point_file: dir.join("point_data.json"),
        edge_file: dir.join("edge_data.json"),
        poi_file: dir.join("poi_data.json"),
    };
    write_json(&output.point_file, &points)?;
    write_json(&output.edge_file, &edges)?;
    write_json(&output.poi_file, &pois)?;

    log::info!(
        "Wrote graph document: {} points, {} edges, {} POIs",
        points.len(),
        edges.len(),
        pois.len()
    );
    Ok(output)
}
