//! End to end network construction

use log::info;
use std::path::Path;

use crate::builder::{BuildStats, NetworkBuilder};
use crate::classify::WayClassifier;
use crate::core::config::NetworkConfig;
use crate::core::error::Result;
use crate::ingest;
use crate::network::Network;
use crate::osm::OsmData;
use crate::poi::{link_pois_to_nodes, PoiExtractor};
use crate::spatial::Region;

/// Counts gathered along the way
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub link_ways: usize,
    pub poi_ways: usize,
    pub links: BuildStats,
    pub pois: usize,
    pub relations_dropped: usize,
    pub pois_linked: usize,
}

/// Classify, clip and assemble a network from ingested data
pub fn build_network(mut data: OsmData, config: &NetworkConfig) -> Result<(Network, BuildReport)> {
    config.validate()?;

    let classification = WayClassifier::new(config).classify(&mut data);

    let mut network = Network::new(data.region.clone());
    let links = NetworkBuilder::new(config).build(&mut data, &classification, &mut network)?;

    let mut report = BuildReport {
        link_ways: classification.link_ways.len(),
        poi_ways: classification.poi_ways.len(),
        links,
        ..Default::default()
    };

    if config.extract_pois {
        let extraction =
            PoiExtractor::new(config).extract(&data, &classification.poi_ways, &mut network);
        report.pois = extraction.ids.len();
        report.relations_dropped = extraction.relations_dropped;
        if let Some(radius) = config.poi_link_radius {
            report.pois_linked = link_pois_to_nodes(&mut network, radius);
        }
    }

    info!(
        "Network ready: {} nodes, {} links, {} POIs",
        network.node_count(),
        network.link_count(),
        network.poi_count()
    );
    Ok((network, report))
}

/// Read a PBF extract and build its network
pub fn build_from_pbf<P: AsRef<Path>>(
    path: P,
    bbox: Option<Region>,
    config: &NetworkConfig,
) -> Result<(Network, BuildReport)> {
    config.validate()?;
    let data = ingest::read_pbf(path, bbox, config)?;
    build_network(data, config)
}
