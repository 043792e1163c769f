//! Integration tests for butterfly-net network construction
//!
//! Extracts are assembled in memory through the `Ingestor`, so no PBF
//! fixture is needed; the pipeline from classification to export runs
//! exactly as it does for a file.

use butterfly_net::ingest::{Ingestor, Member, MemberKind};
use butterfly_net::network::PoiSource;
use butterfly_net::osm::{ControlType, OsmData};
use butterfly_net::{build_network, export, read_pbf, BuildReport, Mode, Network, NetworkConfig, Region};
use geo::{BoundingRect, Contains, Point};

const NO_TAGS: [(&str, &str); 0] = [];

/// Region shared by every scenario
fn region() -> Region {
    Region::from_bbox(116.30, 39.90, 116.40, 40.00).unwrap()
}

struct Extract {
    ingestor: Ingestor,
}

impl Extract {
    fn new(config: &NetworkConfig) -> Self {
        Self {
            ingestor: Ingestor::new(config),
        }
    }

    fn node(mut self, id: i64, lon: f64, lat: f64) -> Self {
        self.ingestor.add_node(id, lon, lat, NO_TAGS);
        self
    }

    fn tagged_node(mut self, id: i64, lon: f64, lat: f64, tags: &[(&str, &str)]) -> Self {
        self.ingestor.add_node(id, lon, lat, tags.iter().copied());
        self
    }

    fn way(mut self, id: i64, refs: &[i64], tags: &[(&str, &str)]) -> Self {
        self.ingestor.add_way(id, refs.to_vec(), tags.iter().copied());
        self
    }

    fn relation(mut self, id: i64, outer_ways: &[i64], tags: &[(&str, &str)]) -> Self {
        let members = outer_ways
            .iter()
            .map(|&ref_id| Member {
                role: "outer".to_string(),
                kind: MemberKind::Way,
                ref_id,
            })
            .collect();
        self.ingestor.add_relation(id, members, tags.iter().copied());
        self
    }

    fn finish(self) -> OsmData {
        self.ingestor.finish(Some(region())).unwrap()
    }
}

fn build(extract: Extract, config: &NetworkConfig) -> (Network, BuildReport) {
    build_network(extract.finish(), config).unwrap()
}

fn node_osm_id(network: &Network, id: u64) -> Option<i64> {
    network.node(id).and_then(|n| n.osm_id)
}

/// Two nodes well inside the region, 1 km apart
fn two_node_extract(config: &NetworkConfig, tags: &[(&str, &str)]) -> Extract {
    Extract::new(config)
        .node(1, 116.31, 39.91)
        .node(2, 116.32, 39.91)
        .way(10, &[1, 2], tags)
}

#[test]
fn test_scenario_a_bidirectional_way() {
    let config = NetworkConfig::default();
    let (network, _) = build(
        two_node_extract(&config, &[("highway", "primary"), ("oneway", "no")]),
        &config,
    );

    assert_eq!(network.node_count(), 2);
    assert_eq!(network.link_count(), 2);

    let forward = network.link(0).unwrap();
    let backward = network.link(1).unwrap();
    assert_eq!(forward.from_node, backward.to_node);
    assert_eq!(forward.to_node, backward.from_node);
    assert_eq!(forward.length(), backward.length());
    assert!(forward.length() > 800.0 && forward.length() < 900.0);

    let mut reversed: Vec<_> = forward.geometry_xy.coords().copied().collect();
    reversed.reverse();
    let backward_coords: Vec<_> = backward.geometry_xy.coords().copied().collect();
    assert_eq!(reversed, backward_coords);

    assert!(forward.from_bidirectional_way && backward.from_bidirectional_way);
    // primary default: 3 lanes, 80 km/h, 1800 veh/h
    assert_eq!(forward.lanes, Some(3));
    assert_eq!(forward.free_speed, Some(80));
    assert_eq!(forward.capacity, Some(1800));
}

#[test]
fn test_scenario_b_oneway() {
    let config = NetworkConfig::default();
    let (network, _) = build(
        two_node_extract(&config, &[("highway", "primary"), ("oneway", "yes")]),
        &config,
    );

    assert_eq!(network.node_count(), 2);
    assert_eq!(network.link_count(), 1);
    let link = network.link(0).unwrap();
    assert!(!link.from_bidirectional_way);
    assert_eq!(node_osm_id(&network, link.from_node), Some(1));
    assert_eq!(node_osm_id(&network, link.to_node), Some(2));
}

#[test]
fn test_scenario_c_motor_vehicle_no() {
    let config = NetworkConfig::default().with_target_modes(vec![Mode::Auto, Mode::Walk]);
    let (network, _) = build(
        two_node_extract(&config, &[("highway", "primary"), ("motor_vehicle", "no")]),
        &config,
    );

    let link = network.link(0).unwrap();
    assert!(!link.allowed_modes.contains(&Mode::Auto));
    assert_eq!(link.allowed_modes, vec![Mode::Walk]);

    // Auto alone leaves nothing to build
    let auto_only = NetworkConfig::default();
    let (network, report) = build(
        two_node_extract(&auto_only, &[("highway", "primary"), ("motor_vehicle", "no")]),
        &auto_only,
    );
    assert_eq!(network.link_count(), 0);
    assert_eq!(report.link_ways, 0);
}

#[test]
fn test_scenario_d_building_poi() {
    let config = NetworkConfig::default();
    let extract = Extract::new(&config)
        .node(1, 116.350, 39.950)
        .node(2, 116.351, 39.950)
        .node(3, 116.351, 39.951)
        .node(4, 116.350, 39.951)
        .way(50, &[1, 2, 3, 4, 1], &[("building", "yes"), ("name", "Hall")]);
    let (network, report) = build(extract, &config);

    assert_eq!(report.pois, 1);
    assert_eq!(network.poi_count(), 1);
    let poi = network.poi(0).unwrap();
    assert_eq!(poi.source, PoiSource::Way(50));
    assert_eq!(poi.name.as_deref(), Some("Hall"));
    assert_eq!(poi.building.as_deref(), Some("yes"));

    let bounds = poi.geometry.bounding_rect().unwrap();
    let (lon, lat) = poi.centroid;
    assert!(bounds.min().x <= lon && lon <= bounds.max().x);
    assert!(bounds.min().y <= lat && lat <= bounds.max().y);
    assert!(poi.geometry.contains(&Point::new(lon, lat)));
    // Roughly 85 m x 111 m
    assert!(poi.area() > 8_000.0 && poi.area() < 11_000.0);
}

#[test]
fn test_scenario_e_outside_way_excluded() {
    let config = NetworkConfig::default();
    let extract = Extract::new(&config)
        .node(1, 116.35, 39.95)
        .node(5, 116.50, 39.95)
        .node(6, 116.51, 39.95)
        .way(60, &[5], &[("highway", "primary")])
        .way(61, &[5, 6], &[("highway", "primary")]);
    let (network, report) = build(extract, &config);

    assert_eq!(report.link_ways, 1);
    assert_eq!(report.links.segments_clipped_away, 1);
    assert_eq!(network.node_count(), 0);
    assert_eq!(network.link_count(), 0);
}

#[test]
fn test_scenario_f_relation_ring() {
    let config = NetworkConfig::default();
    let extract = Extract::new(&config)
        .node(1, 116.350, 39.950)
        .node(2, 116.352, 39.950)
        .node(3, 116.352, 39.952)
        .node(4, 116.350, 39.952)
        .way(70, &[1, 2, 3], NO_TAGS.as_slice())
        .way(71, &[3, 4, 1], NO_TAGS.as_slice())
        .relation(80, &[70, 71], &[("building", "yes"), ("amenity", "school")]);
    let (network, report) = build(extract, &config);

    assert_eq!(report.pois, 1);
    let poi = network.poi(0).unwrap();
    assert_eq!(poi.source, PoiSource::Relation(80));
    assert_eq!(poi.amenity.as_deref(), Some("school"));
    assert_eq!(poi.geometry.0.len(), 1);
    assert_eq!(poi.geometry.0[0].exterior().0.len(), 5);
}

#[test]
fn test_relation_without_closed_ring_dropped() {
    let config = NetworkConfig::default();
    let extract = Extract::new(&config)
        .node(1, 116.350, 39.950)
        .node(2, 116.352, 39.950)
        .node(3, 116.352, 39.952)
        .node(4, 116.360, 39.960)
        .way(70, &[1, 2, 3], NO_TAGS.as_slice())
        .way(71, &[4, 1], NO_TAGS.as_slice())
        .relation(80, &[70, 71], &[("building", "yes")]);
    let (network, report) = build(extract, &config);
    assert_eq!(network.poi_count(), 0);
    assert_eq!(report.relations_dropped, 1);
}

#[test]
fn test_poi_ids_ways_before_relations() {
    let config = NetworkConfig::default();
    let extract = Extract::new(&config)
        .node(1, 116.350, 39.950)
        .node(2, 116.352, 39.950)
        .node(3, 116.352, 39.952)
        .node(4, 116.350, 39.952)
        .node(5, 116.360, 39.960)
        .node(6, 116.361, 39.960)
        .node(7, 116.361, 39.961)
        // Outside the region: dropped
        .node(11, 116.500, 39.950)
        .node(12, 116.501, 39.950)
        .node(13, 116.501, 39.951)
        .way(70, &[1, 2, 3], NO_TAGS.as_slice())
        .way(71, &[3, 4, 1], NO_TAGS.as_slice())
        .way(90, &[11, 12, 13, 11], &[("leisure", "park")])
        .way(91, &[5, 6, 7, 5], &[("amenity", "cafe")])
        .relation(80, &[70, 71], &[("building", "yes")]);
    let (network, report) = build(extract, &config);

    assert_eq!(report.poi_ways, 2);
    assert_eq!(report.pois, 2);
    let ids: Vec<u64> = network.pois().map(|p| p.id).collect();
    assert_eq!(ids, vec![0, 1]);
    assert_eq!(network.poi(0).unwrap().source, PoiSource::Way(91));
    assert_eq!(network.poi(1).unwrap().source, PoiSource::Relation(80));
    assert_eq!(network.next_poi_id(), 2);
}

#[test]
fn test_bus_stop_way_kind() {
    let config = NetworkConfig::default();
    let extract = Extract::new(&config)
        .node(1, 116.350, 39.950)
        .node(2, 116.3502, 39.950)
        .node(3, 116.3502, 39.9501)
        .way(95, &[1, 2, 3, 1], &[("highway", "platform")]);
    let (network, report) = build(extract, &config);

    assert_eq!(report.link_ways, 0);
    assert_eq!(network.poi(0).unwrap().kind.as_deref(), Some("platform"));
}

#[test]
fn test_boundary_clipping_synthesizes_node() {
    let config = NetworkConfig::default();
    let extract = Extract::new(&config)
        .node(1, 116.35, 39.95)
        .node(5, 116.45, 39.95)
        .way(60, &[1, 5], &[("highway", "primary")]);
    let (network, _) = build(extract, &config);

    assert_eq!(network.node_count(), 2);
    assert_eq!(network.link_count(), 2);

    let boundary: Vec<_> = network.nodes().filter(|n| n.is_boundary).collect();
    assert_eq!(boundary.len(), 1);
    assert_eq!(boundary[0].osm_id, None);
    assert!((boundary[0].lon - 116.40).abs() < 1e-7);
    assert!((boundary[0].lat - 39.95).abs() < 1e-7);
}

#[test]
fn test_clipping_head_and_tail_runs() {
    // In, out, out, in: both ends inside produce two runs
    let config = NetworkConfig::default();
    let extract = Extract::new(&config)
        .node(1, 116.38, 39.95)
        .node(2, 116.42, 39.95)
        .node(3, 116.42, 39.96)
        .node(4, 116.38, 39.96)
        .way(60, &[1, 2, 3, 4], &[("highway", "primary"), ("oneway", "yes")]);
    let (network, _) = build(extract, &config);

    assert_eq!(network.link_count(), 2);
    let head = network.link(0).unwrap();
    let tail = network.link(1).unwrap();
    assert_eq!(node_osm_id(&network, head.from_node), Some(1));
    assert!(network.node(head.to_node).unwrap().is_boundary);
    assert!(network.node(tail.from_node).unwrap().is_boundary);
    assert_eq!(node_osm_id(&network, tail.to_node), Some(4));

    // Out, in, out: neither end inside, nothing survives
    let extract = Extract::new(&config)
        .node(1, 116.28, 39.95)
        .node(2, 116.35, 39.95)
        .node(3, 116.42, 39.95)
        .way(61, &[1, 2, 3], &[("highway", "primary")]);
    let (network, _) = build(extract, &config);
    assert_eq!(network.link_count(), 0);
}

#[test]
fn test_pure_cycle_excluded_until_connected() {
    let config = NetworkConfig::default();
    let ring = |extract: Extract| {
        extract
            .node(1, 116.350, 39.950)
            .node(2, 116.352, 39.950)
            .node(3, 116.352, 39.952)
            .way(40, &[1, 2, 3, 1], &[("highway", "residential")])
    };

    let (network, report) = build(ring(Extract::new(&config)), &config);
    assert_eq!(report.links.pure_cycles, 1);
    assert_eq!(network.link_count(), 0);

    let connected = ring(Extract::new(&config))
        .node(7, 116.360, 39.950)
        .way(41, &[2, 7], &[("highway", "residential")]);
    let (network, report) = build(connected, &config);
    assert_eq!(report.links.pure_cycles, 0);
    // Loop split at node 2 into two segments, plus the spur, all two-way
    assert_eq!(network.link_count(), 6);
    assert_eq!(network.node_count(), 3);
}

#[test]
fn test_signal_node_splits_way() {
    let config = NetworkConfig::default();
    let extract = Extract::new(&config)
        .node(1, 116.350, 39.950)
        .tagged_node(2, 116.355, 39.950, &[("highway", "traffic_signals")])
        .node(3, 116.360, 39.950)
        .way(10, &[1, 2, 3], &[("highway", "secondary"), ("oneway", "yes")]);
    let (network, _) = build(extract, &config);

    assert_eq!(network.link_count(), 2);
    let signal = network
        .nodes()
        .find(|n| n.osm_id == Some(2))
        .unwrap();
    assert_eq!(signal.ctrl_type, Some(ControlType::Signal));
    assert_eq!(signal.incoming.len(), 1);
    assert_eq!(signal.outgoing.len(), 1);
}

#[test]
fn test_lane_and_speed_resolution() {
    let config = NetworkConfig::default();
    let (network, _) = build(
        two_node_extract(
            &config,
            &[
                ("highway", "primary"),
                ("lanes", "3"),
                ("lanes:forward", "1"),
                ("maxspeed", "50"),
            ],
        ),
        &config,
    );
    assert_eq!(network.link(0).unwrap().lanes, Some(1));
    assert_eq!(network.link(1).unwrap().lanes, Some(2));
    assert_eq!(network.link(0).unwrap().free_speed, Some(50));

    let (network, _) = build(
        two_node_extract(&config, &[("highway", "primary"), ("lanes", "2"), ("oneway", "yes")]),
        &config,
    );
    assert_eq!(network.link(0).unwrap().lanes, Some(2));
}

#[test]
fn test_reversed_oneway() {
    let config = NetworkConfig::default();
    let (network, _) = build(
        two_node_extract(&config, &[("highway", "primary"), ("oneway", "-1")]),
        &config,
    );

    assert_eq!(network.link_count(), 1);
    let link = network.link(0).unwrap();
    assert_eq!(node_osm_id(&network, link.from_node), Some(2));
    assert_eq!(node_osm_id(&network, link.to_node), Some(1));
}

#[test]
fn test_ids_and_endpoints() {
    let config = NetworkConfig::default().with_target_modes(Mode::all().to_vec());
    let extract = Extract::new(&config)
        .node(1, 116.31, 39.91)
        .node(2, 116.32, 39.91)
        .node(3, 116.33, 39.92)
        .node(4, 116.34, 39.93)
        .node(5, 116.45, 39.93)
        .way(10, &[1, 2, 3], &[("highway", "primary")])
        .way(11, &[3, 4, 5], &[("highway", "tertiary"), ("oneway", "yes")])
        .way(12, &[2, 4], &[("highway", "residential")]);
    let (network, _) = build(extract, &config);

    let node_ids: Vec<u64> = network.nodes().map(|n| n.id).collect();
    assert_eq!(node_ids, (0..network.node_count() as u64).collect::<Vec<_>>());
    let link_ids: Vec<u64> = network.links().map(|l| l.id).collect();
    assert_eq!(link_ids, (0..network.link_count() as u64).collect::<Vec<_>>());

    for link in network.links() {
        let from = network.node(link.from_node).unwrap();
        let to = network.node(link.to_node).unwrap();
        assert!(from.outgoing.contains(&link.id));
        assert!(to.incoming.contains(&link.id));
    }
}

#[test]
fn test_poi_linked_to_nearest_node() {
    let config = NetworkConfig::default();
    let extract = two_node_extract(&config, &[("highway", "primary")])
        .node(20, 116.3101, 39.9101)
        .node(21, 116.3103, 39.9101)
        .node(22, 116.3103, 39.9103)
        .way(30, &[20, 21, 22, 20], &[("amenity", "kiosk")]);
    let (network, report) = build(extract, &config);

    assert_eq!(report.pois_linked, 1);
    let poi = network.poi(0).unwrap();
    let node = network.node(poi.node_id.unwrap()).unwrap();
    assert_eq!(node.osm_id, Some(1));
    assert_eq!(node.poi_id, Some(poi.id));
}

#[test]
fn test_csv_and_graph_export() {
    let config = NetworkConfig::default();
    let extract = two_node_extract(&config, &[("highway", "primary"), ("name", "Main St")]);
    let (network, _) = build(extract, &config);

    let dir = tempfile::tempdir().unwrap();
    let tables = export::write_csv(&network, dir.path()).unwrap();
    assert!(tables.poi_file.is_none());

    let mut reader = csv::Reader::from_path(&tables.link_file).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert!(headers.iter().any(|h| h == "allowed_uses"));
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    let geometry_col = headers.iter().position(|h| h == "geometry").unwrap();
    assert!(rows[0][geometry_col].starts_with("LINESTRING"));
    let uses_col = headers.iter().position(|h| h == "allowed_uses").unwrap();
    assert_eq!(&rows[0][uses_col], "auto");

    let graph = export::write_graph_document(&network, dir.path()).unwrap();
    let edges: serde_json::Value =
        serde_json::from_reader(std::fs::File::open(&graph.edge_file).unwrap()).unwrap();
    let edges = edges.as_array().unwrap();
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0]["edgelabel"], "pos_pos");
    assert_eq!(edges[0]["properties"]["edge_name"], "Main St");
    assert_eq!(edges[0]["properties"]["is_biway"], true);
}

#[test]
fn test_mixed_hemisphere_aborts() {
    let config = NetworkConfig::default();
    let mut ingestor = Ingestor::new(&config);
    ingestor.add_node(1, 30.0, -0.5, NO_TAGS);
    ingestor.add_node(2, 30.0, 0.5, NO_TAGS);
    let err = ingestor.finish(None).unwrap_err();
    assert!(matches!(err, butterfly_net::Error::MixedHemisphere { .. }));
}

#[test]
fn test_region_defaults_to_node_extent() {
    let config = NetworkConfig::default();
    let mut ingestor = Ingestor::new(&config);
    ingestor.add_node(1, 116.30, 39.90, NO_TAGS);
    ingestor.add_node(2, 116.35, 39.90, NO_TAGS);
    ingestor.add_node(3, 116.35, 39.95, NO_TAGS);
    // Runs along the southern and eastern edges of the extent
    ingestor.add_way(10, vec![1, 2, 3], [("highway", "primary")]);
    let data = ingestor.finish(None).unwrap();

    assert_eq!(data.region.bbox(), (116.30, 39.90, 116.35, 39.95));
    assert!(data.nodes.iter().all(|n| n.in_region));

    let (network, report) = build_network(data, &config).unwrap();
    assert_eq!(report.links.segments_clipped_away, 0);
    assert_eq!(network.link_count(), 2);
    assert!(network.nodes().all(|n| !n.is_boundary && n.osm_id.is_some()));
}

#[test]
fn test_read_pbf_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.osm.pbf");
    let config = NetworkConfig::default();

    for bbox in [None, Some(region())] {
        let err = read_pbf(&path, bbox, &config).unwrap_err();
        assert!(
            matches!(err, butterfly_net::Error::Pbf(_) | butterfly_net::Error::IoError(_)),
            "unexpected error {err:?}"
        );
    }
    assert!(butterfly_net::ingest::read_header_region(&path).is_err());
}
