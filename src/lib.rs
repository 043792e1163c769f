//! # Butterfly-net
//!
//! Turns an OpenStreetMap extract into a mode-aware road network (nodes and
//! directed links) plus a catalogue of POI polygons.
//!
//! ```no_run
//! use butterfly_net::{build_from_pbf, export, NetworkConfig, Region};
//!
//! # fn main() -> butterfly_net::Result<()> {
//! let config = NetworkConfig::default();
//! let region = Region::from_bbox(4.30, 50.80, 4.45, 50.90)?;
//! let (network, _report) = build_from_pbf("brussels.osm.pbf", Some(region), &config)?;
//! export::write_csv(&network, "output")?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod classify;
pub mod clip;
pub mod core;
pub mod export;
pub mod ingest;
pub mod network;
pub mod osm;
pub mod pipeline;
pub mod poi;
pub mod profiles;
pub mod spatial;

pub use crate::core::{Error, NetworkConfig, Result};
pub use builder::{BuildStats, NetworkBuilder};
pub use classify::{Classification, WayClassifier};
pub use clip::BoundaryClipper;
pub use ingest::{read_pbf, Ingestor};
pub use network::{Link, Network, Node, Poi, PoiSource};
pub use pipeline::{build_from_pbf, build_network, BuildReport};
pub use poi::{PoiExtraction, PoiExtractor};
pub use profiles::{Mode, ModeFilter};
pub use spatial::{GeoProjector, Region};
