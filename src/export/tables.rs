//! CSV tables: `node.csv`, `link.csv` and `poi.csv`

use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::{link_records, node_records, poi_records};
use crate::core::error::Result;
use crate::network::Network;

/// Files written by [`write_csv`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOutput {
    pub node_file: PathBuf,
    pub link_file: PathBuf,
    /// Only written when the network has POIs
    pub poi_file: Option<PathBuf>,
}

fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}

pub fn write_csv<P: AsRef<Path>>(network: &Network, dir: P) -> Result<CsvOutput> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let node_file = dir.join("node.csv");
    write_records(&node_file, &node_records(network))?;

    let link_file = dir.join("link.csv");
    write_records(&link_file, &link_records(network))?;

    let poi_file = if network.poi_count() > 0 {
        let path = dir.join("poi.csv");
        write_records(&path, &poi_records(network))?;
        Some(path)
    } else {
        None
    };

    Ok(CsvOutput {
        node_file,
        link_file,
        poi_file,
    })
}
