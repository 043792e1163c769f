//! Clipping way segments against the declared region

use log::debug;

use crate::osm::{NodeIdx, RawNode};
use crate::spatial::{round_to, GeoProjector, Region};

pub struct BoundaryClipper<'a> {
    region: &'a Region,
    projector: &'a GeoProjector,
}

impl<'a> BoundaryClipper<'a> {
    pub fn new(region: &'a Region, projector: &'a GeoProjector) -> Self {
        Self { region, projector }
    }

    /// Cut `segment` where it leaves the region
    ///
    /// Yields the in-region run at the head (up to the first node outside)
    /// and the in-region run at the tail (back to the last node outside),
    /// each closed off by a synthesized boundary node appended to `nodes`.
    /// A segment entirely inside comes back whole; runs shorter than two
    /// nodes are dropped.
    pub fn clip(&self, segment: &[NodeIdx], nodes: &mut Vec<RawNode>) -> Vec<Vec<NodeIdx>> {
        let mut parts: Vec<Vec<NodeIdx>> = Vec::new();
        let Some((&first, &last)) = segment.first().zip(segment.last()) else {
            return parts;
        };

        if nodes[first].in_region {
            match segment.iter().position(|&n| !nodes[n].in_region) {
                None => {
                    parts.push(segment.to_vec());
                    return finish(parts);
                }
                Some(first_outside) => {
                    let inside = segment[first_outside - 1];
                    let outside = segment[first_outside];
                    if let Some(boundary) = self.boundary_node(inside, outside, nodes) {
                        let mut head = segment[..first_outside].to_vec();
                        head.push(boundary);
                        parts.push(head);
                    }
                }
            }
        }

        if nodes[last].in_region && segment.len() >= 2 {
            let last_outside = segment[..segment.len() - 1]
                .iter()
                .rposition(|&n| !nodes[n].in_region);
            if let Some(last_outside) = last_outside {
                let inside = segment[last_outside + 1];
                let outside = segment[last_outside];
                if let Some(boundary) = self.boundary_node(inside, outside, nodes) {
                    let mut tail = vec![boundary];
                    tail.extend_from_slice(&segment[last_outside + 1..]);
                    parts.push(tail);
                }
            }
        }

        finish(parts)
    }

    fn boundary_node(
        &self,
        inside: NodeIdx,
        outside: NodeIdx,
        nodes: &mut Vec<RawNode>,
    ) -> Option<NodeIdx> {
        let (a, b) = (&nodes[inside], &nodes[outside]);
        let Some((lon, lat)) = self
            .region
            .boundary_crossing((a.lon, a.lat), (b.lon, b.lat))
        else {
            debug!("No boundary crossing between nodes {inside} and {outside}");
            return None;
        };

        let lon = round_to(lon, self.projector.lonlat_precision);
        let lat = round_to(lat, self.projector.lonlat_precision);
        let (x, y) = self.projector.to_planar(lon, lat);
        nodes.push(RawNode {
            lon,
            lat,
            x,
            y,
            in_region: true,
            is_crossing: true,
            is_boundary: true,
            ..Default::default()
        });
        Some(nodes.len() - 1)
    }
}

fn finish(mut parts: Vec<Vec<NodeIdx>>) -> Vec<Vec<NodeIdx>> {
    parts.retain(|part| part.len() >= 2);
    parts
}
