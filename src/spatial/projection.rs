//! Transverse Mercator projection centred on the dataset
//!
//! The central meridian is the mean longitude of the extract instead of a
//! fixed UTM zone, so a bounded extract never straddles a zone edge. The
//! series expansion is the usual UTM one (WGS84 ellipsoid, scale 0.9996,
//! 500 km false easting, 10 000 km false northing south of the equator).

use serde::{Deserialize, Serialize};

use super::round_to;
use crate::core::error::{Error, Result};

const K0: f64 = 0.9996;
const E: f64 = 0.00669438;
const R: f64 = 6_378_137.0;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Series coefficients derived from the eccentricity
#[derive(Debug, Clone, Copy, PartialEq)]
struct Series {
    e_p2: f64,
    m1: f64,
    m2: f64,
    m3: f64,
    m4: f64,
    p2: f64,
    p3: f64,
    p4: f64,
    p5: f64,
}

impl Series {
    fn wgs84() -> Self {
        let e2 = E * E;
        let e3 = e2 * E;

        let sqrt_e = (1.0 - E).sqrt();
        let n = (1.0 - sqrt_e) / (1.0 + sqrt_e);
        let n2 = n * n;
        let n3 = n2 * n;
        let n4 = n3 * n;
        let n5 = n4 * n;

        Self {
            e_p2: E / (1.0 - E),
            m1: 1.0 - E / 4.0 - 3.0 * e2 / 64.0 - 5.0 * e3 / 256.0,
            m2: 3.0 * E / 8.0 + 3.0 * e2 / 32.0 + 45.0 * e3 / 1024.0,
            m3: 15.0 * e2 / 256.0 + 45.0 * e3 / 1024.0,
            m4: 35.0 * e3 / 3072.0,
            p2: 3.0 / 2.0 * n - 27.0 / 32.0 * n3 + 269.0 / 512.0 * n5,
            p3: 21.0 / 16.0 * n2 - 55.0 / 32.0 * n4,
            p4: 151.0 / 96.0 * n3 - 417.0 / 128.0 * n5,
            p5: 1097.0 / 512.0 * n4,
        }
    }
}

/// Geographic <-> planar transform for one dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoProjector {
    pub central_lon: f64,
    pub central_lat: f64,
    pub northern: bool,
    /// Decimal places kept by [`GeoProjector::to_planar`]
    pub xy_precision: u32,
    /// Decimal places kept by [`GeoProjector::to_geographic`]
    pub lonlat_precision: u32,
    #[serde(skip, default = "Series::wgs84")]
    series: Series,
}

impl GeoProjector {
    pub fn new(central_lon: f64, central_lat: f64, northern: bool) -> Self {
        Self {
            central_lon,
            central_lat,
            northern,
            xy_precision: 2,
            lonlat_precision: 7,
            series: Series::wgs84(),
        }
    }

    /// Anchor a projector on the mean of `(lon, lat)` pairs
    ///
    /// Fails when the latitudes straddle the equator: one false northing
    /// cannot serve both hemispheres.
    pub fn from_coordinates<I>(coords: I) -> Result<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut count = 0usize;
        let (mut sum_lon, mut sum_lat) = (0.0, 0.0);
        let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);

        for (lon, lat) in coords {
            count += 1;
            sum_lon += lon;
            sum_lat += lat;
            min_lat = min_lat.min(lat);
            max_lat = max_lat.max(lat);
        }

        if count == 0 {
            return Err(Error::EmptyExtract);
        }
        if min_lat < 0.0 && max_lat >= 0.0 {
            return Err(Error::MixedHemisphere { min_lat, max_lat });
        }

        let central_lon = sum_lon / count as f64;
        let central_lat = sum_lat / count as f64;
        Ok(Self::new(central_lon, central_lat, central_lat >= 0.0))
    }

    pub fn with_precision(mut self, lonlat_precision: u32, xy_precision: u32) -> Self {
        self.lonlat_precision = lonlat_precision;
        self.xy_precision = xy_precision;
        self
    }

    /// Projected `(x, y)` in metres, rounded to the planar precision
    pub fn to_planar(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = self.forward(lon, lat);
        (round_to(x, self.xy_precision), round_to(y, self.xy_precision))
    }

    /// Geographic `(lon, lat)` in degrees, rounded to the geographic precision
    pub fn to_geographic(&self, x: f64, y: f64) -> (f64, f64) {
        let (lon, lat) = self.inverse(x, y);
        (
            round_to(lon, self.lonlat_precision),
            round_to(lat, self.lonlat_precision),
        )
    }

    /// Unrounded forward transform
    pub fn forward(&self, lon: f64, lat: f64) -> (f64, f64) {
        let s = &self.series;

        let lat_rad = lat.to_radians();
        let lat_sin = lat_rad.sin();
        let lat_cos = lat_rad.cos();

        let lat_tan = lat_sin / lat_cos;
        let lat_tan2 = lat_tan * lat_tan;
        let lat_tan4 = lat_tan2 * lat_tan2;

        let n = R / (1.0 - E * lat_sin * lat_sin).sqrt();
        let c = s.e_p2 * lat_cos * lat_cos;

        let a = lat_cos * (lon - self.central_lon).to_radians();
        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let m = R
            * (s.m1 * lat_rad - s.m2 * (2.0 * lat_rad).sin() + s.m3 * (4.0 * lat_rad).sin()
                - s.m4 * (6.0 * lat_rad).sin());

        let easting = K0
            * n
            * (a + a3 / 6.0 * (1.0 - lat_tan2 + c)
                + a5 / 120.0 * (5.0 - 18.0 * lat_tan2 + lat_tan4 + 72.0 * c - 58.0 * s.e_p2))
            + FALSE_EASTING;

        let mut northing = K0
            * (m + n
                * lat_tan
                * (a2 / 2.0
                    + a4 / 24.0 * (5.0 - lat_tan2 + 9.0 * c + 4.0 * c * c)
                    + a6 / 720.0 * (61.0 - 58.0 * lat_tan2 + lat_tan4 + 600.0 * c - 330.0 * s.e_p2)));

        if !self.northern {
            northing += FALSE_NORTHING_SOUTH;
        }

        (easting, northing)
    }

    /// Unrounded inverse transform
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let s = &self.series;

        let x = x - FALSE_EASTING;
        let y = if self.northern {
            y
        } else {
            y - FALSE_NORTHING_SOUTH
        };

        let m = y / K0;
        let mu = m / (R * s.m1);

        let p_rad = mu
            + s.p2 * (2.0 * mu).sin()
            + s.p3 * (4.0 * mu).sin()
            + s.p4 * (6.0 * mu).sin()
            + s.p5 * (8.0 * mu).sin();

        let p_sin = p_rad.sin();
        let p_sin2 = p_sin * p_sin;
        let p_cos = p_rad.cos();

        let p_tan = p_sin / p_cos;
        let p_tan2 = p_tan * p_tan;
        let p_tan4 = p_tan2 * p_tan2;

        let ep_sin = 1.0 - E * p_sin2;
        let ep_sin_sqrt = ep_sin.sqrt();

        let n = R / ep_sin_sqrt;
        let r = (1.0 - E) / ep_sin;

        let c = s.e_p2 * p_cos * p_cos;
        let c2 = c * c;

        let d = x / (n * K0);
        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let latitude = p_rad
            - (p_tan / r)
                * (d2 / 2.0 - d4 / 24.0 * (5.0 + 3.0 * p_tan2 + 10.0 * c - 4.0 * c2 - 9.0 * s.e_p2)
                    + d6 / 720.0
                        * (61.0 + 90.0 * p_tan2 + 298.0 * c + 45.0 * p_tan4
                            - 252.0 * s.e_p2
                            - 3.0 * c2));

        let longitude = (d - d3 / 6.0 * (1.0 + 2.0 * p_tan2 + c)
            + d5 / 120.0 * (5.0 - 2.0 * c + 28.0 * p_tan2 - 3.0 * c2 + 8.0 * s.e_p2 + 24.0 * p_tan4))
            / p_cos;

        (
            longitude.to_degrees() + self.central_lon,
            latitude.to_degrees(),
        )
    }
}
