//! Coordinate handling: the dataset projection and the declared region

pub mod projection;
pub mod region;

pub use projection::GeoProjector;
pub use region::Region;

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(4.123456789, 7), 4.1234568);
        assert_eq!(round_to(-12.346, 2), -12.35);
        assert_eq!(round_to(1.5, 0), 2.0);
    }
}
