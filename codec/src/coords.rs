//! Fixed-point coordinate conversion.

/// Fixed-point units per degree: seven decimal places.
pub const COORDINATE_SCALE: f64 = 1e7;

const MAX_LAT: f64 = 90.0;
const MAX_LON: f64 = 180.0;

/// Converts decimal degrees to fixed-point units, rounding to nearest.
///
/// Returns `None` for values outside `[-max, max]` or not finite.
#[allow(clippy::cast_possible_truncation)]
fn to_fixed(degrees: f64, max: f64) -> Option<i64> {
    if !degrees.is_finite() || degrees.abs() > max {
        return None;
    }
    // |degrees * 1e7| <= 1.8e9, well inside i64.
    Some((degrees * COORDINATE_SCALE).round() as i64)
}

pub(crate) fn lat_to_fixed(lat: f64) -> Option<i64> {
    to_fixed(lat, MAX_LAT)
}

pub(crate) fn lon_to_fixed(lon: f64) -> Option<i64> {
    to_fixed(lon, MAX_LON)
}

/// Converts fixed-point units back to decimal degrees.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn from_fixed(fixed: i64) -> f64 {
    fixed as f64 / COORDINATE_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seven_decimals_roundtrip_exactly() {
        for value in [47.123_456_7_f64, -122.765_432_1, 0.0, 90.0, -180.0, 0.000_000_1] {
            let max = if value.abs() > 90.0 { MAX_LON } else { MAX_LAT };
            let fixed = to_fixed(value, max).unwrap();
            assert_eq!(from_fixed(fixed), value);
        }
    }

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(lat_to_fixed(1.000_000_04), Some(10_000_000));
        assert_eq!(lat_to_fixed(1.000_000_06), Some(10_000_001));
        assert_eq!(lat_to_fixed(-1.000_000_06), Some(-10_000_001));
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(lat_to_fixed(90.000_001), None);
        assert_eq!(lon_to_fixed(-180.5), None);
        assert_eq!(lon_to_fixed(f64::NAN), None);
        assert_eq!(lat_to_fixed(f64::INFINITY), None);
        assert_eq!(lon_to_fixed(179.999_999_9), Some(1_799_999_999));
    }
}
