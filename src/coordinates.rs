use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::model::Position;

static LAT_LON_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(-?\d+\.?\d*)\s*[,\s]\s*(-?\d+\.?\d*)\s*$").expect("valid lat/lon pattern")
});

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateError {
    #[error("Latitude and longitude must be numbers")]
    NotANumber,

    #[error("Latitude must be between -90 and 90")]
    LatitudeOutOfRange,

    #[error("Longitude must be between -180 and 180")]
    LongitudeOutOfRange,
}

/// Detects a pasted "lat, lon" (or "lat lon") pair.
///
/// Returns `None` when the text is not a pair or either value is out of
/// range, in which case the caller treats the input as a single value.
pub fn parse_lat_lon(input: &str) -> Option<Position> {
    let captures = LAT_LON_PAIR.captures(input)?;
    let lat = parse_finite(&captures[1])?;
    let lon = parse_finite(&captures[2])?;
    Position::new(lat, lon).ok()
}

/// Validates the two coordinate fields of a form.
pub fn validate_lat_lon(lat: &str, lon: &str) -> Result<Position, CoordinateError> {
    let lat = parse_finite(lat).ok_or(CoordinateError::NotANumber)?;
    let lon = parse_finite(lon).ok_or(CoordinateError::NotANumber)?;
    Position::new(lat, lon)
}

fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|it| it.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_pair() {
        let position = parse_lat_lon("21.045960, 105.840907").unwrap();
        assert_eq!(position.lat(), 21.045960);
        assert_eq!(position.lon(), 105.840907);
    }

    #[test]
    fn parses_whitespace_separated_pair() {
        let position = parse_lat_lon("  -33.8688 151.2093 ").unwrap();
        assert_eq!(position.lat(), -33.8688);
        assert_eq!(position.lon(), 151.2093);
    }

    #[test]
    fn parses_integers_and_trailing_dot() {
        let position = parse_lat_lon("10,20.").unwrap();
        assert_eq!(position.lat(), 10.0);
        assert_eq!(position.lon(), 20.0);
    }

    #[test]
    fn rejects_out_of_range_pair() {
        assert_eq!(parse_lat_lon("200, 50"), None);
        assert_eq!(parse_lat_lon("50, 181"), None);
    }

    #[test]
    fn rejects_non_pairs() {
        assert_eq!(parse_lat_lon("abc"), None);
        assert_eq!(parse_lat_lon(""), None);
        assert_eq!(parse_lat_lon("21.04"), None);
        assert_eq!(parse_lat_lon("1.2.3, 4"), None);
        assert_eq!(parse_lat_lon("Hoan Kiem, Hanoi"), None);
    }

    #[test]
    fn accepts_boundary_pair() {
        let position = parse_lat_lon("-90, 180").unwrap();
        assert_eq!(position.lat(), -90.0);
        assert_eq!(position.lon(), 180.0);
    }

    #[test]
    fn validates_fields() {
        let position = validate_lat_lon(" 48.8584 ", "2.2945").unwrap();
        assert_eq!(position.lat(), 48.8584);
        assert_eq!(position.lon(), 2.2945);
    }

    #[test]
    fn validation_reports_each_failure() {
        assert_eq!(validate_lat_lon("", "10"), Err(CoordinateError::NotANumber));
        assert_eq!(validate_lat_lon("1.2.3", "10"), Err(CoordinateError::NotANumber));
        assert_eq!(validate_lat_lon("10", "east"), Err(CoordinateError::NotANumber));
        assert_eq!(validate_lat_lon("inf", "10"), Err(CoordinateError::NotANumber));
        assert_eq!(validate_lat_lon("NaN", "10"), Err(CoordinateError::NotANumber));
        assert_eq!(validate_lat_lon("90.5", "10"), Err(CoordinateError::LatitudeOutOfRange));
        assert_eq!(validate_lat_lon("10", "-180.1"), Err(CoordinateError::LongitudeOutOfRange));
    }

    #[test]
    fn validation_accepts_inclusive_bounds() {
        assert!(validate_lat_lon("90", "-180").is_ok());
        assert!(validate_lat_lon("-90", "180").is_ok());
    }
}
