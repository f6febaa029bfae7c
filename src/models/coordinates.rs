use serde::{Deserialize, Serialize};

/// WGS84 position. Providers exchange positions as `[lng, lat]` arrays.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!(
                "Invalid latitude: {} (must be between -90 and 90)",
                lat
            ));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(format!(
                "Invalid longitude: {} (must be between -180 and 180)",
                lng
            ));
        }
        Ok(Coordinates { lat, lng })
    }

    /// Build from possibly out-of-range synthesized values, pinning them to the valid box.
    pub fn clamped(lat: f64, lng: f64) -> Self {
        Coordinates {
            lat: lat.clamp(-90.0, 90.0),
            lng: lng.clamp(-180.0, 180.0),
        }
    }

    /// Parse a GeoJSON position (`[lng, lat, ...]`); extra elements such as elevation are ignored.
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] => Coordinates::new(*lat, *lng).ok(),
            _ => None,
        }
    }

    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    /// Calculate distance between two coordinates using Haversine formula
    /// Returns distance in kilometers
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;

        let lat1_rad = self.lat.to_radians();
        let lat2_rad = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(48.1173, -1.6743).is_ok());
        assert!(Coordinates::new(91.0, 0.0).is_err()); // Invalid lat
        assert!(Coordinates::new(0.0, 181.0).is_err()); // Invalid lng
    }

    #[test]
    fn test_clamped_stays_in_range() {
        let c = Coordinates::clamped(95.0, -200.0);
        assert_eq!(c.lat, 90.0);
        assert_eq!(c.lng, -180.0);
    }

    #[test]
    fn test_from_position_ignores_elevation() {
        let c = Coordinates::from_position(&[-4.486, 48.3904, 42.0]).unwrap();
        assert_eq!(c.lat, 48.3904);
        assert_eq!(c.lng, -4.486);
        assert_eq!(c.to_lng_lat(), [-4.486, 48.3904]);

        assert!(Coordinates::from_position(&[1.0]).is_none());
        assert!(Coordinates::from_position(&[200.0, 10.0]).is_none());
    }

    #[test]
    fn test_distance_calculation() {
        let rennes = Coordinates::new(48.1173, -1.6743).unwrap();
        let brest = Coordinates::new(48.3904, -4.4860).unwrap();

        // Rennes to Brest is roughly 210 km as the crow flies
        let distance = rennes.distance_to(&brest);
        assert!((distance - 210.0).abs() < 10.0, "got {}km", distance);
    }
}
