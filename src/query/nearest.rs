use geo::{HaversineDistance, Point};

use crate::layers::feature::Business;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestHit {
    pub index: usize,
    pub distance_m: f64,
}

/// Linear scan for the business closest to `from`. Ties keep the first
/// business encountered in slice order. Returns `None` when no businesses
/// are rendered.
pub fn find(businesses: &[Business], from: Point<f64>) -> Option<NearestHit> {
    let mut best: Option<NearestHit> = None;
    for (index, business) in businesses.iter().enumerate() {
        let distance_m = from.haversine_distance(&business.location);
        if best.is_none_or(|b| distance_m < b.distance_m) {
            best = Some(NearestHit {
                index,
                distance_m,
            });
        }
    }
    best
}

/// Popup distance line: rounded meters plus kilometers to two decimals.
pub fn format_distance(distance_m: f64) -> String {
    format!("{}m ({:.2}km)", distance_m.round() as i64, distance_m / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business_at(id: i64, lat: f64, lng: f64) -> Business {
        Business {
            id,
            name: format!("b{id}"),
            kind: Some("store".to_string()),
            location: Point::new(lng, lat),
        }
    }

    #[test]
    fn picks_the_global_minimum() {
        let businesses = vec![
            business_at(1, 43.781, -79.417),
            business_at(2, 43.7805, -79.417),
            business_at(3, 43.790, -79.417),
        ];
        let hit = find(&businesses, Point::new(-79.417, 43.7803)).unwrap();
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn ties_resolve_to_first_in_order() {
        let twin = business_at(1, 43.781, -79.417);
        let mut other = twin.clone();
        other.id = 2;
        let businesses = vec![twin, other];
        let hit = find(&businesses, Point::new(-79.417, 43.7803)).unwrap();
        assert_eq!(hit.index, 0);
    }

    #[test]
    fn empty_layer_finds_nothing() {
        assert!(find(&[], Point::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn distance_formatting() {
        assert_eq!(format_distance(123.4), "123m (0.12km)");
        assert_eq!(format_distance(1250.0), "1250m (1.25km)");
        assert_eq!(format_distance(0.4), "0m (0.00km)");
    }
}
