use geo::{HaversineDestination, HaversineDistance, Point};
use rstar::{RTree, RTreeObject, AABB};

use crate::layers::feature::Business;

/// Fixed buffer radius. Matches the 50 m proximity query of the original
/// tool; not user configurable.
pub const BUFFER_RADIUS_M: f64 = 50.0;

/// Segments used to render the buffer disk outline.
const RING_STEPS: usize = 64;

/// Rough meters per degree of latitude, used only to size the index
/// envelope; membership is decided by exact haversine distance.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// One business point in the spatial index, carrying its position in the
/// rendered layer's feature slice.
pub struct IndexedBusiness {
    pub index: usize,
    pub location: Point<f64>,
}

impl RTreeObject for IndexedBusiness {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.location.x(), self.location.y()])
    }
}

/// Build the spatial index for the currently rendered business layer.
/// Rebuilt on every layer reload; never updated in place.
pub fn build_index(businesses: &[Business]) -> RTree<IndexedBusiness> {
    let entries = businesses
        .iter()
        .enumerate()
        .map(|(index, b)| IndexedBusiness {
            index,
            location: b.location,
        })
        .collect();
    RTree::bulk_load(entries)
}

/// An active buffer query: the disk around one business and the neighbors
/// that fall inside it. Ephemeral; recomputed on every query.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferQuery {
    pub center_index: usize,
    pub radius_m: f64,
    /// Closed ring approximating the disk, for rendering.
    pub ring: Vec<Point<f64>>,
    /// Indices of businesses inside the disk, center excluded, ascending.
    pub neighbors: Vec<usize>,
}

/// Run the proximity query around one business. A neighbor qualifies iff its
/// haversine distance to the center is at most the radius; the center itself
/// never qualifies. Zero qualifying neighbors still yields a query with an
/// empty neighbor list.
pub fn run(
    businesses: &[Business],
    index: &RTree<IndexedBusiness>,
    center_index: usize,
) -> BufferQuery {
    let center = businesses[center_index].location;

    // Envelope prefilter in degree space, padded so no candidate within the
    // radius can be missed, then exact distance test.
    let dlat = BUFFER_RADIUS_M / METERS_PER_DEGREE * 1.5;
    let dlng = dlat / center.y().to_radians().cos().abs().max(0.01);
    let envelope = AABB::from_corners(
        [center.x() - dlng, center.y() - dlat],
        [center.x() + dlng, center.y() + dlat],
    );

    let mut neighbors: Vec<usize> = index
        .locate_in_envelope_intersecting(&envelope)
        .filter(|candidate| {
            candidate.index != center_index
                && center.haversine_distance(&candidate.location) <= BUFFER_RADIUS_M
        })
        .map(|candidate| candidate.index)
        .collect();
    neighbors.sort_unstable();

    let ring = (0..=RING_STEPS)
        .map(|step| {
            let bearing = step as f64 * 360.0 / RING_STEPS as f64;
            center.haversine_destination(bearing, BUFFER_RADIUS_M)
        })
        .collect();

    BufferQuery {
        center_index,
        radius_m: BUFFER_RADIUS_M,
        ring,
        neighbors,
    }
}

/// Modifier-click transition: clicking the active center clears the buffer,
/// clicking anything else makes it the new center (discarding the old state
/// first).
pub fn toggle(
    active: Option<BufferQuery>,
    clicked_index: usize,
    businesses: &[Business],
    index: &RTree<IndexedBusiness>,
) -> Option<BufferQuery> {
    match active {
        Some(query) if query.center_index == clicked_index => None,
        _ => Some(run(businesses, index, clicked_index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn business_at(id: i64, lat: f64, lng: f64) -> Business {
        Business {
            id,
            name: format!("b{id}"),
            kind: Some("store".to_string()),
            location: Point::new(lng, lat),
        }
    }

    /// Offset a latitude by roughly `meters` northwards.
    fn north_of(lat: f64, meters: f64) -> f64 {
        lat + meters / METERS_PER_DEGREE
    }

    fn fixtures() -> Vec<Business> {
        let base = 43.7803;
        vec![
            business_at(1, base, -79.417),                 // center
            business_at(2, north_of(base, 30.0), -79.417), // inside
            business_at(3, north_of(base, 49.0), -79.417), // inside, near edge
            business_at(4, north_of(base, 80.0), -79.417), // outside
        ]
    }

    #[test]
    fn membership_is_distance_at_most_radius() {
        let businesses = fixtures();
        let index = build_index(&businesses);
        let query = run(&businesses, &index, 0);
        assert_eq!(query.neighbors, vec![1, 2]);
    }

    #[test]
    fn center_is_never_its_own_neighbor() {
        let businesses = fixtures();
        let index = build_index(&businesses);
        let query = run(&businesses, &index, 0);
        assert!(!query.neighbors.contains(&0));
    }

    #[test]
    fn isolated_center_yields_empty_neighbor_set() {
        let businesses = vec![business_at(1, 43.7803, -79.417)];
        let index = build_index(&businesses);
        let query = run(&businesses, &index, 0);
        assert!(query.neighbors.is_empty());
        assert!(!query.ring.is_empty());
    }

    #[test]
    fn ring_points_sit_on_the_radius() {
        let businesses = fixtures();
        let index = build_index(&businesses);
        let query = run(&businesses, &index, 0);
        for point in &query.ring {
            let d = businesses[0].location.haversine_distance(point);
            assert_relative_eq!(d, BUFFER_RADIUS_M, epsilon = 0.5);
        }
    }

    #[test]
    fn toggling_same_center_clears() {
        let businesses = fixtures();
        let index = build_index(&businesses);
        let active = toggle(None, 0, &businesses, &index);
        assert!(active.is_some());
        let cleared = toggle(active, 0, &businesses, &index);
        assert!(cleared.is_none());
    }

    #[test]
    fn toggling_other_center_replaces_previous_state() {
        let businesses = fixtures();
        let index = build_index(&businesses);
        let first = toggle(None, 0, &businesses, &index);
        let second = toggle(first, 3, &businesses, &index).unwrap();
        // The old query is gone wholesale; only the new center's neighbors
        // remain highlighted.
        assert_eq!(second.center_index, 3);
        assert_eq!(second.neighbors, vec![1, 2]);
        assert!(!second.neighbors.contains(&0));
    }
}
