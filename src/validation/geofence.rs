use crate::model::attendance::GeoPoint;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Circular permitted region. Containment is boundary-inclusive: a point at
/// exactly `radius_m` from the center passes.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub radius_m: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofenceStatus {
    Valid,
    Invalid,
}

/// Validates a coordinate pair against the configured region. A malformed
/// pair is invalid regardless of region; with no region configured, every
/// well-formed pair passes. Pure, no side effects.
pub fn check(region: Option<&Region>, point: GeoPoint) -> GeofenceStatus {
    if !well_formed(point) {
        return GeofenceStatus::Invalid;
    }
    match region {
        None => GeofenceStatus::Valid,
        Some(region) => {
            let center = GeoPoint {
                longitude: region.center_longitude,
                latitude: region.center_latitude,
            };
            if haversine_m(center, point) <= region.radius_m {
                GeofenceStatus::Valid
            } else {
                GeofenceStatus::Invalid
            }
        }
    }
}

fn well_formed(point: GeoPoint) -> bool {
    point.latitude.is_finite()
        && point.longitude.is_finite()
        && point.latitude.abs() <= 90.0
        && point.longitude.abs() <= 180.0
}

/// Great-circle distance in meters.
fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint {
            longitude,
            latitude,
        }
    }

    fn office_region(radius_m: f64) -> Region {
        Region {
            center_latitude: 23.8103,
            center_longitude: 90.4125,
            radius_m,
        }
    }

    #[test]
    fn no_region_accepts_any_well_formed_pair() {
        assert_eq!(check(None, point(0.0, 0.0)), GeofenceStatus::Valid);
        assert_eq!(check(None, point(-89.9, 179.9)), GeofenceStatus::Valid);
    }

    #[test]
    fn malformed_pair_is_invalid_even_without_region() {
        assert_eq!(check(None, point(f64::NAN, 10.0)), GeofenceStatus::Invalid);
        assert_eq!(check(None, point(91.0, 10.0)), GeofenceStatus::Invalid);
        assert_eq!(check(None, point(10.0, 181.0)), GeofenceStatus::Invalid);
        assert_eq!(
            check(None, point(10.0, f64::INFINITY)),
            GeofenceStatus::Invalid
        );
    }

    #[test]
    fn point_inside_region_passes() {
        let region = office_region(500.0);
        assert_eq!(
            check(Some(&region), point(23.8103, 90.4125)),
            GeofenceStatus::Valid
        );
    }

    #[test]
    fn point_outside_region_is_rejected() {
        let region = office_region(100.0);
        // Roughly 11 km north of the center.
        assert_eq!(
            check(Some(&region), point(23.9103, 90.4125)),
            GeofenceStatus::Invalid
        );
    }

    #[test]
    fn boundary_point_is_inclusive() {
        let center = point(23.8103, 90.4125);
        let edge = point(23.8103, 90.4175);
        let distance = haversine_m(center, edge);

        let exact = office_region(distance);
        assert_eq!(check(Some(&exact), edge), GeofenceStatus::Valid);

        let short = office_region(distance - 0.5);
        assert_eq!(check(Some(&short), edge), GeofenceStatus::Invalid);
    }
}
