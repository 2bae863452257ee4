use crate::db_mongo::models::Coordinates;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Summary of a set of points
#[derive(Debug, Clone, PartialEq)]
pub struct GeoStatistics {
    pub count: usize,
    pub centroid: Coordinates,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

/// Latitude in [-90, 90] and longitude in [-180, 180], both inclusive.
/// NaN is never valid.
pub fn validate_coordinates(latitude: f64, longitude: f64) -> bool {
    (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude)
}

/// Great-circle distance in kilometers (haversine formula)
pub fn haversine_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Arithmetic mean of the points; `None` for an empty set
pub fn centroid(points: &[Coordinates]) -> Option<Coordinates> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as f64;
    let (lat_sum, lon_sum) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.latitude, lon + p.longitude));

    Some(Coordinates {
        latitude: lat_sum / n,
        longitude: lon_sum / n,
    })
}

pub fn statistics(points: &[Coordinates]) -> Option<GeoStatistics> {
    let centroid = centroid(points)?;

    let mut stats = GeoStatistics {
        count: points.len(),
        centroid,
        lat_min: f64::INFINITY,
        lat_max: f64::NEG_INFINITY,
        lon_min: f64::INFINITY,
        lon_max: f64::NEG_INFINITY,
    };

    for p in points {
        stats.lat_min = stats.lat_min.min(p.latitude);
        stats.lat_max = stats.lat_max.max(p.latitude);
        stats.lon_min = stats.lon_min.min(p.longitude);
        stats.lon_max = stats.lon_max.max(p.longitude);
    }

    Some(stats)
}
