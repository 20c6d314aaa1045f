// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Mean radius of Earth, in meters.
const EARTH_RADIUS: f64 = 6_371_000.0;

/// Mean diameter of Earth, in meters.
const EARTH_DIAMETER: f64 = EARTH_RADIUS + EARTH_RADIUS;

/// Calculates the great-circle distance between two lat-lon positions
/// on Earth using the `haversine formula <https://en.wikipedia.org/wiki/Haversine_formula>`_.
/// Returns the result in meters.
pub fn earth_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = lat1.to_radians();
    let lon1 = lon1.to_radians();
    let lat2 = lat2.to_radians();
    let lon2 = lon2.to_radians();

    let sin_dlat_half = ((lat2 - lat1) * 0.5).sin();
    let sin_dlon_half = ((lon2 - lon1) * 0.5).sin();

    let h = sin_dlat_half * sin_dlat_half + lat1.cos() * lat2.cos() * sin_dlon_half * sin_dlon_half;

    // Rounding can push h slightly outside of [0, 1] for coincident and antipodal points
    EARTH_DIAMETER * h.clamp(0.0, 1.0).sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr, $eps:expr) => {
            assert!(
                (($a - $b).abs() < $eps),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    #[test]
    fn zero_for_identical_points() {
        assert_eq!(earth_distance(2.928633, 101.64111, 2.928633, 101.64111), 0.0);
        assert_eq!(earth_distance(0.0, 0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn symmetric() {
        let pairs = [
            (2.928633, 101.64111, 2.9279, 101.6424),
            (52.2297, 21.0122, 50.0647, 19.9450),
            (-33.8688, 151.2093, 51.5074, -0.1278),
        ];
        for (lat1, lon1, lat2, lon2) in pairs {
            assert_eq!(
                earth_distance(lat1, lon1, lat2, lon2),
                earth_distance(lat2, lon2, lat1, lon1)
            );
        }
    }

    #[test]
    fn one_thousandth_of_a_degree_at_equator() {
        assert_almost_eq!(earth_distance(0.0, 0.0, 0.0, 0.001), 111.195, 0.01);
        assert_almost_eq!(earth_distance(0.0, 0.0, 0.001, 0.0), 111.195, 0.01);
    }

    #[test]
    fn antipodal_points() {
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS;
        let d = earth_distance(0.0, 0.0, 0.0, 180.0);
        assert!(d.is_finite());
        assert_almost_eq!(d, half_circumference, 1.0);

        let d = earth_distance(90.0, 0.0, -90.0, 0.0);
        assert!(d.is_finite());
        assert_almost_eq!(d, half_circumference, 1.0);
    }
}
