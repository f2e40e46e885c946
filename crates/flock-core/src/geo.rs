//! Coordinate arithmetic for drone movement.
//!
//! Small-angle spherical approximations are fine here: per-cycle
//! displacements are a few hundred meters inside a ~20 km operating
//! square.

use crate::models::{Direction, DroneState, Position};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Change in latitude (degrees) for a distance moved north.
fn lat_change_deg(distance_km: f64) -> f64 {
    (distance_km / EARTH_RADIUS_KM).to_degrees()
}

/// Change in longitude (degrees) for a distance moved west at a given
/// latitude. The circle of latitude shrinks with cos(lat).
fn lon_change_deg(lat_deg: f64, distance_km: f64) -> f64 {
    let r = EARTH_RADIUS_KM * lat_deg.to_radians().cos();
    (distance_km / r).to_degrees()
}

/// Offset a point by `distance_km` toward `direction`.
///
/// South and east are normalized to north/west with negated distance
/// before applying the approximation.
pub fn offset(point: Position, distance_km: f64, direction: Direction) -> Position {
    let (distance_km, direction) = match direction {
        Direction::South => (-distance_km, Direction::North),
        Direction::East => (-distance_km, Direction::West),
        other => (distance_km, other),
    };

    match direction {
        Direction::North => Position::new(point.lat + lat_change_deg(distance_km), point.lon),
        Direction::West => Position::new(
            point.lat,
            point.lon - lon_change_deg(point.lat, distance_km),
        ),
        // Normalized away above.
        Direction::South | Direction::East => unreachable!(),
    }
}

/// Four-corner square path around `center`: W+S, W+N, E+N, E+S.
pub fn square_path(center: Position, half_width_km: f64) -> [Position; 4] {
    let west = offset(center, half_width_km, Direction::West);
    let east = offset(center, half_width_km, Direction::East);
    [
        offset(west, half_width_km, Direction::South),
        offset(west, half_width_km, Direction::North),
        offset(east, half_width_km, Direction::North),
        offset(east, half_width_km, Direction::South),
    ]
}

/// Axis-aligned `[lat_min, lat_max] x [lon_min, lon_max]` rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Bounds {
    /// Reduce the square path around `center` to a simple rectangle.
    pub fn around(center: Position, half_width_km: f64) -> Self {
        let path = square_path(center, half_width_km);
        let lats = path.map(|p| p.lat);
        let lons = path.map(|p| p.lon);
        Self {
            lat_min: lats.iter().cloned().fold(f64::INFINITY, f64::min),
            lat_max: lats.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            lon_min: lons.iter().cloned().fold(f64::INFINITY, f64::min),
            lon_max: lons.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Inclusive containment on both axes.
    pub fn contains(&self, point: Position) -> bool {
        point.lat >= self.lat_min
            && point.lat <= self.lat_max
            && point.lon >= self.lon_min
            && point.lon <= self.lon_max
    }
}

/// Great-circle distance between two points in kilometers (haversine).
pub fn distance_km(a: Position, b: Position) -> f64 {
    let phi1 = a.lat.to_radians();
    let phi2 = b.lat.to_radians();
    let dphi = (b.lat - a.lat).to_radians();
    let dlambda = (b.lon - a.lon).to_radians();
    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Compass direction to travel from `source` toward `destination`.
///
/// The axis with the larger absolute delta decides N/S vs E/W; equal
/// deltas resolve to the latitude axis.
pub fn bearing(source: Position, destination: Position) -> Direction {
    let lat_diff = (source.lat - destination.lat).abs();
    let lon_diff = (source.lon - destination.lon).abs();
    if lat_diff >= lon_diff {
        if source.lat > destination.lat {
            Direction::South
        } else {
            Direction::North
        }
    } else if source.lon > destination.lon {
        Direction::West
    } else {
        Direction::East
    }
}

/// Slippy-map tile index for a point at the given zoom level.
pub fn tile_index(point: Position, zoom: u32) -> (i64, i64) {
    let lat_rad = point.lat.to_radians();
    let n = 2f64.powi(zoom as i32);
    let xtile = ((point.lon + 180.0) / 360.0 * n) as i64;
    let ytile =
        ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0 * n)
            as i64;
    (xtile, ytile)
}

/// Whether the drone is close enough to `destination` to count as
/// arrived: inside a box whose half-width is the distance coverable in
/// one cycle at the current speed.
pub fn reached_destination(state: &DroneState, destination: Position, cycle_secs: u64) -> bool {
    let half_width_km = state.speed * cycle_secs as f64 / 3600.0 / 2.0;
    Bounds::around(destination, half_width_km).contains(state.position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mode;

    const TOL_DEG: f64 = 1e-9;

    fn approx_eq(a: Position, b: Position) -> bool {
        (a.lat - b.lat).abs() < TOL_DEG && (a.lon - b.lon).abs() < TOL_DEG
    }

    #[test]
    fn offset_round_trips_with_opposite_direction() {
        let start = Position::new(-30.040397656836609, -30.03373871559225);
        for (there, back) in [
            (Direction::North, Direction::South),
            (Direction::South, Direction::North),
            (Direction::East, Direction::West),
            (Direction::West, Direction::East),
        ] {
            let away = offset(start, 1.0, there);
            let home = offset(away, 1.0, back);
            assert!(approx_eq(start, home), "{there:?}/{back:?}: {home:?}");
        }
    }

    #[test]
    fn offset_north_moves_about_one_km() {
        let start = Position::new(10.0, 20.0);
        let moved = offset(start, 1.0, Direction::North);
        let dist = distance_km(start, moved);
        assert!((dist - 1.0).abs() < 0.01, "got {dist}");
    }

    #[test]
    fn point_is_inside_its_own_bounds() {
        let point = Position::new(48.85, 2.35);
        for r in [0.001, 0.5, 10.0, 100.0] {
            assert!(Bounds::around(point, r).contains(point), "r = {r}");
        }
    }

    #[test]
    fn bounds_exclude_far_points() {
        let bounds = Bounds::around(Position::new(0.0, 0.0), 10.0);
        assert!(!bounds.contains(Position::new(1.0, 0.0)));
        assert!(!bounds.contains(Position::new(0.0, 1.0)));
    }

    #[test]
    fn haversine_one_degree_of_latitude() {
        let dist = distance_km(Position::new(0.0, 0.0), Position::new(1.0, 0.0));
        assert!((dist - 111.19).abs() < 0.1, "got {dist}");
    }

    #[test]
    fn bearing_picks_dominant_axis() {
        let src = Position::new(0.0, 0.0);
        assert_eq!(bearing(src, Position::new(2.0, 1.0)), Direction::North);
        assert_eq!(bearing(src, Position::new(-2.0, 1.0)), Direction::South);
        assert_eq!(bearing(src, Position::new(1.0, 2.0)), Direction::East);
        assert_eq!(bearing(src, Position::new(1.0, -2.0)), Direction::West);
    }

    #[test]
    fn bearing_tie_resolves_to_latitude_axis() {
        let src = Position::new(0.0, 0.0);
        assert_eq!(bearing(src, Position::new(1.0, 1.0)), Direction::North);
    }

    #[test]
    fn bearing_converges_under_offset() {
        // Repeatedly stepping toward a destination must get closer.
        let dest = Position::new(10.05, 20.08);
        let mut here = Position::new(10.0, 20.0);
        let mut last = distance_km(here, dest);
        for _ in 0..20 {
            here = offset(here, 0.4, bearing(here, dest));
            let now = distance_km(here, dest);
            assert!(now < last, "diverged: {now} >= {last}");
            last = now;
        }
    }

    #[test]
    fn tile_index_matches_reference_values() {
        // openstreetmap.org slippy-map reference: zoom 13, 51.51/-0.13
        // lands on tile (4093, 2723).
        let (x, y) = tile_index(Position::new(51.51, -0.13), 13);
        assert_eq!((x, y), (4093, 2723));
    }

    #[test]
    fn reached_destination_scales_with_speed() {
        let destination = Position::new(10.0, 20.0);
        let mut state = DroneState {
            speed: 50.0,
            position: offset(destination, 0.1, Direction::North),
            battery: 80.0,
            direction: Direction::North,
            mode: Mode::Active,
        };
        // 50 km/h for 15 s covers ~208 m, half-width ~104 m: 100 m away counts.
        assert!(reached_destination(&state, destination, 15));

        state.position = offset(destination, 1.0, Direction::North);
        assert!(!reached_destination(&state, destination, 15));
    }
}
