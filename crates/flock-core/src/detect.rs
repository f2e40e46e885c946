//! Anomaly detection over the map tile grid.
//!
//! Detection is deterministic in space (an arithmetic gate over the
//! tile index, so anomalies cluster on fixed tiles) and randomized in
//! time (a gated draw decides whether a pass over a hot tile actually
//! raises one).

use crate::geo;
use crate::models::Position;
use rand::Rng;

/// Tunable detection probabilities.
#[derive(Debug, Clone, Copy)]
pub struct DetectionConfig {
    /// Tile zoom level used for the grid.
    pub zoom: u32,
    /// A tile is "hot" when `5x + 7y + 2` is divisible by this.
    pub modulus: i64,
    /// Probability that a pass over a hot tile raises an anomaly.
    pub probability: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            zoom: 17,
            modulus: 35,
            probability: 0.5,
        }
    }
}

/// Whether the tile containing `position` passes the deterministic gate.
pub fn tile_is_hot(position: Position, config: &DetectionConfig) -> bool {
    if config.modulus <= 0 {
        return false;
    }
    let (x, y) = geo::tile_index(position, config.zoom);
    (5 * x + 7 * y + 2).rem_euclid(config.modulus) == 0
}

/// Roll the detection test at `position`: deterministic gate first,
/// then the randomized draw.
pub fn roll(position: Position, config: &DetectionConfig, rng: &mut impl Rng) -> bool {
    tile_is_hot(position, config) && rng.random_bool(config.probability.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scan a small grid for a tile with the wanted gate outcome. Hot
    /// tiles sit on every 7th column and every 5th row of the tile
    /// grid, so both outcomes exist in any sufficiently wide area.
    fn find_tile(config: &DetectionConfig, want_hot: bool) -> Position {
        for i in 0..60 {
            for j in 0..60 {
                let position = Position::new(10.0 + i as f64 * 0.003, 20.0 + j as f64 * 0.003);
                if tile_is_hot(position, config) == want_hot {
                    return position;
                }
            }
        }
        panic!("no {} tile in search area", if want_hot { "hot" } else { "cold" });
    }

    #[test]
    fn cold_tile_never_detects() {
        let config = DetectionConfig::default();
        let mut rng = rand::rng();
        let position = find_tile(&config, false);
        for _ in 0..100 {
            assert!(!roll(position, &config, &mut rng));
        }
    }

    #[test]
    fn hot_tile_with_certain_probability_always_detects() {
        let config = DetectionConfig {
            probability: 1.0,
            ..DetectionConfig::default()
        };
        let mut rng = rand::rng();
        let position = find_tile(&config, true);
        assert!(roll(position, &config, &mut rng));
    }

    #[test]
    fn gate_is_deterministic_per_tile() {
        let config = DetectionConfig::default();
        let position = Position::new(48.85, 2.35);
        let first = tile_is_hot(position, &config);
        for _ in 0..10 {
            assert_eq!(tile_is_hot(position, &config), first);
        }
    }

    #[test]
    fn zero_modulus_disables_detection() {
        let config = DetectionConfig {
            modulus: 0,
            ..DetectionConfig::default()
        };
        let mut rng = rand::rng();
        assert!(!roll(Position::new(10.0, 20.0), &config, &mut rng));
    }
}
