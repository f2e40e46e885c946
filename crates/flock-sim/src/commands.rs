//! Command reconciliation.
//!
//! The drone server queues state-override commands; per cycle only the
//! most recent one is executed, and the whole backlog is drained
//! afterward so stale commands never accumulate.

use flock_core::{Command, CommandRef, Drone};
use flock_gateway::wire;

/// Numeric ids of the given command references, ascending. Malformed
/// references are skipped; one bad id must not block the rest.
pub fn parse_ids(refs: &[CommandRef]) -> Vec<i64> {
    let mut ids: Vec<i64> = refs
        .iter()
        .filter_map(|reference| wire::id_suffix(&reference.id))
        .collect();
    ids.sort_unstable();
    ids
}

/// The command that supersedes all others this cycle.
pub fn latest(ids: &[i64]) -> Option<i64> {
    ids.iter().max().copied()
}

/// Apply a command to the drone.
///
/// The command's state payload replaces the drone state wholesale;
/// speed is clamped to the drone's maximum. Commands addressed to a
/// different drone are ignored (the caller still deletes them).
/// Returns whether the command was applied.
pub fn apply(command: &Command, drone: &mut Drone) -> bool {
    if command.drone_id != drone.id {
        return false;
    }
    drone.state = command.state.clone();
    if drone.state.speed > drone.max_speed {
        drone.state.speed = drone.max_speed;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use flock_core::{Direction, DroneState, Mode, Position};

    fn reference(id: &str) -> CommandRef {
        CommandRef { id: id.to_string() }
    }

    fn command_state(speed: f64) -> DroneState {
        DroneState {
            speed,
            position: Position::new(1.0, 2.0),
            battery: 50.0,
            direction: Direction::East,
            mode: Mode::Active,
        }
    }

    #[test]
    fn parse_ids_skips_malformed_refs() {
        let refs = vec![
            reference("/api/CommandCollection/3"),
            reference("/api/CommandCollection/not-a-number"),
            reference("/api/CommandCollection/1"),
            reference(""),
            reference("/api/CommandCollection/2"),
        ];
        assert_eq!(parse_ids(&refs), vec![1, 2, 3]);
    }

    #[test]
    fn latest_is_the_numeric_max() {
        assert_eq!(latest(&[1, 2, 3]), Some(3));
        assert_eq!(latest(&[]), None);
    }

    #[test]
    fn apply_replaces_state_wholesale() {
        let mut drone = Drone::default_record();
        drone.id = 7;
        let command = Command {
            drone_id: 7,
            state: command_state(90.0),
        };
        assert!(apply(&command, &mut drone));
        assert_eq!(drone.state, command_state(90.0));
    }

    #[test]
    fn apply_clamps_speed_to_max() {
        let mut drone = Drone::default_record();
        drone.id = 7;
        let command = Command {
            drone_id: 7,
            state: command_state(500.0),
        };
        assert!(apply(&command, &mut drone));
        assert_eq!(drone.state.speed, drone.max_speed);
    }

    #[test]
    fn apply_ignores_foreign_drone_id() {
        let mut drone = Drone::default_record();
        drone.id = 7;
        let before = drone.state.clone();
        let command = Command {
            drone_id: 5,
            state: command_state(90.0),
        };
        assert!(!apply(&command, &mut drone));
        assert_eq!(drone.state, before);
    }
}
