//! Battery discharge/charge model and the mode transitions it drives.
//!
//! Thresholds are edge-triggered: each transition fires exactly once,
//! on the cycle that crosses the boundary, and is reported back to the
//! caller as an event instead of being logged in place.

use crate::models::{DroneState, Mode};

/// At or below this level the drone goes Inactive and heads home.
pub const LOW_BATTERY_PCT: f64 = 20.0;

/// At or below this level the drone shuts down. Terminal until an
/// external command resets the state.
pub const CRITICAL_BATTERY_PCT: f64 = 4.0;

/// Charging snaps to full and resumes Active once this level is reached.
pub const CHARGE_RESUME_PCT: f64 = 95.0;

const DISCHARGE_PER_CYCLE: f64 = 1.0;
const LOW_DISCHARGE_PER_CYCLE: f64 = 0.25;
const CHARGE_PER_CYCLE: f64 = 5.0;

/// Threshold crossing observed during a battery step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BatteryEvent {
    /// Crossed the low-battery boundary; the drone went Inactive.
    LowBattery { remaining: f64 },
    /// Battery critical; the drone shut down.
    CriticalShutdown,
    /// Charging finished; the drone is Active again at 100%.
    ChargeComplete,
}

/// Advance the battery model by one cycle.
///
/// Off drones are inert. Charging drones charge, everything else
/// discharges.
pub fn step(state: &mut DroneState) -> Option<BatteryEvent> {
    match state.mode {
        Mode::Off => None,
        Mode::Charging => charge(state),
        _ => discharge(state),
    }
}

fn discharge(state: &mut DroneState) -> Option<BatteryEvent> {
    let before = state.battery;
    if before > LOW_BATTERY_PCT {
        state.battery = before - DISCHARGE_PER_CYCLE;
    } else {
        // Inactive flight draws a quarter of the normal rate.
        state.battery = before - LOW_DISCHARGE_PER_CYCLE;
    }

    if state.battery <= CRITICAL_BATTERY_PCT {
        state.mode = Mode::Off;
        return Some(BatteryEvent::CriticalShutdown);
    }

    if before > LOW_BATTERY_PCT && state.battery <= LOW_BATTERY_PCT {
        state.mode = Mode::Inactive;
        return Some(BatteryEvent::LowBattery {
            remaining: state.battery,
        });
    }

    None
}

fn charge(state: &mut DroneState) -> Option<BatteryEvent> {
    if state.battery < CHARGE_RESUME_PCT {
        state.battery += CHARGE_PER_CYCLE;
        None
    } else {
        state.battery = 100.0;
        state.mode = Mode::Active;
        Some(BatteryEvent::ChargeComplete)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Position};

    fn state(battery: f64, mode: Mode) -> DroneState {
        DroneState {
            speed: 50.0,
            position: Position::new(0.0, 0.0),
            battery,
            direction: Direction::North,
            mode,
        }
    }

    #[test]
    fn discharge_never_increases_battery() {
        let mut s = state(100.0, Mode::Active);
        let mut last = s.battery;
        for _ in 0..500 {
            step(&mut s);
            assert!(s.battery <= last);
            last = s.battery;
        }
    }

    #[test]
    fn crossing_twenty_goes_inactive_exactly_once() {
        let mut s = state(21.0, Mode::Active);
        let event = step(&mut s);
        assert_eq!(s.battery, 20.0);
        assert_eq!(s.mode, Mode::Inactive);
        assert_eq!(event, Some(BatteryEvent::LowBattery { remaining: 20.0 }));

        // Next cycles stay Inactive silently at the reduced rate.
        let event = step(&mut s);
        assert_eq!(s.battery, 19.75);
        assert_eq!(event, None);
    }

    #[test]
    fn critical_threshold_is_terminal() {
        let mut s = state(4.25, Mode::Inactive);
        let event = step(&mut s);
        assert_eq!(event, Some(BatteryEvent::CriticalShutdown));
        assert_eq!(s.mode, Mode::Off);
        assert_eq!(s.battery, 4.0);

        // Off is inert under repeated stepping.
        for _ in 0..10 {
            assert_eq!(step(&mut s), None);
            assert_eq!(s.mode, Mode::Off);
            assert_eq!(s.battery, 4.0);
        }
    }

    #[test]
    fn charge_is_non_decreasing_and_saturates_at_100() {
        let mut s = state(62.0, Mode::Charging);
        let mut last = s.battery;
        let mut steps = 0;
        while s.mode == Mode::Charging {
            let event = step(&mut s);
            assert!(s.battery >= last);
            assert!(s.battery <= 100.0);
            last = s.battery;
            steps += 1;
            assert!(steps < 20, "charge episode never completed");
            // Leaving Charging must coincide with the completion event.
            assert_eq!(event.is_some(), s.mode == Mode::Active);
        }
        assert_eq!(s.battery, 100.0);
        assert_eq!(s.mode, Mode::Active);
    }

    #[test]
    fn charge_snaps_from_resume_boundary() {
        let mut s = state(97.0, Mode::Charging);
        assert_eq!(step(&mut s), Some(BatteryEvent::ChargeComplete));
        assert_eq!(s.battery, 100.0);
    }

    #[test]
    fn confirming_discharges_like_active() {
        let mut s = state(50.0, Mode::Confirming);
        step(&mut s);
        assert_eq!(s.battery, 49.0);
        assert_eq!(s.mode, Mode::Confirming);
    }
}
