//! Contact watchdog wired through the controller.

use std::time::Duration;

use thermrelay::ThermController;
use thermrelay::app::events::AppEvent;
use thermrelay::config::ControllerConfig;

use crate::mock_hw::{MockExpander, RecordingSink, wait_for};

/// Relays 1 and 2 on, sensors idle.
const RELAYS_ON: [u8; 2] = [0x77, 0x06];

fn short_watchdog(timeout_ms: u64) -> ControllerConfig {
    ControllerConfig {
        poll_period_ms: 60_000,
        watchdog_timeout_ms: timeout_ms,
        ..ControllerConfig::default()
    }
}

#[test]
fn silence_forces_relays_off() {
    let hw = MockExpander::new(RELAYS_ON);
    let sink = RecordingSink::new();
    let ctl = ThermController::new(hw.clone(), &short_watchdog(200), sink.clone()).unwrap();
    assert!(!ctl.get_state().relays_off());

    assert!(wait_for(Duration::from_secs(3), || ctl.get_state().relays_off()));
    assert_eq!(hw.banks(), [0x66, 0x06]);
    assert!(ctl.failsafe_trips() >= 1);
    assert!(sink.count(|e| *e == AppEvent::FailsafeFired) >= 1);
}

#[test]
fn regular_contact_keeps_relays_on() {
    let hw = MockExpander::new(RELAYS_ON);
    let ctl = ThermController::new(hw.clone(), &short_watchdog(300), RecordingSink::new()).unwrap();

    for _ in 0..12 {
        std::thread::sleep(Duration::from_millis(50));
        ctl.touch_watchdog();
    }

    assert_eq!(ctl.failsafe_trips(), 0);
    assert!(hw.writes().is_empty());
    assert!(ctl.since_contact() < Duration::from_millis(300));
}

#[test]
fn closed_controller_never_trips() {
    let hw = MockExpander::new(RELAYS_ON);
    let mut ctl = ThermController::new(hw.clone(), &short_watchdog(100), RecordingSink::new()).unwrap();
    ctl.close().unwrap();

    std::thread::sleep(Duration::from_millis(400));
    assert_eq!(ctl.failsafe_trips(), 0);
    assert!(hw.writes().is_empty());
}
