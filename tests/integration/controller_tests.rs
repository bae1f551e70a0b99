//! Controller lifecycle and the two update paths (interrupt and poll).

use std::sync::Arc;
use std::time::Duration;

use thermrelay::app::events::{AppEvent, UpdateSource};
use thermrelay::config::ControllerConfig;
use thermrelay::drivers::sim_expander::SimExpander;
use thermrelay::{Channel, ConfigError, Error, PortError, SAFE_STATE, Sensor, ThermController, ThermState};

use crate::mock_hw::{IDLE, MockExpander, RecordingSink, quiet_config, wait_for};

#[test]
fn startup_publishes_initial_read() {
    // Channel 1 relay on, channel 1 sensor A pulled low (active).
    let hw = MockExpander::new([0x65, 0x06]);
    let sink = RecordingSink::new();
    let ctl = ThermController::new(hw.clone(), &quiet_config(), sink.clone()).unwrap();

    let state = ctl.get_state();
    assert!(state.relay_1);
    assert!(state.sensor_a_1);
    assert!(!state.sensor_b_1);
    assert_eq!(sink.events().first(), Some(&AppEvent::Started(state)));
}

#[test]
fn invalid_config_is_rejected_before_touching_hardware() {
    let hw = MockExpander::new(IDLE);
    let config = ControllerConfig {
        poll_period_ms: 0,
        ..ControllerConfig::default()
    };
    let err = ThermController::new(hw.clone(), &config, RecordingSink::new()).err();
    assert!(matches!(err, Some(Error::Config(ConfigError::ValidationFailed(_)))));
    assert_eq!(hw.reads(), 0);
}

#[test]
fn failed_initial_read_fails_construction() {
    let hw = MockExpander::new(IDLE);
    hw.fail_reads(true);
    let err = ThermController::new(hw, &quiet_config(), RecordingSink::new()).err();
    assert_eq!(err, Some(Error::Hardware(PortError::ReadFailed)));
}

#[test]
fn interrupt_publishes_delivered_bytes() {
    let hw = MockExpander::new(IDLE);
    let sink = RecordingSink::new();
    let ctl = ThermController::new(hw.clone(), &quiet_config(), sink.clone()).unwrap();

    // Channel 2 sensor B goes active.
    hw.interrupt([0x26, 0x06]);

    let state = ctl.get_state();
    assert!(state.sensor_b_2);
    assert!(!state.sensor_a_2);
    assert!(sink.events().contains(&AppEvent::StateChanged {
        source: UpdateSource::Interrupt,
        state,
    }));
}

#[test]
fn interrupt_fault_keeps_previous_state() {
    let hw = MockExpander::new(IDLE);
    let sink = RecordingSink::new();
    let ctl = ThermController::new(hw.clone(), &quiet_config(), sink.clone()).unwrap();
    let before = ctl.get_state();

    hw.interrupt_fault(PortError::InterruptFailed);

    assert_eq!(ctl.get_state(), before);
    assert!(sink
        .events()
        .contains(&AppEvent::InterruptFault(PortError::InterruptFailed)));
}

#[test]
fn poll_picks_up_changes_without_interrupts() {
    let hw = MockExpander::new(IDLE);
    let sink = RecordingSink::new();
    let config = ControllerConfig {
        poll_period_ms: 50,
        ..ControllerConfig::default()
    };
    let ctl = ThermController::new(hw.clone(), &config, sink.clone()).unwrap();

    // Channel 3 sensor A active, no interrupt raised.
    hw.set_banks([0x66, 0x04]);

    assert!(wait_for(Duration::from_secs(2), || ctl.get_state().sensor_a_3));
    assert!(sink.count(|e| matches!(
        e,
        AppEvent::StateChanged { source: UpdateSource::Poll, .. }
    )) >= 1);
}

#[test]
fn unchanged_poll_is_silent() {
    let hw = MockExpander::new(IDLE);
    let sink = RecordingSink::new();
    let ctl = ThermController::new(hw.clone(), &quiet_config(), sink.clone()).unwrap();

    ctl.refresh().unwrap();
    ctl.refresh().unwrap();

    assert_eq!(sink.count(|e| matches!(e, AppEvent::StateChanged { .. })), 0);
}

#[test]
fn poll_failure_keeps_previous_state() {
    let hw = MockExpander::new(IDLE);
    let sink = RecordingSink::new();
    let ctl = ThermController::new(hw.clone(), &quiet_config(), sink.clone()).unwrap();
    let before = ctl.get_state();

    hw.fail_reads(true);
    hw.set_banks([0x00, 0x00]);
    assert_eq!(ctl.refresh(), Err(Error::Hardware(PortError::ReadFailed)));

    assert_eq!(ctl.get_state(), before);
    assert!(sink.events().contains(&AppEvent::PollFault(PortError::ReadFailed)));
}

#[test]
fn close_is_idempotent_and_final() {
    let hw = MockExpander::new(IDLE);
    let sink = RecordingSink::new();
    let mut ctl = ThermController::new(hw.clone(), &quiet_config(), sink.clone()).unwrap();

    ctl.close().unwrap();
    ctl.close().unwrap();

    assert!(ctl.is_closed());
    assert!(hw.is_closed());
    assert_eq!(
        ctl.set_state(&SAFE_STATE),
        Err(Error::Hardware(PortError::Closed))
    );
    assert_eq!(sink.count(|e| *e == AppEvent::Closed), 1);
}

#[test]
fn drop_closes_the_port() {
    let hw = MockExpander::new(IDLE);
    let ctl = ThermController::new(hw.clone(), &quiet_config(), Arc::new(RecordingSink::default()))
        .unwrap();
    drop(ctl);
    assert!(hw.is_closed());
}

#[test]
fn reads_are_consistent_under_concurrent_interrupts() {
    let hw = MockExpander::new(IDLE);
    let ctl = ThermController::new(hw.clone(), &quiet_config(), RecordingSink::new()).unwrap();

    // Alternate between "all sensors idle" and "all sensors active".
    let toggler = {
        let hw = hw.clone();
        std::thread::spawn(move || {
            for i in 0..500 {
                hw.interrupt(if i % 2 == 0 { [0x00, 0x00] } else { IDLE });
            }
        })
    };

    for _ in 0..500 {
        let s = ctl.get_state();
        let sensors = [
            s.sensor_a_1,
            s.sensor_b_1,
            s.sensor_a_2,
            s.sensor_b_2,
            s.sensor_a_3,
            s.sensor_b_3,
        ];
        assert!(
            sensors.iter().all(|&b| b) || sensors.iter().all(|&b| !b),
            "torn snapshot: {s:?}"
        );
    }
    toggler.join().unwrap();
}

#[test]
fn failed_interrupt_subscription_releases_the_port() {
    let hw = MockExpander::new(IDLE);
    hw.fail_subscribe();

    let err = ThermController::new(hw.clone(), &quiet_config(), RecordingSink::new()).err();

    assert_eq!(err, Some(Error::Hardware(PortError::InterruptFailed)));
    assert!(hw.is_closed());
}

#[test]
fn simulated_bus_fault_keeps_previous_state() {
    let sim = SimExpander::new();
    let sink = RecordingSink::new();
    let ctl = ThermController::new(sim.clone(), &quiet_config(), sink.clone()).unwrap();
    let before = ctl.get_state();

    sim.raise_fault(PortError::Bus("spi timeout"));
    sim.set_sensor(Channel::One, Sensor::B, true);
    assert!(ctl.get_state().sensor_b_1);
    sim.raise_fault(PortError::Bus("spi timeout"));

    let expected = ThermState {
        sensor_b_1: true,
        ..before
    };
    assert_eq!(ctl.get_state(), expected);
    assert_eq!(
        sink.count(|e| *e == AppEvent::InterruptFault(PortError::Bus("spi timeout"))),
        2
    );
}
