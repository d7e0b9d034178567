//! End-to-end tests: `SimLift` talking to an in-process `SimServer`.

use lift_common::hal::config::SimConfig;
use lift_common::hal::driver::{LiftError, Lifter, SimulationFault};
use lift_common::hal::types::{Button, CommandOutcome, Direction, FloorSensor};
use lift_hal::drivers::SimLift;
use lift_hal::server::{SimHandle, SimServer};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Fast lift: 400ms between floors, in-floor band ±0.375 floors.
fn fast_config(floors: u8) -> SimConfig {
    SimConfig::builder()
        .num_floors(floors)
        .unwrap()
        .travel_time_between_floors(Duration::from_millis(400))
        .unwrap()
        .travel_time_passing_floors(Duration::from_millis(300))
        .unwrap()
        .btn_depressed_time(Duration::from_millis(150))
        .unwrap()
        .tick_period(Duration::from_millis(2))
        .unwrap()
        .ephemeral_port()
        .build()
        .unwrap()
}

/// Start a simulator and connect a lift to it.
fn start(config: SimConfig) -> (SimHandle, SimLift) {
    let handle = SimServer::bind(config.clone()).unwrap().start().unwrap();
    let lift_config = config
        .into_builder()
        .com_port(handle.local_addr().port())
        .unwrap()
        .build()
        .unwrap();
    let lift = SimLift::connect(lift_config).unwrap();
    (handle, lift)
}

#[test]
fn test_six_floor_scenario_reaches_floor_one() {
    let (sim, lift) = start(fast_config(6));

    assert_eq!(lift.floor_sensor().unwrap(), FloorSensor::at(0));
    assert_eq!(lift.floor_indicator(5).unwrap(), CommandOutcome::Applied);
    assert_eq!(lift.set_motor_direction(1).unwrap(), CommandOutcome::Applied);

    // Floor 1 is reached after 400ms; its band lasts until 550ms.
    thread::sleep(Duration::from_millis(460));
    lift.set_motor_direction(0).unwrap();

    assert_eq!(lift.floor_sensor().unwrap(), FloorSensor::at(1));
    assert_eq!(sim.panel().floor_indicator(), 5);
    assert_eq!(sim.physics().direction(), Direction::Stop);
}

#[test]
fn test_between_floors_while_travelling() {
    let (sim, lift) = start(fast_config(4));
    sim.physics().set_position(1.5);
    assert_eq!(lift.floor_sensor().unwrap(), FloorSensor::between());
}

#[test]
fn test_fire_commands_are_idempotent() {
    let (sim, lift) = start(fast_config(4));

    lift.order_button_light(0, 1, true).unwrap();
    lift.door_light(true).unwrap();
    lift.stop_light(true).unwrap();
    // Fire frames carry no reply; a query afterwards flushes them.
    lift.stop_button().unwrap();
    let once = sim.panel().snapshot();

    lift.order_button_light(0, 1, true).unwrap();
    lift.door_light(true).unwrap();
    lift.stop_light(true).unwrap();
    lift.stop_button().unwrap();
    assert_eq!(sim.panel().snapshot(), once);

    assert!(once.order_lamps[1][Button::HallUp.index()]);
    assert!(once.door_light);
    assert!(once.stop_light);
}

#[test]
fn test_invalid_commands_send_nothing() {
    let (sim, lift) = start(fast_config(4));
    let before = sim.panel().snapshot();

    assert_eq!(lift.set_motor_direction(7).unwrap(), CommandOutcome::Ignored);
    assert_eq!(lift.floor_indicator(4).unwrap(), CommandOutcome::Ignored);
    assert_eq!(lift.order_button_light(3, 0, true).unwrap(), CommandOutcome::Ignored);
    assert!(matches!(lift.order_button(0, 4), Err(LiftError::InvalidArgument(_))));

    lift.obstruction().unwrap();
    assert_eq!(sim.panel().snapshot(), before);
    assert_eq!(sim.physics().direction(), Direction::Stop);
}

#[test]
fn test_order_button_press_window() {
    let (sim, lift) = start(fast_config(4));

    assert!(!lift.order_button(2, 3).unwrap());
    sim.panel().press_order_button(Button::Cab, 3);
    assert!(lift.order_button(2, 3).unwrap());
    assert!(!lift.order_button(1, 3).unwrap());

    thread::sleep(Duration::from_millis(250));
    assert!(!lift.order_button(2, 3).unwrap());
}

#[test]
fn test_switch_queries() {
    let (sim, lift) = start(fast_config(4));
    assert!(!lift.stop_button().unwrap());
    assert!(!lift.obstruction().unwrap());

    sim.panel().set_stop_button(true);
    sim.panel().set_obstruction(true);
    assert!(lift.stop_button().unwrap());
    assert!(lift.obstruction().unwrap());
}

#[test]
fn test_concurrent_queries_are_paired() {
    let (sim, lift) = start(fast_config(9));
    sim.panel().set_obstruction(true);
    sim.physics().set_position(4.0);
    let lift = Arc::new(lift);

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let lift = Arc::clone(&lift);
            thread::spawn(move || {
                for _ in 0..50 {
                    match worker % 3 {
                        0 => assert_eq!(lift.floor_sensor().unwrap(), FloorSensor::at(4)),
                        1 => assert!(lift.obstruction().unwrap()),
                        _ => assert!(!lift.stop_button().unwrap()),
                    }
                    lift.door_light(worker % 2 == 0).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }
}

#[test]
fn test_unreachable_simulator_is_connect_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = fast_config(4).into_builder().com_port(port).unwrap().build().unwrap();
    assert!(matches!(SimLift::connect(config), Err(LiftError::Connect { .. })));
}

#[test]
fn test_init_dials_again_after_simulator_restart() {
    let (sim, mut lift) = start(fast_config(4));
    let port = sim.local_addr().port();
    drop(sim);

    // The server side has closed; the next exchange poisons the connection.
    thread::sleep(Duration::from_millis(100));
    assert!(lift.floor_sensor().is_err());
    for _ in 0..50 {
        if !lift.is_connected() {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert!(!lift.is_connected());
    assert!(matches!(lift.stop_button(), Err(LiftError::Disconnected)));

    let config = fast_config(4).into_builder().com_port(port).unwrap().build().unwrap();
    let sim = SimServer::bind(config).unwrap().start().unwrap();
    lift.init().unwrap();
    assert!(lift.is_connected());

    sim.panel().set_stop_button(true);
    assert!(lift.stop_button().unwrap());
    assert_eq!(lift.floor_sensor().unwrap(), FloorSensor::at(0));
}

#[test]
fn test_shaft_violation_reported_once() {
    let (sim, lift) = start(fast_config(4));

    // Start floor 0; slack 0.5 floors is gone after ~200ms.
    lift.set_motor_direction(-1).unwrap();

    let fault = sim.faults().recv_timeout(Duration::from_secs(3)).unwrap();
    let SimulationFault::ShaftBoundViolation { position, lower, .. } = fault;
    assert!(position < lower);
    assert!(sim.physics().is_faulted());

    thread::sleep(Duration::from_millis(100));
    assert!(sim.faults().try_recv().is_err());

    // The car is frozen but the panel still answers.
    assert!(!lift.stop_button().unwrap());
}
