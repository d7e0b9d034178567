//! Shared physics engine and its tick thread.
//!
//! `PhysicsEngine` wraps the [`CarModel`] in a reader/writer lock so that
//! sensor reads from connection threads run concurrently with each other
//! while the tick thread holds the write lock only for the integration step.

use super::car::CarModel;
use crossbeam_channel::Sender;
use lift_common::hal::config::SimConfig;
use lift_common::hal::driver::SimulationFault;
use lift_common::hal::types::{CommandOutcome, Direction, FloorSensor};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Cloneable handle to the simulated car.
#[derive(Debug, Clone)]
pub struct PhysicsEngine {
    car: Arc<RwLock<CarModel>>,
    tick_period: Duration,
}

/// Timing statistics of the tick loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickStats {
    /// Number of ticks executed
    pub tick_count: u64,
    /// Ticks that took longer than the tick period
    pub overruns: u64,
    /// Longest observed tick in microseconds
    pub max_tick_us: u64,
}

impl PhysicsEngine {
    /// Create the engine for one simulated lift.
    pub fn new(config: &SimConfig) -> Self {
        Self {
            car: Arc::new(RwLock::new(CarModel::new(config))),
            tick_period: config.tick_period,
        }
    }

    /// Set the motor direction (`-1/0/1`); other values are ignored.
    pub fn set_direction(&self, direction: i32) -> CommandOutcome {
        self.car.write().set_direction(direction)
    }

    /// Advance the car by `dt`.
    pub fn tick(&self, dt: Duration) -> Result<(), SimulationFault> {
        self.car.write().tick(dt)
    }

    /// Read the floor sensors.
    pub fn floor_sensor(&self) -> FloorSensor {
        self.car.read().floor_sensor()
    }

    /// Current position.
    pub fn position(&self) -> f64 {
        self.car.read().position()
    }

    /// Place the car.
    ///
    /// Start-up and test hook. Apart from the tick thread this is the only
    /// writer of the car; calling it while the tick thread runs races with
    /// integration and is meant for placing a stopped car.
    #[doc(hidden)]
    pub fn set_position(&self, position: f64) {
        self.car.write().set_position(position);
    }

    /// Current motor direction.
    pub fn direction(&self) -> Direction {
        self.car.read().direction()
    }

    /// Whether a shaft violation has been reported.
    pub fn is_faulted(&self) -> bool {
        self.car.read().is_faulted()
    }

    /// Start the tick thread.
    ///
    /// The thread advances the car every `tick_period` by the time actually
    /// elapsed since the previous tick. A shaft violation is sent once on
    /// `faults` and ends the thread.
    pub fn spawn(&self, faults: Sender<SimulationFault>) -> Result<PhysicsHandle, std::io::Error> {
        let running = Arc::new(AtomicBool::new(true));
        let engine = self.clone();
        let flag = Arc::clone(&running);

        let thread = thread::Builder::new()
            .name("lift-physics".to_string())
            .spawn(move || engine.run(&flag, &faults))?;

        Ok(PhysicsHandle {
            running,
            thread: Some(thread),
        })
    }

    fn run(&self, running: &AtomicBool, faults: &Sender<SimulationFault>) -> TickStats {
        info!(
            "Physics tick loop started (period={}ms, rt={})",
            self.tick_period.as_millis(),
            detect_rt_mode()
        );

        let mut stats = TickStats::default();
        let mut last_tick = Instant::now();

        while running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();
            let dt = tick_start.duration_since(last_tick);
            last_tick = tick_start;

            if let Err(fault) = self.tick(dt) {
                error!("Simulation fault: {}", fault);
                if faults.send(fault).is_err() {
                    warn!("Fault receiver is gone; fault only logged");
                }
                break;
            }

            let tick_us = tick_start.elapsed().as_micros() as u64;
            stats.tick_count += 1;
            stats.max_tick_us = stats.max_tick_us.max(tick_us);
            if tick_us > self.tick_period.as_micros() as u64 {
                stats.overruns += 1;
                if stats.overruns <= 10 || stats.overruns % 1000 == 0 {
                    warn!(
                        "Tick overrun #{}: took {}us (period {}us)",
                        stats.overruns,
                        tick_us,
                        self.tick_period.as_micros()
                    );
                }
            }

            if stats.tick_count % 1000 == 0 {
                debug!(
                    "Physics: {} ticks, max={}us, overruns={}",
                    stats.tick_count, stats.max_tick_us, stats.overruns
                );
            }

            let elapsed = tick_start.elapsed();
            if elapsed < self.tick_period {
                thread::sleep(self.tick_period - elapsed);
            }
        }

        running.store(false, Ordering::SeqCst);
        info!(
            "Physics tick loop stopped after {} ticks (overruns: {})",
            stats.tick_count, stats.overruns
        );
        stats
    }
}

/// Owner of the tick thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct PhysicsHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<TickStats>>,
}

impl PhysicsHandle {
    /// Whether the tick loop is still running (false after a fault).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the tick thread and return its statistics.
    pub fn stop(mut self) -> TickStats {
        self.join()
    }

    fn join(&mut self) -> TickStats {
        self.running.store(false, Ordering::SeqCst);
        match self.thread.take().map(JoinHandle::join) {
            Some(Ok(stats)) => stats,
            Some(Err(_)) => {
                error!("Physics thread panicked");
                TickStats::default()
            }
            None => TickStats::default(),
        }
    }
}

impl Drop for PhysicsHandle {
    fn drop(&mut self) {
        self.join();
    }
}

/// Detect if running in real-time mode by checking scheduler policy.
fn detect_rt_mode() -> bool {
    #[cfg(target_os = "linux")]
    {
        use libc::{SCHED_FIFO, SCHED_RR, sched_getscheduler};
        // SAFETY: querying the policy of the calling thread has no preconditions.
        let policy = unsafe { sched_getscheduler(0) };
        policy == SCHED_FIFO || policy == SCHED_RR
    }
    #[cfg(not(target_os = "linux"))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    fn fast_config() -> SimConfig {
        SimConfig::builder()
            .travel_time_between_floors(Duration::from_millis(200))
            .unwrap()
            .travel_time_passing_floors(Duration::from_millis(50))
            .unwrap()
            .tick_period(Duration::from_millis(2))
            .unwrap()
            .slack_margin(0.1)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_concurrent_readers() {
        let engine = PhysicsEngine::new(&fast_config());
        engine.set_position(2.0);

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let engine = engine.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        assert_eq!(engine.floor_sensor(), FloorSensor::at(2));
                    }
                })
            })
            .collect();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_tick_thread_moves_car() {
        let engine = PhysicsEngine::new(&fast_config());
        let (tx, _rx) = unbounded();
        let handle = engine.spawn(tx).unwrap();

        engine.set_direction(1);
        thread::sleep(Duration::from_millis(100));
        engine.set_direction(0);

        let stats = handle.stop();
        assert!(stats.tick_count > 0);
        assert!(engine.position() > 0.0);
    }

    #[test]
    fn test_fault_delivered_once_and_loop_stops() {
        let engine = PhysicsEngine::new(&fast_config());
        let (tx, rx) = unbounded();
        let handle = engine.spawn(tx).unwrap();

        // Floor 0, driving down: leaves the 0.1 slack after ~20ms.
        engine.set_direction(-1);

        let fault = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(fault, SimulationFault::ShaftBoundViolation { .. }));

        // The loop exits on its own after the fault.
        let deadline = Instant::now() + Duration::from_secs(1);
        while handle.is_running() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(!handle.is_running());
        assert!(engine.is_faulted());

        drop(handle);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_drop_stops_thread() {
        let engine = PhysicsEngine::new(&fast_config());
        let (tx, _rx) = unbounded();
        let handle = engine.spawn(tx).unwrap();
        drop(handle);

        let before = engine.position();
        engine.set_direction(1);
        thread::sleep(Duration::from_millis(20));
        assert!((engine.position() - before).abs() < 1e-12);
    }
}
