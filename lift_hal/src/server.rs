//! In-process lift simulator.
//!
//! `SimServer` listens on the simulator port and plays the lift: fire
//! frames drive the physics engine and the panel, query frames are answered
//! from them. Each connection is served on its own thread.
//!
//! ```text
//!  client ──TCP──► connection thread ──► handle_frame ──┬──► PhysicsEngine ◄── tick thread
//!                                                     └──► Panel
//! ```

use crate::bridge::{Frame, Opcode, Reply};
use crate::panel::Panel;
use crate::physics::{PhysicsEngine, PhysicsHandle};
use crossbeam_channel::{Receiver, unbounded};
use lift_common::consts::FRAME_LEN;
use lift_common::hal::config::SimConfig;
use lift_common::hal::driver::{LiftError, SimulationFault};
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How often idle threads re-check the running flag.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Bound, not yet running simulator.
#[derive(Debug)]
pub struct SimServer {
    config: SimConfig,
    listener: TcpListener,
}

impl SimServer {
    /// Validate `config` and bind its endpoint.
    pub fn bind(config: SimConfig) -> Result<Self, LiftError> {
        config.validate()?;
        let endpoint = config.endpoint();
        let listener = TcpListener::bind(&endpoint)
            .map_err(|e| LiftError::Io(format!("unable to listen on {endpoint}: {e}")))?;
        Ok(Self { config, listener })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, LiftError> {
        self.listener
            .local_addr()
            .map_err(|e| LiftError::Io(e.to_string()))
    }

    /// Start the physics tick thread and accept connections.
    pub fn start(self) -> Result<SimHandle, LiftError> {
        let io_err = |e: std::io::Error| LiftError::Io(e.to_string());
        let local_addr = self.local_addr()?;
        self.listener.set_nonblocking(true).map_err(io_err)?;

        let physics = PhysicsEngine::new(&self.config);
        let panel = Arc::new(Panel::new(&self.config));
        let (fault_tx, faults) = unbounded();
        let ticker = physics.spawn(fault_tx).map_err(io_err)?;

        let running = Arc::new(AtomicBool::new(true));
        let acceptor = {
            let running = Arc::clone(&running);
            let physics = physics.clone();
            let panel = Arc::clone(&panel);
            let listener = self.listener;
            thread::Builder::new()
                .name("lift-sim-accept".to_string())
                .spawn(move || accept_loop(&listener, &physics, &panel, &running))
                .map_err(io_err)?
        };

        info!(
            "Lift simulator listening on {} ({} floors, start floor {})",
            local_addr, self.config.num_floors, self.config.start_floor
        );

        Ok(SimHandle {
            config: self.config,
            local_addr,
            physics,
            panel,
            faults,
            running,
            ticker: Some(ticker),
            acceptor: Some(acceptor),
        })
    }
}

/// Running simulator. Dropping it stops every thread.
#[derive(Debug)]
pub struct SimHandle {
    config: SimConfig,
    local_addr: SocketAddr,
    physics: PhysicsEngine,
    panel: Arc<Panel>,
    faults: Receiver<SimulationFault>,
    running: Arc<AtomicBool>,
    ticker: Option<PhysicsHandle>,
    acceptor: Option<JoinHandle<()>>,
}

impl SimHandle {
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The simulated car.
    pub fn physics(&self) -> &PhysicsEngine {
        &self.physics
    }

    /// The simulated panel; tests press buttons here.
    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// Simulation faults, delivered once each.
    pub fn faults(&self) -> &Receiver<SimulationFault> {
        &self.faults
    }

    /// Stop all threads and wait for them.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(acceptor) = self.acceptor.take() {
            if acceptor.join().is_err() {
                error!("Accept thread panicked");
            }
        }
        if let Some(ticker) = self.ticker.take() {
            let stats = ticker.stop();
            debug!("Physics stopped: {:?}", stats);
        }
    }
}

impl Drop for SimHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn accept_loop(
    listener: &TcpListener,
    physics: &PhysicsEngine,
    panel: &Arc<Panel>,
    running: &Arc<AtomicBool>,
) {
    let mut connections: Vec<JoinHandle<()>> = Vec::new();

    while running.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                info!("Client connected from {}", peer);
                let physics = physics.clone();
                let panel = Arc::clone(panel);
                let running = Arc::clone(running);
                let spawned = thread::Builder::new()
                    .name(format!("lift-sim-{peer}"))
                    .spawn(move || {
                        if let Err(e) = serve_connection(stream, &physics, &panel, &running) {
                            warn!("Connection {} closed: {}", peer, e);
                        } else {
                            info!("Client {} disconnected", peer);
                        }
                    });
                match spawned {
                    Ok(handle) => connections.push(handle),
                    Err(e) => error!("Unable to serve {}: {}", peer, e),
                }
                connections.retain(|c| !c.is_finished());
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                warn!("Accept failed: {}", e);
                thread::sleep(POLL_INTERVAL);
            }
        }
    }

    for connection in connections {
        let _ = connection.join();
    }
}

/// Serve one client until it hangs up, sends garbage, or the server stops.
fn serve_connection(
    mut stream: TcpStream,
    physics: &PhysicsEngine,
    panel: &Panel,
    running: &AtomicBool,
) -> Result<(), LiftError> {
    let io_err = |e: std::io::Error| LiftError::Io(e.to_string());
    stream.set_nonblocking(false).map_err(io_err)?;
    stream.set_nodelay(true).map_err(io_err)?;
    stream.set_read_timeout(Some(POLL_INTERVAL)).map_err(io_err)?;

    let mut buf = [0u8; FRAME_LEN];
    let mut filled = 0;

    while running.load(Ordering::SeqCst) {
        match stream.read(&mut buf[filled..]) {
            Ok(0) => return Ok(()),
            Ok(n) => filled += n,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                continue;
            }
            Err(e) => return Err(io_err(e)),
        }
        if filled < FRAME_LEN {
            continue;
        }
        filled = 0;

        let frame = Frame::decode(&buf)?;
        if let Some(reply) = handle_frame(&frame, physics, panel) {
            stream.write_all(reply.as_bytes()).map_err(io_err)?;
        }
    }
    Ok(())
}

/// Apply one frame to the simulated lift; returns the reply for queries.
///
/// Payloads out of range are ignored the way the physical lift ignores
/// them: fire frames change nothing, queries read as not pressed.
pub fn handle_frame(frame: &Frame, physics: &PhysicsEngine, panel: &Panel) -> Option<Reply> {
    let [p0, p1, p2] = frame.payload;
    debug!("Frame {:?} {:?}", frame.opcode, frame.payload);

    match frame.opcode {
        Opcode::MotorDirection => {
            match frame.direction() {
                Ok(direction) => {
                    physics.set_direction(direction.as_i32());
                }
                Err(e) => warn!("{}", e),
            }
            None
        }
        Opcode::OrderButtonLight => {
            if let Ok(button) = frame.button() {
                panel.set_order_lamp(button, p1, p2 != 0);
            }
            None
        }
        Opcode::FloorIndicator => {
            panel.set_floor_indicator(p0);
            None
        }
        Opcode::DoorLight => {
            panel.set_door_light(p0 != 0);
            None
        }
        Opcode::StopLight => {
            panel.set_stop_light(p0 != 0);
            None
        }
        Opcode::OrderButton => {
            let pressed = frame
                .button()
                .is_ok_and(|button| panel.order_button(button, p1));
            Some(Reply::flag(Opcode::OrderButton, pressed))
        }
        Opcode::FloorSensor => Some(Reply::sensor(physics.floor_sensor())),
        Opcode::StopButton => Some(Reply::flag(Opcode::StopButton, panel.stop_button())),
        Opcode::Obstruction => Some(Reply::flag(Opcode::Obstruction, panel.obstruction())),
    }
}
