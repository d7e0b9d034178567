//! Bridge client: one connection to the simulator.

use super::coordinator::CoordinatorHandle;
use super::frame::{Frame, Reply};
use lift_common::hal::driver::LiftError;
use std::net::TcpStream;
use std::time::Duration;
use tracing::{debug, info};

/// Connection to a simulator endpoint.
#[derive(Debug)]
pub struct BridgeClient {
    addr: String,
    coordinator: CoordinatorHandle,
}

impl BridgeClient {
    /// Dial `addr` once and start the coordinator.
    ///
    /// A failed dial is reported as [`LiftError::Connect`] and not retried.
    pub fn connect(addr: &str, query_timeout: Duration) -> Result<Self, LiftError> {
        let stream = TcpStream::connect(addr).map_err(|source| LiftError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        info!("Connected to simulator at {}", addr);
        Ok(Self {
            addr: addr.to_string(),
            coordinator: CoordinatorHandle::spawn(stream, query_timeout)?,
        })
    }

    /// Endpoint this client dialed.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send a fire frame.
    pub fn fire(&self, frame: Frame) -> Result<(), LiftError> {
        debug!("fire {:?} {:?}", frame.opcode, frame.payload);
        self.coordinator.fire(frame)
    }

    /// Send a query frame and wait for the reply.
    pub fn query(&self, frame: Frame) -> Result<Reply, LiftError> {
        debug!("query {:?} {:?}", frame.opcode, frame.payload);
        self.coordinator.query(frame)
    }

    /// Whether the connection is still being served.
    pub fn is_connected(&self) -> bool {
        self.coordinator.is_connected()
    }
}
