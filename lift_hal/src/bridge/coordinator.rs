//! Connection coordinator.
//!
//! One thread owns the socket. Callers hand it frames over two rendezvous
//! channels, one for fire frames and one for queries, and the thread
//! serves whichever is ready first:
//!
//! ```text
//!   fire_tx  ──┐
//!              ├─► select! ─► write frame ─► (query) read 4 bytes ─► reply_tx
//!   query_tx ──┘
//! ```
//!
//! A query carries its own one-shot reply channel, so each reply reaches
//! the caller that asked for it. At most one query is on the wire at any
//! time. A failed exchange (timeout, short read, wrong echo) leaves the
//! byte stream in an unknown state; the coordinator then closes the socket
//! and every later call fails with [`LiftError::Disconnected`].

use super::frame::{Frame, FrameClass, Reply};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, bounded, select};
use lift_common::consts::FRAME_LEN;
use lift_common::hal::driver::{LiftError, ProtocolError};
use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::ops::ControlFlow;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, trace, warn};

/// Extra time a caller waits beyond the socket timeout before giving up.
const REPLY_GRACE: Duration = Duration::from_millis(100);

/// A query and the channel its reply goes back on.
struct QueryRequest {
    frame: Frame,
    reply: Sender<Result<Reply, LiftError>>,
}

impl std::fmt::Debug for QueryRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryRequest").field("frame", &self.frame).finish()
    }
}

/// Socket owner running on its own thread.
struct Coordinator {
    stream: TcpStream,
    query_timeout: Duration,
}

impl Coordinator {
    /// Start the coordinator thread for an established connection.
    fn spawn(stream: TcpStream, query_timeout: Duration) -> Result<CoordinatorHandle, LiftError> {
        let io_err = |e: std::io::Error| LiftError::Io(e.to_string());
        stream.set_nodelay(true).map_err(io_err)?;
        let control = stream.try_clone().map_err(io_err)?;

        let (fire_tx, fire_rx) = bounded(0);
        let (query_tx, query_rx) = bounded(0);
        let coordinator = Coordinator {
            stream,
            query_timeout,
        };

        let thread = thread::Builder::new()
            .name("lift-bridge".to_string())
            .spawn(move || coordinator.run(&fire_rx, &query_rx))
            .map_err(io_err)?;

        Ok(CoordinatorHandle {
            fire_tx: Some(fire_tx),
            query_tx: Some(query_tx),
            query_timeout,
            control,
            thread: Some(thread),
        })
    }

    fn run(mut self, fire_rx: &Receiver<Frame>, query_rx: &Receiver<QueryRequest>) {
        info!(
            "Bridge coordinator started (peer={:?}, query_timeout={:?})",
            self.stream.peer_addr().ok(),
            self.query_timeout
        );

        loop {
            let step = select! {
                recv(fire_rx) -> msg => match msg {
                    Ok(frame) => self.serve_fire(frame),
                    Err(_) => ControlFlow::Break(()),
                },
                recv(query_rx) -> msg => match msg {
                    Ok(request) => self.serve_query(request),
                    Err(_) => ControlFlow::Break(()),
                },
            };
            if step.is_break() {
                break;
            }
        }

        // Peer may already be gone.
        let _ = self.stream.shutdown(Shutdown::Both);
        info!("Bridge coordinator stopped");
    }

    fn serve_fire(&mut self, frame: Frame) -> ControlFlow<()> {
        match self.write_frame(&frame) {
            Ok(()) => ControlFlow::Continue(()),
            Err(err) => {
                warn!("Fire frame {:?} failed, closing connection: {}", frame.opcode, err);
                ControlFlow::Break(())
            }
        }
    }

    fn serve_query(&mut self, request: QueryRequest) -> ControlFlow<()> {
        let result = self.exchange(&request.frame);
        let poisoned = result.is_err();
        if let Err(err) = &result {
            warn!("Query {:?} failed, closing connection: {}", request.frame.opcode, err);
        }
        if request.reply.send(result).is_err() {
            debug!("Caller of query {:?} stopped waiting", request.frame.opcode);
        }
        if poisoned {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    fn exchange(&mut self, frame: &Frame) -> Result<Reply, LiftError> {
        self.write_frame(frame)?;
        let bytes = self.read_reply(frame)?;
        let reply = Reply::from_bytes(&bytes)?;
        reply.check_echo(frame.opcode)?;
        trace!("Reply {:?} <- {:?}", frame.opcode, reply.as_bytes());
        Ok(reply)
    }

    fn write_frame(&mut self, frame: &Frame) -> Result<(), LiftError> {
        trace!("Frame -> {:?}", frame.encode());
        self.stream
            .write_all(&frame.encode())
            .map_err(|e| LiftError::Io(e.to_string()))
    }

    /// Read exactly one reply, bounded by `query_timeout` in total.
    fn read_reply(&mut self, frame: &Frame) -> Result<[u8; FRAME_LEN], LiftError> {
        let timeout = LiftError::Timeout {
            opcode: frame.opcode.as_u8(),
            waited: self.query_timeout,
        };
        let deadline = Instant::now() + self.query_timeout;
        let mut buf = [0u8; FRAME_LEN];
        let mut filled = 0;

        while filled < FRAME_LEN {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(timeout);
            }
            self.stream
                .set_read_timeout(Some(remaining))
                .map_err(|e| LiftError::Io(e.to_string()))?;

            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(ProtocolError::ShortFrame {
                        expected: FRAME_LEN,
                        actual: filled,
                    }
                    .into());
                }
                Ok(n) => filled += n,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(timeout);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(LiftError::Io(e.to_string())),
            }
        }
        Ok(buf)
    }
}

/// Caller side of a coordinator.
///
/// Shared by reference between threads. Dropping it closes the connection
/// and joins the coordinator thread.
#[derive(Debug)]
pub struct CoordinatorHandle {
    fire_tx: Option<Sender<Frame>>,
    query_tx: Option<Sender<QueryRequest>>,
    query_timeout: Duration,
    control: TcpStream,
    thread: Option<JoinHandle<()>>,
}

impl CoordinatorHandle {
    /// Take over `stream` and start serving it.
    pub fn spawn(stream: TcpStream, query_timeout: Duration) -> Result<Self, LiftError> {
        Coordinator::spawn(stream, query_timeout)
    }

    /// Hand a fire frame to the coordinator.
    ///
    /// Returns once the coordinator has taken the frame; no reply follows.
    /// Query frames are rejected with [`LiftError::InvalidArgument`]; their
    /// reply would be left unread on the wire.
    pub fn fire(&self, frame: Frame) -> Result<(), LiftError> {
        check_class(&frame, FrameClass::Fire)?;
        let tx = self.fire_tx.as_ref().ok_or(LiftError::Disconnected)?;
        tx.send(frame).map_err(|_| LiftError::Disconnected)
    }

    /// Send a query and wait for its reply.
    ///
    /// Fire frames are rejected with [`LiftError::InvalidArgument`].
    pub fn query(&self, frame: Frame) -> Result<Reply, LiftError> {
        check_class(&frame, FrameClass::Query)?;
        let tx = self.query_tx.as_ref().ok_or(LiftError::Disconnected)?;
        let (reply_tx, reply_rx) = bounded(1);
        tx.send(QueryRequest {
            frame,
            reply: reply_tx,
        })
        .map_err(|_| LiftError::Disconnected)?;

        let waited = self.query_timeout + REPLY_GRACE;
        match reply_rx.recv_timeout(waited) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(LiftError::Timeout {
                opcode: frame.opcode.as_u8(),
                waited,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(LiftError::Disconnected),
        }
    }

    /// Whether the coordinator thread is still serving.
    pub fn is_connected(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }
}

fn check_class(frame: &Frame, expected: FrameClass) -> Result<(), LiftError> {
    if frame.class() != expected {
        return Err(LiftError::InvalidArgument(format!(
            "{:?} is a {:?} frame, expected {:?}",
            frame.opcode,
            frame.class(),
            expected
        )));
    }
    Ok(())
}

impl Drop for CoordinatorHandle {
    fn drop(&mut self) {
        self.fire_tx.take();
        self.query_tx.take();
        let _ = self.control.shutdown(Shutdown::Both);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Bridge coordinator thread panicked");
            }
        }
    }
}
