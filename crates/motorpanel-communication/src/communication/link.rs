//! Serial link manager
//!
//! Owns the single connection to the controller board. A background
//! listener thread polls the port for input and publishes every complete
//! line; writes happen on the caller's thread. Both sides share the port
//! through a mutex, and the listener only ever reads bytes that are
//! already buffered, so a write never waits behind a blocking read.

use crate::communication::serial::{NativePortOpener, PortOpener, SerialPort};
use crate::communication::{ConnectionParams, LineSink};
use motorpanel_core::{Error, EventDispatcher, PanelEvent, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type SharedPort = Arc<Mutex<Box<dyn SerialPort>>>;

/// Largest chunk the listener pulls off the port per poll
const READ_CHUNK: usize = 1024;

struct ActiveConnection {
    device: String,
    port: SharedPort,
    stop: Arc<AtomicBool>,
    listener: Option<JoinHandle<()>>,
}

/// Connection manager for the controller's serial link
pub struct SerialLink {
    params: ConnectionParams,
    opener: Box<dyn PortOpener>,
    events: EventDispatcher,
    connection: Mutex<Option<ActiveConnection>>,
    /// Serializes connect calls from open through install
    connecting: Mutex<()>,
}

impl SerialLink {
    /// Create a link using the system's serial ports
    pub fn new(params: ConnectionParams, events: EventDispatcher) -> Self {
        Self::with_opener(params, events, Box::new(NativePortOpener))
    }

    /// Create a link with a custom port opener
    pub fn with_opener(
        params: ConnectionParams,
        events: EventDispatcher,
        opener: Box<dyn PortOpener>,
    ) -> Self {
        Self {
            params,
            opener,
            events,
            connection: Mutex::new(None),
            connecting: Mutex::new(()),
        }
    }

    /// Connection parameters in use
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Open `device` and start the background listener
    ///
    /// An existing connection is closed first. Concurrent calls are
    /// serialized, so only the last one to finish stays connected.
    pub fn connect(&self, device: &str) -> Result<()> {
        let _connecting = self.connecting.lock();
        self.disconnect();

        let port = self.opener.open(device, &self.params)?;
        let port: SharedPort = Arc::new(Mutex::new(port));
        let stop = Arc::new(AtomicBool::new(false));

        let listener = {
            let port = port.clone();
            let stop = stop.clone();
            let events = self.events.clone();
            let poll = self.params.listener_poll();
            thread::Builder::new()
                .name("serial-listener".to_string())
                .spawn(move || listen(port, stop, events, poll))?
        };

        *self.connection.lock() = Some(ActiveConnection {
            device: device.to_string(),
            port,
            stop,
            listener: Some(listener),
        });

        tracing::info!(
            "Connected to {} @ {} baud",
            device,
            self.params.baud_rate
        );
        self.events.publish(PanelEvent::Connected {
            port: device.to_string(),
            baud_rate: self.params.baud_rate,
        });
        Ok(())
    }

    /// Stop the listener and close the port
    ///
    /// Blocks until the listener thread has exited. Does nothing when no
    /// connection is open.
    pub fn disconnect(&self) {
        let Some(mut connection) = self.connection.lock().take() else {
            return;
        };

        connection.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = connection.listener.take() {
            if handle.join().is_err() {
                tracing::error!("Serial listener for {} panicked", connection.device);
            }
        }

        if let Err(e) = connection.port.lock().close() {
            tracing::warn!("Error closing {}: {}", connection.device, e);
        }

        tracing::info!("Disconnected from {}", connection.device);
        self.events.publish(PanelEvent::Disconnected);
    }

    /// Whether a connection is open
    pub fn is_connected(&self) -> bool {
        self.connection.lock().is_some()
    }

    /// Device the link is connected to
    pub fn device(&self) -> Option<String> {
        self.connection
            .lock()
            .as_ref()
            .map(|connection| connection.device.clone())
    }

    /// Send one line, appending the newline terminator
    ///
    /// The connection stays locked for the write, so a concurrent
    /// disconnect waits for it instead of closing the port underneath.
    pub fn send(&self, line: &str) -> Result<()> {
        let guard = self.connection.lock();
        let connection = guard.as_ref().ok_or(Error::NotConnected)?;

        let data = format!("{}\n", line);
        connection.port.lock().write(data.as_bytes()).map_err(|e| {
            tracing::error!("Failed to send '{}': {}", line, e);
            Error::write(line, e)
        })?;

        tracing::debug!(">>> {}", line);
        self.events.publish(PanelEvent::LineSent(line.to_string()));
        Ok(())
    }
}

impl LineSink for SerialLink {
    fn send_line(&self, line: &str) -> Result<()> {
        self.send(line)
    }

    fn is_connected(&self) -> bool {
        SerialLink::is_connected(self)
    }
}

impl Drop for SerialLink {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Background listener loop
///
/// Runs until `stop` is set or the port reports an error.
fn listen(
    port: SharedPort,
    stop: Arc<AtomicBool>,
    events: EventDispatcher,
    poll: std::time::Duration,
) {
    let mut pending: Vec<u8> = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    while !stop.load(Ordering::SeqCst) {
        let read = {
            let mut port = port.lock();
            match port.bytes_available() {
                Ok(0) => Ok(0),
                Ok(available) => port.read(&mut chunk[..available.min(READ_CHUNK)]),
                Err(e) => Err(e),
            }
        };

        match read {
            Ok(0) => thread::sleep(poll),
            Ok(n) => {
                pending.extend_from_slice(&chunk[..n]);
                for line in drain_lines(&mut pending) {
                    tracing::debug!("<<< {}", line);
                    events.publish(PanelEvent::LineReceived(line));
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => thread::sleep(poll),
            Err(e) => {
                tracing::warn!(
                    "Serial read error on {}, listener stopping: {}",
                    port.lock().name(),
                    e
                );
                break;
            }
        }
    }

    tracing::debug!("Serial listener exited");
}

/// Remove every complete line from `pending`
///
/// Invalid UTF-8 is dropped, trailing whitespace stripped, and empty
/// lines skipped. An incomplete tail stays in the buffer.
fn drain_lines(pending: &mut Vec<u8>) -> Vec<String> {
    let mut lines = Vec::new();
    while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
        let raw: Vec<u8> = pending.drain(..=pos).collect();
        let decoded: String = raw[..pos].utf8_chunks().map(|chunk| chunk.valid()).collect();
        let line = decoded.trim_end();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    lines
}
