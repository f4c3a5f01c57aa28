//! Tests for the serial link manager using an in-memory port

use motorpanel_communication::{
    send_command, Axis, ConnectionParams, Direction, MotorCommand, PortOpener, SerialLink,
    SerialPort,
};
use motorpanel_core::{ConnectionError, Error, EventDispatcher, EventReceiver, PanelEvent};
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct PortState {
    written: Vec<String>,
    incoming: VecDeque<u8>,
    fail_write_at: Option<usize>,
    fail_reads: bool,
    closed: bool,
    polls: usize,
    write_delay: Option<Duration>,
}

#[derive(Clone, Default)]
struct MockPort {
    state: Arc<Mutex<PortState>>,
}

impl MockPort {
    fn push_incoming(&self, data: &[u8]) {
        self.state.lock().unwrap().incoming.extend(data);
    }

    fn written(&self) -> Vec<String> {
        self.state.lock().unwrap().written.clone()
    }

    fn polls(&self) -> usize {
        self.state.lock().unwrap().polls
    }
}

impl SerialPort for MockPort {
    fn write(&mut self, data: &[u8]) -> io::Result<()> {
        let delay = self.state.lock().unwrap().write_delay;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        let mut state = self.state.lock().unwrap();
        let attempt = state.written.len() + 1;
        if state.fail_write_at == Some(attempt) {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "write timed out"));
        }
        state.written.push(String::from_utf8_lossy(data).to_string());
        Ok(())
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        state.polls += 1;
        if state.fail_reads {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"));
        }
        Ok(state.incoming.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        let n = buf.len().min(state.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(state.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn name(&self) -> String {
        "mock".to_string()
    }

    fn close(&mut self) -> io::Result<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

struct MockOpener {
    port: MockPort,
    busy: Vec<String>,
}

impl PortOpener for MockOpener {
    fn open(
        &self,
        device: &str,
        _params: &ConnectionParams,
    ) -> motorpanel_core::Result<Box<dyn SerialPort>> {
        if self.busy.iter().any(|d| d == device) {
            return Err(ConnectionError::PortInUse {
                port: device.to_string(),
            }
            .into());
        }
        Ok(Box::new(self.port.clone()))
    }
}

/// Takes a while to open and hands out a fresh port per call
#[derive(Clone, Default)]
struct SlowOpener {
    opened: Arc<Mutex<Vec<MockPort>>>,
}

impl PortOpener for SlowOpener {
    fn open(
        &self,
        _device: &str,
        _params: &ConnectionParams,
    ) -> motorpanel_core::Result<Box<dyn SerialPort>> {
        std::thread::sleep(Duration::from_millis(100));
        let port = MockPort::default();
        self.opened.lock().unwrap().push(port.clone());
        Ok(Box::new(port))
    }
}

fn mock_link() -> (SerialLink, MockPort, EventReceiver) {
    let port = MockPort::default();
    let (events, rx) = EventDispatcher::channel();
    let params = ConnectionParams {
        listener_poll_ms: 5,
        ..ConnectionParams::default()
    };
    let opener = MockOpener {
        port: port.clone(),
        busy: vec!["/dev/ttyBUSY".to_string()],
    };
    (SerialLink::with_opener(params, events, Box::new(opener)), port, rx)
}

async fn next_event(rx: &mut EventReceiver) -> PanelEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

#[tokio::test]
async fn test_connect_and_receive_lines() {
    let (link, port, mut rx) = mock_link();

    link.connect("/dev/ttyACM0").unwrap();
    assert!(link.is_connected());
    assert_eq!(link.device().as_deref(), Some("/dev/ttyACM0"));
    assert_eq!(
        next_event(&mut rx).await,
        PanelEvent::Connected {
            port: "/dev/ttyACM0".to_string(),
            baud_rate: 115_200,
        }
    );

    port.push_incoming(b"Motor X ready\r\n\r\nspe");
    assert_eq!(
        next_event(&mut rx).await,
        PanelEvent::LineReceived("Motor X ready".to_string())
    );

    port.push_incoming(b"ed=800\n");
    assert_eq!(
        next_event(&mut rx).await,
        PanelEvent::LineReceived("speed=800".to_string())
    );

    link.disconnect();
    assert_eq!(next_event(&mut rx).await, PanelEvent::Disconnected);
}

#[tokio::test]
async fn test_send_appends_newline_and_echoes() {
    let (link, port, mut rx) = mock_link();
    link.connect("/dev/ttyACM0").unwrap();
    next_event(&mut rx).await;

    link.send("G1 X10").unwrap();

    assert_eq!(port.written(), vec!["G1 X10\n"]);
    assert_eq!(
        next_event(&mut rx).await,
        PanelEvent::LineSent("G1 X10".to_string())
    );
}

#[test]
fn test_send_when_disconnected() {
    let (link, port, _rx) = mock_link();
    assert!(matches!(link.send("x"), Err(Error::NotConnected)));
    assert!(port.written().is_empty());
}

#[test]
fn test_disconnect_is_idempotent() {
    let (link, port, _rx) = mock_link();
    link.disconnect();

    link.connect("/dev/ttyACM0").unwrap();
    link.disconnect();
    link.disconnect();

    assert!(!link.is_connected());
    assert!(port.state.lock().unwrap().closed);
    assert!(matches!(link.send("x"), Err(Error::NotConnected)));
}

#[test]
fn test_connect_busy_port() {
    let (link, _port, _rx) = mock_link();
    let err = link.connect("/dev/ttyBUSY").unwrap_err();
    assert!(matches!(
        err,
        Error::Connection(ConnectionError::PortInUse { .. })
    ));
    assert!(!link.is_connected());
}

#[test]
fn test_reconnect_replaces_connection() {
    let (link, _port, _rx) = mock_link();
    link.connect("/dev/ttyACM0").unwrap();
    link.connect("/dev/ttyACM1").unwrap();
    assert_eq!(link.device().as_deref(), Some("/dev/ttyACM1"));
}

#[test]
fn test_write_failure_names_line() {
    let (link, port, _rx) = mock_link();
    port.state.lock().unwrap().fail_write_at = Some(1);
    link.connect("/dev/ttyACM0").unwrap();

    let err = link.send("m=400").unwrap_err();
    assert_eq!(err.failed_line(), Some("m=400"));
}

#[test]
fn test_read_error_stops_listener_quietly() {
    let (link, port, _rx) = mock_link();
    link.connect("/dev/ttyACM0").unwrap();
    port.state.lock().unwrap().fail_reads = true;
    std::thread::sleep(Duration::from_millis(50));

    // The session survives; writes keep working.
    assert!(link.is_connected());
    port.state.lock().unwrap().fail_reads = false;
    link.send("w").unwrap();
    assert_eq!(port.written(), vec!["w\n"]);
    link.disconnect();
}

#[test]
fn test_send_command_sequence() {
    let (link, port, _rx) = mock_link();
    link.connect("/dev/ttyACM0").unwrap();

    let cmd = MotorCommand::jog(Axis::Y, Direction::Backward, "600", "1500").unwrap();
    send_command(&link, &cmd).unwrap();
    send_command(&link, &MotorCommand::servo("45").unwrap()).unwrap();

    assert_eq!(
        port.written(),
        vec!["y\n", "v=600\n", "n=1500\n", "s\n", "p=45\n"]
    );
}

#[test]
fn test_send_command_stops_at_failed_line() {
    let (link, port, _rx) = mock_link();
    port.state.lock().unwrap().fail_write_at = Some(2);
    link.connect("/dev/ttyACM0").unwrap();

    let cmd = MotorCommand::jog(Axis::X, Direction::Forward, "300", "").unwrap();
    let err = send_command(&link, &cmd).unwrap_err();

    assert_eq!(err.failed_line(), Some("v=300"));
    assert_eq!(port.written(), vec!["x\n"]);
}

#[test]
fn test_send_command_not_connected() {
    let (link, port, _rx) = mock_link();
    let err = send_command(&link, &MotorCommand::stop(Axis::Z)).unwrap_err();
    assert!(matches!(err, Error::NotConnected));
    assert!(port.written().is_empty());
}

#[test]
fn test_concurrent_connects_leave_no_listener_behind() {
    let opener = SlowOpener::default();
    let params = ConnectionParams {
        listener_poll_ms: 5,
        ..ConnectionParams::default()
    };
    let link = Arc::new(SerialLink::with_opener(
        params,
        EventDispatcher::disabled(),
        Box::new(opener.clone()),
    ));

    let handles: Vec<_> = ["/dev/ttyA", "/dev/ttyB"]
        .into_iter()
        .map(|device| {
            let link = link.clone();
            std::thread::spawn(move || link.connect(device))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }
    assert!(link.is_connected());

    link.disconnect();
    assert!(!link.is_connected());

    let ports = opener.opened.lock().unwrap().clone();
    assert_eq!(ports.len(), 2);
    let polls_at_disconnect: Vec<usize> = ports.iter().map(MockPort::polls).collect();
    std::thread::sleep(Duration::from_millis(100));
    let polls_later: Vec<usize> = ports.iter().map(MockPort::polls).collect();
    assert_eq!(polls_later, polls_at_disconnect);
    assert!(ports.iter().all(|port| port.state.lock().unwrap().closed));
}

#[test]
fn test_disconnect_waits_for_write_in_flight() {
    let (link, port, _rx) = mock_link();
    let link = Arc::new(link);
    link.connect("/dev/ttyACM0").unwrap();
    port.state.lock().unwrap().write_delay = Some(Duration::from_millis(100));

    let sender = {
        let link = link.clone();
        std::thread::spawn(move || link.send("x"))
    };
    std::thread::sleep(Duration::from_millis(20));
    link.disconnect();

    // Only the test's handle and the opener's template remain
    assert_eq!(Arc::strong_count(&port.state), 2);
    assert!(sender.join().unwrap().is_ok());
    assert_eq!(port.written(), vec!["x\n"]);
    assert!(port.state.lock().unwrap().closed);
}
