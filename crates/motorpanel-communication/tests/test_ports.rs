//! Port enumeration against the host's real serial devices

use motorpanel_communication::{list_ports, select_port, SerialPortInfo};
use motorpanel_core::{ConnectionError, Error};

fn host_ports() -> Option<Vec<SerialPortInfo>> {
    match list_ports() {
        Ok(ports) => Some(ports),
        // Containers without udev cannot enumerate at all.
        Err(Error::Connection(ConnectionError::Enumeration { .. })) => None,
        Err(e) => panic!("unexpected error listing ports: {}", e),
    }
}

#[test]
fn test_list_ports_snapshot() {
    let Some(ports) = host_ports() else {
        return;
    };

    for port in &ports {
        assert!(!port.port_name.is_empty());
        assert!(port.label().starts_with(&port.port_name));
    }
}

#[test]
fn test_select_from_host_ports() {
    let Some(ports) = host_ports() else {
        return;
    };

    match select_port(&ports, None) {
        Ok(port) => assert_eq!(port.port_name, ports[0].port_name),
        Err(Error::PortEnumerationEmpty) => assert!(ports.is_empty()),
        Err(e) => panic!("unexpected error: {}", e),
    }
}
