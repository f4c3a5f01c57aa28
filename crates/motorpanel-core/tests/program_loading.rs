//! Tests for loading programs from disk

use motorpanel_core::{Error, LineKind, Program};
use std::io::Write;

#[test]
fn test_load_program_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".gcode")
        .tempfile()
        .unwrap();
    writeln!(file, "; spiral test").unwrap();
    writeln!(file, "G21").unwrap();
    writeln!(file).unwrap();
    writeln!(file, "G1 X10 Y10 F300").unwrap();

    let program = Program::load(file.path()).unwrap();

    // Runs count all four lines, the load summary only the non-empty ones.
    assert_eq!(program.len(), 4);
    assert_eq!(program.loaded_line_count(), 3);
    assert_eq!(
        LineKind::classify(&program.lines()[3]).command(),
        Some("G1 X10 Y10 F300")
    );
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = Program::load(&dir.path().join("missing.nc"));
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_extension_not_enforced() {
    let mut file = tempfile::Builder::new().suffix(".cfg").tempfile().unwrap();
    write!(file, "G28").unwrap();

    let program = Program::load(file.path()).unwrap();
    assert_eq!(program.command_count(), 1);
}
