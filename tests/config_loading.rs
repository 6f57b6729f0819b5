//! Loading configuration files and environment overrides.

use pretty_assertions::assert_eq;
use serial_byte_writer::codec::InputFormat;
use serial_byte_writer::config::{ConfigError, ConfigLoader, LogFormat};
use serial_byte_writer::port::Parity;
use serial_test::serial;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp config");
    file.write_all(contents.as_bytes()).expect("write temp config");
    file
}

#[test]
#[serial]
fn loads_file_and_keeps_defaults() {
    let file = write_config(
        r#"
        [serial]
        port = "bpod"
        baud = 9600
        parity = "even"

        [serial.port_aliases]
        bpod = "/dev/ttyACM0"

        [logging]
        format = "json"
        "#,
    );

    let loader = ConfigLoader::load_from(file.path()).unwrap();
    let config = loader.config();

    assert_eq!(loader.config_path.as_deref(), Some(file.path()));
    assert_eq!(config.serial.baud, 9600);
    assert_eq!(config.serial.parity, Parity::Even);
    assert_eq!(config.serial.resolve_port("bpod"), "/dev/ttyACM0");
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.input.format, InputFormat::Text);
    assert_eq!(config.serial.timeout_ms, 1000);
}

#[test]
#[serial]
fn env_overrides_file_values() {
    let file = write_config("[serial]\nbaud = 9600\n");
    std::env::set_var("SERIAL_WRITER_SERIAL_BAUD", "230400");
    std::env::set_var("SERIAL_WRITER_LOGGING_FORMAT", "pretty");

    let result = ConfigLoader::load_from(file.path());

    std::env::remove_var("SERIAL_WRITER_SERIAL_BAUD");
    std::env::remove_var("SERIAL_WRITER_LOGGING_FORMAT");

    let config = result.unwrap().into_config();
    assert_eq!(config.serial.baud, 230400);
    assert_eq!(config.logging.format, LogFormat::Pretty);
}

#[test]
#[serial]
fn invalid_toml_is_a_parse_error() {
    let file = write_config("[serial\nbaud = ");
    let err = ConfigLoader::load_from(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ParseError(_)));
}

#[test]
#[serial]
fn zero_baud_fails_validation() {
    let file = write_config("[serial]\nbaud = 0\n");
    let err = ConfigLoader::load_from(file.path()).unwrap_err();
    assert!(err.to_string().contains("serial.baud"));
}

#[test]
#[serial]
fn saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("serial-writer.toml");

    let mut loader = ConfigLoader::with_defaults();
    loader.config_mut().serial.port = Some("COM7".to_string());
    loader.config_mut().input.format = InputFormat::Hex;
    loader.save_to(&path).unwrap();

    let reloaded = ConfigLoader::load_from(&path).unwrap().into_config();
    assert_eq!(&reloaded, loader.config());
}
