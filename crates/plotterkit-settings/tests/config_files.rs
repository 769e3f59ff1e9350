use plotterkit_settings::{ConfigError, PlotterConfig, SettingsError};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_or_create_writes_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.ini");

    let config = PlotterConfig::load_or_create(&path).unwrap();

    assert!(path.exists());
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("[GCodeSettings]"));
    assert!(text.contains("usb_port = /dev/ttyAMA10"));
    assert_eq!(config.connection.usb_port, "/dev/ttyAMA10");
    assert_eq!(config.pen.travel_position_mm, 5.0);
}

#[test]
fn test_load_toml_with_overrides() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plotter.toml");
    fs::write(
        &path,
        r#"
[GCodeSettings]
pen_down_position_mm = -2.5
pen_travel_position_mm = 3
pen_feed_rate_mm_min = 1500
min_plot_x = 0
max_plot_x = 300
min_plot_y = 0
max_plot_y = 200
usb_port = "/dev/ttyUSB0"
baud_rate = 250000
passes = 1
gcode_folder = "queue"
"#,
    )
    .unwrap();

    let config = PlotterConfig::load_from_file(&path).unwrap();

    assert_eq!(config.pen.down_position_mm, -2.5);
    assert_eq!(config.pen.passes, 1);
    assert_eq!(config.plot_area.width(), 300.0);
    assert_eq!(config.connection.baud_rate, 250000);
    assert_eq!(config.folders.gcode, std::path::PathBuf::from("queue"));
}

#[test]
fn test_missing_required_key_in_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(&path, r#"{"usb_port": "/dev/ttyUSB0", "baud_rate": 115200}"#).unwrap();

    let err = PlotterConfig::load_from_file(&path).unwrap_err();
    assert!(matches!(
        err,
        SettingsError::Config(ConfigError::MissingKey(ref key)) if key == "pen_down_position_mm"
    ));
}

#[test]
fn test_unsupported_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(&path, "usb_port: x").unwrap();

    assert!(matches!(
        PlotterConfig::load_from_file(&path),
        Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
    ));
}
