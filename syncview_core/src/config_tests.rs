use std::time::Duration;
use super::*;

// ============================================================================
// Color
// ============================================================================

#[test]
fn test_color_from_hex_with_hash() {
    let color = Color::from_hex("#0b0e12").unwrap();
    assert_eq!(color, Color::rgb(0x0b, 0x0e, 0x12));
}

#[test]
fn test_color_from_hex_without_hash() {
    assert_eq!(Color::from_hex("FF8000").unwrap(), Color::rgb(255, 128, 0));
}

#[test]
fn test_color_rejects_bad_input() {
    assert!(matches!(Color::from_hex("#12345"), Err(Error::InvalidColor(_))));
    assert!(matches!(Color::from_hex("#gg0000"), Err(Error::InvalidColor(_))));
    assert!(matches!(Color::from_hex(""), Err(Error::InvalidColor(_))));
}

#[test]
fn test_color_display_is_lower_hex() {
    assert_eq!(Color::rgb(0xAB, 0x01, 0xFF).to_string(), "#ab01ff");
}

#[test]
fn test_color_linear_rgb() {
    let rgb = Color::rgb(255, 0, 51).to_linear_rgb();
    assert_eq!(rgb[0], 1.0);
    assert_eq!(rgb[1], 0.0);
    assert!((rgb[2] - 0.2).abs() < 1e-6);
}

// ============================================================================
// ViewerConfig
// ============================================================================

#[test]
fn test_viewer_config_defaults() {
    let config = ViewerConfig::default();
    assert_eq!(config.initial_driver.as_deref(), Some("mesh"));
    assert_eq!(config.background, Color::rgb(0x0b, 0x0e, 0x12));
    assert_eq!(config.point_size, 1.5);
    assert_eq!(config.remote.request_timeout(), Some(Duration::from_secs(10)));
    assert!(!config.remote.coalesce_pending);
}

#[test]
fn test_viewer_config_partial_json() {
    let config = ViewerConfig::from_json_str(
        r##"{ "background": "#ffffff", "remote": { "coalescePending": true, "requestTimeoutMs": null } }"##,
    ).unwrap();

    assert_eq!(config.background, Color::rgb(255, 255, 255));
    assert!(config.remote.coalesce_pending);
    assert_eq!(config.remote.request_timeout(), None);
    assert_eq!(config.remote.frame_width, 960);
    assert_eq!(config.initial_driver.as_deref(), Some("mesh"));
}

#[test]
fn test_viewer_config_bad_color_is_invalid_config() {
    let result = ViewerConfig::from_json_str(r#"{ "background": "blue" }"#);
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}

#[test]
fn test_viewer_config_missing_file() {
    let result = ViewerConfig::load(std::path::Path::new("/nonexistent/syncview.json"));
    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}
