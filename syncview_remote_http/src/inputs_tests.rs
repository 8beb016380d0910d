use syncview_core::glam::Vec3;
use super::*;

const LISTING: &str = r#"{
    "count": 2,
    "cameras": [
        { "position": [1, 2, 3], "target": [0, 0, 0], "up": [0, 1, 0], "fov": 60 },
        { "position": [-1.3, 0.5, 4], "target": [0, 0, 0], "up": [0, 1, 0], "fov": 45.5 }
    ]
}"#;

#[test]
fn test_listing_parses() {
    let info = InputsInfo::from_json_str(LISTING).unwrap();

    assert_eq!(info.count, 2);
    assert_eq!(info.camera(1).unwrap().position, Vec3::new(-1.3, 0.5, 4.0));
    assert!(info.camera(2).is_none());
}

#[test]
fn test_listing_without_cameras() {
    let info = InputsInfo::from_json_str(r#"{ "count": 0 }"#).unwrap();
    assert_eq!(info.count, 0);
    assert!(info.cameras.is_empty());
}

#[test]
fn test_malformed_listing_is_remote_failure() {
    assert!(matches!(
        InputsInfo::from_json_str(r#"{ "cameras": [] }"#),
        Err(Error::RemoteRequestFailed(_))
    ));
}

#[test]
fn test_captions() {
    let info = InputsInfo::from_json_str(LISTING).unwrap();
    assert_eq!(info.caption(0).as_deref(), Some("#0 pos=(1.0,2.0,3.0) fov=60"));
    assert_eq!(info.caption(1).as_deref(), Some("#1 pos=(-1.3,0.5,4.0) fov=45.5"));
    assert_eq!(info.caption(5), None);
}

#[test]
fn test_urls_ignore_trailing_slash() {
    assert_eq!(inputs_url("http://localhost:7007/"), "http://localhost:7007/inputs");
    assert_eq!(input_image_url("http://localhost:7007", 3), "http://localhost:7007/inputs/image/3");
    assert_eq!(input_image_url("http://nerf/", 0), "http://nerf/inputs/image/0");
}

#[test]
#[ignore] // Requires a render server on localhost:7007
fn test_live_health() {
    assert!(check_health("http://localhost:7007").unwrap());
}
