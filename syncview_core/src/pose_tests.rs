use glam::Vec3;
use super::*;

#[test]
fn test_pose_default() {
    let pose = CameraPose::default();
    assert_eq!(pose.position, Vec3::new(2.0, 2.0, 2.0));
    assert_eq!(pose.target, Vec3::ZERO);
    assert_eq!(pose.up, Vec3::Y);
    assert_eq!(pose.fov, 60.0);
}

#[test]
fn test_pose_is_copied_not_shared() {
    let original = CameraPose::default();
    let mut copy = original;
    copy.fov = 30.0;
    assert_eq!(original.fov, 60.0);
    assert_eq!(copy.fov, 30.0);
}

#[test]
fn test_pose_forward_and_distance() {
    let pose = CameraPose::from_arrays([0.0, 0.0, 5.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], 45.0);
    assert_eq!(pose.forward(), Vec3::new(0.0, 0.0, -1.0));
    assert_eq!(pose.distance(), 5.0);
}

#[test]
fn test_pose_degenerate_detection() {
    let looking_down_up = CameraPose::from_arrays([0.0, 5.0, 0.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], 60.0);
    assert!(looking_down_up.is_degenerate());

    let coincident = CameraPose::from_arrays([1.0, 1.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 0.0], 60.0);
    assert!(coincident.is_degenerate());

    assert!(!CameraPose::default().is_degenerate());
}

#[test]
fn test_pose_json_arrays() {
    let pose: CameraPose = serde_json::from_str(
        r#"{ "position": [2, 2, 2], "target": [0, 0, 0], "up": [0, 1, 0], "fov": 60 }"#,
    ).unwrap();
    assert_eq!(pose, CameraPose::default());
}
