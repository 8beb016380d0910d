use glam::Vec3;
use super::*;

fn approx(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < 1e-4
}

#[test]
fn test_pose_roundtrips_through_camera() {
    let pose = CameraPose::new(Vec3::new(3.0, 2.0, 3.0), Vec3::ZERO, Vec3::Y, 50.0);
    let camera = OrbitCamera::from_pose(&pose, 16.0 / 9.0);
    assert_eq!(camera.pose(), pose);
}

#[test]
fn test_apply_pose_keeps_previous_fov_when_invalid() {
    let mut camera = OrbitCamera::new(1.0);
    camera.apply_pose(&CameraPose::new(Vec3::ONE, Vec3::ZERO, Vec3::ZERO, 0.0));
    assert_eq!(camera.fov_degrees(), 60.0);
    assert_eq!(camera.up(), Vec3::Y);
    assert_eq!(camera.position(), Vec3::ONE);
}

#[test]
fn test_orbit_preserves_distance_and_target() {
    let mut camera = OrbitCamera::new(1.0);
    let distance = camera.pose().distance();

    camera.handle(CameraInput::Orbit { yaw: 0.7, pitch: 0.2 });

    assert_eq!(camera.target(), Vec3::ZERO);
    assert!((camera.pose().distance() - distance).abs() < 1e-4);
    assert_ne!(camera.position(), Vec3::new(2.0, 2.0, 2.0));
}

#[test]
fn test_orbit_pitch_is_clamped_before_pole() {
    let mut camera = OrbitCamera::new(1.0);
    camera.handle(CameraInput::Orbit { yaw: 0.0, pitch: 10.0 });

    let direction = (camera.position() - camera.target()).normalize();
    assert!(direction.dot(Vec3::Y) < 1.0);
    assert!(camera.view_matrix().is_finite());
}

#[test]
fn test_pan_moves_target_and_position_together() {
    let mut camera = OrbitCamera::new(1.0);
    let offset = camera.position() - camera.target();

    camera.handle(CameraInput::Pan { right: 0.1, up: -0.05 });

    assert_ne!(camera.target(), Vec3::ZERO);
    assert!(approx(camera.position() - camera.target(), offset));
}

#[test]
fn test_zoom_scales_distance() {
    let mut camera = OrbitCamera::new(1.0);
    let before = camera.pose().distance();

    camera.handle(CameraInput::Zoom { factor: 0.5 });
    assert!((camera.pose().distance() - before * 0.5).abs() < 1e-4);

    camera.handle(CameraInput::Zoom { factor: -1.0 });
    assert!((camera.pose().distance() - before * 0.5).abs() < 1e-4);
}

#[test]
fn test_fit_sets_clip_planes() {
    let mut camera = OrbitCamera::new(1.0);
    camera.fit_to(&Aabb::new(Vec3::splat(-10.0), Vec3::splat(10.0)));

    assert_eq!(camera.target(), Vec3::ZERO);
    assert!(camera.near() > 0.0);
    assert!(camera.far() > camera.near());
}

#[test]
fn test_invalid_aspect_falls_back() {
    let mut camera = OrbitCamera::new(0.0);
    assert_eq!(camera.aspect(), 1.0);
    camera.set_aspect(2.0);
    assert_eq!(camera.aspect(), 2.0);
    assert!(camera.projection_matrix().is_finite());
}
