use glam::Vec3;
use super::*;

fn triangle() -> Vec<Vertex> {
    vec![
        Vertex::new(Vec3::new(0.0, 0.0, 0.0), [1.0, 0.0, 0.0]),
        Vertex::new(Vec3::new(2.0, 0.0, 0.0), [0.0, 1.0, 0.0]),
        Vertex::new(Vec3::new(0.0, 2.0, 0.0), [0.0, 0.0, 1.0]),
    ]
}

#[test]
fn test_vertex_layout_is_tightly_packed() {
    assert_eq!(std::mem::size_of::<Vertex>(), 24);
}

#[test]
fn test_indexed_triangles() {
    let geometry = Geometry::indexed_triangles("tri", triangle(), vec![0, 1, 2]).unwrap();

    assert_eq!(geometry.topology(), Topology::Triangles);
    assert_eq!(geometry.primitive_count(), 1);
    assert_eq!(geometry.vertex_bytes().len(), 3 * 24);
    assert_eq!(geometry.index_bytes().len(), 3 * 4);
    assert_eq!(geometry.byte_size(), 84);
}

#[test]
fn test_indexed_triangles_rejects_bad_indices() {
    let err = Geometry::indexed_triangles("tri", triangle(), vec![0, 1, 7]).unwrap_err();
    assert!(matches!(err, Error::AssetUnavailable(_)));

    let err = Geometry::indexed_triangles("tri", triangle(), vec![0, 1]).unwrap_err();
    assert!(matches!(err, Error::AssetUnavailable(_)));
}

#[test]
fn test_points_primitive_count() {
    let geometry = Geometry::points("cloud", triangle());
    assert_eq!(geometry.topology(), Topology::Points);
    assert_eq!(geometry.primitive_count(), 3);
    assert!(geometry.indices().is_none());
    assert!(geometry.index_bytes().is_empty());
}

#[test]
fn test_bounds_and_centered() {
    let geometry = Geometry::points("cloud", triangle());
    let bounds = geometry.bounds().unwrap();
    assert_eq!(bounds.center(), Vec3::new(1.0, 1.0, 0.0));

    let centered = geometry.centered();
    assert_eq!(centered.bounds().unwrap().center(), Vec3::ZERO);
    assert_eq!(centered.vertices()[0].color, [1.0, 0.0, 0.0]);
}

#[test]
fn test_empty_geometry_has_no_bounds() {
    let geometry = Geometry::points("empty", Vec::new());
    assert!(geometry.is_empty());
    assert!(geometry.bounds().is_none());
    assert_eq!(geometry.centered(), geometry);
}
