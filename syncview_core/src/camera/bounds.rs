/// Axis-aligned bounding boxes and fit-to-view placement.

use glam::Vec3;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z)
    pub min: Vec3,
    /// Maximum corner (x, y, z)
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, `None` for an empty set
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |acc, p| Self::new(acc.min.min(p), acc.max.max(p))))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Length of the box diagonal
    pub fn diagonal(&self) -> f32 {
        self.size().length()
    }
}

/// Camera placement that frames a bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFit {
    pub position: Vec3,
    pub target: Vec3,
    pub near: f32,
    pub far: f32,
}

/// Smallest framing size; point-like or empty content still gets a usable frustum
const MIN_FIT_SIZE: f32 = 1.0;

/// Frame `bounds`: look at its center from a diagonal offset scaled by its size.
///
/// size = diagonal length (at least 1.0), position = center + (size/2, size/3, size/2),
/// near = size/100, far = size*10.
pub fn fit_to_view(bounds: &Aabb) -> CameraFit {
    let mut size = bounds.diagonal();
    if !size.is_finite() || size < MIN_FIT_SIZE * 1e-3 {
        size = MIN_FIT_SIZE;
    }
    let center = bounds.center();

    CameraFit {
        position: center + Vec3::new(size / 2.0, size / 3.0, size / 2.0),
        target: center,
        near: size / 100.0,
        far: size * 10.0,
    }
}

#[cfg(test)]
#[path = "bounds_tests.rs"]
mod tests;
