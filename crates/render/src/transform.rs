use crate::RenderError;
use glam::{Mat4, Vec3};

/// Builder for model matrices.
///
/// Each step right-multiplies the current matrix, so the last call is the
/// first to touch a vertex: `translate(..).rotate_z(..).scale(..)` scales,
/// then rotates, then translates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform3D {
    matrix: Mat4,
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform3D {
    pub fn new() -> Self {
        Self {
            matrix: Mat4::IDENTITY,
        }
    }

    pub fn translate(mut self, x: f32, y: f32, z: f32) -> Self {
        self.matrix *= Mat4::from_translation(Vec3::new(x, y, z));
        self
    }

    pub fn rotate_x(mut self, radians: f32) -> Self {
        self.matrix *= Mat4::from_rotation_x(radians);
        self
    }

    pub fn rotate_y(mut self, radians: f32) -> Self {
        self.matrix *= Mat4::from_rotation_y(radians);
        self
    }

    pub fn rotate_z(mut self, radians: f32) -> Self {
        self.matrix *= Mat4::from_rotation_z(radians);
        self
    }

    pub fn scale(mut self, x: f32, y: f32, z: f32) -> Self {
        self.matrix *= Mat4::from_scale(Vec3::new(x, y, z));
        self
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }
}

impl From<Transform3D> for Mat4 {
    fn from(t: Transform3D) -> Mat4 {
        t.matrix
    }
}

/// Right-handed orthographic projection into wgpu clip space.
pub fn orthographic(
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    near: f32,
    far: f32,
) -> Result<Mat4, RenderError> {
    let degenerate = [
        ("left == right", left, right),
        ("bottom == top", bottom, top),
        ("near == far", near, far),
    ];
    for (what, a, b) in degenerate {
        if a == b {
            return Err(RenderError::InvalidProjection(format!("{what} ({a})")));
        }
    }
    let values = [left, right, bottom, top, near, far];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(RenderError::InvalidProjection(format!(
            "non-finite bounds {values:?}"
        )));
    }
    Ok(Mat4::orthographic_rh(left, right, bottom, top, near, far))
}

/// Camera view matrix: move the world by `-(x, y, z)`, then scale it.
pub fn view(x: f32, y: f32, z: f32, scale: f32) -> Mat4 {
    Mat4::from_scale(Vec3::splat(scale)) * Mat4::from_translation(Vec3::new(-x, -y, -z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn apply(m: Mat4, p: Vec3) -> Vec3 {
        (m * p.extend(1.0)).truncate()
    }

    #[test]
    fn builder_applies_last_call_first() {
        let m = Transform3D::new()
            .translate(10.0, 0.0, 0.0)
            .scale(2.0, 2.0, 1.0)
            .matrix();
        // scale first (1 -> 2), then translate (2 -> 12)
        let p = apply(m, Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(12.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn rotate_z_quarter_turn() {
        let m = Transform3D::new()
            .rotate_z(std::f32::consts::FRAC_PI_2)
            .matrix();
        let p = apply(m, Vec3::X);
        assert!((p - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn orthographic_maps_bounds_to_clip_space() {
        let proj = orthographic(-2.0, 2.0, -1.0, 1.0, 0.1, 100.0).unwrap();
        let right_top = proj * Vec4::new(2.0, 1.0, -1.0, 1.0);
        assert!((right_top.x - 1.0).abs() < 1e-5);
        assert!((right_top.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn orthographic_rejects_degenerate_bounds() {
        assert!(matches!(
            orthographic(1.0, 1.0, -1.0, 1.0, 0.1, 100.0),
            Err(RenderError::InvalidProjection(_))
        ));
        assert!(orthographic(-1.0, 1.0, 0.0, 0.0, 0.1, 100.0).is_err());
        assert!(orthographic(-1.0, 1.0, -1.0, 1.0, 5.0, 5.0).is_err());
        assert!(orthographic(-1.0, f32::NAN, -1.0, 1.0, 0.1, 1.0).is_err());
    }

    #[test]
    fn view_centers_camera() {
        let v = view(3.0, 4.0, 0.0, 0.5);
        let p = apply(v, Vec3::new(3.0, 4.0, 0.0));
        assert!(p.length() < 1e-5);
        let q = apply(v, Vec3::new(5.0, 4.0, 0.0));
        assert!((q - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }
}
