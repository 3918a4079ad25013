use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Orthographic camera. `zoom` is the number of screen pixels per world unit.
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(viewport_width: u32, viewport_height: u32, zoom: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom,
            viewport: (viewport_width, viewport_height),
        }
    }

    /// Half the visible area in world units.
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(
            (self.viewport.0 as f32) / (2.0 * self.zoom),
            (self.viewport.1 as f32) / (2.0 * self.zoom),
        )
    }

    /// Center on `target` without showing anything outside `min..max`. When the
    /// world is smaller than the view on an axis, that axis is centered instead.
    pub fn follow_clamped(&mut self, target: Vec2, min: Vec2, max: Vec2) {
        let half = self.half_extents();
        self.position.x = clamp_axis(target.x, min.x, max.x, half.x);
        self.position.y = clamp_axis(target.y, min.y, max.y, half.y);
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let half = self.half_extents();

        let proj = Mat4::orthographic_rh(
            self.position.x - half.x,
            self.position.x + half.x,
            self.position.y - half.y,
            self.position.y + half.y,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}

fn clamp_axis(target: f32, min: f32, max: f32, half: f32) -> f32 {
    if max - min <= half * 2.0 {
        (min + max) * 0.5
    } else {
        target.clamp(min + half, max - half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_extents_scale_with_zoom() {
        let camera = Camera2D::new(1280, 960, 64.0);
        let half = camera.half_extents();
        assert!((half.x - 10.0).abs() < 1e-5);
        assert!((half.y - 7.5).abs() < 1e-5);
    }

    #[test]
    fn follow_clamps_to_world_edges() {
        let mut camera = Camera2D::new(1280, 960, 64.0);
        let min = Vec2::new(0.0, 0.0);
        let max = Vec2::new(40.0, 20.0);

        camera.follow_clamped(Vec2::new(1.0, 1.0), min, max);
        assert!((camera.position.x - 10.0).abs() < 1e-5);
        assert!((camera.position.y - 7.5).abs() < 1e-5);

        camera.follow_clamped(Vec2::new(39.0, 19.0), min, max);
        assert!((camera.position.x - 30.0).abs() < 1e-5);
        assert!((camera.position.y - 12.5).abs() < 1e-5);
    }

    #[test]
    fn follow_centers_small_world() {
        let mut camera = Camera2D::new(1280, 960, 64.0);
        camera.follow_clamped(Vec2::new(2.0, 1.0), Vec2::ZERO, Vec2::new(8.0, 6.0));
        assert!((camera.position.x - 4.0).abs() < 1e-5);
        assert!((camera.position.y - 3.0).abs() < 1e-5);
    }

    #[test]
    fn uniform_maps_camera_center_to_clip_origin() {
        let mut camera = Camera2D::new(800, 600, 50.0);
        camera.position = Vec2::new(3.0, -2.0);
        let uniform = camera.build_uniform();
        let m = Mat4::from_cols_array_2d(&uniform.view_proj);
        let clip = m.project_point3(glam::Vec3::new(3.0, -2.0, 0.0));
        assert!(clip.x.abs() < 1e-5);
        assert!(clip.y.abs() < 1e-5);
    }
}
