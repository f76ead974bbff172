use glam::{Mat4, Vec2, Vec3};

/// Orbit camera pinned to the head model. The eye rides a sphere around the
/// target; dragging changes yaw and pitch, scrolling changes the radius
/// within [min_distance, max_distance].
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,

    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    pub min_distance: f32,
    pub max_distance: f32,
    pub mouse_sensitivity: f32,
    pub zoom_speed: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        let eye = Vec3::new(0.0, 2.0, 8.0);
        let target = Vec3::ZERO;
        let offset = eye - target;
        let distance = offset.length();
        let dir = offset / distance;

        Self {
            target,
            yaw: dir.z.atan2(dir.x),
            pitch: dir.y.asin(),
            distance,

            fov: 50.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 100.0,

            min_distance: 4.0,
            max_distance: 12.0,
            mouse_sensitivity: 0.005,
            zoom_speed: 0.6,
        }
    }
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        self.target
            + Vec3::new(
                self.distance * self.yaw.cos() * self.pitch.cos(),
                self.distance * self.pitch.sin(),
                self.distance * self.yaw.sin() * self.pitch.cos(),
            )
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn process_mouse_movement(&mut self, delta: Vec2) {
        self.yaw += delta.x * self.mouse_sensitivity;
        self.pitch -= delta.y * self.mouse_sensitivity;

        let max_pitch = 89.0_f32.to_radians();
        self.pitch = self.pitch.clamp(-max_pitch, max_pitch);
    }

    pub fn process_scroll(&mut self, delta: f32) {
        self.distance =
            (self.distance - delta * self.zoom_speed).clamp(self.min_distance, self.max_distance);
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height;
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
}

impl CameraUniform {
    pub fn from_camera(camera: &OrbitCamera) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: camera.eye().to_array(),
            _padding: 0.0,
        }
    }
}
