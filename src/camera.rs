use glam::{Mat4, Vec3};

const DEFAULT_FOV: f32 = 30.0;
const DEFAULT_NEAR: f32 = 0.1;
const DEFAULT_FAR: f32 = 10_000.0;

/// Orbiting camera holding the view/projection matrices for the frame loop.
///
/// Navigation never re-derives Euler angles: every rotation multiplies the
/// view matrix by a rotation about an axis extracted from the matrix itself
/// (camera-local right/up/forward live in its rows), so the view matrix stays
/// an orthonormal rotation composed with a translation.
#[derive(Debug, Clone)]
pub struct Camera {
    zoom_sensitivity: f32,
    move_sensitivity: f32,
    rotation_sensitivity: f32,
    dragging: bool,
    aspect_ratio: f32,
    init_fov: f32,
    near_plane: f32,
    far_plane: f32,
    init_eye: Vec3,
    init_target: Vec3,
    init_up: Vec3,
    fov: f32,
    position: Vec3,
    view: Mat4,
    projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, -10.0), Vec3::ZERO, Vec3::Y)
    }
}

impl Camera {
    /// Creates a camera at `eye` looking at `target` with the default
    /// 30-degree field of view.
    pub fn new(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        Self::with_perspective(eye, target, up, DEFAULT_FOV, DEFAULT_NEAR, DEFAULT_FAR)
    }

    pub fn with_perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_degrees: f32,
        near_plane: f32,
        far_plane: f32,
    ) -> Self {
        Self {
            zoom_sensitivity: 1.0,
            move_sensitivity: 0.5,
            rotation_sensitivity: 0.01,
            dragging: false,
            aspect_ratio: 1.0,
            init_fov: fov_degrees,
            near_plane,
            far_plane,
            init_eye: eye,
            init_target: target,
            init_up: up,
            fov: fov_degrees,
            position: eye,
            view: Mat4::look_at_rh(eye, target, up),
            projection: Mat4::IDENTITY,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn set_dragging(&mut self, dragging: bool) {
        self.dragging = dragging;
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn fov_degrees(&self) -> f32 {
        self.fov
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Pitches about the camera-local right axis. `steps` is typically a
    /// pointer delta in pixels.
    pub fn pitch(&mut self, steps: f32) {
        let axis = self.view.row(0).truncate();
        self.rotate_about(axis, steps);
    }

    /// Yaws about the world up axis, keeping the horizon level.
    pub fn yaw(&mut self, steps: f32) {
        self.rotate_about(Vec3::Y, steps);
    }

    /// Dollies along the camera-local forward axis; positive moves forward.
    pub fn dolly(&mut self, steps: f32) {
        let axis = self.view.row(2).truncate();
        self.translate_along(axis, steps);
    }

    pub fn move_forward(&mut self) {
        self.dolly(1.0);
    }

    pub fn move_backward(&mut self) {
        self.dolly(-1.0);
    }

    pub fn move_left(&mut self) {
        let axis = self.view.row(0).truncate();
        self.translate_along(axis, 1.0);
    }

    pub fn move_right(&mut self) {
        let axis = self.view.row(0).truncate();
        self.translate_along(axis, -1.0);
    }

    pub fn move_up(&mut self) {
        let axis = self.view.row(1).truncate();
        self.translate_along(axis, -1.0);
    }

    pub fn move_down(&mut self) {
        let axis = self.view.row(1).truncate();
        self.translate_along(axis, 1.0);
    }

    /// Narrows the field of view by one zoom step. Saturates above zero
    /// degrees instead of inverting the frustum.
    pub fn zoom_in(&mut self) {
        if self.fov - self.zoom_sensitivity > 0.0 {
            self.fov -= self.zoom_sensitivity;
            self.update_projection();
        }
    }

    /// Widens the field of view by one zoom step, capped at 90 degrees.
    pub fn zoom_out(&mut self) {
        if self.fov < 90.0 {
            self.fov = (self.fov + self.zoom_sensitivity).min(90.0);
            self.update_projection();
        }
    }

    /// Restores the initial pose and field of view, keeping the current
    /// aspect ratio.
    pub fn reset(&mut self) {
        self.fov = self.init_fov;
        self.position = self.init_eye;
        self.view = Mat4::look_at_rh(self.init_eye, self.init_target, self.init_up);
        self.update_projection();
    }

    /// Recomputes the aspect ratio and projection after a resize. The camera
    /// pose is untouched.
    pub fn update_window_size(&mut self, width: u32, height: u32) {
        if height == 0 {
            return;
        }
        self.aspect_ratio = width as f32 / height as f32;
        self.update_projection();
    }

    fn rotate_about(&mut self, axis: Vec3, steps: f32) {
        self.view *= Mat4::from_axis_angle(axis, steps * self.rotation_sensitivity);
        self.refresh_position();
    }

    fn translate_along(&mut self, axis: Vec3, steps: f32) {
        self.view *= Mat4::from_translation(steps * self.move_sensitivity * axis);
        self.refresh_position();
    }

    fn update_projection(&mut self) {
        self.projection = Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.near_plane,
            self.far_plane,
        );
    }

    // The world-space camera position is the translation column of the
    // inverted view matrix.
    fn refresh_position(&mut self) {
        self.position = self.view.inverse().col(3).truncate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_mat4_eq(a: Mat4, b: Mat4) {
        for (x, y) in a
            .to_cols_array()
            .iter()
            .zip(b.to_cols_array().iter())
        {
            assert!((x - y).abs() < 1e-5, "matrices differ: {a:?} vs {b:?}");
        }
    }

    #[test]
    fn reset_restores_initial_matrices() {
        let mut camera = Camera::default();
        camera.update_window_size(1920, 1080);
        let mut reference = Camera::default();
        reference.update_window_size(1920, 1080);

        camera.pitch(12.0);
        camera.yaw(-40.0);
        camera.dolly(3.0);
        camera.move_left();
        camera.zoom_in();
        camera.zoom_in();
        camera.reset();

        assert_mat4_eq(camera.view_matrix(), reference.view_matrix());
        assert_mat4_eq(camera.projection_matrix(), reference.projection_matrix());
        assert_eq!(camera.fov_degrees(), reference.fov_degrees());
    }

    #[test]
    fn zooming_saturates_inside_open_interval() {
        let mut camera = Camera::default();
        camera.update_window_size(800, 600);
        for _ in 0..200 {
            camera.zoom_in();
        }
        assert!(camera.fov_degrees() > 0.0);
        for _ in 0..200 {
            camera.zoom_out();
        }
        assert!(camera.fov_degrees() <= 90.0);
    }

    #[test]
    fn resize_updates_aspect_without_moving_camera() {
        let mut camera = Camera::default();
        let before = camera.position();
        camera.update_window_size(1024, 256);
        assert_eq!(camera.aspect_ratio(), 1024.0 / 256.0);
        assert_eq!(camera.position(), before);
    }

    #[test]
    fn zero_height_resize_is_ignored() {
        let mut camera = Camera::default();
        camera.update_window_size(800, 600);
        let aspect = camera.aspect_ratio();
        camera.update_window_size(800, 0);
        assert_eq!(camera.aspect_ratio(), aspect);
    }

    #[test]
    fn rotations_keep_the_view_orthonormal() {
        let mut camera = Camera::default();
        for i in 0..500 {
            camera.pitch(if i % 2 == 0 { 3.0 } else { -2.0 });
            camera.yaw(1.5);
        }
        let view = camera.view_matrix();
        let rows = [
            view.row(0).truncate(),
            view.row(1).truncate(),
            view.row(2).truncate(),
        ];
        for row in rows {
            assert!((row.length() - 1.0).abs() < 1e-3);
        }
        assert!(rows[0].dot(rows[1]).abs() < 1e-3);
        assert!(rows[0].dot(rows[2]).abs() < 1e-3);
        assert!(rows[1].dot(rows[2]).abs() < 1e-3);
    }

    #[test]
    fn dolly_moves_along_the_forward_axis() {
        let mut camera = Camera::default();
        let start = camera.position();
        camera.move_forward();
        let moved = camera.position();
        assert!((moved - start).length() > 0.0);
        camera.move_backward();
        assert!((camera.position() - start).length() < 1e-5);
    }
}
