use bytemuck::{Pod, Zeroable};
use glam::{Vec3, Vec4};
use log::debug;

/// Upper bound on lights the shader iterates over; the uniform block carries
/// a fixed array of this size regardless of how many lights are populated.
pub const MAX_LIGHTS: usize = 8;

/// A single light source. `position.w` distinguishes point lights (1.0) from
/// directional lights (0.0). A cutoff angle of 180 degrees disables the
/// spotlight cone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec4,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub spot_direction: Vec3,
    pub spot_cutoff_degrees: f32,
    pub spot_feather: f32,
    pub falloff_radius: f32,
    pub enabled: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec4::new(0.0, 0.0, 0.0, 1.0),
            ambient: Vec4::new(0.0, 0.0, 0.0, 1.0),
            diffuse: Vec4::ONE,
            specular: Vec4::ONE,
            spot_direction: Vec3::NEG_Z,
            spot_cutoff_degrees: 180.0,
            spot_feather: 0.0,
            falloff_radius: 1000.0,
            enabled: true,
        }
    }
}

/// Ordered collection of lights plus the global lighting switch.
///
/// Mutators address lights by index and ignore out-of-range indices; the
/// list never shrinks once populated.
#[derive(Debug, Clone)]
pub struct LightSet {
    lights: Vec<Light>,
    lighting_on: bool,
    global_ambient: Vec4,
}

impl Default for LightSet {
    fn default() -> Self {
        Self {
            lights: Vec::new(),
            lighting_on: true,
            global_ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
        }
    }
}

impl LightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a light. Lights are addressed by insertion order afterwards.
    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    pub fn is_lighting_on(&self) -> bool {
        self.lighting_on
    }

    pub fn toggle_lighting(&mut self) {
        self.lighting_on = !self.lighting_on;
    }

    pub fn global_ambient(&self) -> Vec4 {
        self.global_ambient
    }

    pub fn set_global_ambient(&mut self, color: Vec4) {
        self.global_ambient = color;
    }

    pub fn get(&self, index: usize) -> Option<&Light> {
        self.lights.get(index)
    }

    pub fn set_position(&mut self, index: usize, position: Vec4) {
        self.with_light(index, |light| light.position = position);
    }

    pub fn set_ambient_color(&mut self, index: usize, color: Vec4) {
        self.with_light(index, |light| light.ambient = color);
    }

    pub fn set_diffuse_color(&mut self, index: usize, color: Vec4) {
        self.with_light(index, |light| light.diffuse = color);
    }

    pub fn set_specular_color(&mut self, index: usize, color: Vec4) {
        self.with_light(index, |light| light.specular = color);
    }

    pub fn set_spotlight_direction(&mut self, index: usize, direction: Vec3) {
        self.with_light(index, |light| light.spot_direction = direction);
    }

    pub fn set_spotlight_cutoff(&mut self, index: usize, degrees: f32) {
        self.with_light(index, |light| light.spot_cutoff_degrees = degrees);
    }

    pub fn set_spotlight_feather(&mut self, index: usize, feather: f32) {
        self.with_light(index, |light| light.spot_feather = feather);
    }

    pub fn set_falloff_radius(&mut self, index: usize, radius: f32) {
        self.with_light(index, |light| light.falloff_radius = radius);
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) {
        self.with_light(index, |light| light.enabled = enabled);
    }

    /// Flattens the set into the fixed-size record array pushed into the
    /// frame uniform, plus the populated count. Lights beyond `MAX_LIGHTS`
    /// are dropped from the push (the shader cannot address them).
    pub fn records(&self) -> ([LightRecord; MAX_LIGHTS], u32) {
        let mut records = [LightRecord::zeroed(); MAX_LIGHTS];
        let count = self.lights.len().min(MAX_LIGHTS);
        for (record, light) in records.iter_mut().zip(self.lights.iter().take(count)) {
            *record = LightRecord::from(light);
        }
        (records, count as u32)
    }

    fn with_light(&mut self, index: usize, apply: impl FnOnce(&mut Light)) {
        match self.lights.get_mut(index) {
            Some(light) => apply(light),
            None => debug!(
                "ignoring update for light {index}: set holds {} light(s)",
                self.lights.len()
            ),
        }
    }
}

/// POD mirror of [`Light`] laid out for the uniform block.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightRecord {
    pub position: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// xyz: spotlight direction, w: cutoff angle in degrees.
    pub spot: [f32; 4],
    /// x: spotlight feather, y: falloff radius, z: enabled flag, w: unused.
    pub params: [f32; 4],
}

impl From<&Light> for LightRecord {
    fn from(light: &Light) -> Self {
        Self {
            position: light.position.into(),
            ambient: light.ambient.into(),
            diffuse: light.diffuse.into(),
            specular: light.specular.into(),
            spot: light
                .spot_direction
                .extend(light.spot_cutoff_degrees)
                .into(),
            params: [
                light.spot_feather,
                light.falloff_radius,
                if light.enabled { 1.0 } else { 0.0 },
                0.0,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_light_grows_the_count() {
        let mut lights = LightSet::new();
        for _ in 0..3 {
            lights.add_light(Light::default());
        }
        assert_eq!(lights.len(), 3);
        let (_, count) = lights.records();
        assert_eq!(count, 3);
    }

    #[test]
    fn out_of_range_setters_leave_state_unchanged() {
        let mut lights = LightSet::new();
        lights.add_light(Light::default());
        let before = *lights.get(0).unwrap();
        lights.set_ambient_color(5, Vec4::ONE);
        lights.set_enabled(1, false);
        assert_eq!(*lights.get(0).unwrap(), before);
    }

    #[test]
    fn toggling_twice_restores_the_switch() {
        let mut lights = LightSet::new();
        let before = lights.is_lighting_on();
        lights.toggle_lighting();
        assert_ne!(lights.is_lighting_on(), before);
        lights.toggle_lighting();
        assert_eq!(lights.is_lighting_on(), before);
    }

    #[test]
    fn empty_set_produces_zero_count_records() {
        let lights = LightSet::new();
        let (records, count) = lights.records();
        assert_eq!(count, 0);
        assert_eq!(records[0], LightRecord::zeroed());
    }

    #[test]
    fn records_clamp_to_the_shader_limit() {
        let mut lights = LightSet::new();
        for _ in 0..MAX_LIGHTS + 4 {
            lights.add_light(Light::default());
        }
        let (_, count) = lights.records();
        assert_eq!(count, MAX_LIGHTS as u32);
    }

    #[test]
    fn record_packs_spotlight_fields() {
        let light = Light {
            spot_direction: Vec3::new(0.0, -1.0, -1.5),
            spot_cutoff_degrees: 7.0,
            spot_feather: 0.1,
            falloff_radius: 1000.0,
            enabled: false,
            ..Light::default()
        };
        let record = LightRecord::from(&light);
        assert_eq!(record.spot, [0.0, -1.0, -1.5, 7.0]);
        assert_eq!(record.params, [0.1, 1000.0, 0.0, 0.0]);
    }
}
