use nalgebra::{Matrix4, Vector3};
use std::collections::HashMap;

/// Names shared by the compositor and the shader programs.
pub mod names {
    pub const PROJECTION: &str = "projection";
    pub const VIEW: &str = "view";
    pub const MODEL: &str = "model";
    /// Camera position in view space (the origin).
    pub const VIEW_POS: &str = "view_pos";
    pub const MATERIAL_DIFFUSE: &str = "material.diffuse";
    pub const MATERIAL_SPECULAR: &str = "material.specular";
    pub const MATERIAL_NORMAL: &str = "material.normal";
    pub const MATERIAL_SHININESS: &str = "material.shininess";
    pub const NORMAL_MAPPING: &str = "normal_mapping";
    pub const SKYBOX: &str = "skybox";

    pub const DIR_LIGHT: &str = "dir_light";
    pub const SPOT_LIGHT: &str = "spot_light";
    pub const MOVING_SPOT: &str = "moving_spot";

    /// `"<light>.<field>"`
    pub fn field(light: &str, field: &str) -> String {
        format!("{light}.{field}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec3(Vector3<f32>),
    Mat4(Matrix4<f32>),
}

/// Uniform values of one program, by name.
///
/// Values persist until overwritten, like GL program state.
#[derive(Debug, Clone, Default)]
pub struct UniformStore {
    values: HashMap<String, UniformValue>,
}

impl UniformStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: UniformValue) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mat4(&self, name: &str) -> Option<Matrix4<f32>> {
        match self.get(name)? {
            UniformValue::Mat4(m) => Some(m),
            _ => None,
        }
    }

    pub fn vec3(&self, name: &str) -> Option<Vector3<f32>> {
        match self.get(name)? {
            UniformValue::Vec3(v) => Some(v),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            UniformValue::Float(f) => Some(f),
            UniformValue::Int(i) => Some(i as f32),
            _ => None,
        }
    }

    pub fn int(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            UniformValue::Int(i) => Some(i),
            UniformValue::Bool(b) => Some(b as i32),
            _ => None,
        }
    }

    /// Ints are truthy when non-zero.
    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            UniformValue::Bool(b) => Some(b),
            UniformValue::Int(i) => Some(i != 0),
            _ => None,
        }
    }
}
