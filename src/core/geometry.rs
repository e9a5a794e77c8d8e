use crate::pipeline::backend::{VertexAttribute, VertexLayout};
use bytemuck::{Pod, Zeroable};
use nalgebra::{Point3, Vector2, Vector3};

/// Represents a single authored vertex in 3D space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// Position in local object space.
    pub position: Point3<f32>,
    /// Normal vector for lighting calculations.
    pub normal: Vector3<f32>,
    /// Texture coordinates (UV).
    pub texcoord: Vector2<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>, texcoord: Vector2<f32>) -> Self {
        Self {
            position,
            normal,
            texcoord,
        }
    }

    /// Reads one interleaved `position(3) normal(3) uv(2)` record.
    pub fn from_interleaved(data: &[f32; 8]) -> Self {
        Self::new(
            Point3::new(data[0], data[1], data[2]),
            Vector3::new(data[3], data[4], data[5]),
            Vector2::new(data[6], data[7]),
        )
    }
}

/// Three vertices in winding order.
pub type Triangle = [Vertex; 3];

/// A vertex carrying its triangle's tangent frame, ready for normal mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentVertex {
    pub vertex: Vertex,
    pub tangent: Vector3<f32>,
    pub bitangent: Vector3<f32>,
}

impl TangentVertex {
    pub fn new(vertex: Vertex, tangent: Vector3<f32>, bitangent: Vector3<f32>) -> Self {
        Self {
            vertex,
            tangent,
            bitangent,
        }
    }

    pub fn to_raw(&self) -> RawTangentVertex {
        let v = &self.vertex;
        RawTangentVertex {
            position: v.position.coords.into(),
            normal: v.normal.into(),
            texcoord: v.texcoord.into(),
            tangent: self.tangent.into(),
            bitangent: self.bitangent.into(),
        }
    }

    pub fn from_raw(raw: &RawTangentVertex) -> Self {
        Self {
            vertex: Vertex::new(
                Point3::from(raw.position),
                Vector3::from(raw.normal),
                Vector2::from(raw.texcoord),
            ),
            tangent: Vector3::from(raw.tangent),
            bitangent: Vector3::from(raw.bitangent),
        }
    }
}

/// Packed 14-float vertex record as uploaded to the graphics backend.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RawTangentVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub texcoord: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl RawTangentVertex {
    pub const LOCATION_POSITION: u32 = 0;
    pub const LOCATION_NORMAL: u32 = 1;
    pub const LOCATION_TEXCOORD: u32 = 2;
    pub const LOCATION_TANGENT: u32 = 3;
    pub const LOCATION_BITANGENT: u32 = 4;

    /// Attribute layout descriptor (stride 56 bytes).
    pub fn layout() -> VertexLayout {
        VertexLayout {
            stride: std::mem::size_of::<RawTangentVertex>(),
            attributes: TANGENT_ATTRIBUTES,
        }
    }

    /// Layout for position-only streams such as the sky cube.
    pub fn position_only_layout() -> VertexLayout {
        VertexLayout {
            stride: 3 * FLOAT_SIZE,
            attributes: POSITION_ATTRIBUTES,
        }
    }
}

const FLOAT_SIZE: usize = std::mem::size_of::<f32>();

const TANGENT_ATTRIBUTES: &[VertexAttribute] = &[
    VertexAttribute {
        location: RawTangentVertex::LOCATION_POSITION,
        components: 3,
        offset: 0,
    },
    VertexAttribute {
        location: RawTangentVertex::LOCATION_NORMAL,
        components: 3,
        offset: 3 * FLOAT_SIZE,
    },
    VertexAttribute {
        location: RawTangentVertex::LOCATION_TEXCOORD,
        components: 2,
        offset: 6 * FLOAT_SIZE,
    },
    VertexAttribute {
        location: RawTangentVertex::LOCATION_TANGENT,
        components: 3,
        offset: 8 * FLOAT_SIZE,
    },
    VertexAttribute {
        location: RawTangentVertex::LOCATION_BITANGENT,
        components: 3,
        offset: 11 * FLOAT_SIZE,
    },
];

const POSITION_ATTRIBUTES: &[VertexAttribute] = &[VertexAttribute {
    location: RawTangentVertex::LOCATION_POSITION,
    components: 3,
    offset: 0,
}];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_layout_matches_struct() {
        let layout = RawTangentVertex::layout();
        assert_eq!(layout.stride, 56);
        assert_eq!(layout.attributes.len(), 5);
        assert_eq!(layout.attributes[4].offset, 44);
    }

    #[test]
    fn raw_conversion_keeps_every_attribute() {
        let v = TangentVertex::new(
            Vertex::from_interleaved(&[1.0, 2.0, 3.0, 0.0, 1.0, 0.0, 0.25, 0.75]),
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, -1.0),
        );
        let raw = v.to_raw();
        assert_eq!(raw.texcoord, [0.25, 0.75]);
        assert_eq!(TangentVertex::from_raw(&raw), v);
    }
}
