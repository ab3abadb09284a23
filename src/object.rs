use std::path::Path;

use glam::{Vec2, Vec3, Vec4};
use log::error;
use thiserror::Error;

use crate::texture::{self, PixelFormat, TextureData};

/// Which optional attributes a mesh carries. Fixed at build time; the
/// stride and attribute offsets of the interleaved buffer follow from it
/// for the lifetime of the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    pub has_normals: bool,
    pub has_uvs: bool,
}

impl VertexLayout {
    pub const POSITIONS_ONLY: Self = Self {
        has_normals: false,
        has_uvs: false,
    };

    /// Floats per vertex: 3 for position, plus 3 for a normal and 2 for a
    /// UV when present (3, 5, 6, or 8).
    pub fn floats_per_vertex(self) -> usize {
        3 + if self.has_normals { 3 } else { 0 } + if self.has_uvs { 2 } else { 0 }
    }

    pub fn stride_bytes(self) -> u64 {
        (self.floats_per_vertex() * std::mem::size_of::<f32>()) as u64
    }

    pub fn normal_offset(self) -> Option<usize> {
        self.has_normals.then_some(3)
    }

    pub fn uv_offset(self) -> Option<usize> {
        self.has_uvs
            .then_some(3 + if self.has_normals { 3 } else { 0 })
    }
}

/// How the vertex stream is assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawMode {
    #[default]
    TriangleList,
    TriangleStrip,
    LineList,
    LineStrip,
    PointList,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("{attribute} array has {actual} entries, expected {expected}")]
    AttributeLengthMismatch {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("update supplies a different attribute layout than the mesh was built with")]
    LayoutMismatch,
    #[error("update supplies {actual} vertices, mesh was allocated for {expected}")]
    VertexCountMismatch { expected: usize, actual: usize },
}

/// CPU-side interleaved vertex data. The GPU buffer a renderer allocates
/// from this is sized once; in-place updates must keep the layout and
/// vertex count.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    draw_mode: DrawMode,
    layout: VertexLayout,
    vertex_count: usize,
    data: Vec<f32>,
}

impl MeshData {
    /// Interleaves typed attribute arrays into a single buffer. The layout
    /// is derived from which optional arrays are present.
    pub fn build(
        draw_mode: DrawMode,
        positions: &[Vec3],
        normals: Option<&[Vec3]>,
        uvs: Option<&[Vec2]>,
    ) -> Result<Self, GeometryError> {
        let layout = VertexLayout {
            has_normals: normals.is_some(),
            has_uvs: uvs.is_some(),
        };
        check_len("normal", normals.map(<[Vec3]>::len), positions.len())?;
        check_len("uv", uvs.map(<[Vec2]>::len), positions.len())?;

        let mut data = Vec::with_capacity(positions.len() * layout.floats_per_vertex());
        for (index, position) in positions.iter().enumerate() {
            data.extend_from_slice(&[position.x, position.y, position.z]);
            if let Some(normals) = normals {
                let normal = normals[index];
                data.extend_from_slice(&[normal.x, normal.y, normal.z]);
            }
            if let Some(uvs) = uvs {
                let uv = uvs[index];
                data.extend_from_slice(&[uv.x, uv.y]);
            }
        }

        Ok(Self {
            draw_mode,
            layout,
            vertex_count: positions.len(),
            data,
        })
    }

    /// A unit square: two triangles spanning (0,0)..(1,1) in the XY plane,
    /// facing +Z, with full-range UVs.
    pub fn unit_square(draw_mode: DrawMode, layout: VertexLayout) -> Self {
        let positions = [
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 0.0),
        ];
        let normals = [Vec3::Z; 6];
        let uvs = [
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(0.0, 0.0),
        ];
        Self::build(
            draw_mode,
            &positions,
            layout.has_normals.then_some(&normals[..]),
            layout.has_uvs.then_some(&uvs[..]),
        )
        .expect("square attribute arrays have matching lengths")
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn layout(&self) -> VertexLayout {
        self.layout
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn as_floats(&self) -> &[f32] {
        &self.data
    }

    /// Replaces every attribute in place. The attribute set must match the
    /// build-time layout and the vertex count must be unchanged; anything
    /// else would silently corrupt the fixed-size GPU buffer, so it is
    /// rejected up front.
    pub fn update_vertices(
        &mut self,
        positions: &[Vec3],
        normals: Option<&[Vec3]>,
        uvs: Option<&[Vec2]>,
    ) -> Result<(), GeometryError> {
        let layout = VertexLayout {
            has_normals: normals.is_some(),
            has_uvs: uvs.is_some(),
        };
        if layout != self.layout {
            return Err(GeometryError::LayoutMismatch);
        }
        if positions.len() != self.vertex_count {
            return Err(GeometryError::VertexCountMismatch {
                expected: self.vertex_count,
                actual: positions.len(),
            });
        }
        let rebuilt = Self::build(self.draw_mode, positions, normals, uvs)?;
        self.data = rebuilt.data;
        Ok(())
    }

    /// Rewrites only the position lanes, leaving normals and UVs intact.
    pub fn replace_positions(&mut self, positions: &[Vec3]) -> Result<(), GeometryError> {
        if positions.len() != self.vertex_count {
            return Err(GeometryError::VertexCountMismatch {
                expected: self.vertex_count,
                actual: positions.len(),
            });
        }
        let stride = self.layout.floats_per_vertex();
        for (index, position) in positions.iter().enumerate() {
            self.data[index * stride] = position.x;
            self.data[index * stride + 1] = position.y;
            self.data[index * stride + 2] = position.z;
        }
        Ok(())
    }
}

fn check_len(
    attribute: &'static str,
    actual: Option<usize>,
    expected: usize,
) -> Result<(), GeometryError> {
    match actual {
        Some(actual) if actual != expected => Err(GeometryError::AttributeLengthMismatch {
            attribute,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

/// Phong reflectance coefficients pushed into the per-object uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub emission: Vec4,
    pub ambient: Vec4,
    pub diffuse: Vec4,
    pub specular: Vec4,
    pub specular_exponent: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            emission: Vec4::new(0.0, 0.0, 0.0, 1.0),
            ambient: Vec4::new(0.2, 0.2, 0.2, 1.0),
            diffuse: Vec4::new(0.8, 0.8, 0.8, 1.0),
            specular: Vec4::new(0.0, 0.0, 0.0, 1.0),
            specular_exponent: 0.0,
        }
    }
}

/// A mesh plus the material and decoded textures the renderer draws it with.
#[derive(Debug, Clone)]
pub struct RenderObject {
    pub mesh: MeshData,
    pub material: Material,
    textures: Vec<TextureData>,
}

impl RenderObject {
    pub fn new(mesh: MeshData) -> Self {
        Self {
            mesh,
            material: Material::default(),
            textures: Vec::new(),
        }
    }

    /// Decodes an image file and appends it to the object's texture list,
    /// returning its index. Decode failures are logged and skipped; the
    /// object simply renders untextured.
    pub fn add_texture_from_file(&mut self, path: &Path, format: PixelFormat) -> Option<usize> {
        match texture::load(path, format) {
            Ok(texture) => Some(self.add_texture(texture)),
            Err(err) => {
                error!("could not read image file {}: {err:#}", path.display());
                None
            }
        }
    }

    pub fn add_texture(&mut self, texture: TextureData) -> usize {
        self.textures.push(texture);
        self.textures.len() - 1
    }

    pub fn texture(&self, index: usize) -> Option<&TextureData> {
        self.textures.get(index)
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(count: usize) -> Vec<Vec3> {
        (0..count).map(|i| Vec3::splat(i as f32)).collect()
    }

    #[test]
    fn positions_only_buffer_has_stride_three() {
        let mesh = MeshData::build(DrawMode::TriangleList, &positions(7), None, None).unwrap();
        assert_eq!(mesh.layout().floats_per_vertex(), 3);
        assert_eq!(mesh.as_floats().len(), 3 * 7);
        assert_eq!(mesh.vertex_count(), 7);
    }

    #[test]
    fn optional_attributes_select_the_stride() {
        let pos = positions(4);
        let normals = vec![Vec3::Z; 4];
        let uvs = vec![Vec2::ONE; 4];

        let with_normals =
            MeshData::build(DrawMode::TriangleList, &pos, Some(&normals), None).unwrap();
        assert_eq!(with_normals.layout().floats_per_vertex(), 6);

        let with_uvs = MeshData::build(DrawMode::TriangleList, &pos, None, Some(&uvs)).unwrap();
        assert_eq!(with_uvs.layout().floats_per_vertex(), 5);

        let with_both =
            MeshData::build(DrawMode::TriangleList, &pos, Some(&normals), Some(&uvs)).unwrap();
        assert_eq!(with_both.layout().floats_per_vertex(), 8);
        assert_eq!(with_both.as_floats().len(), 8 * 4);
    }

    #[test]
    fn attribute_offsets_follow_the_layout() {
        let layout = VertexLayout {
            has_normals: true,
            has_uvs: true,
        };
        assert_eq!(layout.normal_offset(), Some(3));
        assert_eq!(layout.uv_offset(), Some(6));

        let uv_only = VertexLayout {
            has_normals: false,
            has_uvs: true,
        };
        assert_eq!(uv_only.normal_offset(), None);
        assert_eq!(uv_only.uv_offset(), Some(3));
    }

    #[test]
    fn mismatched_attribute_lengths_are_rejected() {
        let err = MeshData::build(
            DrawMode::TriangleList,
            &positions(3),
            Some(&[Vec3::Z; 2]),
            None,
        )
        .unwrap_err();
        assert_eq!(
            err,
            GeometryError::AttributeLengthMismatch {
                attribute: "normal",
                expected: 3,
                actual: 2,
            }
        );
    }

    #[test]
    fn update_rejects_layout_and_count_changes() {
        let pos = positions(3);
        let normals = vec![Vec3::Z; 3];
        let mut mesh =
            MeshData::build(DrawMode::TriangleList, &pos, Some(&normals), None).unwrap();

        assert_eq!(
            mesh.update_vertices(&pos, None, None),
            Err(GeometryError::LayoutMismatch)
        );
        assert_eq!(
            mesh.update_vertices(&positions(4), Some(&[Vec3::Z; 4]), None),
            Err(GeometryError::VertexCountMismatch {
                expected: 3,
                actual: 4,
            })
        );
        assert!(mesh.update_vertices(&pos, Some(&normals), None).is_ok());
    }

    #[test]
    fn replace_positions_preserves_other_lanes() {
        let pos = positions(2);
        let normals = vec![Vec3::Y; 2];
        let mut mesh =
            MeshData::build(DrawMode::TriangleList, &pos, Some(&normals), None).unwrap();
        mesh.replace_positions(&[Vec3::splat(9.0), Vec3::splat(8.0)])
            .unwrap();
        let data = mesh.as_floats();
        assert_eq!(&data[0..3], &[9.0, 9.0, 9.0]);
        assert_eq!(&data[3..6], &[0.0, 1.0, 0.0]);
        assert_eq!(&data[6..9], &[8.0, 8.0, 8.0]);
    }

    #[test]
    fn unit_square_matches_its_layout() {
        let layout = VertexLayout {
            has_normals: true,
            has_uvs: true,
        };
        let mesh = MeshData::unit_square(DrawMode::TriangleList, layout);
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.as_floats().len(), 6 * 8);
        // Every vertex of the square faces +Z.
        for vertex in mesh.as_floats().chunks_exact(8) {
            assert_eq!(&vertex[3..6], &[0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn missing_texture_file_is_a_soft_failure() {
        let square = MeshData::unit_square(
            DrawMode::TriangleList,
            VertexLayout {
                has_normals: true,
                has_uvs: true,
            },
        );
        let mut object = RenderObject::new(square);
        let index =
            object.add_texture_from_file(Path::new("/nonexistent.png"), PixelFormat::Rgba8);
        assert_eq!(index, None);
        assert_eq!(object.texture_count(), 0);
    }
}
