//! Full-screen quad geometry.
//!
//! One pipeline, two equivalent geometries: six plain vertices forming two
//! triangles, or four vertices plus a six-entry index list. Both cover the
//! full [-1,1]² square in normalized device coordinates. Vertex positions
//! may be 2D or 3D (third coordinate unused); historical pipeline revisions
//! that hardcoded one combination are unified here as configuration.

use bytemuck::{Pod, Zeroable};

/// Non-indexed triangles or an indexed quad.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GeometryMode {
    Triangles,
    Indexed,
}

/// Component count of the vertex position attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VertexDim {
    Two,
    Three,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Vertex2 {
    pos: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct Vertex3 {
    pos: [f32; 3],
}

const ATTRS_2D: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const ATTRS_3D: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

// Two triangles covering the screen, CCW under the default front face.
const CORNERS_TRIANGLES: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
];

const CORNERS_QUAD: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Fixed screen-filling geometry plus the layout the pipeline binds.
pub struct QuadGeometry {
    vertex_data: Vec<u8>,
    vertex_count: u32,
    indices: Option<[u16; 6]>,
    dim: VertexDim,
}

impl QuadGeometry {
    pub fn new(mode: GeometryMode, dim: VertexDim) -> Self {
        let corners: &[[f32; 2]] = match mode {
            GeometryMode::Triangles => &CORNERS_TRIANGLES,
            GeometryMode::Indexed => &CORNERS_QUAD,
        };

        let vertex_data = match dim {
            VertexDim::Two => {
                let vertices: Vec<Vertex2> =
                    corners.iter().map(|&pos| Vertex2 { pos }).collect();
                bytemuck::cast_slice(&vertices).to_vec()
            }
            VertexDim::Three => {
                let vertices: Vec<Vertex3> = corners
                    .iter()
                    .map(|&[x, y]| Vertex3 { pos: [x, y, 0.0] })
                    .collect();
                bytemuck::cast_slice(&vertices).to_vec()
            }
        };

        Self {
            vertex_data,
            vertex_count: corners.len() as u32,
            indices: match mode {
                GeometryMode::Triangles => None,
                GeometryMode::Indexed => Some(QUAD_INDICES),
            },
            dim,
        }
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        &self.vertex_data
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn indices(&self) -> Option<&[u16; 6]> {
        self.indices.as_ref()
    }

    pub fn dim(&self) -> VertexDim {
        self.dim
    }

    /// Elements drawn per frame; six for both geometry modes.
    pub fn draw_count(&self) -> u32 {
        match self.indices {
            Some(indices) => indices.len() as u32,
            None => self.vertex_count,
        }
    }

    pub fn vertex_stride(&self) -> u64 {
        match self.dim {
            VertexDim::Two => std::mem::size_of::<Vertex2>() as u64,
            VertexDim::Three => std::mem::size_of::<Vertex3>() as u64,
        }
    }

    /// Input layout matching the built-in vertex shader's signature: a single
    /// position attribute at location 0, component count per `dim`.
    pub fn vertex_layout(&self) -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: self.vertex_stride(),
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: match self.dim {
                VertexDim::Two => &ATTRS_2D,
                VertexDim::Three => &ATTRS_3D,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_f32(bytes: &[u8]) -> f32 {
        f32::from_ne_bytes(bytes[..4].try_into().unwrap())
    }

    fn positions(geometry: &QuadGeometry) -> Vec<[f32; 2]> {
        let stride = geometry.vertex_stride() as usize;
        geometry
            .vertex_bytes()
            .chunks_exact(stride)
            .map(|chunk| [read_f32(chunk), read_f32(&chunk[4..])])
            .collect()
    }

    fn assert_full_coverage(geometry: &QuadGeometry) {
        let positions = positions(geometry);
        for corner in [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]] {
            assert!(
                positions.contains(&corner),
                "corner {corner:?} not covered"
            );
        }
        for [x, y] in positions {
            assert!((-1.0..=1.0).contains(&x) && (-1.0..=1.0).contains(&y));
        }
    }

    #[test]
    fn triangle_list_covers_full_screen() {
        let geometry = QuadGeometry::new(GeometryMode::Triangles, VertexDim::Two);
        assert_eq!(geometry.vertex_count(), 6);
        assert!(geometry.indices().is_none());
        assert_eq!(geometry.draw_count(), 6);
        assert_full_coverage(&geometry);
    }

    #[test]
    fn indexed_quad_covers_full_screen() {
        let geometry = QuadGeometry::new(GeometryMode::Indexed, VertexDim::Two);
        assert_eq!(geometry.vertex_count(), 4);
        assert_eq!(geometry.indices(), Some(&[0, 1, 2, 0, 2, 3]));
        assert_eq!(geometry.draw_count(), 6);
        assert_full_coverage(&geometry);
    }

    #[test]
    fn indices_stay_in_range() {
        let geometry = QuadGeometry::new(GeometryMode::Indexed, VertexDim::Two);
        for &index in geometry.indices().unwrap() {
            assert!((index as u32) < geometry.vertex_count());
        }
    }

    #[test]
    fn three_dimensional_vertices_zero_the_third_coordinate() {
        let geometry = QuadGeometry::new(GeometryMode::Triangles, VertexDim::Three);
        assert_eq!(geometry.vertex_stride(), 12);
        assert_full_coverage(&geometry);

        for chunk in geometry.vertex_bytes().chunks_exact(12) {
            assert_eq!(read_f32(&chunk[8..]), 0.0);
        }
    }

    #[test]
    fn layout_stride_matches_vertex_data() {
        for dim in [VertexDim::Two, VertexDim::Three] {
            let geometry = QuadGeometry::new(GeometryMode::Triangles, dim);
            let layout = geometry.vertex_layout();
            assert_eq!(layout.array_stride, geometry.vertex_stride());
            assert_eq!(
                geometry.vertex_bytes().len() as u64,
                layout.array_stride * geometry.vertex_count() as u64
            );
        }
    }
}
