use bytemuck::{Pod, Zeroable};

/// Clip-space position, `w` always 1.
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct QuadVertex {
    pub position: [f32; 4],
}

pub const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex::new(-1.0, -1.0), // bottom-left
    QuadVertex::new(1.0, -1.0),  // bottom-right
    QuadVertex::new(-1.0, 1.0),  // top-left
    QuadVertex::new(1.0, 1.0),   // top-right
];

/// Two counter-clockwise triangles covering the screen.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x4];

impl QuadVertex {
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            position: [x, y, 0.0, 1.0],
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_area(tri: &[u16]) -> f32 {
        let p = |i: u16| QUAD_VERTICES[i as usize].position;
        let (a, b, c) = (p(tri[0]), p(tri[1]), p(tri[2]));
        (b[0] - a[0]) * (c[1] - a[1]) - (c[0] - a[0]) * (b[1] - a[1])
    }

    #[test]
    fn test_quad_triangles_wind_ccw_and_cover_screen() {
        let area: f32 = QUAD_INDICES
            .chunks_exact(3)
            .map(|tri| {
                let a = signed_area(tri);
                assert!(a > 0.0);
                a / 2.0
            })
            .sum();
        assert_eq!(area, 4.0);
    }

    #[test]
    fn test_corners_sit_on_the_clip_plane() {
        assert_eq!(QUAD_VERTICES[0].position, [-1.0, -1.0, 0.0, 1.0]);
        assert_eq!(QUAD_VERTICES[3].position, [1.0, 1.0, 0.0, 1.0]);
        assert!(QUAD_VERTICES
            .iter()
            .all(|v| v.position[2] == 0.0 && v.position[3] == 1.0));
    }

    #[test]
    fn test_vertex_layout() {
        let layout = QuadVertex::layout();
        assert_eq!(layout.array_stride, 16);
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].format, wgpu::VertexFormat::Float32x4);
        assert_eq!(bytemuck::cast_slice::<_, u8>(&QUAD_VERTICES).len(), 64);
    }
}
