/// Per-vertex attributes: NDC position on the XY plane and a texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub texture_coordinate: [f32; 2],
}

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

impl QuadVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub const fn new(position: [f32; 2], texture_coordinate: [f32; 2]) -> Self {
        Self {
            position,
            texture_coordinate,
        }
    }
}

impl Vertex for QuadVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Two triangles covering the whole viewport.
///
/// Corners are taken in the order `min, (max.x, min.y), max, (min.x, max.y)`
/// and split as `[0, 1, 2, 0, 2, 3]`. UV `(0, 0)` sits at NDC `(-1, -1)`, the
/// bottom left of the framebuffer.
pub const SCREEN_QUAD: [QuadVertex; 6] = [
    QuadVertex::new([-1., -1.], [0., 0.]),
    QuadVertex::new([1., -1.], [1., 0.]),
    QuadVertex::new([1., 1.], [1., 1.]),
    QuadVertex::new([-1., -1.], [0., 0.]),
    QuadVertex::new([1., 1.], [1., 1.]),
    QuadVertex::new([-1., 1.], [0., 1.]),
];

/// Values produced by the vertex stage, before rasterizer interpolation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct VertexOutput {
    pub clip_position: [f32; 4],
    pub texture_coordinate: [f32; 2],
}

/// CPU mirror of `vs_main`.
///
/// Positions are already in normalized device coordinates: depth is pinned
/// to 0 and `w` to 1, so there is no perspective divide.
pub fn vertex_stage(vertex: QuadVertex) -> VertexOutput {
    let [x, y] = vertex.position;
    VertexOutput {
        clip_position: [x, y, 0.0, 1.0],
        texture_coordinate: vertex.texture_coordinate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_and_w_are_fixed() {
        let inputs = [
            QuadVertex::new([0.0, 0.0], [0.5, 0.5]),
            QuadVertex::new([-3.5, 12.0], [-1.0, 2.0]),
            QuadVertex::new([f32::MAX, f32::MIN], [0.0, 0.0]),
        ];
        for vertex in inputs {
            let out = vertex_stage(vertex);
            assert_eq!(out.clip_position[2], 0.0);
            assert_eq!(out.clip_position[3], 1.0);
            assert_eq!(out.clip_position[0], vertex.position[0]);
            assert_eq!(out.clip_position[1], vertex.position[1]);
        }
    }

    #[test]
    fn texture_coordinate_passes_through_bit_exact() {
        let odd = [0.1f32 + 0.2, 1.0 / 3.0];
        let out = vertex_stage(QuadVertex::new([0.25, -0.75], odd));
        assert_eq!(out.texture_coordinate[0].to_bits(), odd[0].to_bits());
        assert_eq!(out.texture_coordinate[1].to_bits(), odd[1].to_bits());
    }

    #[test]
    fn screen_quad_covers_ndc() {
        for vertex in SCREEN_QUAD {
            let [x, y] = vertex.position;
            let [u, v] = vertex.texture_coordinate;
            assert_eq!(u, (x + 1.) / 2.);
            assert_eq!(v, (y + 1.) / 2.);
        }
        let xs: Vec<f32> = SCREEN_QUAD.iter().map(|v| v.position[0]).collect();
        assert!(xs.contains(&-1.) && xs.contains(&1.));
    }

    #[test]
    fn layout_matches_attribute_locations() {
        let layout = QuadVertex::desc();
        assert_eq!(layout.array_stride, 16);
        assert_eq!(layout.attributes.len(), 2);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.attributes[0].offset, 0);
        assert_eq!(layout.attributes[1].shader_location, 1);
        assert_eq!(layout.attributes[1].offset, 8);
        assert_eq!(layout.attributes[1].format, wgpu::VertexFormat::Float32x2);
    }
}
