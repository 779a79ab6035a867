#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PresentVertex {
    /// Clip space, `[-1, 1]` on both axes.
    pub position: [f32; 2],
    pub tex_coords: [f32; 2],
}

impl PresentVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PresentVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// Triangle-list quad covering `[x0, x1] x [y0, y1]` in clip space.
    pub fn quad(x0: f32, y0: f32, x1: f32, y1: f32) -> [PresentVertex; 6] {
        let v = |x, y, u, t| PresentVertex {
            position: [x, y],
            tex_coords: [u, t],
        };
        [
            v(x0, y0, 0.0, 1.0),
            v(x1, y0, 1.0, 1.0),
            v(x1, y1, 1.0, 0.0),
            v(x0, y0, 0.0, 1.0),
            v(x1, y1, 1.0, 0.0),
            v(x0, y1, 0.0, 0.0),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_maps_top_of_frame_to_top_of_clip_space() {
        let quad = PresentVertex::quad(-1.0, -1.0, 1.0, 1.0);
        let top_left = quad
            .iter()
            .find(|v| v.position == [-1.0, 1.0])
            .expect("top-left corner");
        assert_eq!(top_left.tex_coords, [0.0, 0.0]);
        assert_eq!(std::mem::size_of::<PresentVertex>(), 16);
    }
}
