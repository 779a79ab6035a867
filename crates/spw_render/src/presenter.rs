//! Uploads the composited back buffer and blits it to the window surface.
//!
//! The back buffer keeps its own resolution; it is scaled by the largest
//! whole factor that fits the surface and centered, with black bars filling
//! the rest. When the surface is smaller than the back buffer the quad is
//! shrunk to fit instead.

use spw_core::PixelBuffer;

use crate::gpu_context::GpuContext;
use crate::vertex::PresentVertex;

pub struct Presenter {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    frame_size: (u32, u32),
}

/// Clip-space rectangle `(x0, y0, x1, y1)` for a `frame` letterboxed in `surface`.
pub fn letterbox(surface: (u32, u32), frame: (u32, u32)) -> (f32, f32, f32, f32) {
    let (sw, sh) = (surface.0.max(1) as f32, surface.1.max(1) as f32);
    let (fw, fh) = (frame.0.max(1) as f32, frame.1.max(1) as f32);
    let fit = (sw / fw).min(sh / fh);
    let scale = if fit >= 1.0 { fit.floor() } else { fit };
    let half_w = fw * scale / sw;
    let half_h = fh * scale / sh;
    (-half_w, -half_h, half_w, half_h)
}

impl Presenter {
    pub fn new(gpu: &GpuContext, frame_width: u32, frame_height: u32) -> Self {
        let device = &gpu.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Present Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("present.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Present Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Present Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Present Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[PresentVertex::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: gpu.surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Nearest filtering keeps pixel art crisp under integer scaling.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Present Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Present Quad"),
            size: (std::mem::size_of::<PresentVertex>() * 6) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let frame_size = (frame_width.max(1), frame_height.max(1));
        let texture = Self::create_frame_texture(device, frame_size);
        let bind_group = Self::create_bind_group(device, &bind_group_layout, &sampler, &texture);

        log::info!(
            "Presenter ready: {}x{} back buffer -> {:?}",
            frame_size.0,
            frame_size.1,
            gpu.surface_format
        );

        Self {
            pipeline,
            bind_group_layout,
            sampler,
            texture,
            bind_group,
            vertex_buffer,
            frame_size,
        }
    }

    fn create_frame_texture(device: &wgpu::Device, size: (u32, u32)) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Back Buffer Texture"),
            size: wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        })
    }

    fn create_bind_group(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        texture: &wgpu::Texture,
    ) -> wgpu::BindGroup {
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Present Bind Group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }

    /// Upload `frame` and record a pass that clears `view` to black and draws
    /// the letterboxed quad.
    pub fn present(
        &mut self,
        gpu: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        frame: &PixelBuffer,
    ) {
        let size = (frame.width(), frame.height());
        if size != self.frame_size {
            log::debug!("Back buffer resized to {}x{}", size.0, size.1);
            self.frame_size = size;
            self.texture = Self::create_frame_texture(&gpu.device, size);
            self.bind_group = Self::create_bind_group(
                &gpu.device,
                &self.bind_group_layout,
                &self.sampler,
                &self.texture,
            );
        }

        gpu.queue.write_texture(
            self.texture.as_image_copy(),
            &frame.to_rgba8(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.0),
                rows_per_image: Some(size.1),
            },
            wgpu::Extent3d {
                width: size.0,
                height: size.1,
                depth_or_array_layers: 1,
            },
        );

        let (x0, y0, x1, y1) = letterbox(gpu.size, size);
        let quad = PresentVertex::quad(x0, y0, x1, y1);
        gpu.queue
            .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&quad));

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Present Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            ..Default::default()
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.draw(0..6, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::letterbox;

    #[test]
    fn letterbox_uses_integer_scale() {
        // 320x180 in 1280x800: scale 4 fills the width, bars top and bottom.
        let (x0, y0, x1, y1) = letterbox((1280, 800), (320, 180));
        assert_eq!((x0, x1), (-1.0, 1.0));
        assert!((y1 - 720.0 / 800.0).abs() < 1e-6);
        assert_eq!(y0, -y1);
    }

    #[test]
    fn letterbox_shrinks_when_surface_is_smaller() {
        let (x0, _, x1, y1) = letterbox((160, 90), (320, 180));
        assert_eq!((x0, x1, y1), (-1.0, 1.0, 1.0));
    }

    #[test]
    fn letterbox_keeps_whole_factor_between_sizes() {
        // 1.5x would fit but only 1x is whole.
        let (_, _, x1, _) = letterbox((480, 270), (320, 180));
        assert!((x1 - 320.0 / 480.0).abs() < 1e-6);
    }
}
