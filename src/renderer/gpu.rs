use glam::Vec3;

use crate::anatomy::markers::AbnormalityMarker;
use crate::anatomy::mesh::TriangleMesh;
use crate::renderer::camera::{CameraUniform, OrbitCamera};

const MAX_CORTEX_VERTICES: usize = 65_536;
const MAX_CORTEX_INDICES: usize = 400_000;
const MAX_MARKER_VERTICES: usize = 4_096;
const MAX_MARKER_INDICES: usize = 20_480;

const MARKER_SEGMENTS: u32 = 32;

// Floats per marker vertex: position, normal, rgba, emissive.
const MARKER_VERTEX_FLOATS: usize = 13;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.008,
    g: 0.012,
    b: 0.033,
    a: 1.0,
};

pub struct BrainBuffers {
    pub cortex_vertex_buffer: wgpu::Buffer,
    pub cortex_normal_buffer: wgpu::Buffer,
    pub cortex_index_buffer: wgpu::Buffer,
    pub cortex_vertex_count: u32,
    pub cortex_index_count: u32,

    pub marker_vertex_buffer: wgpu::Buffer,
    pub marker_index_buffer: wgpu::Buffer,
    pub marker_index_count: u32,
}

impl BrainBuffers {
    pub fn new(device: &wgpu::Device) -> Self {
        let cortex_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cortex Vertex Buffer"),
            size: (MAX_CORTEX_VERTICES * 3 * 4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let cortex_normal_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cortex Normal Buffer"),
            size: (MAX_CORTEX_VERTICES * 3 * 4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let cortex_index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Cortex Index Buffer"),
            size: (MAX_CORTEX_INDICES * 4) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let marker_vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Marker Vertex Buffer"),
            size: (MAX_MARKER_VERTICES * MARKER_VERTEX_FLOATS * 4) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let marker_index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Marker Index Buffer"),
            size: (MAX_MARKER_INDICES * 4) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            cortex_vertex_buffer,
            cortex_normal_buffer,
            cortex_index_buffer,
            cortex_vertex_count: 0,
            cortex_index_count: 0,
            marker_vertex_buffer,
            marker_index_buffer,
            marker_index_count: 0,
        }
    }

    pub fn upload_cortex(&mut self, queue: &wgpu::Queue, mesh: &TriangleMesh) {
        let vertex_count = mesh.vertices.len().min(MAX_CORTEX_VERTICES * 3);
        let index_count = mesh.indices.len().min(MAX_CORTEX_INDICES);

        queue.write_buffer(
            &self.cortex_vertex_buffer,
            0,
            bytemuck::cast_slice(&mesh.vertices[..vertex_count]),
        );
        queue.write_buffer(
            &self.cortex_normal_buffer,
            0,
            bytemuck::cast_slice(&mesh.normals[..vertex_count]),
        );
        queue.write_buffer(
            &self.cortex_index_buffer,
            0,
            bytemuck::cast_slice(&mesh.indices[..index_count]),
        );

        self.cortex_vertex_count = (vertex_count / 3) as u32;
        self.cortex_index_count = index_count as u32;
    }

    pub fn upload_markers(&mut self, queue: &wgpu::Queue, vertices: &[f32], indices: &[u32]) {
        let float_count = vertices
            .len()
            .min(MAX_MARKER_VERTICES * MARKER_VERTEX_FLOATS);
        let index_count = indices.len().min(MAX_MARKER_INDICES);

        queue.write_buffer(
            &self.marker_vertex_buffer,
            0,
            bytemuck::cast_slice(&vertices[..float_count]),
        );
        queue.write_buffer(
            &self.marker_index_buffer,
            0,
            bytemuck::cast_slice(&indices[..index_count]),
        );

        self.marker_index_count = index_count as u32;
    }
}

pub struct GpuState {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    pub pipeline_cortex: wgpu::RenderPipeline,
    pub pipeline_marker: wgpu::RenderPipeline,

    pub camera_buffer: wgpu::Buffer,
    pub camera_bind_group: wgpu::BindGroup,

    pub brain_buffers: BrainBuffers,

    pub depth_texture: wgpu::TextureView,
}

fn cortex_position_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn cortex_normal_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: 12,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        }],
    }
}

fn marker_vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: (MARKER_VERTEX_FLOATS * 4) as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x4,
            },
            wgpu::VertexAttribute {
                offset: 40,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x3,
            },
        ],
    }
}

impl GpuState {
    pub async fn new(window: std::sync::Arc<winit::window::Window>) -> Self {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window).unwrap();

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: None,
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders.wgsl").into()),
        });

        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Buffer"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let brain_buffers = BrainBuffers::new(&device);

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Camera Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Brain Pipeline Layout"),
            bind_group_layouts: &[&camera_bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline_cortex = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Cortex Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_cortex_main"),
                buffers: &[cortex_position_layout(), cortex_normal_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_cortex_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Markers are annotations, not anatomy. They skip the depth test so a
        // region seated inside the cortex still reads through the surface, and
        // they never write depth so the blend order stays with the buffer.
        let pipeline_marker = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Marker Render Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_marker_main"),
                buffers: &[marker_vertex_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_marker_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: wgpu::TextureFormat::Depth32Float,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Always,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let depth_texture = Self::create_depth_texture(&device, &config);

        Self {
            surface,
            device,
            queue,
            config,
            size,
            pipeline_cortex,
            pipeline_marker,
            camera_buffer,
            camera_bind_group,
            brain_buffers,
            depth_texture,
        }
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        let size = wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        };

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = Self::create_depth_texture(&self.device, &self.config);
        }
    }

    pub fn update_camera(&self, camera: &OrbitCamera) {
        let uniform = CameraUniform::from_camera(camera);
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::cast_slice(&[uniform]));
    }

    pub fn set_vsync(&mut self, enabled: bool) {
        self.config.present_mode = if enabled {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        };
        self.surface.configure(&self.device, &self.config);
    }

    pub fn render_cortex(&self, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Cortex Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline_cortex);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.brain_buffers.cortex_vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.brain_buffers.cortex_normal_buffer.slice(..));
        render_pass.set_index_buffer(
            self.brain_buffers.cortex_index_buffer.slice(..),
            wgpu::IndexFormat::Uint32,
        );
        render_pass.draw_indexed(0..self.brain_buffers.cortex_index_count, 0, 0..1);
    }

    pub fn render_markers(&self, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Marker Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        render_pass.set_pipeline(&self.pipeline_marker);
        render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.brain_buffers.marker_vertex_buffer.slice(..));
        render_pass.set_index_buffer(
            self.brain_buffers.marker_index_buffer.slice(..),
            wgpu::IndexFormat::Uint32,
        );
        render_pass.draw_indexed(0..self.brain_buffers.marker_index_count, 0, 0..1);
    }

    pub fn clear_pass(&self, view: &wgpu::TextureView, encoder: &mut wgpu::CommandEncoder) {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Clear Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_texture,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
    }
}

/// Bakes translucent shells for the given markers into one interleaved
/// vertex/index pair. Slice order is preserved, so feeding markers sorted by
/// opacity keeps the draw blending faintest-first.
pub fn generate_marker_geometry(markers: &[AbnormalityMarker]) -> (Vec<f32>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for marker in markers {
        let base = (vertices.len() / MARKER_VERTEX_FLOATS) as u32;
        let emissive = [
            marker.emissive[0] * marker.emissive_intensity,
            marker.emissive[1] * marker.emissive_intensity,
            marker.emissive[2] * marker.emissive_intensity,
        ];

        for i in 0..=MARKER_SEGMENTS {
            let theta = std::f32::consts::PI * i as f32 / MARKER_SEGMENTS as f32;
            for j in 0..=MARKER_SEGMENTS {
                let phi = std::f32::consts::TAU * j as f32 / MARKER_SEGMENTS as f32;
                let normal = Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.cos(),
                    theta.sin() * phi.sin(),
                );
                let position = marker.position + normal * marker.radius;

                vertices.extend_from_slice(&[
                    position.x,
                    position.y,
                    position.z,
                    normal.x,
                    normal.y,
                    normal.z,
                    marker.color[0],
                    marker.color[1],
                    marker.color[2],
                    marker.opacity,
                    emissive[0],
                    emissive[1],
                    emissive[2],
                ]);
            }
        }

        let row = MARKER_SEGMENTS + 1;
        for i in 0..MARKER_SEGMENTS {
            for j in 0..MARKER_SEGMENTS {
                let tl = base + i * row + j;
                let tr = tl + 1;
                let bl = tl + row;
                let br = bl + 1;
                indices.extend_from_slice(&[tl, tr, bl, tr, br, bl]);
            }
        }
    }

    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anatomy::markers::MARKERS;

    #[test]
    fn marker_geometry_keeps_the_slice_order() {
        let (vertices, indices) = generate_marker_geometry(MARKERS);

        let per_shell = ((MARKER_SEGMENTS + 1) * (MARKER_SEGMENTS + 1)) as usize;
        assert_eq!(vertices.len(), MARKERS.len() * per_shell * MARKER_VERTEX_FLOATS);
        assert_eq!(
            indices.len(),
            MARKERS.len() * (MARKER_SEGMENTS * MARKER_SEGMENTS * 6) as usize
        );

        // Opacity rides in the tenth float of each vertex and must never
        // decrease along the buffer.
        let opacities: Vec<f32> = vertices
            .chunks(MARKER_VERTEX_FLOATS)
            .map(|v| v[9])
            .collect();
        assert!(opacities.windows(2).all(|w| w[0] <= w[1]));

        let vertex_count = (vertices.len() / MARKER_VERTEX_FLOATS) as u32;
        assert!(indices.iter().all(|&i| i < vertex_count));
    }

    #[test]
    fn marker_geometry_fits_the_preallocated_buffers() {
        let (vertices, indices) = generate_marker_geometry(MARKERS);
        assert!(vertices.len() <= MAX_MARKER_VERTICES * MARKER_VERTEX_FLOATS);
        assert!(indices.len() <= MAX_MARKER_INDICES);
    }
}
