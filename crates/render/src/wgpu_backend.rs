//! [`GpuDevice`] on top of wgpu.
//!
//! Calls are buffered per frame: binds, clears and uniform snapshots are
//! collected into segments, one per render-target binding, and encoded into
//! wgpu render passes when the frame is presented.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroU64;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::gpu::{
    validate_wgsl, BufferId, ClearFlags, DepthFormat, DepthTargetId, GpuDevice, GpuError,
    ProgramDesc, ProgramId, RenderTarget, ShadingMode, TextureDesc, TextureId, UniformValue,
    VertexLayout,
};
use crate::uniforms::{UniformBlock, UniformLayout};

const SCENE_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const TEXTURE_UNITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TargetKind {
    Surface,
    Depth(DepthFormat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PipelineKey {
    program: ProgramId,
    target: TargetKind,
    depth_test: bool,
}

struct GpuProgram {
    name: String,
    mode: ShadingMode,
    module: wgpu::ShaderModule,
    block: UniformBlock,
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    vertices: u32,
}

enum TextureKind {
    Color,
    Depth,
}

struct GpuTexture {
    // Kept alive for the view.
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    kind: TextureKind,
}

struct DepthTarget {
    texture: TextureId,
    format: DepthFormat,
    size: (u32, u32),
}

struct DrawCall {
    key: PipelineKey,
    buffer: BufferId,
    vertex_count: u32,
    uniform_offset: u32,
    viewport: (u32, u32),
    units: [Option<TextureId>; TEXTURE_UNITS],
}

struct Segment {
    target: RenderTarget,
    clear: Option<(ClearFlags, [f32; 4])>,
    draws: Vec<DrawCall>,
}

/// Hardware device presenting to a window surface.
pub struct WgpuDevice {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    scene_depth_view: wgpu::TextureView,

    uniform_layout: wgpu::BindGroupLayout,
    material_layout: wgpu::BindGroupLayout,
    depth_pipeline_layout: wgpu::PipelineLayout,
    material_pipeline_layout: wgpu::PipelineLayout,
    color_sampler: wgpu::Sampler,
    shadow_sampler: wgpu::Sampler,
    fallback_color: TextureId,
    fallback_depth: TextureId,

    uniform_buffer: wgpu::Buffer,
    uniform_capacity: u64,
    uniform_alignment: u64,
    uniform_binding_size: u64,
    uniform_staging: Vec<u8>,

    programs: HashMap<ProgramId, GpuProgram>,
    buffers: HashMap<BufferId, GpuBuffer>,
    textures: HashMap<TextureId, GpuTexture>,
    depth_targets: HashMap<DepthTargetId, DepthTarget>,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    rejected: HashSet<PipelineKey>,
    next_id: u32,

    segments: Vec<Segment>,
    target: RenderTarget,
    viewport: (u32, u32),
    program: Option<ProgramId>,
    units: [Option<TextureId>; TEXTURE_UNITS],
    depth_test: bool,
    frames: u64,
}

impl WgpuDevice {
    /// Open the GPU and configure the window surface.
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::AdapterUnavailable)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("landscape device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(GpuError::AdapterUnavailable)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let scene_depth_view = create_scene_depth(&device, config.width, config.height);

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Block Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let color_texture_entry = |binding| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material Texture Layout"),
            entries: &[
                color_texture_entry(0),
                color_texture_entry(1),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 4,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let depth_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Depth Pipeline Layout"),
            bind_group_layouts: &[&uniform_layout],
            push_constant_ranges: &[],
        });
        let material_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Material Pipeline Layout"),
                bind_group_layouts: &[&uniform_layout, &material_layout],
                push_constant_ranges: &[],
            });

        let color_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Shadow Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let uniform_alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let uniform_binding_size = max_uniform_block_size();
        let uniform_capacity = align_up(uniform_binding_size, uniform_alignment) * 64;
        let uniform_buffer = create_uniform_buffer(&device, uniform_capacity);

        tracing::info!(
            width = config.width,
            height = config.height,
            format = ?surface_format,
            "GPU rendering context initialized"
        );

        let mut gpu = Self {
            surface,
            device,
            queue,
            config,
            scene_depth_view,
            uniform_layout,
            material_layout,
            depth_pipeline_layout,
            material_pipeline_layout,
            color_sampler,
            shadow_sampler,
            fallback_color: TextureId(0),
            fallback_depth: TextureId(0),
            uniform_buffer,
            uniform_capacity,
            uniform_alignment,
            uniform_binding_size,
            uniform_staging: Vec::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            depth_targets: HashMap::new(),
            pipelines: HashMap::new(),
            rejected: HashSet::new(),
            next_id: 0,
            segments: Vec::new(),
            target: RenderTarget::Default,
            viewport: (size.width.max(1), size.height.max(1)),
            program: None,
            units: [None; TEXTURE_UNITS],
            depth_test: false,
            frames: 0,
        };

        gpu.fallback_color = gpu.create_texture(&TextureDesc {
            label: "Fallback White",
            width: 1,
            height: 1,
            pixels: &[255, 255, 255, 255],
        })?;
        let (_, fallback_depth) = gpu.create_depth_target(1, 1, DepthFormat::Depth32)?;
        gpu.clear_depth_texture(fallback_depth);
        gpu.fallback_depth = fallback_depth;

        Ok(gpu)
    }

    /// Swapchain texture format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Frames presented so far, not counting skipped ones.
    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn current_segment(&mut self) -> &mut Segment {
        if self.segments.last().map(|s| s.target) != Some(self.target) {
            self.segments.push(Segment {
                target: self.target,
                clear: None,
                draws: Vec::new(),
            });
        }
        let len = self.segments.len();
        &mut self.segments[len - 1]
    }

    fn target_kind(&self, target: RenderTarget) -> Option<TargetKind> {
        match target {
            RenderTarget::Default => Some(TargetKind::Surface),
            RenderTarget::Depth(id) => self.depth_targets.get(&id).map(|t| TargetKind::Depth(t.format)),
        }
    }

    fn target_size(&self, target: RenderTarget) -> (u32, u32) {
        match target {
            RenderTarget::Default => (self.config.width, self.config.height),
            RenderTarget::Depth(id) => self.depth_targets.get(&id).map_or((1, 1), |t| t.size),
        }
    }

    fn build_pipeline(&self, program: &GpuProgram, key: PipelineKey) -> Option<wgpu::RenderPipeline> {
        let (layout, depth_format, fragment_targets, bias, cull) = match (program.mode, key.target) {
            (ShadingMode::DepthOnly, TargetKind::Depth(format)) => (
                &self.depth_pipeline_layout,
                format.texture_format(),
                None,
                wgpu::DepthBiasState {
                    constant: 2,
                    slope_scale: 2.0,
                    clamp: 0.0,
                },
                Some(wgpu::Face::Back),
            ),
            (ShadingMode::Material, TargetKind::Surface) => (
                &self.material_pipeline_layout,
                SCENE_DEPTH_FORMAT,
                Some([Some(wgpu::ColorTargetState {
                    format: self.config.format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })]),
                wgpu::DepthBiasState::default(),
                Some(wgpu::Face::Back),
            ),
            (mode, target) => {
                tracing::warn!(
                    program = %program.name,
                    ?mode,
                    ?target,
                    "program cannot draw into this target"
                );
                return None;
            }
        };

        let attributes = vertex_attributes(VertexLayout::position_normal_uv());
        let label = format!("{} pipeline", program.name);

        Some(self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: &program.module,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: u64::from(VertexLayout::position_normal_uv().stride) * 4,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &attributes,
                }],
            },
            fragment: fragment_targets.as_ref().map(|targets| wgpu::FragmentState {
                module: &program.module,
                entry_point: "fs_main",
                targets,
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: cull,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: key.depth_test,
                depth_compare: if key.depth_test {
                    wgpu::CompareFunction::Less
                } else {
                    wgpu::CompareFunction::Always
                },
                stencil: wgpu::StencilState::default(),
                bias,
            }),
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        }))
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) -> bool {
        if self.pipelines.contains_key(&key) {
            return true;
        }
        if self.rejected.contains(&key) {
            return false;
        }
        let Some(program) = self.programs.get(&key.program) else {
            return false;
        };
        match self.build_pipeline(program, key) {
            Some(pipeline) => {
                self.pipelines.insert(key, pipeline);
                true
            }
            None => {
                self.rejected.insert(key);
                false
            }
        }
    }

    fn clear_depth_texture(&mut self, texture: TextureId) {
        let Some(gpu_texture) = self.textures.get(&texture) else {
            return;
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Depth Clear Encoder"),
            });
        {
            let _pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Depth Clear Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &gpu_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
        }
        self.queue.submit(Some(encoder.finish()));
    }

    fn upload_uniforms(&mut self) {
        let needed = self.uniform_staging.len() as u64;
        if needed == 0 {
            return;
        }
        if needed > self.uniform_capacity {
            self.uniform_capacity = needed.next_power_of_two();
            self.uniform_buffer = create_uniform_buffer(&self.device, self.uniform_capacity);
            tracing::debug!(capacity = self.uniform_capacity, "grew uniform arena");
        }
        self.queue
            .write_buffer(&self.uniform_buffer, 0, &self.uniform_staging);
    }

    fn material_bind_group(
        &self,
        units: &[Option<TextureId>; TEXTURE_UNITS],
    ) -> Option<wgpu::BindGroup> {
        let color_view = |unit: Option<TextureId>| {
            unit.and_then(|id| self.textures.get(&id))
                .filter(|t| matches!(t.kind, TextureKind::Color))
                .or_else(|| self.textures.get(&self.fallback_color))
                .map(|t| &t.view)
        };
        let depth_view = units[2]
            .and_then(|id| self.textures.get(&id))
            .filter(|t| matches!(t.kind, TextureKind::Depth))
            .or_else(|| self.textures.get(&self.fallback_depth))
            .map(|t| &t.view)?;
        let diffuse = color_view(units[0])?;
        let specular = color_view(units[1])?;

        Some(self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material Bind Group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(diffuse),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(specular),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.color_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&self.shadow_sampler),
                },
            ],
        }))
    }

    fn reset_frame(&mut self) {
        self.segments.clear();
        self.uniform_staging.clear();
    }

    fn encode_frame(&mut self, frame_view: &wgpu::TextureView) {
        let segments = std::mem::take(&mut self.segments);

        let keys: Vec<PipelineKey> = segments
            .iter()
            .flat_map(|s| s.draws.iter().map(|d| d.key))
            .collect();
        for key in keys {
            self.ensure_pipeline(key);
        }

        self.upload_uniforms();

        let uniform_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Block Bind Group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &self.uniform_buffer,
                    offset: 0,
                    size: NonZeroU64::new(self.uniform_binding_size),
                }),
            }],
        });

        let mut material_groups: Vec<wgpu::BindGroup> = Vec::new();
        let mut group_index: HashMap<[Option<TextureId>; TEXTURE_UNITS], Option<usize>> =
            HashMap::new();
        let mut draw_groups: Vec<Vec<Option<usize>>> = Vec::with_capacity(segments.len());
        for segment in &segments {
            let mut groups = Vec::with_capacity(segment.draws.len());
            for draw in &segment.draws {
                let material = self
                    .programs
                    .get(&draw.key.program)
                    .is_some_and(|p| p.mode == ShadingMode::Material);
                if !material {
                    groups.push(None);
                    continue;
                }
                let index = *group_index.entry(draw.units).or_insert_with(|| {
                    let group = self.material_bind_group(&draw.units)?;
                    material_groups.push(group);
                    Some(material_groups.len() - 1)
                });
                groups.push(index);
            }
            draw_groups.push(groups);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Landscape Frame Encoder"),
            });

        for (segment, groups) in segments.iter().zip(&draw_groups) {
            if segment.clear.is_none() && segment.draws.is_empty() {
                continue;
            }
            let flags = segment.clear.map_or(ClearFlags::empty(), |(flags, _)| flags);
            let depth_ops = Some(wgpu::Operations {
                load: if flags.contains(ClearFlags::DEPTH) {
                    wgpu::LoadOp::Clear(1.0)
                } else {
                    wgpu::LoadOp::Load
                },
                store: wgpu::StoreOp::Store,
            });

            let (color_attachments, depth_view) = match segment.target {
                RenderTarget::Default => {
                    let color = segment.clear.map_or([0.0; 4], |(_, color)| color);
                    let load = if flags.contains(ClearFlags::COLOR) {
                        wgpu::LoadOp::Clear(wgpu::Color {
                            r: f64::from(color[0]),
                            g: f64::from(color[1]),
                            b: f64::from(color[2]),
                            a: f64::from(color[3]),
                        })
                    } else {
                        wgpu::LoadOp::Load
                    };
                    (
                        vec![Some(wgpu::RenderPassColorAttachment {
                            view: frame_view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load,
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        Some(&self.scene_depth_view),
                    )
                }
                RenderTarget::Depth(id) => {
                    let view = self
                        .depth_targets
                        .get(&id)
                        .and_then(|t| self.textures.get(&t.texture))
                        .map(|t| &t.view);
                    (Vec::new(), view)
                }
            };
            let Some(depth_view) = depth_view else {
                tracing::warn!(target = ?segment.target, "skipping pass for unknown render target");
                continue;
            };

            let target_size = self.target_size(segment.target);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Landscape Pass"),
                color_attachments: &color_attachments,
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: depth_view,
                    depth_ops,
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            for (draw, group) in segment.draws.iter().zip(groups) {
                let (Some(pipeline), Some(buffer)) =
                    (self.pipelines.get(&draw.key), self.buffers.get(&draw.buffer))
                else {
                    continue;
                };
                let count = draw.vertex_count.min(buffer.vertices);
                let width = draw.viewport.0.clamp(1, target_size.0);
                let height = draw.viewport.1.clamp(1, target_size.1);
                pass.set_viewport(0.0, 0.0, width as f32, height as f32, 0.0, 1.0);
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &uniform_bind_group, &[draw.uniform_offset]);
                if let Some(index) = group {
                    pass.set_bind_group(1, &material_groups[*index], &[]);
                }
                pass.set_vertex_buffer(0, buffer.buffer.slice(..));
                pass.draw(0..count, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
    }
}

fn max_uniform_block_size() -> u64 {
    [ShadingMode::DepthOnly, ShadingMode::Material]
        .into_iter()
        .map(|mode| UniformLayout::for_mode(mode).size() as u64)
        .max()
        .unwrap_or(16)
}

fn align_up(value: u64, alignment: u64) -> u64 {
    value.div_ceil(alignment) * alignment
}

fn create_uniform_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Uniform Arena"),
        size,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_scene_depth(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Scene Depth Texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: SCENE_DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

fn vertex_attributes(layout: VertexLayout) -> Vec<wgpu::VertexAttribute> {
    layout
        .attributes
        .iter()
        .map(|attr| wgpu::VertexAttribute {
            offset: u64::from(attr.offset) * 4,
            shader_location: attr.location,
            format: match attr.components {
                1 => wgpu::VertexFormat::Float32,
                2 => wgpu::VertexFormat::Float32x2,
                3 => wgpu::VertexFormat::Float32x3,
                _ => wgpu::VertexFormat::Float32x4,
            },
        })
        .collect()
}

fn upload_rgba_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    width: u32,
    height: u32,
    pixels: &[u8],
    label: &str,
) -> wgpu::Texture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    let row_bytes = width as usize * 4;
    let alignment = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    let padded_row_bytes = row_bytes.div_ceil(alignment) * alignment;

    let padded;
    let data = if padded_row_bytes == row_bytes {
        pixels
    } else {
        let mut rows = vec![0u8; padded_row_bytes * height as usize];
        for (src, dst) in pixels
            .chunks_exact(row_bytes)
            .zip(rows.chunks_exact_mut(padded_row_bytes))
        {
            dst[..row_bytes].copy_from_slice(src);
        }
        padded = rows;
        &padded
    };

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(padded_row_bytes as u32),
            rows_per_image: Some(height),
        },
        size,
    );

    texture
}

impl GpuDevice for WgpuDevice {
    fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn bind_render_target(&mut self, target: RenderTarget) {
        self.target = target;
    }

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]) {
        let target = self.target;
        if self
            .segments
            .last()
            .is_some_and(|s| s.target == target && !s.draws.is_empty())
        {
            // Clearing after draws starts a fresh pass on the same target.
            self.segments.push(Segment {
                target,
                clear: None,
                draws: Vec::new(),
            });
        }
        self.current_segment().clear = Some((flags, color));
    }

    fn enable_depth_test(&mut self) {
        self.depth_test = true;
    }

    fn use_program(&mut self, program: ProgramId) {
        self.program = Some(program);
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: UniformValue) {
        match self.programs.get_mut(&program) {
            Some(gpu_program) => {
                gpu_program.block.set(name, value);
            }
            None => tracing::warn!(?program, name, "uniform set on unknown program"),
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        match self.units.get_mut(unit as usize) {
            Some(slot) => *slot = Some(texture),
            None => tracing::warn!(unit, ?texture, "texture unit out of range"),
        }
    }

    fn draw(&mut self, buffer: BufferId, vertex_count: u32) {
        let Some(program) = self.program else {
            tracing::warn!(?buffer, "draw without a program");
            return;
        };
        let Some(target) = self.target_kind(self.target) else {
            tracing::warn!(target = ?self.target, "draw into unknown render target");
            return;
        };
        let Some(bytes) = self.programs.get(&program).map(|p| p.block.bytes().to_vec()) else {
            tracing::warn!(?program, "draw with unknown program");
            return;
        };

        let offset = align_up(self.uniform_staging.len() as u64, self.uniform_alignment);
        let end = offset + self.uniform_binding_size;
        self.uniform_staging.resize(end as usize, 0);
        self.uniform_staging[offset as usize..offset as usize + bytes.len()]
            .copy_from_slice(&bytes);

        let call = DrawCall {
            key: PipelineKey {
                program,
                target,
                depth_test: self.depth_test,
            },
            buffer,
            vertex_count,
            uniform_offset: offset as u32,
            viewport: self.viewport,
            units: self.units,
        };
        self.current_segment().draws.push(call);
    }

    fn present(&mut self) -> Result<(), GpuError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::warn!("surface lost or outdated; reconfiguring and skipping frame");
                self.surface.configure(&self.device, &self.config);
                self.reset_frame();
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("surface timeout; skipping frame");
                self.reset_frame();
                return Ok(());
            }
            Err(err) => {
                self.reset_frame();
                return Err(err.into());
            }
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.encode_frame(&view);
        frame.present();
        self.reset_frame();
        self.frames += 1;
        Ok(())
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, GpuError> {
        validate_wgsl(desc.name, desc.source, desc.mode)?;

        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = self
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(desc.name),
                source: wgpu::ShaderSource::Wgsl(desc.source.into()),
            });
        let program = ProgramId(self.next_id());
        self.programs.insert(
            program,
            GpuProgram {
                name: desc.name.to_string(),
                mode: desc.mode,
                module,
                block: UniformBlock::new(UniformLayout::for_mode(desc.mode)),
            },
        );
        let target = match desc.mode {
            ShadingMode::DepthOnly => TargetKind::Depth(DepthFormat::Depth32),
            ShadingMode::Material => TargetKind::Surface,
        };
        self.ensure_pipeline(PipelineKey {
            program,
            target,
            depth_test: true,
        });

        if let Some(err) = pollster::block_on(self.device.pop_error_scope()) {
            self.programs.remove(&program);
            self.pipelines.retain(|key, _| key.program != program);
            return Err(GpuError::ShaderLink {
                name: desc.name.to_string(),
                log: err.to_string(),
            });
        }
        Ok(program)
    }

    fn create_vertex_buffer(
        &mut self,
        data: &[f32],
        layout: VertexLayout,
    ) -> Result<BufferId, GpuError> {
        if layout != VertexLayout::position_normal_uv() {
            return Err(GpuError::UnsupportedLayout {
                stride: layout.stride,
            });
        }
        let stride = layout.stride as usize;
        if data.len() % stride != 0 {
            return Err(GpuError::InvalidVertexData {
                len: data.len(),
                stride: layout.stride,
            });
        }
        let id = BufferId(self.next_id());
        // wgpu rejects zero-sized vertex buffers.
        let contents: &[u8] = if data.is_empty() {
            &[0; 4]
        } else {
            bytemuck::cast_slice(data)
        };
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.buffers.insert(
            id,
            GpuBuffer {
                buffer,
                vertices: (data.len() / stride) as u32,
            },
        );
        Ok(id)
    }

    fn destroy_vertex_buffer(&mut self, buffer: BufferId) {
        match self.buffers.remove(&buffer) {
            Some(gpu_buffer) => gpu_buffer.buffer.destroy(),
            None => tracing::warn!(?buffer, "destroying unknown vertex buffer"),
        }
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId, GpuError> {
        let expected = desc.width as usize * desc.height as usize * 4;
        if desc.pixels.len() != expected || desc.width == 0 || desc.height == 0 {
            return Err(GpuError::InvalidTextureData {
                label: desc.label.to_string(),
                expected,
                found: desc.pixels.len(),
            });
        }
        let texture = upload_rgba_texture(
            &self.device,
            &self.queue,
            desc.width,
            desc.height,
            desc.pixels,
            desc.label,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let id = TextureId(self.next_id());
        self.textures.insert(
            id,
            GpuTexture {
                _texture: texture,
                view,
                kind: TextureKind::Color,
            },
        );
        Ok(id)
    }

    fn create_depth_target(
        &mut self,
        width: u32,
        height: u32,
        format: DepthFormat,
    ) -> Result<(DepthTargetId, TextureId), GpuError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max || height > max {
            return Err(GpuError::FramebufferIncomplete {
                reason: format!("depth attachment {width}x{height} outside 1..={max}"),
            });
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Shadow Depth Texture"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: format.texture_format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let texture_id = TextureId(self.next_id());
        self.textures.insert(
            texture_id,
            GpuTexture {
                _texture: texture,
                view,
                kind: TextureKind::Depth,
            },
        );
        let target = DepthTargetId(self.next_id());
        self.depth_targets.insert(
            target,
            DepthTarget {
                texture: texture_id,
                format,
                size: (width, height),
            },
        );
        Ok((target, texture_id))
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.scene_depth_view = create_scene_depth(&self.device, width, height);
        tracing::debug!(width, height, "surface resized");
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_device<T: GpuDevice>() {}

    #[test]
    fn backend_implements_device_seam() {
        assert_device::<WgpuDevice>();
        assert!((crate::context::SHADOW_UNIT as usize) < TEXTURE_UNITS);
    }

    #[test]
    fn vertex_attributes_use_byte_offsets() {
        let attrs = vertex_attributes(VertexLayout::position_normal_uv());
        let offsets: Vec<u64> = attrs.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        assert_eq!(attrs[2].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn uniform_slots_fit_the_largest_block() {
        assert_eq!(
            max_uniform_block_size(),
            UniformLayout::for_mode(ShadingMode::Material).size() as u64
        );
        assert_eq!(align_up(368, 256), 512);
        assert_eq!(align_up(512, 256), 512);
    }
}
