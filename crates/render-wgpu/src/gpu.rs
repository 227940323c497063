use std::collections::BTreeMap;

use sketchflight_common::{Viewport, ViewportError};
use sketchflight_render::{NoiseTexture, RenderView, SketchSettings, TargetExtent};
use sketchflight_scene::{
    GeometryId, MaterialId, MeshData, NodeId, SceneError, SceneEvent, SceneGraph,
};
use wgpu::util::DeviceExt;

use crate::camera::ViewCamera;
use crate::frame::{DrawClass, FrameUniforms, NodeUniforms, Vertex, draw_plan};
use crate::shaders;

/// Off-screen colour target of the base pass.
pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Off-screen target of the normal pass.
pub const NORMAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Encodes a view-space normal facing the camera.
const NORMAL_CLEAR: wgpu::Color = wgpu::Color {
    r: 0.5,
    g: 0.5,
    b: 1.0,
    a: 1.0,
};

/// Errors raised by the GPU backend.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("viewport error: {0}")]
    Viewport(#[from] ViewportError),
    #[error("scene error: {0}")]
    Scene(#[from] SceneError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    vertex_count: usize,
    index_count: u32,
}

struct GpuNode {
    uniforms: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Long-lived inputs of the pencil pass. Only the targets change on resize.
struct PencilInputs {
    layout: wgpu::BindGroupLayout,
    params: wgpu::Buffer,
    noise: wgpu::TextureView,
    clamp_sampler: wgpu::Sampler,
    repeat_sampler: wgpu::Sampler,
}

/// Size-dependent textures and the bind group that reads them.
struct Targets {
    color: wgpu::TextureView,
    normal: wgpu::TextureView,
    depth: wgpu::TextureView,
    pencil_bind_group: wgpu::BindGroup,
}

impl Targets {
    fn new(device: &wgpu::Device, inputs: &PencilInputs, viewport: Viewport) -> Self {
        let color = create_target(device, "color_target", COLOR_FORMAT, viewport);
        let normal = create_target(device, "normal_target", NORMAL_FORMAT, viewport);
        let depth = create_depth_texture(device, viewport);
        let pencil_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pencil_bind_group"),
            layout: &inputs.layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: inputs.params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&color),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&normal),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&inputs.noise),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::Sampler(&inputs.clamp_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&inputs.repeat_sampler),
                },
            ],
        });
        Self {
            color,
            normal,
            depth,
            pencil_bind_group,
        }
    }
}

/// Fixed-function state of one scene pipeline.
struct PipelineDesc {
    label: &'static str,
    vertex: &'static str,
    fragment: &'static str,
    format: wgpu::TextureFormat,
    blend: wgpu::BlendState,
    depth_write: bool,
}

/// Pencil-sketch renderer over a `SceneGraph`.
///
/// Mirrors scene geometry into GPU buffers, then draws a base pass, a normal
/// pass under the material override and the full-screen pencil pass.
pub struct SketchRenderer {
    pipelines: BTreeMap<DrawClass, wgpu::RenderPipeline>,
    pencil_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    node_layout: wgpu::BindGroupLayout,
    pencil: PencilInputs,
    targets: Targets,
    extent: TargetExtent,
    meshes: BTreeMap<GeometryId, GpuMesh>,
    nodes: BTreeMap<NodeId, GpuNode>,
    settings: SketchSettings,
    camera: ViewCamera,
    surface_format: wgpu::TextureFormat,
}

impl SketchRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        viewport: Viewport,
        settings: SketchSettings,
        seed: u64,
    ) -> Self {
        let camera = ViewCamera::default();
        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniforms"),
            contents: bytemuck::bytes_of(&FrameUniforms::new(&camera, 0.0, &settings.fog)),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_layout = uniform_layout(device, "frame_bind_group_layout");
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });
        let node_layout = uniform_layout(device, "node_bind_group_layout");

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &node_layout],
            push_constant_ranges: &[],
        });

        let opaque = |label: &'static str, vertex: &'static str, fragment: &'static str| PipelineDesc {
            label,
            vertex,
            fragment,
            format: COLOR_FORMAT,
            blend: wgpu::BlendState::REPLACE,
            depth_write: true,
        };
        let descs = [
            (
                DrawClass::Sky,
                shaders::sky_shader(),
                PipelineDesc {
                    depth_write: false,
                    ..opaque("sky_pipeline", "vs_sky", "fs_sky")
                },
            ),
            (
                DrawClass::Terrain,
                shaders::terrain_shader(),
                opaque("terrain_pipeline", "vs_terrain", "fs_terrain"),
            ),
            (
                DrawClass::Ink,
                shaders::ink_shader(),
                opaque("ink_pipeline", "vs_ink", "fs_ink"),
            ),
            (
                DrawClass::Cloud,
                shaders::cloud_shader(),
                PipelineDesc {
                    blend: wgpu::BlendState::ALPHA_BLENDING,
                    depth_write: false,
                    ..opaque("cloud_pipeline", "vs_cloud", "fs_cloud")
                },
            ),
            (
                DrawClass::Normal,
                shaders::normal_shader(),
                PipelineDesc {
                    format: NORMAL_FORMAT,
                    ..opaque("normal_pipeline", "vs_normal", "fs_normal")
                },
            ),
        ];
        let pipelines = descs
            .into_iter()
            .map(|(class, source, desc)| {
                (class, scene_pipeline(device, &scene_layout, &source, &desc))
            })
            .collect();

        let extent = TargetExtent::new(&settings, viewport);
        let pencil = PencilInputs {
            layout: pencil_layout(device),
            params: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("sketch_uniforms"),
                contents: bytemuck::bytes_of(extent.uniforms()),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            }),
            noise: upload_noise(
                device,
                queue,
                &NoiseTexture::generate(settings.jitter_size, seed),
            ),
            clamp_sampler: device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("clamp_sampler"),
                address_mode_u: wgpu::AddressMode::ClampToEdge,
                address_mode_v: wgpu::AddressMode::ClampToEdge,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            }),
            repeat_sampler: device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("repeat_sampler"),
                address_mode_u: wgpu::AddressMode::Repeat,
                address_mode_v: wgpu::AddressMode::Repeat,
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                ..Default::default()
            }),
        };
        let pencil_pipeline = create_pencil_pipeline(device, &pencil.layout, surface_format);
        let targets = Targets::new(device, &pencil, viewport);

        tracing::info!(
            width = viewport.width(),
            height = viewport.height(),
            ?surface_format,
            "sketch renderer ready"
        );

        Self {
            pipelines,
            pencil_pipeline,
            frame_buffer,
            frame_bind_group,
            node_layout,
            pencil,
            targets,
            extent,
            meshes: BTreeMap::new(),
            nodes: BTreeMap::new(),
            settings,
            camera,
            surface_format,
        }
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn viewport(&self) -> Viewport {
        self.extent.viewport()
    }

    pub fn camera(&self) -> &ViewCamera {
        &self.camera
    }

    /// Number of meshes currently mirrored on the GPU.
    pub fn resident_meshes(&self) -> usize {
        self.meshes.len()
    }

    /// Resize from a raw host size. A zero dimension is rejected and leaves
    /// every target untouched.
    pub fn resize_to(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
    ) -> Result<bool, RenderError> {
        let viewport = Viewport::new(width, height)?;
        Ok(self.resize(device, queue, viewport))
    }

    /// Recreate every off-screen target and rewrite the pencil uniforms.
    /// Returns false when the size did not change.
    pub fn resize(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, viewport: Viewport) -> bool {
        if !self.extent.resize(viewport) {
            return false;
        }
        self.targets = Targets::new(device, &self.pencil, viewport);
        queue.write_buffer(
            &self.pencil.params,
            0,
            bytemuck::bytes_of(self.extent.uniforms()),
        );
        true
    }

    /// Render one frame into `target`.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        scene: &mut SceneGraph,
        view: &RenderView,
        normal_material: MaterialId,
    ) -> Result<(), RenderError> {
        let _span = tracing::trace_span!("render_frame", time_ms = view.time_ms).entered();
        self.resize(device, queue, view.viewport);
        self.sync(device, queue, scene);

        self.camera.apply(view);
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms::new(
                &self.camera,
                view.time_ms,
                &self.settings.fog,
            )),
        );
        self.write_node_uniforms(queue, scene);

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("sketch_encoder"),
        });

        let [r, g, b] = self.settings.fog.color;
        let paper = wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        };
        let base_plan = draw_plan(scene);
        self.scene_pass(&mut encoder, "base_pass", &self.targets.color, paper, scene, &base_plan);

        {
            let overridden = scene.override_materials(normal_material)?;
            let normal_plan = draw_plan(&overridden);
            self.scene_pass(
                &mut encoder,
                "normal_pass",
                &self.targets.normal,
                NORMAL_CLEAR,
                &overridden,
                &normal_plan,
            );
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pencil_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(paper),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                ..Default::default()
            });
            pass.set_pipeline(&self.pencil_pipeline);
            pass.set_bind_group(0, &self.targets.pencil_bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Mirror structural scene changes into GPU resources.
    fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &mut SceneGraph) {
        let events = scene.drain_events();
        if events.is_empty() {
            return;
        }
        for event in events {
            match event {
                SceneEvent::GeometryAdded(id) | SceneEvent::GeometryUpdated(id) => {
                    match scene.geometry(id) {
                        Some(mesh) => self.upload_mesh(device, queue, id, mesh),
                        None => {
                            self.meshes.remove(&id);
                        }
                    }
                }
                SceneEvent::GeometryReleased(id) => {
                    self.meshes.remove(&id);
                }
                SceneEvent::NodeAdded(id) => {
                    let node = self.create_node(device);
                    self.nodes.insert(id, node);
                }
                SceneEvent::NodeRemoved(id) => {
                    self.nodes.remove(&id);
                }
                SceneEvent::MaterialAdded(_) | SceneEvent::MaterialReleased(_) => {}
            }
        }
        tracing::trace!(
            meshes = self.meshes.len(),
            nodes = self.nodes.len(),
            "gpu mirror synced"
        );
    }

    fn upload_mesh(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        id: GeometryId,
        mesh: &MeshData,
    ) {
        if mesh.indices.is_empty() || mesh.positions.is_empty() {
            self.meshes.remove(&id);
            return;
        }
        let vertices = Vertex::interleave(mesh);
        if let Some(existing) = self.meshes.get(&id) {
            if existing.vertex_count == vertices.len()
                && existing.index_count as usize == mesh.indices.len()
            {
                queue.write_buffer(&existing.vertices, 0, bytemuck::cast_slice(&vertices));
                queue.write_buffer(&existing.indices, 0, bytemuck::cast_slice(&mesh.indices));
                return;
            }
        }
        let gpu = GpuMesh {
            vertices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_vertices"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            }),
            indices: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("mesh_indices"),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            }),
            vertex_count: vertices.len(),
            index_count: mesh.indices.len() as u32,
        };
        self.meshes.insert(id, gpu);
    }

    fn create_node(&self, device: &wgpu::Device) -> GpuNode {
        let uniforms = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("node_uniforms"),
            size: std::mem::size_of::<NodeUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("node_bind_group"),
            layout: &self.node_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.as_entire_binding(),
            }],
        });
        GpuNode {
            uniforms,
            bind_group,
        }
    }

    /// Per-node blocks always carry the node's own material; the override
    /// only changes which pipeline draws it.
    fn write_node_uniforms(&self, queue: &wgpu::Queue, scene: &SceneGraph) {
        for (id, node) in scene.nodes() {
            let (Some(gpu), Some(material)) = (self.nodes.get(id), scene.material(node.material))
            else {
                continue;
            };
            let block = NodeUniforms::new(node.transform.matrix(), material);
            queue.write_buffer(&gpu.uniforms, 0, bytemuck::bytes_of(&block));
        }
    }

    fn scene_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        label: &str,
        view: &wgpu::TextureView,
        clear: wgpu::Color,
        scene: &SceneGraph,
        plan: &[(NodeId, DrawClass)],
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.targets.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        });

        let mut bound = None;
        for (id, class) in plan {
            let Some(node) = scene.node(*id) else {
                continue;
            };
            let (Some(mesh), Some(gpu), Some(pipeline)) = (
                self.meshes.get(&node.geometry),
                self.nodes.get(id),
                self.pipelines.get(class),
            ) else {
                continue;
            };
            if bound != Some(*class) {
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.frame_bind_group, &[]);
                bound = Some(*class);
            }
            pass.set_bind_group(1, &gpu.bind_group, &[]);
            pass.set_vertex_buffer(0, mesh.vertices.slice(..));
            pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
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
    })
}

fn pencil_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };
    let sampler = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("pencil_bind_group_layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture(1),
            texture(2),
            texture(3),
            sampler(4),
            sampler(5),
        ],
    })
}

fn scene_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    source: &str,
    desc: &PipelineDesc,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(desc.label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some(desc.vertex),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x3,
                    1 => Float32x3,
                ],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some(desc.fragment),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: Some(desc.blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: desc.depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn create_pencil_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    surface_format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("pencil_shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::PENCIL_SHADER.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pencil_pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("pencil_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_fullscreen"),
            compilation_options: Default::default(),
            buffers: &[],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_pencil"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn extent_of(viewport: Viewport) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: viewport.width(),
        height: viewport.height(),
        depth_or_array_layers: 1,
    }
}

fn create_target(
    device: &wgpu::Device,
    label: &str,
    format: wgpu::TextureFormat,
    viewport: Viewport,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent_of(viewport),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn create_depth_texture(device: &wgpu::Device, viewport: Viewport) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: extent_of(viewport),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

fn upload_noise(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    noise: &NoiseTexture,
) -> wgpu::TextureView {
    let size = wgpu::Extent3d {
        width: noise.size(),
        height: noise.size(),
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("jitter_noise"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        noise.bytes(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(noise.size() * 4),
            rows_per_image: Some(noise.size()),
        },
        size,
    );
    texture.create_view(&Default::default())
}
