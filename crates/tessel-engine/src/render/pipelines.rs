use std::num::NonZeroU64;

use anyhow::{Result, bail};

use crate::resources::GpuTexture;

use super::RenderCtx;
use super::vertex::{
    DotCorner, DotInstance, FragUniform, FrameVertex, LinInstance, LineCorner, TriVertexGpu,
    VertUniform,
};

/// Every pipeline a frame needs, built for one sample count.
///
/// Triangle, stroke and dot pipelines share one bind group layout:
/// - 0: vertex uniform
/// - 1: fragment uniform
/// - 2: texture (triangles only read it)
/// - 3: sampler
pub(crate) struct Pipelines {
    sample_count: u32,
    pub(crate) frame: wgpu::RenderPipeline,
    pub(crate) tri: wgpu::RenderPipeline,
    pub(crate) lin: wgpu::RenderPipeline,
    pub(crate) dot: wgpu::RenderPipeline,
    mesh_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl Pipelines {
    pub(crate) fn new(ctx: &RenderCtx<'_>) -> Result<Self> {
        let device = ctx.device;

        let frame_shader = compile(device, "tessel frame shader", include_str!("shaders/frame.wgsl"))?;
        let tri_shader = compile(device, "tessel tri shader", include_str!("shaders/tri.wgsl"))?;
        let lin_shader = compile(device, "tessel lin shader", include_str!("shaders/lin.wgsl"))?;
        let dot_shader = compile(device, "tessel dot shader", include_str!("shaders/dot.wgsl"))?;

        let mesh_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessel mesh bgl"),
            entries: &[
                uniform_entry::<VertUniform>(0, wgpu::ShaderStages::VERTEX),
                uniform_entry::<FragUniform>(1, wgpu::ShaderStages::FRAGMENT),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
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
            ],
        });

        let frame_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessel frame pipeline layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });
        let mesh_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessel mesh pipeline layout"),
            bind_group_layouts: &[&mesh_layout],
            immediate_size: 0,
        });

        let frame = build(
            ctx,
            "tessel frame pipeline",
            &frame_shader,
            &frame_layout,
            &[FrameVertex::layout()],
            wgpu::CompareFunction::Always,
        );
        let tri = build(
            ctx,
            "tessel tri pipeline",
            &tri_shader,
            &mesh_pipeline_layout,
            &[TriVertexGpu::layout()],
            wgpu::CompareFunction::Less,
        );
        let lin = build(
            ctx,
            "tessel lin pipeline",
            &lin_shader,
            &mesh_pipeline_layout,
            &[LineCorner::layout(), LinInstance::layout()],
            wgpu::CompareFunction::Less,
        );
        let dot = build(
            ctx,
            "tessel dot pipeline",
            &dot_shader,
            &mesh_pipeline_layout,
            &[DotCorner::layout(), DotInstance::layout()],
            wgpu::CompareFunction::Less,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessel texture sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        log::debug!("pipelines built for {}x multisampling", ctx.sample_count);

        Ok(Self {
            sample_count: ctx.sample_count,
            frame,
            tri,
            lin,
            dot,
            mesh_layout,
            sampler,
        })
    }

    #[inline]
    pub(crate) fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub(crate) fn mesh_bind_group(
        &self,
        device: &wgpu::Device,
        vert: &wgpu::Buffer,
        frag: &wgpu::Buffer,
        texture: &GpuTexture,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessel mesh bind group"),
            layout: &self.mesh_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: vert.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: frag.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        })
    }
}

// ── private helpers ────────────────────────────────────────────────────────

/// Compiles WGSL and folds any compiler errors into the returned error.
fn compile(device: &wgpu::Device, label: &str, source: &'static str) -> Result<wgpu::ShaderModule> {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let info = pollster::block_on(module.get_compilation_info());
    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
        .map(|m| m.message.clone())
        .collect();

    if !errors.is_empty() {
        let text = errors.join("\n");
        log::error!("{label} failed to compile:\n{text}");
        bail!("{label} failed to compile:\n{text}");
    }
    Ok(module)
}

fn uniform_entry<T>(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(std::mem::size_of::<T>() as u64),
        },
        count: None,
    }
}

/// Straight (non-premultiplied) alpha over.
fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

fn build(
    ctx: &RenderCtx<'_>,
    label: &str,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    buffers: &[wgpu::VertexBufferLayout<'_>],
    depth_compare: wgpu::CompareFunction,
) -> wgpu::RenderPipeline {
    ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers,
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: ctx.color_format,
                blend: Some(alpha_blend()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: ctx.depth_format,
            depth_write_enabled: true,
            depth_compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: ctx.sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview_mask: None,
        cache: None,
    })
}
