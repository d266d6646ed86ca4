#![cfg(feature = "integration-tests")]

use std::time::Duration;

use meshkit::data_structures::model::{DrawModel, ModelVertex, Vertex};
use meshkit::resources::{
    load_model, load_model_obj,
    texture::{diffuse_specular_layout, load_texture},
};

mod common;

const TEST_SHADER: &str = "
struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tex_coords: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coords: vec2<f32>,
    @location(1) normal: vec3<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = vec4<f32>(in.position, 1.0);
    out.tex_coords = in.tex_coords;
    out.normal = in.normal;
    return out;
}

@group(0) @binding(0) var t_diffuse: texture_2d<f32>;
@group(0) @binding(1) var s_diffuse: sampler;
@group(0) @binding(2) var t_specular: texture_2d<f32>;
@group(0) @binding(3) var s_specular: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let diffuse = textureSample(t_diffuse, s_diffuse, in.tex_coords);
    let specular = textureSample(t_specular, s_specular, in.tex_coords);
    return diffuse + specular * 0.5;
}
";

fn create_device() -> Option<(wgpu::Device, wgpu::Queue)> {
    pollster::block_on(async {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok()?;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: None,
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .ok()?;
        Some((device, queue))
    })
}

#[test]
fn uploads_model_to_gpu() {
    common::init_logging();
    let Some((device, queue)) = create_device() else {
        eprintln!("no GPU adapter available; skipping");
        return;
    };

    let model = load_model_obj(common::fixture("cube.obj"), &device, &queue).unwrap();
    assert_eq!(model.meshes.len(), 1);
    assert_eq!(model.materials.len(), 1);
    assert_eq!(model.meshes[0].num_elements, 6);
    assert_eq!(model.materials[0].name, "crate");
}

#[test]
fn uploads_single_texture() {
    common::init_logging();
    let Some((device, queue)) = create_device() else {
        eprintln!("no GPU adapter available; skipping");
        return;
    };

    let texture = load_texture(common::fixture("shared.png"), true, &device, &queue).unwrap();
    assert_eq!(texture.texture.width(), 2);
    assert_eq!(texture.texture.height(), 2);

    assert!(load_texture(common::fixture("ghost.png"), true, &device, &queue).is_err());
}

#[test]
fn missing_model_degrades_to_empty() {
    common::init_logging();
    let Some((device, queue)) = create_device() else {
        eprintln!("no GPU adapter available; skipping");
        return;
    };

    let model = load_model(common::fixture("does_not_exist.obj"), &device, &queue);
    assert!(model.meshes.is_empty());
    assert!(model.materials.is_empty());
}

#[test]
fn draws_every_mesh_of_a_model() {
    common::init_logging();
    let Some((device, queue)) = create_device() else {
        eprintln!("no GPU adapter available; skipping");
        return;
    };

    let model = load_model(common::fixture("nested.gltf"), &device, &queue);
    assert_eq!(model.meshes.len(), 4);

    let target = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("test target"),
        size: wgpu::Extent3d {
            width: 64,
            height: 64,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = target.create_view(&wgpu::TextureViewDescriptor::default());

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Test Pipeline Layout"),
        bind_group_layouts: &[&diffuse_specular_layout(&device)],
        push_constant_ranges: &[],
    });
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Test Shader"),
        source: wgpu::ShaderSource::Wgsl(TEST_SHADER.into()),
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        cache: None,
        label: Some("Test Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[ModelVertex::desc()],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
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
        depth_stencil: None,
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Test Encoder"),
    });
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Test Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            occlusion_query_set: None,
            timestamp_writes: None,
        });
        render_pass.set_pipeline(&pipeline);
        render_pass.draw_model(&model);
    }
    queue.submit(std::iter::once(encoder.finish()));

    device
        .poll(wgpu::PollType::Wait {
            submission_index: None,
            timeout: Some(Duration::from_secs(3)),
        })
        .unwrap();
}
