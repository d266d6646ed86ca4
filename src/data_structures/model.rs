//! Mesh, material and model definitions plus draw submission.
//!
//! A [`Model`] is the flattened result of importing one asset file: an
//! ordered list of [`Mesh`]es and the [`Material`]s they reference by index.
//! Both are created once at load time and immutable afterwards; the GPU
//! buffers they own are released when the value is dropped.
//!
//! Drawing goes through the [`DrawModel`] trait, implemented for
//! `wgpu::RenderPass`. The caller is responsible for having set a compatible
//! pipeline and all transform/light bind groups beforehand; meshes manage
//! nothing beyond their own vertex/index buffers and material textures.

use std::ops::Range;
use std::sync::Arc;

use crate::data_structures::texture;

/// Anything with a GPU vertex buffer layout.
pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

/// A single model vertex: position, normal and texture coordinate.
///
/// Stored interleaved with position at shader location 0, normal at
/// location 1 and texture coordinate at location 2.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// A named pair of texture maps with a prebuilt bind group.
///
/// The diffuse texture/sampler sit at bindings 0/1 and the specular
/// texture/sampler at bindings 2/3, matching
/// [`diffuse_specular_layout`](crate::resources::texture::diffuse_specular_layout).
/// Texture handles are shared with the owning [`Model`]'s cache; a map that
/// was missing from the source file holds the default 1x1 fallback instead.
pub struct Material {
    pub name: String,
    pub diffuse_texture: Arc<texture::Texture>,
    pub specular_texture: Arc<texture::Texture>,
    pub bind_group: wgpu::BindGroup,
}

impl Material {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        diffuse_texture: Arc<texture::Texture>,
        specular_texture: Arc<texture::Texture>,
        layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse_texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&specular_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&specular_texture.sampler),
                },
            ],
            label: Some(name),
        });

        Self {
            name: name.to_string(),
            diffuse_texture,
            specular_texture,
            bind_group,
        }
    }
}

/// One drawable geometry batch: vertex/index buffers and a material index.
///
/// `material` indexes into the parent [`Model`]'s material list; the mesh
/// itself owns no textures. Every index in the index buffer is strictly less
/// than the vertex count, checked at import time.
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: usize,
}

/// The meshes and materials imported from one asset file.
///
/// Mesh order is a pre-order walk of the source scene graph; callers must
/// not rely on index stability across different input files. The default
/// value is the empty model used when loading degrades.
#[derive(Default)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
}

/// Draw submission for meshes and models.
///
/// Each method binds the material bind group at group 0 and issues indexed
/// triangle-list draws; transform and lighting bind groups (group 1 and up)
/// are the caller's responsibility and must be set before drawing. Drawing a
/// model issues exactly one draw call per mesh, in list order.
pub trait DrawModel<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh, material: &'a Material);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, material: &'a Material, instances: Range<u32>);
    fn draw_model(&mut self, model: &'a Model);
    fn draw_model_instanced(&mut self, model: &'a Model, instances: Range<u32>);
}

impl<'a, 'b> DrawModel<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh, material: &'b Material) {
        self.draw_mesh_instanced(mesh, material, 0..1);
    }

    fn draw_mesh_instanced(
        &mut self,
        mesh: &'b Mesh,
        material: &'b Material,
        instances: Range<u32>,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &material.bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, instances);
    }

    fn draw_model(&mut self, model: &'b Model) {
        self.draw_model_instanced(model, 0..1);
    }

    fn draw_model_instanced(&mut self, model: &'b Model, instances: Range<u32>) {
        for mesh in &model.meshes {
            let material = &model.materials[mesh.material];
            self.draw_mesh_instanced(mesh, material, instances.clone());
        }
    }
}
