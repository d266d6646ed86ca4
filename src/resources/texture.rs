use std::{path::Path, sync::Arc};

use anyhow::{Context, Result};

use crate::{
    data_structures::{model, texture},
    resources::scene::{ImageData, MaterialData},
};

/// The bind group layout every [`model::Material`] is built against:
/// diffuse texture/sampler at bindings 0/1, specular texture/sampler at
/// bindings 2/3. Pipelines rendering models place this at group 0.
pub fn diffuse_specular_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
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
        label: Some("Material texture_bind_group_layout"),
    })
}

/// Load a single texture file from disk and upload it, outside of any model.
pub fn load_texture(
    file_name: impl AsRef<Path>,
    srgb: bool,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<texture::Texture> {
    let path = file_name.as_ref();
    let data = std::fs::read(path)
        .with_context(|| format!("could not read texture {}", path.display()))?;
    texture::Texture::from_bytes(
        device,
        queue,
        &data,
        &path.display().to_string(),
        path.extension().and_then(|ext| ext.to_str()),
        srgb,
    )
}

/// Upload every distinct decoded image once and hand out shared handles.
pub fn upload_images(
    images: &[ImageData],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Vec<Arc<texture::Texture>> {
    images
        .iter()
        .map(|img| {
            Arc::new(texture::Texture::from_image(
                device,
                queue,
                &img.image,
                Some(&img.path),
                img.srgb,
            ))
        })
        .collect()
}

/// Build GPU materials from the imported definitions.
///
/// A slot with no image (missing from the file, or skipped after a decode
/// failure) gets the shared 1x1 fallback map instead, so every material can
/// always be bound. When the file defines no materials at all but does
/// contain meshes, a single all-fallback material is produced for them.
pub fn build_materials(
    materials: &[MaterialData],
    textures: &[Arc<texture::Texture>],
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> Vec<model::Material> {
    let default_diffuse = Arc::new(texture::Texture::create_default_diffuse_map(device, queue));
    let default_specular = Arc::new(texture::Texture::create_default_specular_map(device, queue));

    let resolve = |slot: Option<usize>, default: &Arc<texture::Texture>| {
        slot.and_then(|idx| textures.get(idx))
            .cloned()
            .unwrap_or_else(|| default.clone())
    };

    let mut built = materials
        .iter()
        .map(|m| {
            model::Material::new(
                device,
                &m.name,
                resolve(m.diffuse, &default_diffuse),
                resolve(m.specular, &default_specular),
                layout,
            )
        })
        .collect::<Vec<_>>();

    if built.is_empty() {
        built.push(model::Material::new(
            device,
            "default_material",
            default_diffuse.clone(),
            default_specular.clone(),
            layout,
        ));
    }
    built
}
