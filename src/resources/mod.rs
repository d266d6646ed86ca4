use std::path::Path;

use anyhow::Result;

use crate::{
    data_structures::model,
    resources::{scene::SceneData, texture::diffuse_specular_layout},
};

/**
 * This module contains all logic for loading mesh/textures/etc. from external files.
 *
 * Importing is split in two stages: `scene` parses an asset file into plain
 * CPU data (with texture decoding cached per file path), and the functions
 * here upload that data into a `model::Model`. Everything runs synchronously
 * on the thread owning the device and queue.
 */
pub mod mesh;
pub mod scene;
pub mod texture;

/// Load a model, degrading instead of failing.
///
/// The format is picked from the file extension (`.obj`, `.gltf`, `.glb`).
/// An unreadable or unparsable file is logged and yields the empty model, so
/// a missing asset never takes the process down with it.
pub fn load_model(
    file_name: impl AsRef<Path>,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> model::Model {
    let path = file_name.as_ref();
    let result = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("obj") => load_model_obj(path, device, queue),
        Some("gltf") | Some("glb") => load_model_gltf(path, device, queue),
        other => Err(anyhow::anyhow!(
            "unsupported model format {:?} for {}",
            other,
            path.display()
        )),
    };
    match result {
        Ok(model) => model,
        Err(e) => {
            log::error!("failed to load model {}: {:#}", path.display(), e);
            model::Model::default()
        }
    }
}

pub fn load_model_obj(
    file_name: impl AsRef<Path>,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<model::Model> {
    let path = file_name.as_ref();
    let scene = scene::import_obj(path)?;
    Ok(build_model(scene, &path.display().to_string(), device, queue))
}

pub fn load_model_gltf(
    file_name: impl AsRef<Path>,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> Result<model::Model> {
    let path = file_name.as_ref();
    let scene = scene::import_gltf(path)?;
    Ok(build_model(scene, &path.display().to_string(), device, queue))
}

fn build_model(
    mut scene: SceneData,
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> model::Model {
    let layout = diffuse_specular_layout(device);
    let textures = texture::upload_images(&scene.images, device, queue);
    let materials = texture::build_materials(&scene.materials, &textures, device, queue, &layout);

    // `build_materials` always yields at least one entry, so clamping keeps
    // every mesh drawable even when its material definition was unusable.
    for m in &mut scene.meshes {
        if m.material >= materials.len() {
            log::warn!(
                "sub-mesh {} of {} references missing material {}; using material 0",
                m.name,
                file_name,
                m.material
            );
            m.material = 0;
        }
    }

    let meshes = mesh::build_meshes(&scene.meshes, file_name, device);
    model::Model { meshes, materials }
}
