//! CPU-side scene import: parse an asset file into flat mesh, material and
//! image lists, before anything touches the GPU.
//!
//! Both importers produce the same [`SceneData`] shape, so the upload stage
//! in [`crate::resources`] is format-agnostic. Relative texture paths from
//! material definitions resolve against the asset file's parent directory,
//! and decoded images are cached by that path: a texture referenced by any
//! number of sub-meshes is decoded exactly once per load.

use std::{
    collections::HashMap,
    fs,
    io::{BufReader, Cursor},
    path::Path,
};

use anyhow::{Context, Result, bail};

use crate::{data_structures::model::ModelVertex, resources::mesh::generate_normals};

/// One sub-mesh, flattened out of the source scene graph.
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    pub material: usize,
}

/// One material definition: optional indices into [`SceneData::images`].
pub struct MaterialData {
    pub name: String,
    pub diffuse: Option<usize>,
    pub specular: Option<usize>,
}

/// One decoded image, keyed by the path it was loaded from.
pub struct ImageData {
    pub path: String,
    pub image: image::DynamicImage,
    pub srgb: bool,
}

/// Everything imported from one asset file.
///
/// Mesh order is a pre-order walk of the source scene graph: each node's
/// sub-meshes appear before any of its children's, children in their given
/// order. Image order follows first reference; materials keep file order.
#[derive(Default)]
pub struct SceneData {
    pub meshes: Vec<MeshData>,
    pub materials: Vec<MaterialData>,
    pub images: Vec<ImageData>,
}

/// Path-keyed image cache, live for the duration of one import.
///
/// A path that failed to decode is remembered as a miss, so a model
/// referencing the same broken texture from many materials logs once per
/// material but decodes at most once.
struct ImageCache<'a> {
    dir: &'a Path,
    loaded: HashMap<String, Option<usize>>,
    images: Vec<ImageData>,
}

impl<'a> ImageCache<'a> {
    fn new(dir: &'a Path) -> Self {
        Self {
            dir,
            loaded: HashMap::new(),
            images: Vec::new(),
        }
    }

    fn load_file(&mut self, rel_path: &str, srgb: bool) -> Option<usize> {
        if let Some(cached) = self.loaded.get(rel_path) {
            return *cached;
        }
        let full_path = self.dir.join(rel_path);
        let entry = match fs::read(&full_path) {
            Ok(bytes) => self.decode(rel_path, &bytes, srgb),
            Err(e) => {
                log::warn!("could not read texture {}: {}", full_path.display(), e);
                None
            }
        };
        self.loaded.insert(rel_path.to_string(), entry);
        entry
    }

    fn load_bytes(&mut self, key: &str, bytes: &[u8], srgb: bool) -> Option<usize> {
        if let Some(cached) = self.loaded.get(key) {
            return *cached;
        }
        let entry = self.decode(key, bytes, srgb);
        self.loaded.insert(key.to_string(), entry);
        entry
    }

    fn decode(&mut self, key: &str, bytes: &[u8], srgb: bool) -> Option<usize> {
        match image::load_from_memory(bytes) {
            Ok(image) => {
                self.images.push(ImageData {
                    path: key.to_string(),
                    image,
                    srgb,
                });
                Some(self.images.len() - 1)
            }
            Err(e) => {
                log::warn!("could not decode texture {}: {}", key, e);
                None
            }
        }
    }
}

/// Import a glTF file (`.gltf` with sibling buffers, or binary `.glb`).
///
/// Fails fast if the file cannot be read or parsed, a referenced buffer is
/// missing, or the document contains no scene. Sub-meshes with out-of-range
/// indices or a non-triangle topology are skipped with a warning; missing
/// texture coordinates fall back to (0,0) and missing normals are generated
/// from the triangle faces.
pub fn import_gltf(path: &Path) -> Result<SceneData> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let bytes =
        fs::read(path).with_context(|| format!("could not read model {}", path.display()))?;
    let gltf = gltf::Gltf::from_reader(BufReader::new(Cursor::new(bytes)))
        .with_context(|| format!("could not parse {}", path.display()))?;

    let mut buffer_data: Vec<Vec<u8>> = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .with_context(|| format!("{} has no binary blob", path.display()))?;
                buffer_data.push(blob.into());
            }
            gltf::buffer::Source::Uri(uri) => {
                let bin = fs::read(dir.join(uri))
                    .with_context(|| format!("could not read buffer {} of {}", uri, path.display()))?;
                buffer_data.push(bin);
            }
        }
    }

    let mut cache = ImageCache::new(dir);
    let mut materials = Vec::new();
    for material in gltf.materials() {
        let pbr = material.pbr_metallic_roughness();
        let diffuse = pbr
            .base_color_texture()
            .and_then(|info| resolve_image(&mut cache, info.texture().source(), &buffer_data, true));
        let specular = pbr.metallic_roughness_texture().and_then(|info| {
            resolve_image(&mut cache, info.texture().source(), &buffer_data, false)
        });
        materials.push(MaterialData {
            name: material.name().unwrap_or("unnamed_material").to_string(),
            diffuse,
            specular,
        });
    }

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .with_context(|| format!("{} contains no scene", path.display()))?;

    // Pre-order walk over the node graph with an explicit stack; reversing
    // the children keeps them in file order when popped.
    let mut meshes = Vec::new();
    let mut stack: Vec<gltf::Node> = scene.nodes().collect();
    stack.reverse();
    while let Some(node) = stack.pop() {
        if let Some(mesh) = node.mesh() {
            let name = mesh.name().unwrap_or("unnamed_mesh");
            for primitive in mesh.primitives() {
                match read_primitive(name, &primitive, &buffer_data) {
                    Ok(Some(data)) => meshes.push(data),
                    Ok(None) => (),
                    Err(e) => {
                        log::warn!("skipping sub-mesh {} of {}: {}", name, path.display(), e)
                    }
                }
            }
        }
        let mut children: Vec<gltf::Node> = node.children().collect();
        children.reverse();
        stack.append(&mut children);
    }

    Ok(SceneData {
        meshes,
        materials,
        images: cache.images,
    })
}

fn resolve_image(
    cache: &mut ImageCache,
    image: gltf::Image,
    buffer_data: &[Vec<u8>],
    srgb: bool,
) -> Option<usize> {
    match image.source() {
        gltf::image::Source::Uri { uri, .. } => cache.load_file(uri, srgb),
        gltf::image::Source::View { view, .. } => {
            let buffer = buffer_data.get(view.buffer().index())?;
            let bytes = buffer.get(view.offset()..view.offset() + view.length())?;
            // Embedded images have no file path; the view index stands in
            // as the cache key.
            cache.load_bytes(&format!("#view{}", view.index()), bytes, srgb)
        }
    }
}

fn read_primitive(
    name: &str,
    primitive: &gltf::Primitive,
    buffer_data: &[Vec<u8>],
) -> Result<Option<MeshData>> {
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        bail!("unsupported primitive mode {:?}", primitive.mode());
    }
    let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

    let mut vertices: Vec<ModelVertex> = match reader.read_positions() {
        Some(positions) => positions
            .map(|position| ModelVertex {
                position,
                normal: Default::default(),
                tex_coords: Default::default(),
            })
            .collect(),
        None => return Ok(None),
    };
    if vertices.is_empty() {
        return Ok(None);
    }

    let mut has_normals = false;
    if let Some(normals) = reader.read_normals() {
        for (vertex, normal) in vertices.iter_mut().zip(normals) {
            vertex.normal = normal;
        }
        has_normals = true;
    }
    if let Some(tex_coords) = reader.read_tex_coords(0).map(|t| t.into_f32()) {
        for (vertex, tex_coord) in vertices.iter_mut().zip(tex_coords) {
            vertex.tex_coords = tex_coord;
        }
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        // Non-indexed geometry draws the vertices in order.
        None => (0..vertices.len() as u32).collect(),
    };
    if indices.is_empty() {
        return Ok(None);
    }
    validate_indices(vertices.len(), &indices)?;

    if !has_normals {
        generate_normals(&mut vertices, &indices);
    }

    Ok(Some(MeshData {
        name: name.to_string(),
        vertices,
        indices,
        material: primitive.material().index().unwrap_or(0),
    }))
}

/// Import a Wavefront OBJ file with its sibling `.mtl` materials.
///
/// The load options ask tobj for triangulated faces and a single index per
/// vertex, so the output is a plain indexed triangle list. A missing or
/// unreadable `.mtl` degrades to zero materials rather than failing the
/// import.
pub fn import_obj(path: &Path) -> Result<SceneData> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let (models, obj_materials) = tobj::load_obj(
        path,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
    )
    .with_context(|| format!("could not load model {}", path.display()))?;

    let mut cache = ImageCache::new(dir);
    let mut materials = Vec::new();
    match obj_materials {
        Ok(list) => {
            for m in list {
                let diffuse = m
                    .diffuse_texture
                    .as_deref()
                    .and_then(|p| cache.load_file(p, true));
                let specular = m
                    .specular_texture
                    .as_deref()
                    .and_then(|p| cache.load_file(p, false));
                materials.push(MaterialData {
                    name: m.name,
                    diffuse,
                    specular,
                });
            }
        }
        Err(e) => log::warn!("no usable materials for {}: {}", path.display(), e),
    }

    let mut meshes = Vec::new();
    for m in &models {
        let vertex_count = m.mesh.positions.len() / 3;
        if vertex_count == 0 || m.mesh.indices.is_empty() {
            continue;
        }
        let mut vertices = (0..vertex_count)
            .map(|i| ModelVertex {
                position: [
                    m.mesh.positions[i * 3],
                    m.mesh.positions[i * 3 + 1],
                    m.mesh.positions[i * 3 + 2],
                ],
                normal: [
                    m.mesh.normals.get(i * 3).map_or(0.0, |f| *f),
                    m.mesh.normals.get(i * 3 + 1).map_or(0.0, |f| *f),
                    m.mesh.normals.get(i * 3 + 2).map_or(0.0, |f| *f),
                ],
                // The v axis is flipped for the wgpu texture coordinate
                // system; meshes without texture coordinates get (0,0).
                tex_coords: if m.mesh.texcoords.is_empty() {
                    [0.0, 0.0]
                } else {
                    [
                        m.mesh.texcoords.get(i * 2).map_or(0.0, |f| *f),
                        1.0 - m.mesh.texcoords.get(i * 2 + 1).map_or(0.0, |f| *f),
                    ]
                },
            })
            .collect::<Vec<_>>();

        let indices = m.mesh.indices.clone();
        if let Err(e) = validate_indices(vertices.len(), &indices) {
            log::warn!("skipping sub-mesh {} of {}: {}", m.name, path.display(), e);
            continue;
        }
        if m.mesh.normals.is_empty() {
            generate_normals(&mut vertices, &indices);
        }

        meshes.push(MeshData {
            name: m.name.clone(),
            vertices,
            indices,
            material: m.mesh.material_id.unwrap_or(0),
        });
    }

    Ok(SceneData {
        meshes,
        materials,
        images: cache.images,
    })
}

fn validate_indices(vertex_count: usize, indices: &[u32]) -> Result<()> {
    if let Some(&max) = indices.iter().max() {
        if max as usize >= vertex_count {
            bail!("index {} out of range for {} vertices", max, vertex_count);
        }
    }
    Ok(())
}
