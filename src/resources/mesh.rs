use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::{data_structures::model, resources::scene::MeshData};

/**
 * Obj files (and the odd glTF export) don't always come with normals, so
 * they have to be calculated for lighting to work at all.
 *
 * Face normals are accumulated per vertex over the triangle list and then
 * normalized, which averages the contribution of every triangle sharing a
 * vertex.
 */
pub fn generate_normals(vertices: &mut [model::ModelVertex], indices: &[u32]) {
    for c in indices.chunks_exact(3) {
        let pos0: cgmath::Vector3<f32> = vertices[c[0] as usize].position.into();
        let pos1: cgmath::Vector3<f32> = vertices[c[1] as usize].position.into();
        let pos2: cgmath::Vector3<f32> = vertices[c[2] as usize].position.into();

        let face_normal = (pos1 - pos0).cross(pos2 - pos0);

        vertices[c[0] as usize].normal =
            (face_normal + cgmath::Vector3::from(vertices[c[0] as usize].normal)).into();
        vertices[c[1] as usize].normal =
            (face_normal + cgmath::Vector3::from(vertices[c[1] as usize].normal)).into();
        vertices[c[2] as usize].normal =
            (face_normal + cgmath::Vector3::from(vertices[c[2] as usize].normal)).into();
    }

    for vertex in vertices.iter_mut() {
        let normal: cgmath::Vector3<f32> = vertex.normal.into();
        // Degenerate triangles can leave a zero accumulator; normalizing
        // that would produce NaNs.
        if normal.magnitude2() > 0.0 {
            vertex.normal = normal.normalize().into();
        }
    }
}

pub fn build_meshes(
    meshes: &[MeshData],
    file_name: &str,
    device: &wgpu::Device,
) -> Vec<model::Mesh> {
    meshes
        .iter()
        .map(|m| {
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Vertex Buffer", file_name)),
                contents: bytemuck::cast_slice(&m.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{:?} Index Buffer", file_name)),
                contents: bytemuck::cast_slice(&m.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            model::Mesh {
                name: m.name.clone(),
                vertex_buffer,
                index_buffer,
                num_elements: m.indices.len() as u32,
                material: m.material,
            }
        })
        .collect::<Vec<_>>()
}
