use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use glam::{vec2, vec3, Vec3};
use jpeg_decoder::{Decoder, PixelFormat};
use log::{info, trace};

use crate::error::{EngineError, EngineResult};
use crate::vk_utils::Vertex;

/// Decoded image, always tightly packed RGBA8
#[derive(Clone, Debug)]
pub struct ImageData {
  pub width: u32,
  pub height: u32,
  pub pixels: Vec<u8>,
}

/// CPU-side mesh, ready to be uploaded as a `Model`
#[derive(Clone, Debug, Default)]
pub struct MeshData {
  pub vertices: Vec<Vertex>,
  pub indices: Vec<u32>,
}

fn asset_error(path: &Path, reason: impl ToString) -> EngineError {
  EngineError::Asset {
    path: path.to_path_buf(),
    reason: reason.to_string(),
  }
}

////////////////////////////////
/// Images
////////////////////////////////

pub fn load_image(path: &Path) -> EngineResult<ImageData> {
  info!("Loading texture from '{}'", path.to_string_lossy());
  let file = File::open(path).map_err(|e| asset_error(path, e))?;
  let mut decoder = Decoder::new(BufReader::new(file));
  let pixel_bytes = decoder.decode().map_err(|e| asset_error(path, e))?;
  let metadata = decoder
    .info()
    .ok_or_else(|| asset_error(path, "missing JPEG metadata"))?;
  trace!("File meta: {:?}", metadata);

  let pixels = match metadata.pixel_format {
    PixelFormat::RGB24 => convert_rgb_to_rgba(&pixel_bytes),
    PixelFormat::L8 => convert_luma_to_rgba(&pixel_bytes),
    other => {
      return Err(asset_error(
        path,
        format!("unsupported pixel format {:?}", other),
      ))
    }
  };

  Ok(ImageData {
    width: metadata.width as u32,
    height: metadata.height as u32,
    pixels,
  })
}

// Used cause vk::Format::R8G8B8_SRGB is rarely supported for sampling
fn convert_rgb_to_rgba(data_rgb: &[u8]) -> Vec<u8> {
  data_rgb
    .chunks_exact(3)
    .flat_map(|px| [px[0], px[1], px[2], 255u8])
    .collect()
}

fn convert_luma_to_rgba(data_l: &[u8]) -> Vec<u8> {
  data_l.iter().flat_map(|&l| [l, l, l, 255u8]).collect()
}

////////////////////////////////
/// Meshes
////////////////////////////////

pub fn load_mesh(path: &Path) -> EngineResult<MeshData> {
  info!("Loading mesh from '{}'", path.to_string_lossy());
  let file = File::open(path).map_err(|e| asset_error(path, e))?;
  let mut reader = BufReader::new(file);
  let (models, _) = tobj::load_obj_buf(
    &mut reader,
    &tobj::LoadOptions {
      triangulate: true,
      single_index: true,
      ..Default::default()
    },
    // materials are assigned in code
    |_| Ok(Default::default()),
  )
  .map_err(|e| asset_error(path, e))?;

  let mut mesh = MeshData::default();
  for model in models.iter() {
    let m = &model.mesh;
    let base = mesh.vertices.len() as u32;
    let vertex_count = m.positions.len() / 3;

    for i in 0..vertex_count {
      let position = vec3(m.positions[3 * i], m.positions[3 * i + 1], m.positions[3 * i + 2]);
      let normal = if m.normals.len() >= 3 * (i + 1) {
        vec3(m.normals[3 * i], m.normals[3 * i + 1], m.normals[3 * i + 2])
      } else {
        Vec3::ZERO
      };
      let uv = if m.texcoords.len() >= 2 * (i + 1) {
        vec2(m.texcoords[2 * i], 1.0 - m.texcoords[2 * i + 1])
      } else {
        vec2(0.0, 0.0)
      };
      mesh.vertices.push(Vertex::new(position, normal, uv));
    }
    mesh.indices.extend(m.indices.iter().map(|idx| base + idx));
  }

  compute_tangents(&mut mesh.vertices, &mesh.indices);
  trace!(
    "Mesh '{}': {} vertices, {} indices",
    path.to_string_lossy(),
    mesh.vertices.len(),
    mesh.indices.len()
  );
  Ok(mesh)
}

/// Per-triangle tangent frame from UV derivatives, accumulated per vertex.
/// Triangles with degenerate UVs are skipped.
pub fn compute_tangents(vertices: &mut [Vertex], indices: &[u32]) {
  let mut tangents = vec![Vec3::ZERO; vertices.len()];
  let mut bitangents = vec![Vec3::ZERO; vertices.len()];

  for tri in indices.chunks_exact(3) {
    let (i0, i1, i2) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
    let (v0, v1, v2) = (vertices[i0], vertices[i1], vertices[i2]);
    let edge1 = v1.position - v0.position;
    let edge2 = v2.position - v0.position;
    let duv1 = v1.uv - v0.uv;
    let duv2 = v2.uv - v0.uv;

    let det = duv1.x * duv2.y - duv2.x * duv1.y;
    if det.abs() < f32::EPSILON {
      continue;
    }
    let r = 1.0 / det;
    let tangent = (edge1 * duv2.y - edge2 * duv1.y) * r;
    let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * r;
    for &i in &[i0, i1, i2] {
      tangents[i] += tangent;
      bitangents[i] += bitangent;
    }
  }

  for (i, v) in vertices.iter_mut().enumerate() {
    v.tangent = tangents[i].normalize_or_zero();
    v.bitangent = bitangents[i].normalize_or_zero();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::io::Write;

  #[test]
  fn rgb_is_expanded_to_opaque_rgba() {
    let rgba = convert_rgb_to_rgba(&[1, 2, 3, 4, 5, 6]);
    assert_eq!(rgba, vec![1, 2, 3, 255, 4, 5, 6, 255]);
    let rgba = convert_luma_to_rgba(&[7]);
    assert_eq!(rgba, vec![7, 7, 7, 255]);
  }

  #[test]
  fn tangents_follow_uv_directions() {
    let n = vec3(0.0, 0.0, 1.0);
    let mut vertices = vec![
      Vertex::new(vec3(0.0, 0.0, 0.0), n, vec2(0.0, 0.0)),
      Vertex::new(vec3(1.0, 0.0, 0.0), n, vec2(1.0, 0.0)),
      Vertex::new(vec3(0.0, 1.0, 0.0), n, vec2(0.0, 1.0)),
    ];
    compute_tangents(&mut vertices, &[0, 1, 2]);
    for v in vertices.iter() {
      assert!((v.tangent - vec3(1.0, 0.0, 0.0)).length() < 1e-5);
      assert!((v.bitangent - vec3(0.0, 1.0, 0.0)).length() < 1e-5);
    }
  }

  #[test]
  fn load_mesh_reads_triangulated_obj() {
    let path = std::env::temp_dir().join(format!("rs_vk_pbr_quad_{}.obj", std::process::id()));
    {
      let mut f = File::create(&path).unwrap();
      writeln!(f, "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0").unwrap();
      writeln!(f, "vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1").unwrap();
      writeln!(f, "vn 0 0 1").unwrap();
      writeln!(f, "f 1/1/1 2/2/1 3/3/1 4/4/1").unwrap();
    }

    let mesh = load_mesh(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(mesh.vertices.len(), 4);
    assert_eq!(mesh.indices.len(), 6);
    // v flipped for Vulkan
    assert!((mesh.vertices[0].uv - vec2(0.0, 1.0)).length() < 1e-5);
    assert!((mesh.vertices[0].normal - vec3(0.0, 0.0, 1.0)).length() < 1e-5);
  }

  #[test]
  fn missing_file_is_asset_error() {
    let result = load_image(Path::new("does/not/exist.jpg"));
    assert!(matches!(result, Err(EngineError::Asset { .. })));
  }
}
