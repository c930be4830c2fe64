//! Wavefront OBJ export

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::types::MeshData;
use crate::color::Rgb;
use crate::error::{PlantError, Result};

/// Streams several meshes into one OBJ file as separate objects
///
/// Face indices are offset across objects, so every object refers to its
/// own vertices. A colour, when given, is written as the widely supported
/// `v x y z r g b` extension.
pub struct ObjWriter<W: Write> {
    out: W,
    vertex_offset: usize,
    objects: usize,
}

impl<W: Write> ObjWriter<W> {
    pub fn new(mut out: W) -> std::io::Result<Self> {
        writeln!(out, "# nether-plant")?;
        Ok(Self {
            out,
            vertex_offset: 0,
            objects: 0,
        })
    }

    /// Append one named object
    pub fn object(&mut self, name: &str, mesh: &MeshData, color: Option<Rgb>) -> std::io::Result<()> {
        writeln!(self.out, "o {name}")?;

        for p in &mesh.positions {
            match color {
                Some([r, g, b]) => writeln!(
                    self.out,
                    "v {} {} {} {r:.4} {g:.4} {b:.4}",
                    p[0], p[1], p[2]
                )?,
                None => writeln!(self.out, "v {} {} {}", p[0], p[1], p[2])?,
            }
        }
        for i in 0..mesh.vertex_count() {
            let uv = mesh.uvs.get(i).copied().unwrap_or([0.0, 0.0]);
            writeln!(self.out, "vt {} {}", uv[0], uv[1])?;
        }
        for n in &mesh.normals {
            writeln!(self.out, "vn {} {} {}", n[0], n[1], n[2])?;
        }

        // OBJ indices are 1-based
        let base = self.vertex_offset + 1;
        for [a, b, c] in mesh.triangles() {
            let (a, b, c) = (a as usize + base, b as usize + base, c as usize + base);
            writeln!(self.out, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")?;
        }

        self.vertex_offset += mesh.vertex_count();
        self.objects += 1;
        Ok(())
    }

    pub fn object_count(&self) -> usize {
        self.objects
    }

    pub fn finish(mut self) -> std::io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Create `path` and run `body` against an OBJ writer on it
pub(crate) fn with_obj_file<F>(path: &Path, body: F) -> Result<usize>
where
    F: FnOnce(&mut ObjWriter<BufWriter<File>>) -> std::io::Result<()>,
{
    let run = || -> std::io::Result<usize> {
        let file = File::create(path)?;
        let mut writer = ObjWriter::new(BufWriter::new(file))?;
        body(&mut writer)?;
        let count = writer.object_count();
        writer.finish()?;
        Ok(count)
    };
    run().map_err(|e| PlantError::io(path, e))
}

/// Write a single mesh as an OBJ file
///
/// # Example
/// ```no_run
/// use nether_plant::mesh::{build_leaf_mesh, write_obj, LeafShape};
/// use std::path::Path;
///
/// let leaf = build_leaf_mesh(&LeafShape::default());
/// write_obj(&leaf, Path::new("leaf.obj"), "leaf").unwrap();
/// ```
pub fn write_obj(mesh: &MeshData, path: &Path, name: &str) -> Result<()> {
    with_obj_file(path, |obj| obj.object(name, mesh, None))?;
    tracing::debug!(
        path = %path.display(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "wrote obj"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use tempfile::tempdir;

    fn triangle() -> MeshData {
        let mut mesh = MeshData::new();
        mesh.add_vertex(Vec3::ZERO, (0.0, 0.0), Vec3::Z);
        mesh.add_vertex(Vec3::X, (1.0, 0.0), Vec3::Z);
        mesh.add_vertex(Vec3::Y, (0.0, 1.0), Vec3::Z);
        mesh.add_triangle(0, 1, 2);
        mesh
    }

    #[test]
    fn test_objects_offset_faces() {
        let mut obj = ObjWriter::new(Vec::new()).unwrap();
        obj.object("a", &triangle(), None).unwrap();
        obj.object("b", &triangle(), Some([0.5, 0.25, 1.0])).unwrap();
        assert_eq!(obj.object_count(), 2);
        let text = String::from_utf8(obj.finish().unwrap()).unwrap();

        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces, vec!["f 1/1/1 2/2/2 3/3/3", "f 4/4/4 5/5/5 6/6/6"]);
        assert!(text.contains("o b\nv 0 0 0 0.5000 0.2500 1.0000"));
        assert_eq!(text.lines().filter(|l| l.starts_with("vn ")).count(), 6);
    }

    #[test]
    fn test_write_obj_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("tri.obj");
        write_obj(&triangle(), &path, "tri").unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 3);
        assert_eq!(text.lines().filter(|l| l.starts_with("vt ")).count(), 3);
        assert_eq!(text.lines().filter(|l| l.starts_with("f ")).count(), 1);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("missing").join("tri.obj");
        let err = write_obj(&triangle(), &path, "tri").unwrap_err();
        assert!(matches!(err, crate::PlantError::Io { .. }));
        assert!(err.to_string().contains("tri.obj"));
    }
}
