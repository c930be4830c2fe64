//! Whole-plant assembly
//!
//! Grows a skeleton and extrudes one tube per branch node. Leaves are an
//! optional second pass (`Plant::decorate`).

use std::path::Path;

use glam::Vec3;
use tracing::debug;

use crate::color::{Rgb, order_color};
use crate::error::Result;
use crate::leaves::{LeafCanopySettings, LeafInstance, decorate_leaves};
use crate::mesh::export::{ObjWriter, with_obj_file};
use crate::mesh::{MeshApply, MeshData, Transform, TubeMesh, TubeOptions, build_leaf_mesh, build_tube_mesh};
use crate::settings::PlantSettings;
use crate::skeleton::{BranchTree, NodeId, build_resolved};

/// Surface of one branch node
#[derive(Debug, Clone, PartialEq)]
pub struct BranchMesh {
    pub node: NodeId,
    pub order: u32,
    pub mesh: TubeMesh,
    /// Per-order debug colour, when enabled in the settings
    pub tint: Option<Rgb>,
}

/// A generated plant in its own space, trunk base at the origin
#[derive(Debug, Clone, PartialEq)]
pub struct Plant {
    pub settings: PlantSettings,
    pub tree: BranchTree,
    /// One mesh per node, each node before its children
    pub branches: Vec<BranchMesh>,
    pub leaves: Vec<LeafInstance>,
    /// Blade every leaf instance places; empty until decorated
    pub leaf_mesh: MeshData,
    canopy: Option<LeafCanopySettings>,
}

/// Grow a plant from `settings.seed`
pub fn build_plant(settings: &PlantSettings) -> Plant {
    let resolved = settings.resolve();
    let tree = build_resolved(settings.seed, &resolved);

    let branches: Vec<BranchMesh> = tree
        .depth_first()
        .into_iter()
        .filter_map(|id| tree.get(id).map(|node| (id, node)))
        .map(|(id, node)| {
            let options = TubeOptions {
                radial_segments: resolved.radial_segments,
                samples_per_span: resolved.curve_samples,
                base_radius: node.radius,
                cap_start: node.order == 0,
                cap_end: true,
                flip_faces: false,
            };
            BranchMesh {
                node: id,
                order: node.order,
                mesh: build_tube_mesh(&node.centerline, &resolved.taper, &options),
                tint: resolved.debug_order_tint.then(|| order_color(node.order)),
            }
        })
        .collect();

    debug!(
        seed = settings.seed,
        branches = branches.len(),
        vertices = branches.iter().map(|b| b.mesh.vertex_count()).sum::<usize>(),
        "built plant"
    );

    Plant {
        settings: settings.clone(),
        tree,
        branches,
        leaves: Vec::new(),
        leaf_mesh: MeshData::new(),
        canopy: None,
    }
}

impl Plant {
    /// Place leaves on the branch meshes, replacing any previous leaves
    pub fn decorate(&mut self, canopy: &LeafCanopySettings) {
        self.leaves = decorate_leaves(self, canopy);
        self.leaf_mesh = build_leaf_mesh(&canopy.leaf_shape);
        self.canopy = Some(canopy.clone());
    }

    /// Replace this plant with a fresh build from `seed`
    ///
    /// Leaves are regrown when the old plant had been decorated.
    pub fn regenerate(&mut self, seed: u64) {
        let settings = PlantSettings {
            seed,
            ..self.settings.clone()
        };
        let mut next = build_plant(&settings);
        if let Some(canopy) = &self.canopy {
            next.decorate(canopy);
        }
        *self = next;
    }

    pub fn branch(&self, node: NodeId) -> Option<&BranchMesh> {
        self.branches.iter().find(|b| b.node == node)
    }

    /// All branch meshes merged into one
    pub fn bark_mesh(&self) -> MeshData {
        let mut merged = MeshData::new();
        for branch in &self.branches {
            merged.append(&branch.mesh);
        }
        merged
    }

    /// All leaves baked into one mesh
    pub fn foliage_mesh(&self) -> MeshData {
        let mut merged = MeshData::new();
        for leaf in &self.leaves {
            merged.append(&self.leaf_geometry(leaf));
        }
        merged
    }

    fn leaf_geometry(&self, leaf: &LeafInstance) -> MeshData {
        let mut mesh = self.leaf_mesh.clone();
        mesh.apply(Transform::from_scale_rotation_translation(
            leaf.scale,
            leaf.rotation,
            leaf.position,
        ));
        mesh
    }

    /// Write every branch and leaf as OBJ objects, shifted by `offset`
    pub(crate) fn write_objects<W: std::io::Write>(
        &self,
        obj: &mut ObjWriter<W>,
        prefix: &str,
        offset: Vec3,
        bark: Option<Rgb>,
    ) -> std::io::Result<()> {
        let shift = Transform::translate(offset.x, offset.y, offset.z);
        for (i, branch) in self.branches.iter().enumerate() {
            let mut mesh = branch.mesh.clone();
            mesh.apply(shift);
            let name = format!("{prefix}branch_o{}_{i}", branch.order);
            obj.object(&name, &mesh, branch.tint.or(bark))?;
        }
        for (i, leaf) in self.leaves.iter().enumerate() {
            let mut mesh = self.leaf_geometry(leaf);
            mesh.apply(shift);
            let [r, g, b, _] = leaf.color;
            obj.object(&format!("{prefix}leaf_{i}"), &mesh, Some([r, g, b]))?;
        }
        Ok(())
    }
}

/// Write a plant (branches and leaves) as one OBJ file
pub fn write_plant_obj(plant: &Plant, path: &Path) -> Result<()> {
    let objects = with_obj_file(path, |obj| plant.write_objects(obj, "", Vec3::ZERO, None))?;
    debug!(path = %path.display(), objects, "wrote plant obj");
    Ok(())
}
