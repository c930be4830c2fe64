//! Mesh generation and modification

pub mod export;
pub mod ground;
pub mod leaf;
pub mod modifiers;
pub mod tube;
pub mod types;

pub use types::{IndexBuffer, IndexFormat, MeshData, PackedVertex, TubeMesh, U16_VERTEX_LIMIT};

// Generators
pub use ground::{GroundSettings, build_ground_mesh};
pub use leaf::{LeafShape, build_leaf_mesh};
pub use tube::{MIN_RING_RADIUS, TubeOptions, build_tube_mesh};

pub use modifiers::{FlipWinding, MeshApply, MeshModifier, SmoothNormals, Transform};
pub use export::{ObjWriter, write_obj};
