//! Procedural branching plants
//!
//! Grows seeded branch skeletons, fits each branch's noisy control path with
//! a Catmull-Rom spline, and extrudes a tapered tube along it using
//! parallel-transport frames. On top of that sit leaf canopies, gardens of
//! several plants over a noise ground, and Wavefront OBJ export.
//!
//! Generation is pure and deterministic: the same seed and settings always
//! produce the same skeleton and meshes.
//!
//! # Skeleton Example
//! ```no_run
//! use nether_plant::*;
//!
//! let settings = PlantSettings {
//!     branch_orders: 3,
//!     ..Default::default()
//! };
//! let tree = build_skeleton(42, &settings);
//!
//! for (id, node) in tree.iter() {
//!     println!("{id:?}: order {} length {:.2}", node.order, node.length);
//! }
//! ```
//!
//! # Tube Example
//! ```no_run
//! use glam::Vec3;
//! use nether_plant::*;
//!
//! let centerline = [Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.2, 2.0, 0.0)];
//! let profile = RadiusProfile::linear(0.0, 1.0, 1.0, 0.3);
//! let options = TubeOptions {
//!     radial_segments: 8,
//!     base_radius: 0.1,
//!     ..Default::default()
//! };
//! let mesh: TubeMesh = build_tube_mesh(&centerline, &profile, &options);
//! mesh::write_obj(&mesh, "branch.obj".as_ref(), "branch")?;
//! # Ok::<(), PlantError>(())
//! ```
//!
//! # Garden Example
//! ```no_run
//! use nether_plant::*;
//!
//! let mut garden = Garden::generate(&GardenSettings::default());
//! write_garden_obj(&garden, "garden.obj".as_ref())?;
//!
//! // Grow a different row from the same settings
//! garden.regenerate(7);
//! # Ok::<(), PlantError>(())
//! ```

pub mod color;
pub mod curve;
pub mod error;
pub mod frame;
pub mod garden;
pub mod leaves;
pub mod mesh;
pub mod plant;
pub mod settings;
pub mod skeleton;
pub mod spline;

pub use color::{Gradient, Rgb};
pub use curve::{Curve, Keyframe, RadiusProfile};
pub use error::{PlantError, Result};
pub use garden::{Garden, GardenSettings, PlacedPlant, write_garden_obj};
pub use leaves::{LeafCanopySettings, LeafInstance, decorate_leaves};
pub use mesh::{TubeMesh, TubeOptions, build_tube_mesh};
pub use plant::{BranchMesh, Plant, build_plant, write_plant_obj};
pub use settings::PlantSettings;
pub use skeleton::{BranchNode, BranchTree, NodeId, build_skeleton};
