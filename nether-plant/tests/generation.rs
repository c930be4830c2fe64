//! Integration tests for plant generation
//!
//! Exercises the public pipeline: settings -> skeleton -> tube meshes -> leaves

use glam::Vec3;
use nether_plant::curve::Curve;
use nether_plant::*;

fn small() -> PlantSettings {
    PlantSettings {
        seed: 1234,
        branch_orders: 3,
        branches_per_order: 5,
        radial_segments: 6,
        curve_samples: 4,
        ..Default::default()
    }
}

// ============================================================================
// Skeleton
// ============================================================================

#[test]
fn test_same_seed_same_tree() {
    let a = build_skeleton(7, &small());
    let b = build_skeleton(7, &small());
    assert_eq!(a, b);

    let c = build_skeleton(8, &small());
    assert_ne!(a, c, "different seeds should grow different trees");
}

#[test]
fn test_child_order_and_radius_invariants() {
    let settings = small();
    let resolved = settings.resolve();
    let tree = build_skeleton(99, &settings);
    assert!(tree.len() > 1);

    for (id, node) in tree.iter() {
        let Some(parent) = tree.parent_of(id) else {
            assert_eq!(node.order, 0, "only the trunk has no parent");
            continue;
        };
        assert_eq!(node.order, parent.order + 1);
        let parent_r = BranchTree::radius_at(parent, &resolved.taper, resolved.min_radius, node.attach_t);
        assert!(
            node.radius <= parent_r,
            "child {id:?} radius {} exceeds parent radius {parent_r} at t={}",
            node.radius,
            node.attach_t
        );
        assert!(
            node.radius <= parent_r * resolved.max_child_to_parent_ratio + 1e-6,
            "child {id:?} radius {} above ratio cap of parent radius {parent_r}",
            node.radius
        );
        assert!(node.radius < parent_r * 0.98);
        assert!(node.order < settings.branch_orders);

        let siblings: Vec<&BranchNode> = tree.children_of(node.parent.unwrap()).collect();
        assert!(siblings.iter().any(|s| std::ptr::eq(*s, node)));
    }

    let root_children = tree.children_of(NodeId(0)).count();
    assert_eq!(root_children, tree.root().unwrap().children.len());
    assert!(tree.children_of(NodeId(0)).all(|c| c.order == 1));
}

#[test]
fn test_children_too_thick_for_parent_are_rejected() {
    // Every child would be clamped up to radius 1.0, far above 98% of the trunk
    let settings = PlantSettings {
        abs_min_twig_radius: 1.0,
        stop_branch_radius: 0.001,
        ..small()
    };
    let tree = build_skeleton(11, &settings);
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_non_positive_trunk_is_clamped() {
    let settings = PlantSettings {
        trunk_radius: -0.5,
        trunk_height: -3.0,
        ..small()
    };
    let tree = build_skeleton(2, &settings);
    let trunk = tree.root().unwrap();
    assert!(trunk.radius > 0.0);
    assert!(trunk.length > 0.0);
    assert!(tree.iter().all(|(_, n)| n.radius > 0.0 && n.length > 0.0));
}

#[test]
fn test_single_order_is_bare_trunk() {
    let settings = PlantSettings {
        trunk_height: 8.0,
        trunk_radius: 0.14,
        branch_orders: 1,
        ..Default::default()
    };
    let tree = build_skeleton(42, &settings);
    assert_eq!(tree.len(), 1);

    let trunk = tree.root().unwrap();
    assert_eq!(trunk.order, 0);
    assert!(trunk.children.is_empty());
    assert_eq!(trunk.length, 8.0);
    assert_eq!(trunk.radius, 0.14);
}

#[test]
fn test_zero_floors_still_terminate() {
    let settings = PlantSettings {
        branch_orders: 4,
        branches_per_order: 4,
        min_radius: 0.0,
        min_length: 0.0,
        stop_branch_radius: 0.0,
        abs_min_twig_radius: 0.0,
        curve_samples: 2,
        ..Default::default()
    };
    let tree = build_skeleton(5, &settings);
    assert!(tree.depth() <= 3);
    assert!(tree.iter().all(|(_, n)| n.radius.is_finite() && n.length.is_finite()));
}

#[test]
fn test_centerlines_span_base_to_tip() {
    let tree = build_skeleton(3, &small());
    for (_, node) in tree.iter() {
        assert!(node.centerline.len() >= 2);
        assert_eq!(node.centerline[0], node.base);
        let end = *node.centerline.last().unwrap();
        assert!(end.distance(node.tip()) < 1e-4, "end {end} vs tip {}", node.tip());
    }
}

#[test]
fn test_trunk_starts_at_origin_pointing_up() {
    let tree = build_skeleton(1, &small());
    let trunk = tree.root().unwrap();
    assert_eq!(trunk.base, Vec3::ZERO);
    assert_eq!(trunk.direction, Vec3::Y);
}

// ============================================================================
// Tube mesher
// ============================================================================

#[test]
fn test_straight_tube_counts() {
    let centerline = [Vec3::ZERO, Vec3::new(0.0, 10.0, 0.0)];
    let options = TubeOptions {
        radial_segments: 8,
        samples_per_span: 2,
        base_radius: 1.0,
        cap_start: false,
        cap_end: false,
        flip_faces: false,
    };
    let mesh = build_tube_mesh(&centerline, &Curve::flat(), &options);
    assert_eq!(mesh.vertex_count(), 18);
    assert_eq!(mesh.triangle_count(), 16);

    for p in &mesh.positions {
        let radial = Vec3::new(p[0], 0.0, p[2]).length();
        assert!((radial - 1.0).abs() < 1e-4);
    }
}

// ============================================================================
// Plant and leaves
// ============================================================================

#[test]
fn test_plant_meshes_follow_tree() {
    let plant = build_plant(&small());
    assert_eq!(plant.branches.len(), plant.tree.len());
    for branch in &plant.branches {
        let node = plant.tree.get(branch.node).unwrap();
        assert_eq!(branch.order, node.order);
        assert!(branch.mesh.normals.iter().all(|n| {
            let len = Vec3::from(*n).length();
            (len - 1.0).abs() < 1e-3
        }));
    }
}

#[test]
fn test_canopy_is_deterministic_and_bounded() {
    let canopy = LeafCanopySettings {
        max_leaves_total: 150,
        ..Default::default()
    };
    let mut a = build_plant(&small());
    let mut b = build_plant(&small());
    a.decorate(&canopy);
    b.decorate(&canopy);

    assert_eq!(a.leaves, b.leaves);
    assert!(!a.leaves.is_empty());
    assert!(a.leaves.len() <= 150);
}

#[test]
fn test_regenerate_regrows_leaves() {
    let mut plant = build_plant(&small());
    plant.decorate(&LeafCanopySettings::default());
    let before = plant.leaves.clone();

    plant.regenerate(4321);
    assert_ne!(plant.leaves, before);
    assert!(!plant.leaves.is_empty());
}
