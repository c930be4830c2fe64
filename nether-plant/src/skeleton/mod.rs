//! Branch skeleton
//!
//! A plant's structure before any surface exists: a tree of branch nodes,
//! each with a base, a direction, a length, a base radius and a dense
//! centerline. Nodes live in one arena owned by `BranchTree`; children and
//! parent links are `NodeId` indices into it.

mod builder;
mod rng;

pub use builder::build_skeleton;
pub(crate) use builder::build_resolved;
pub use rng::BranchRng;

use glam::Vec3;

use crate::curve::RadiusProfile;
use crate::spline::{polyline_tangent_at, sample_polyline};

/// Index of a node inside its `BranchTree`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One branch segment
#[derive(Debug, Clone, PartialEq)]
pub struct BranchNode {
    /// 0 for the trunk, parent order + 1 for children
    pub order: u32,
    pub base: Vec3,
    /// Unit growth direction
    pub direction: Vec3,
    pub length: f32,
    /// Radius at the base, before the taper profile
    pub radius: f32,
    /// Fitted path from `base` to `base + direction * length`
    pub centerline: Vec<Vec3>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Parametric position on the parent's centerline (0 for the trunk)
    pub attach_t: f32,
    /// Spawned as the extra branch near the parent's tip
    pub is_tip: bool,
}

impl BranchNode {
    /// Where the node's path ends
    pub fn tip(&self) -> Vec3 {
        self.base + self.direction * self.length
    }

    /// Point on the centerline at parametric `t`
    pub fn point_at(&self, t: f32) -> Vec3 {
        sample_polyline(&self.centerline, t)
    }

    /// Centerline direction at parametric `t`
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        polyline_tangent_at(&self.centerline, t)
    }
}

/// All nodes of one plant, trunk first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchTree {
    nodes: Vec<BranchNode>,
}

impl BranchTree {
    pub(crate) fn push(&mut self, node: BranchNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        if let Some(parent) = node.parent {
            self.nodes[parent.0].children.push(id);
        }
        self.nodes.push(node);
        id
    }

    /// The trunk
    pub fn root(&self) -> Option<&BranchNode> {
        self.nodes.first()
    }

    pub fn get(&self, id: NodeId) -> Option<&BranchNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes with their ids, in creation order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &BranchNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Nodes in depth-first order: each node before its children,
    /// siblings in creation order
    pub fn depth_first(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        if !self.nodes.is_empty() {
            stack.push(NodeId(0));
        }
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    pub fn children_of(&self, id: NodeId) -> impl Iterator<Item = &BranchNode> {
        self.nodes
            .get(id.0)
            .into_iter()
            .flat_map(move |n| n.children.iter().map(move |c| &self.nodes[c.0]))
    }

    pub fn parent_of(&self, id: NodeId) -> Option<&BranchNode> {
        self.get(id)?.parent.and_then(|p| self.get(p))
    }

    /// Highest order present
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.order).max().unwrap_or(0)
    }

    /// Node count per order, trunk first
    pub fn count_by_order(&self) -> Vec<usize> {
        let mut counts = vec![0; self.depth() as usize + 1];
        for node in &self.nodes {
            counts[node.order as usize] += 1;
        }
        counts
    }

    /// Radius of `node` at parametric `t`, never below `min_radius`
    pub fn radius_at(node: &BranchNode, taper: &RadiusProfile, min_radius: f32, t: f32) -> f32 {
        (node.radius * taper.evaluate(t.clamp(0.0, 1.0))).max(min_radius)
    }
}
