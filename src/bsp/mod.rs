//! Binary space partitioning tree over a solid's faces.
//!
//! The tree answers one question: which part of a triangle lies inside the
//! solid it was built from. Nodes live in a flat arena and refer to their
//! children by index, so dropping a deep tree never recurses.
//!
//! **Classification rule:** a triangle is split by each node plane it
//! straddles, every piece is pushed down its side, and the partial results
//! are combined with [`Classification::agrees_with`]. Pieces that land on a
//! plane keep track of it through the `*On` variants.

pub mod node;

pub use node::{BspNode, NodeId};

use crate::aabb::Aabb;
use crate::float_types::Real;
use crate::math;
use crate::mesh::{FaceId, IndexedMesh};
use crate::plane::Plane;
use crate::tag::{Classification, PointClass, TriClass};
use nalgebra::Point3;
use tracing::trace;

type Triangle = [Point3<Real>; 3];

#[derive(Debug, Clone, Default)]
pub struct BspTree {
    nodes: Vec<BspNode>,
    root: Option<NodeId>,
    bbox: Option<Aabb>,
    depth: usize,
    /// Built from an inverted solid: an empty tree then contains everything
    inverted: bool,
}

impl BspTree {
    /// Empty tree of an ordinary solid, classifies everything outside.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty tree of an inverted solid, classifies everything inside.
    pub fn new_inverted() -> Self {
        Self {
            inverted: true,
            ..Self::default()
        }
    }

    /// Builds a tree from the live triangles among `faces`.
    pub fn from_mesh_faces(mesh: &IndexedMesh, faces: impl IntoIterator<Item = FaceId>, inverted: bool) -> Self {
        let mut tree = if inverted {
            Self::new_inverted()
        } else {
            Self::new()
        };
        for f in faces {
            if mesh.face(f).is_retired() {
                continue;
            }
            if let Some([p1, p2, p3]) = mesh.triangle_points(f) {
                tree.add_face(&p1, &p2, &p3, mesh.face(f).plane());
            }
        }
        trace!(nodes = tree.nodes.len(), depth = tree.depth, "built BSP tree");
        tree
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[inline]
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Length of the longest root-to-node path.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Box around every point inserted so far, `None` while empty.
    #[inline]
    pub fn bounding_box(&self) -> Option<&Aabb> {
        self.bbox.as_ref()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &BspNode {
        &self.nodes[id]
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    fn leaf_class(&self) -> Classification {
        if self.inverted {
            Classification::In
        } else {
            Classification::Out
        }
    }

    fn push_node(&mut self, plane: Plane, depth: usize) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(BspNode::new(plane, depth));
        self.depth = self.depth.max(depth);
        id
    }

    /// Inserts a triangle with its cached plane.
    ///
    /// Degenerate triangles are ignored. The triangle is clipped by every
    /// node plane on its way down; each piece that reaches a missing child
    /// creates it with `plane`.
    pub fn add_face(&mut self, p1: &Point3<Real>, p2: &Point3<Real>, p3: &Point3<Real>, plane: &Plane) {
        if math::collinear(p1, p2, p3) {
            trace!("skipping degenerate triangle");
            return;
        }
        match &mut self.bbox {
            Some(bbox) => {
                bbox.grow(p1);
                bbox.grow(p2);
                bbox.grow(p3);
            },
            None => self.bbox = Aabb::from_points([p1, p2, p3]),
        }

        let Some(root) = self.root else {
            self.root = Some(self.push_node(*plane, 1));
            return;
        };

        let mut pending = vec![(root, vec![*p1, *p2, *p3])];
        while let Some((id, polygon)) = pending.pop() {
            let node_plane = self.nodes[id].plane;
            let (inside, outside) = split_polygon(&node_plane, &polygon);
            let depth = self.nodes[id].depth + 1;

            if let Some(piece) = inside {
                match self.nodes[id].in_child {
                    Some(child) => pending.push((child, piece)),
                    None => {
                        let child = self.push_node(*plane, depth);
                        self.nodes[id].in_child = Some(child);
                    },
                }
            }
            if let Some(piece) = outside {
                match self.nodes[id].out_child {
                    Some(child) => pending.push((child, piece)),
                    None => {
                        let child = self.push_node(*plane, depth);
                        self.nodes[id].out_child = Some(child);
                    },
                }
            }
        }
    }

    /// Classifies a point; points on a plane follow both sides and report
    /// [`Classification::On`] when the sides disagree.
    pub fn classify_point(&self, p: &Point3<Real>) -> Classification {
        match self.root {
            Some(root) => self.classify_point_at(root, p),
            None => self.leaf_class(),
        }
    }

    fn classify_point_at(&self, id: NodeId, p: &Point3<Real>) -> Classification {
        let node = &self.nodes[id];
        let inside = || match node.in_child {
            Some(child) => self.classify_point_at(child, p),
            None => Classification::In,
        };
        let outside = || match node.out_child {
            Some(child) => self.classify_point_at(child, p),
            None => Classification::Out,
        };
        match node.plane.classify_point(p) {
            PointClass::In => inside(),
            PointClass::Out => outside(),
            PointClass::On => {
                let (a, b) = (inside(), outside());
                if a == b { a } else { Classification::On }
            },
        }
    }

    /// Full classification of the triangle `p1 p2 p3` lying on `plane`.
    pub fn classify_face(
        &self,
        p1: &Point3<Real>,
        p2: &Point3<Real>,
        p3: &Point3<Real>,
        plane: &Plane,
    ) -> Classification {
        match self.root {
            Some(root) => self.classify_at(root, [*p1, *p2, *p3], plane),
            None => self.leaf_class(),
        }
    }

    fn descend(&self, id: NodeId, side: PointClass, tri: Triangle, plane: &Plane) -> Classification {
        let node = &self.nodes[id];
        match side {
            PointClass::Out => match node.out_child {
                Some(child) => self.classify_at(child, tri, plane),
                None => Classification::Out,
            },
            _ => match node.in_child {
                Some(child) => self.classify_at(child, tri, plane),
                None => Classification::In,
            },
        }
    }

    fn classify_at(&self, id: NodeId, tri: Triangle, plane: &Plane) -> Classification {
        let node_plane = self.nodes[id].plane;
        let classes = node_plane.classify_triangle(&tri[0], &tri[1], &tri[2]);
        let on = classes.count(PointClass::On);
        let inside = classes.count(PointClass::In);
        let outside = classes.count(PointClass::Out);

        if on == 3 {
            let side = if node_plane.same_orientation(plane) {
                PointClass::In
            } else {
                PointClass::Out
            };
            return self.descend(id, side, tri, plane).add_on();
        }
        if outside == 0 || inside == 0 {
            let side = if outside == 0 {
                PointClass::In
            } else {
                PointClass::Out
            };
            let class = self.descend(id, side, tri, plane);
            return if on > 0 { class.add_on() } else { class };
        }

        match straddle(&node_plane, &tri, &classes) {
            Straddle::ThroughCorner { inside, outside } => {
                let a = self.descend(id, PointClass::In, inside, plane);
                let b = self.descend(id, PointClass::Out, outside, plane);
                if a.agrees_with(b) {
                    a.add_on()
                } else {
                    Classification::InOut
                }
            },
            Straddle::Lone { side, lone, rest } => {
                let other = opposite(side);
                let a = self.descend(id, side, lone, plane);
                let b = self.descend(id, other, rest[0], plane);
                let c = self.descend(id, other, rest[1], plane);
                if a.agrees_with(b) && b.agrees_with(c) {
                    a.add_on()
                } else {
                    Classification::InOut
                }
            },
        }
    }

    /// Cheap classification following a single path: where a node plane
    /// splits the triangle, only the larger piece is pushed further down.
    pub fn simplified_classify_face(
        &self,
        p1: &Point3<Real>,
        p2: &Point3<Real>,
        p3: &Point3<Real>,
        plane: &Plane,
    ) -> Classification {
        let mut tri = [*p1, *p2, *p3];
        let Some(mut id) = self.root else {
            return self.leaf_class();
        };
        loop {
            let node = &self.nodes[id];
            let classes = node.plane.classify_triangle(&tri[0], &tri[1], &tri[2]);
            let inside = classes.count(PointClass::In);
            let outside = classes.count(PointClass::Out);

            let side = if inside == 0 && outside == 0 {
                if node.plane.same_orientation(plane) {
                    PointClass::In
                } else {
                    PointClass::Out
                }
            } else if outside == 0 {
                PointClass::In
            } else if inside == 0 {
                PointClass::Out
            } else {
                let (side, piece) = larger_piece(straddle(&node.plane, &tri, &classes));
                tri = piece;
                side
            };

            let next = match side {
                PointClass::Out => node.out_child,
                _ => node.in_child,
            };
            match next {
                Some(child) => id = child,
                None if side == PointClass::Out => return Classification::Out,
                None => return Classification::In,
            }
        }
    }
}

/// How a node plane cuts a triangle that has corners on both sides.
enum Straddle {
    /// One corner on the plane, the opposite edge crosses it.
    ThroughCorner { inside: Triangle, outside: Triangle },
    /// One corner alone on `side`; the rest is a quad split into two triangles.
    Lone {
        side: PointClass,
        lone: Triangle,
        rest: [Triangle; 2],
    },
}

fn opposite(side: PointClass) -> PointClass {
    match side {
        PointClass::In => PointClass::Out,
        PointClass::Out => PointClass::In,
        PointClass::On => PointClass::On,
    }
}

fn straddle(plane: &Plane, tri: &Triangle, classes: &TriClass) -> Straddle {
    if let Some(on) = classes.position(PointClass::On) {
        let i = classes.position(PointClass::In).unwrap_or((on + 1) % 3);
        let o = classes.position(PointClass::Out).unwrap_or((on + 2) % 3);
        let m = plane.intersect_segment(&tri[i], &tri[o]);
        return Straddle::ThroughCorner {
            inside: [tri[i], m, tri[on]],
            outside: [m, tri[o], tri[on]],
        };
    }

    let side = if classes.count(PointClass::In) == 1 {
        PointClass::In
    } else {
        PointClass::Out
    };
    let a = classes.position(side).unwrap_or(0);
    let (b, c) = ((a + 1) % 3, (a + 2) % 3);
    let m1 = plane.intersect_segment(&tri[a], &tri[b]);
    let m2 = plane.intersect_segment(&tri[a], &tri[c]);
    let rest = if math::is_inside_circle(&m1, &tri[b], &m2, &tri[c]) {
        [[m1, tri[b], tri[c]], [m1, tri[c], m2]]
    } else {
        [[m1, tri[b], m2], [tri[b], tri[c], m2]]
    };
    Straddle::Lone {
        side,
        lone: [tri[a], m1, m2],
        rest,
    }
}

fn larger_piece(straddle: Straddle) -> (PointClass, Triangle) {
    let area = |t: &Triangle| math::triangle_area(&t[0], &t[1], &t[2]);
    match straddle {
        Straddle::ThroughCorner { inside, outside } => {
            if area(&inside) >= area(&outside) {
                (PointClass::In, inside)
            } else {
                (PointClass::Out, outside)
            }
        },
        Straddle::Lone { side, lone, rest } => {
            let [r1, r2] = rest;
            let bigger = if area(&r1) >= area(&r2) { r1 } else { r2 };
            if area(&lone) >= area(&r1) + area(&r2) {
                (side, lone)
            } else {
                (opposite(side), bigger)
            }
        },
    }
}

/// Clips a convex polygon by `plane` into its inside and outside parts.
///
/// A part is only returned when at least one corner lies strictly on its
/// side, so polygons lying on the plane or merely touching it produce no
/// piece on that side.
fn split_polygon(plane: &Plane, polygon: &[Point3<Real>]) -> (Option<Vec<Point3<Real>>>, Option<Vec<Point3<Real>>>) {
    let classes: Vec<PointClass> = polygon.iter().map(|p| plane.classify_point(p)).collect();
    let has_in = classes.contains(&PointClass::In);
    let has_out = classes.contains(&PointClass::Out);
    if !has_out {
        return (has_in.then(|| polygon.to_vec()), None);
    }
    if !has_in {
        return (None, Some(polygon.to_vec()));
    }

    let mut inside = Vec::with_capacity(polygon.len() + 1);
    let mut outside = Vec::with_capacity(polygon.len() + 1);
    for i in 0..polygon.len() {
        let j = (i + 1) % polygon.len();
        let (ci, cj) = (classes[i], classes[j]);
        match ci {
            PointClass::In => inside.push(polygon[i]),
            PointClass::Out => outside.push(polygon[i]),
            PointClass::On => {
                inside.push(polygon[i]);
                outside.push(polygon[i]);
            },
        }
        if matches!(
            (ci, cj),
            (PointClass::In, PointClass::Out) | (PointClass::Out, PointClass::In)
        ) {
            let x = plane.intersect_segment(&polygon[i], &polygon[j]);
            inside.push(x);
            outside.push(x);
        }
    }
    (
        (inside.len() >= 3).then_some(inside),
        (outside.len() >= 3).then_some(outside),
    )
}
