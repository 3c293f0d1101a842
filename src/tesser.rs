//! Drives the external triangulator over one sub-path and collects its
//! output per winding component.
//!
//! There are two winding numbers in play: the one the triangulator reports
//! for a region, and the one the region is recorded under. They differ by
//! the sub-path's winding offset, obtained by collapsing the contours that
//! wrap around the sub-path boundary (see `hoard`).

use crate::consts::MIN_HEIGHT;
use crate::hoard::{Path, PointHoard};
use crate::math::{DPoint, DVector};
use crate::triangulator::{TriangulationOutput, Triangulator, NULL_CLIENT_ID};

use arrayvec::ArrayVec;
use std::collections::BTreeMap;

/// A silhouette edge of one monotone polygon.
///
/// `next` is the far endpoint of the following edge around the same
/// boundary, used to build the bevel joining the two.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Edge {
    pub start: u32,
    pub end: u32,
    pub next: u32,
    pub draw_edge: bool,
    pub draw_bevel: bool,
}

impl Edge {
    pub fn num_attributes(&self) -> usize {
        let e = if self.draw_edge { 4 } else { 0 };
        let b = if self.draw_bevel { 3 } else { 0 };
        e + b
    }

    pub fn num_indices(&self) -> usize {
        let e = if self.draw_edge { 6 } else { 0 };
        let b = if self.draw_bevel { 3 } else { 0 };
        e + b
    }
}

/// The silhouette edges of one winding component, threaded boundary by
/// boundary. Only edges that draw something (edge quad or bevel) are kept.
#[derive(Default)]
pub(crate) struct EdgeList {
    edges: Vec<Edge>,
    attribute_count: usize,
    index_count: usize,
    edge_count: usize,

    current: Vec<Edge>,
}

impl EdgeList {
    pub fn begin_boundary(&mut self) {
        debug_assert!(self.current.is_empty());
    }

    pub fn add_edge(&mut self, p0: u32, p1: u32, edge_drawn: bool) {
        if let Some(last) = self.current.last_mut() {
            debug_assert_eq!(last.end, p0);
            last.next = p1;
            last.draw_bevel = edge_drawn || last.draw_edge;
        }

        self.current.push(Edge {
            start: p0,
            end: p1,
            next: p1,
            draw_edge: edge_drawn,
            draw_bevel: false,
        });
    }

    pub fn end_boundary(&mut self) {
        if self.current.is_empty() {
            return;
        }

        let first_start = self.current[0].start;
        let first_end = self.current[0].end;
        let first_draws = self.current[0].draw_edge;

        let last = self.current.last_mut().unwrap();
        debug_assert_eq!(last.end, first_start);
        last.next = first_end;
        last.draw_bevel = first_draws || last.draw_edge;

        for e in self.current.drain(..) {
            if e.draw_edge || e.draw_bevel {
                self.attribute_count += e.num_attributes();
                self.index_count += e.num_indices();
                self.edge_count += 1;
                self.edges.push(e);
            }
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn attribute_count(&self) -> usize {
        self.attribute_count
    }

    pub fn index_count(&self) -> usize {
        self.index_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}

/// Everything collected for one stored winding number.
#[derive(Default)]
pub(crate) struct WindingComponent {
    pub triangles: Vec<u32>,
    pub edges: EdgeList,
}

pub(crate) type PerWindingComponents = BTreeMap<i32, WindingComponent>;

/// Feeds one discretized path to the triangulator and implements its
/// output callbacks.
pub(crate) struct Tesser<'l> {
    point_count: u32,
    points: &'l mut PointHoard,
    temp_verts: ArrayVec<u32, 3>,
    triangulation_failed: bool,
    current_winding: i32,
    winding_offset: i32,
    components: &'l mut PerWindingComponents,
}

impl<'l> Tesser<'l> {
    pub fn new(
        points: &'l mut PointHoard,
        winding_offset: i32,
        components: &'l mut PerWindingComponents,
    ) -> Self {
        Tesser {
            point_count: 0,
            points,
            temp_verts: ArrayVec::new(),
            triangulation_failed: false,
            current_winding: 0,
            winding_offset,
            components,
        }
    }

    /// Run a fresh triangulator over `path`. Returns true if the
    /// triangulation failed (some triangles may still have been
    /// collected).
    pub fn run<T: Triangulator>(
        points: &'l mut PointHoard,
        path: &Path,
        winding_offset: i32,
        components: &'l mut PerWindingComponents,
    ) -> bool {
        let mut tesser = Tesser::new(points, winding_offset, components);
        let mut tess = T::new();

        tess.set_boundary_only(false);
        tess.begin_polygon();
        for contour in path {
            debug_assert!(!contour.is_empty());
            tess.begin_contour(true);
            for p in contour {
                let position = tesser.points.apply(p.vertex, tesser.point_count);
                tesser.point_count += 1;
                tess.add_vertex(position.x, position.y, p.vertex);
            }
            tess.end_contour();
        }
        tess.end_polygon(&mut tesser);

        tesser.triangulation_failed
    }

    /// All three corners distinct, non-zero area, and no altitude under
    /// `MIN_HEIGHT` grid units (the distance from an edge to the third
    /// point is twice the area over the edge length).
    fn temp_verts_non_degenerate_triangle(&self) -> bool {
        let [a, b, c] = [self.temp_verts[0], self.temp_verts[1], self.temp_verts[2]];
        if a == b || a == c || b == c {
            return false;
        }

        let p0 = self.points.ipt(a).cast::<i64>();
        let p1 = self.points.ipt(b).cast::<i64>();
        let p2 = self.points.ipt(c).cast::<i64>();
        let v = p1 - p0;
        let w = p2 - p0;

        let twice_area = (v.x * w.y - v.y * w.x).abs();
        if twice_area == 0 {
            return false;
        }

        let u = p2 - p1;
        let two_area = twice_area as f64;
        let vmag = ((v.x * v.x + v.y * v.y) as f64).sqrt();
        let wmag = ((w.x * w.x + w.y * w.y) as f64).sqrt();
        let umag = ((u.x * u.x + u.y * u.y) as f64).sqrt();

        two_area >= MIN_HEIGHT * vmag
            && two_area >= MIN_HEIGHT * wmag
            && two_area >= MIN_HEIGHT * umag
    }
}

impl TriangulationOutput for Tesser<'_> {
    fn begin_region(&mut self, winding: i32) {
        self.temp_verts.clear();
        self.current_winding = winding + self.winding_offset;
        self.components.entry(self.current_winding).or_default();
    }

    fn triangle_vertex(&mut self, id: u32) {
        if id == NULL_CLIENT_ID {
            self.triangulation_failed = true;
        }

        self.temp_verts.push(id);
        if !self.temp_verts.is_full() {
            return;
        }

        let ok = !self.temp_verts.contains(&NULL_CLIENT_ID)
            && self.temp_verts_non_degenerate_triangle();
        if ok {
            let component = self
                .components
                .entry(self.current_winding)
                .or_default();
            component.triangles.extend_from_slice(&self.temp_verts);
        }
        self.temp_verts.clear();
    }

    fn combine(&mut self, position: DPoint, ids: [u32; 4], weights: [f64; 4]) -> u32 {
        let use_sum = ids.iter().all(|&id| id != NULL_CLIENT_ID);

        let pt = if use_sum {
            let mut acc = DVector::new(0.0, 0.0);
            for i in 0..4 {
                acc += self.points.point(ids[i]).to_vector() * weights[i];
            }
            acc.to_point()
        } else {
            self.points.converter().unapply_f64(position)
        };

        self.points.fetch_undiscretized(pt)
    }

    fn corner_vertex(&mut self, is_max_x: bool, is_max_y: bool) -> (DPoint, u32) {
        let index = self.points.fetch_corner(is_max_x, is_max_y);
        let ipt = self.points.ipt(index);
        (DPoint::new(ipt.x as f64, ipt.y as f64), index)
    }

    fn corner_position(&mut self, step: i32, is_max_x: bool, is_max_y: bool) -> DPoint {
        let index = self.points.fetch_corner(is_max_x, is_max_y);
        let ipt = self.points.ipt(index);
        let step = step as f64 * self.points.converter().fudge_delta();

        DPoint::new(
            ipt.x as f64 + if is_max_x { step } else { -step },
            ipt.y as f64 + if is_max_y { step } else { -step },
        )
    }

    fn keep_winding(&mut self, _winding: i32) -> bool {
        true
    }

    fn emit_monotone(&mut self, winding: i32, vertex_ids: &[u32], neighbor_windings: &[i32]) {
        debug_assert_eq!(vertex_ids.len(), neighbor_windings.len());

        let stored_winding = winding + self.winding_offset;
        let component = self.components.entry(stored_winding).or_default();

        component.edges.begin_boundary();
        let count = vertex_ids.len();
        for i in 0..count {
            let inext = if i + 1 < count { i + 1 } else { 0 };
            let va = vertex_ids[i];
            let vb = vertex_ids[inext];

            let hugs = self.points.edge_hugs_boundary(va, vb);
            let same_winding = neighbor_windings[i] == winding;
            let draw_edge = !hugs && !same_winding;

            component.edges.add_edge(va, vb, draw_edge);
        }
        component.edges.end_boundary();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryFlags;
    use crate::math::{dpoint, DBox2D};

    fn hoard_with_unit_box() -> PointHoard {
        PointHoard::new(&DBox2D::new(dpoint(0.0, 0.0), dpoint(1.0, 1.0)))
    }

    #[test]
    fn winding_offset_folds_into_components() {
        let mut hoard = hoard_with_unit_box();
        let a = hoard.fetch_discretized(dpoint(0.1, 0.1), BoundaryFlags::NONE);
        let b = hoard.fetch_discretized(dpoint(0.9, 0.1), BoundaryFlags::NONE);
        let c = hoard.fetch_discretized(dpoint(0.5, 0.9), BoundaryFlags::NONE);

        let mut components = PerWindingComponents::new();
        let mut tesser = Tesser::new(&mut hoard, -2, &mut components);

        tesser.begin_region(1);
        for id in [a, b, c] {
            tesser.triangle_vertex(id);
        }

        // Two triangulator windings folding onto the same stored winding
        // share one component.
        tesser.begin_region(1);
        for id in [a, c, b] {
            tesser.triangle_vertex(id);
        }

        assert!(!tesser.triangulation_failed);
        assert_eq!(components.len(), 1);
        assert_eq!(components[&-1].triangles.len(), 6);
    }

    #[test]
    fn degenerate_triangles_are_dropped() {
        let mut hoard = hoard_with_unit_box();
        let a = hoard.fetch_discretized(dpoint(0.1, 0.1), BoundaryFlags::NONE);
        let b = hoard.fetch_discretized(dpoint(0.9, 0.1), BoundaryFlags::NONE);
        // A sliver: a few grid units tall, well under MIN_HEIGHT.
        let c = hoard.fetch_discretized(dpoint(0.5, 0.1 + 2e-6), BoundaryFlags::NONE);

        let mut components = PerWindingComponents::new();
        let mut tesser = Tesser::new(&mut hoard, 0, &mut components);

        tesser.begin_region(1);
        // Repeated vertex.
        for id in [a, a, b] {
            tesser.triangle_vertex(id);
        }
        // Sliver.
        for id in [a, b, c] {
            tesser.triangle_vertex(id);
        }

        assert!(!tesser.triangulation_failed);
        assert!(components[&1].triangles.is_empty());
    }

    #[test]
    fn null_vertex_marks_failure() {
        let mut hoard = hoard_with_unit_box();
        let a = hoard.fetch_discretized(dpoint(0.1, 0.1), BoundaryFlags::NONE);
        let b = hoard.fetch_discretized(dpoint(0.9, 0.1), BoundaryFlags::NONE);

        let mut components = PerWindingComponents::new();
        let mut tesser = Tesser::new(&mut hoard, 0, &mut components);

        tesser.begin_region(0);
        for id in [a, b, NULL_CLIENT_ID] {
            tesser.triangle_vertex(id);
        }

        assert!(tesser.triangulation_failed);
        assert!(components[&0].triangles.is_empty());
    }

    #[test]
    fn combine_interpolates_unfudged_positions() {
        let mut hoard = hoard_with_unit_box();
        let a = hoard.fetch_discretized(dpoint(0.0, 0.0), BoundaryFlags::NONE);
        let b = hoard.fetch_discretized(dpoint(1.0, 0.0), BoundaryFlags::NONE);

        let mut components = PerWindingComponents::new();
        let mut tesser = Tesser::new(&mut hoard, 0, &mut components);

        let id = tesser.combine(
            dpoint(0.0, 0.0),
            [a, b, a, b],
            [0.75, 0.25, 0.0, 0.0],
        );
        let p = tesser.points.point(id);
        assert!((p.x - 0.25).abs() < 1e-12);
        assert_eq!(p.y, 0.0);

        // With an invalid interpolant the reported position is inverted
        // through the grid transform instead.
        let mid_grid = dpoint(
            1.0 + crate::consts::BOX_DIM as f64 * 0.5,
            1.0 + crate::consts::BOX_DIM as f64 * 0.5,
        );
        let id2 = tesser.combine(mid_grid, [a, b, NULL_CLIENT_ID, b], [0.5, 0.5, 0.0, 0.0]);
        let p2 = tesser.points.point(id2);
        assert!((p2.x - 0.5).abs() < 1e-6);
        assert!((p2.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn corner_callbacks() {
        let mut hoard = hoard_with_unit_box();
        let mut components = PerWindingComponents::new();
        let mut tesser = Tesser::new(&mut hoard, 0, &mut components);

        let (pos, id) = tesser.corner_vertex(true, false);
        assert_eq!(pos.x, (crate::consts::BOX_DIM + 1) as f64);
        assert_eq!(pos.y, 1.0);
        let (_, id2) = tesser.corner_vertex(true, false);
        assert_eq!(id, id2);

        // Perturbed positions step away from the center of the box.
        let p1 = tesser.corner_position(1, false, false);
        let p2 = tesser.corner_position(2, false, false);
        assert!(p2.x < p1.x && p1.x < 1.0);
        assert!(p2.y < p1.y && p1.y < 1.0);

        assert!(tesser.keep_winding(7));
        assert!(tesser.keep_winding(-7));
    }

    #[test]
    fn monotone_edges_and_bevels() {
        let mut hoard = hoard_with_unit_box();
        let a = hoard.fetch_discretized(dpoint(0.2, 0.2), BoundaryFlags::NONE);
        let b = hoard.fetch_discretized(dpoint(0.8, 0.2), BoundaryFlags::NONE);
        let c = hoard.fetch_discretized(dpoint(0.8, 0.8), BoundaryFlags::NONE);
        let d = hoard.fetch_discretized(dpoint(0.2, 0.8), BoundaryFlags::NONE);

        let mut components = PerWindingComponents::new();
        let mut tesser = Tesser::new(&mut hoard, 0, &mut components);

        // Quad boundary around winding 1; the bottom and top edges face
        // winding 0, the left and right edges face winding 1 itself.
        tesser.emit_monotone(1, &[a, b, c, d], &[0, 1, 0, 1]);

        let edges = components[&1].edges.edges();
        // Drawn edges: (a, b) and (c, d). (b, c) is kept because it draws
        // the bevel joining it to (c, d); (d, a) likewise for (a, b).
        assert_eq!(components[&1].edges.edge_count(), 4);

        let ab = edges.iter().find(|e| e.start == a && e.end == b).unwrap();
        assert!(ab.draw_edge);
        assert!(ab.draw_bevel);
        assert_eq!(ab.next, c);

        let bc = edges.iter().find(|e| e.start == b && e.end == c).unwrap();
        assert!(!bc.draw_edge);
        assert!(bc.draw_bevel);

        assert_eq!(
            components[&1].edges.attribute_count(),
            2 * (4 + 3) + 2 * 3
        );
        assert_eq!(components[&1].edges.index_count(), 2 * (6 + 3) + 2 * 3);
    }

    #[test]
    fn hugging_monotone_edges_do_not_draw() {
        let mut hoard = hoard_with_unit_box();
        let a = hoard.fetch_discretized(dpoint(0.0, 0.2), BoundaryFlags::ON_MIN_X);
        let b = hoard.fetch_discretized(dpoint(0.0, 0.8), BoundaryFlags::ON_MIN_X);
        let c = hoard.fetch_discretized(dpoint(0.5, 0.5), BoundaryFlags::NONE);

        let mut components = PerWindingComponents::new();
        let mut tesser = Tesser::new(&mut hoard, 0, &mut components);

        // The (a, b) edge hugs the min-x boundary: even against a
        // different winding it must not draw.
        tesser.emit_monotone(1, &[a, b, c], &[0, 0, 0]);

        let edges = components[&1].edges.edges();
        let ab = edges.iter().find(|e| e.start == a && e.end == b).unwrap();
        assert!(!ab.draw_edge);
        // It still draws the bevel shared with the drawn (b, c) edge.
        assert!(ab.draw_bevel);
        let bc = edges.iter().find(|e| e.start == b && e.end == c).unwrap();
        assert!(bc.draw_edge);
    }
}
