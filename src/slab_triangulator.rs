//! A reference triangulator for the test suite.
//!
//! This is not a production triangulator: it decomposes the plane into
//! horizontal slabs between consecutive vertex y values, accumulates the
//! winding number across the sorted active edges of each slab, and emits
//! every non-zero-winding trapezoid as two triangles plus one monotone
//! boundary. Trapezoid corners that fall inside an edge are created
//! through the `combine` callback. It is enough to exercise the engine on
//! polygonal scenes; it never needs the bounding-rectangle corner
//! callbacks and never reports a failure.

use crate::math::DPoint;
use crate::triangulator::{TriangulationOutput, Triangulator};

use std::collections::HashMap;

/// Slabs thinner than this (in grid units) only exist because of the
/// fudge offsets between coincident vertices; skip them.
const MIN_SLAB_HEIGHT: f64 = 0.5;

#[derive(Copy, Clone, Debug)]
struct Vertex {
    position: DPoint,
    id: u32,
}

#[derive(Copy, Clone, Debug)]
struct TessEdge {
    a: Vertex,
    b: Vertex,
}

impl TessEdge {
    fn y_min(&self) -> f64 {
        self.a.position.y.min(self.b.position.y)
    }

    fn y_max(&self) -> f64 {
        self.a.position.y.max(self.b.position.y)
    }

    /// Crossing this edge left to right changes the winding number by
    /// this amount (downward edges wind counter-clockwise regions
    /// positively).
    fn winding_contribution(&self) -> i32 {
        if self.b.position.y < self.a.position.y {
            1
        } else {
            -1
        }
    }

    fn x_at(&self, y: f64) -> f64 {
        let a = self.a.position;
        let b = self.b.position;
        a.x + (b.x - a.x) * (y - a.y) / (b.y - a.y)
    }
}

struct ActiveEdge {
    x: f64,
    contribution: i32,
    edge_index: usize,
}

struct Slab {
    y0: f64,
    y1: f64,
    /// Active edges sorted by their x at the slab midline.
    actives: Vec<ActiveEdge>,
}

pub(crate) struct SlabTriangulator {
    edges: Vec<TessEdge>,
    contour: Vec<Vertex>,
    boundary_only: bool,
}

impl Triangulator for SlabTriangulator {
    fn new() -> Self {
        SlabTriangulator {
            edges: Vec::new(),
            contour: Vec::new(),
            boundary_only: false,
        }
    }

    fn set_boundary_only(&mut self, boundary_only: bool) {
        self.boundary_only = boundary_only;
    }

    fn begin_polygon(&mut self) {
        self.edges.clear();
    }

    fn begin_contour(&mut self, _is_closed: bool) {
        self.contour.clear();
    }

    fn add_vertex(&mut self, x: f64, y: f64, id: u32) {
        self.contour.push(Vertex {
            position: DPoint::new(x, y),
            id,
        });
    }

    fn end_contour(&mut self) {
        let n = self.contour.len();
        for i in 0..n {
            let a = self.contour[i];
            let b = self.contour[(i + 1) % n];
            self.edges.push(TessEdge { a, b });
        }
        self.contour.clear();
    }

    fn end_polygon(&mut self, output: &mut dyn TriangulationOutput) {
        let slabs = self.build_slabs();
        let mut corner_cache = HashMap::new();

        for (slab_index, slab) in slabs.iter().enumerate() {
            let mut winding = 0;
            for k in 0..slab.actives.len().saturating_sub(1) {
                winding += slab.actives[k].contribution;
                if winding == 0 {
                    continue;
                }

                let left = &slab.actives[k];
                let right = &slab.actives[k + 1];

                let bl = self.corner_id(left.edge_index, slab.y0, output, &mut corner_cache);
                let br = self.corner_id(right.edge_index, slab.y0, output, &mut corner_cache);
                let tr = self.corner_id(right.edge_index, slab.y1, output, &mut corner_cache);
                let tl = self.corner_id(left.edge_index, slab.y1, output, &mut corner_cache);

                if !self.boundary_only {
                    output.begin_region(winding);
                    for id in [bl, br, tr, bl, tr, tl] {
                        output.triangle_vertex(id);
                    }
                }

                let query_x = 0.5 * (left.x + right.x);
                let below = if slab_index > 0 {
                    winding_at(&slabs[slab_index - 1], query_x)
                } else {
                    0
                };
                let above = if slab_index + 1 < slabs.len() {
                    winding_at(&slabs[slab_index + 1], query_x)
                } else {
                    0
                };
                let left_neighbor = winding - left.contribution;
                let right_neighbor = winding + right.contribution;

                output.emit_monotone(
                    winding,
                    &[bl, br, tr, tl],
                    &[below, right_neighbor, above, left_neighbor],
                );
            }
        }
    }
}

impl SlabTriangulator {
    fn build_slabs(&self) -> Vec<Slab> {
        let mut ys: Vec<f64> = self
            .edges
            .iter()
            .flat_map(|e| [e.a.position.y, e.b.position.y])
            .collect();
        ys.sort_unstable_by(f64::total_cmp);
        ys.dedup();

        let mut slabs = Vec::new();
        for pair in ys.windows(2) {
            let (y0, y1) = (pair[0], pair[1]);
            if y1 - y0 <= MIN_SLAB_HEIGHT {
                continue;
            }

            let ymid = 0.5 * (y0 + y1);
            let mut actives: Vec<ActiveEdge> = self
                .edges
                .iter()
                .enumerate()
                .filter(|(_, e)| e.y_min() <= y0 && e.y_max() >= y1)
                .map(|(edge_index, e)| ActiveEdge {
                    x: e.x_at(ymid),
                    contribution: e.winding_contribution(),
                    edge_index,
                })
                .collect();
            actives.sort_by(|p, q| p.x.total_cmp(&q.x));

            slabs.push(Slab { y0, y1, actives });
        }

        slabs
    }

    /// The client id of the point where `edge` crosses `y`: the endpoint
    /// id when the edge starts or ends there, otherwise a combined vertex
    /// (cached so adjacent trapezoids share it).
    fn corner_id(
        &self,
        edge_index: usize,
        y: f64,
        output: &mut dyn TriangulationOutput,
        cache: &mut HashMap<(usize, u64), u32>,
    ) -> u32 {
        let edge = &self.edges[edge_index];
        if edge.a.position.y == y {
            return edge.a.id;
        }
        if edge.b.position.y == y {
            return edge.b.id;
        }

        let key = (edge_index, y.to_bits());
        if let Some(&id) = cache.get(&key) {
            return id;
        }

        let t = (y - edge.a.position.y) / (edge.b.position.y - edge.a.position.y);
        let x = edge.a.position.x + (edge.b.position.x - edge.a.position.x) * t;
        let id = output.combine(
            DPoint::new(x, y),
            [edge.a.id, edge.b.id, edge.a.id, edge.b.id],
            [1.0 - t, t, 0.0, 0.0],
        );
        cache.insert(key, id);
        id
    }
}

fn winding_at(slab: &Slab, x: f64) -> i32 {
    let mut winding = 0;
    for active in &slab.actives {
        if active.x >= x {
            break;
        }
        winding += active.contribution;
    }
    winding
}
