//! Contract of the external planar triangulator.
//!
//! Triangulating a planar polygon with winding classification is delegated
//! to an external collaborator. The collaborator consumes f64 contour
//! vertices (in the fudged integer-grid space described in the crate
//! documentation) tagged with client vertex ids, and reports its output
//! through the [`TriangulationOutput`] callback object:
//! triangles grouped by winding number, monotone-polygon boundaries with
//! the winding of the region on the other side of each edge, and requests
//! for combined (intersection) and bounding-rectangle corner vertices.

use crate::math::DPoint;

/// Id reported by the triangulator when it could not attach a client
/// vertex; receiving it marks the triangulation as failed.
pub const NULL_CLIENT_ID: u32 = u32::MAX;

/// The callback object driven by the triangulator while it emits output.
pub trait TriangulationOutput {
    /// A new group of triangles begins, all of them in regions with the
    /// given winding number.
    fn begin_region(&mut self, winding: i32);

    /// One triangle corner; corners arrive in groups of three after
    /// `begin_region`. `NULL_CLIENT_ID` signals a failed triangle.
    fn triangle_vertex(&mut self, id: u32);

    /// The triangulator created a vertex (typically at an intersection)
    /// interpolating up to four existing vertices; returns the client id
    /// for it. `position` is in grid coordinates; ids equal to
    /// `NULL_CLIENT_ID` mark unusable interpolants.
    fn combine(&mut self, position: DPoint, ids: [u32; 4], weights: [f64; 4]) -> u32;

    /// The grid position and client id of a corner of the bounding
    /// rectangle.
    fn corner_vertex(&mut self, is_max_x: bool, is_max_y: bool) -> (DPoint, u32);

    /// The grid position of a corner of the bounding rectangle, perturbed
    /// `step` fudge deltas away from the center of the box so repeated
    /// requests do not coincide.
    fn corner_position(&mut self, step: i32, is_max_x: bool, is_max_y: bool) -> DPoint;

    /// Whether regions with this winding number should be emitted.
    fn keep_winding(&mut self, winding: i32) -> bool;

    /// The boundary of one monotone polygon. Edge `i` runs from
    /// `vertex_ids[i]` to `vertex_ids[(i + 1) % n]`;
    /// `neighbor_windings[i]` is the winding number of the region on its
    /// other side.
    fn emit_monotone(&mut self, winding: i32, vertex_ids: &[u32], neighbor_windings: &[i32]);
}

/// A planar polygon triangulator.
///
/// Contours are fed between `begin_polygon` and `end_polygon`; the whole
/// triangulation runs inside `end_polygon`, which drives the supplied
/// [`TriangulationOutput`]. One instance is acquired per triangulation and
/// released by dropping it; no pooling is expected.
pub trait Triangulator {
    fn new() -> Self
    where
        Self: Sized;

    /// When set, only region boundaries are produced, no triangles.
    fn set_boundary_only(&mut self, boundary_only: bool);

    fn begin_polygon(&mut self);

    fn begin_contour(&mut self, is_closed: bool);

    /// One contour vertex: a (fudged) grid position and the client id the
    /// output callbacks will refer to it by.
    fn add_vertex(&mut self, x: f64, y: f64, id: u32);

    fn end_contour(&mut self);

    /// Run the triangulation and report everything through `output`.
    fn end_polygon(&mut self, output: &mut dyn TriangulationOutput);
}
