//! Deduplicating, discretizing point table.
//!
//! Every point fed to the triangulator goes through the hoard: positions
//! are snapped to the integer grid (with boundary-tagged points forced
//! exactly onto their boundary line), deduplicated, and later delivered
//! with an incrementing sub-f32 fudge offset so that the triangulator
//! never sees two identical f64 positions.

use crate::boundary::BoundaryFlags;
use crate::consts::BOX_DIM;
use crate::coordinate::CoordinateConverter;
use crate::math::{DBox2D, DPoint, IntPoint};
use crate::sub_path::{SubContour, SubPath};

use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// A contour point after discretization: a vertex index into the hoard
/// plus the boundary flags it was tagged with.
#[derive(Copy, Clone, Debug)]
pub(crate) struct ContourPoint {
    pub vertex: u32,
    pub flags: BoundaryFlags,
}

pub(crate) type Contour = Vec<ContourPoint>;
pub(crate) type Path = Vec<Contour>;

pub(crate) struct PointHoard {
    converter: CoordinateConverter,
    map: HashMap<(i32, i32), u32>,
    ipts: Vec<IntPoint>,
    pts: Vec<DPoint>,
}

impl PointHoard {
    pub fn new(bounds: &DBox2D) -> Self {
        PointHoard {
            converter: CoordinateConverter::new(bounds.min, bounds.max),
            map: HashMap::new(),
            ipts: Vec::new(),
            pts: Vec::new(),
        }
    }

    /// Snap `pt` onto the grid, forcing boundary-flagged coordinates to
    /// the exact boundary value, and return the deduplicated index.
    pub fn fetch_discretized(&mut self, pt: DPoint, flags: BoundaryFlags) -> u32 {
        debug_assert_eq!(self.pts.len(), self.ipts.len());
        debug_assert!(flags.is_valid());

        let mut ipt = self.converter.iapply(pt);
        if flags.contains(BoundaryFlags::ON_MIN_X) {
            ipt.x = 1;
        }
        if flags.contains(BoundaryFlags::ON_MAX_X) {
            ipt.x = BOX_DIM + 1;
        }
        if flags.contains(BoundaryFlags::ON_MIN_Y) {
            ipt.y = 1;
        }
        if flags.contains(BoundaryFlags::ON_MAX_Y) {
            ipt.y = BOX_DIM + 1;
        }

        match self.map.entry((ipt.x, ipt.y)) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let index = self.pts.len() as u32;
                self.pts.push(pt);
                self.ipts.push(ipt);
                e.insert(index);
                index
            }
        }
    }

    /// Add a point without deduplication (used for combined vertices the
    /// triangulator creates at intersections).
    pub fn fetch_undiscretized(&mut self, pt: DPoint) -> u32 {
        let index = self.pts.len() as u32;
        self.ipts.push(self.converter.iapply(pt));
        self.pts.push(pt);
        index
    }

    /// The canonical vertex for one corner of the bounding rectangle.
    pub fn fetch_corner(&mut self, is_max_x: bool, is_max_y: bool) -> u32 {
        let bounds = *self.converter.bounds();
        let mut ipt = IntPoint::new(1, 1);
        let mut pt = bounds.min;

        if is_max_x {
            ipt.x = BOX_DIM + 1;
            pt.x = bounds.max.x;
        }
        if is_max_y {
            ipt.y = BOX_DIM + 1;
            pt.y = bounds.max.y;
        }

        match self.map.entry((ipt.x, ipt.y)) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                let index = self.pts.len() as u32;
                self.pts.push(pt);
                self.ipts.push(ipt);
                e.insert(index);
                index
            }
        }
    }

    /// The grid position of vertex `index` offset by `fudge_count` fudge
    /// deltas toward the outside of the box.
    ///
    /// TODO: incrementing the fudge amount on every delivered point is a
    /// blunt instrument; only overlapping and degenerate edges actually
    /// need it.
    pub fn apply(&self, index: u32, fudge_count: u32) -> DPoint {
        let ipt = self.ipts[index as usize];
        let fudge_r = fudge_count as f64 * self.converter.fudge_delta();
        let fx = if ipt.x >= BOX_DIM / 2 { -fudge_r } else { fudge_r };
        let fy = if ipt.y >= BOX_DIM / 2 { -fudge_r } else { fudge_r };
        DPoint::new(ipt.x as f64 + fx, ipt.y as f64 + fy)
    }

    /// The position of vertex `index` before the grid transformation.
    pub fn point(&self, index: u32) -> DPoint {
        self.pts[index as usize]
    }

    /// The position of vertex `index` on the integer grid.
    pub fn ipt(&self, index: u32) -> IntPoint {
        self.ipts[index as usize]
    }

    pub fn points(&self) -> &[DPoint] {
        &self.pts
    }

    pub fn converter(&self) -> &CoordinateConverter {
        &self.converter
    }

    /// True if the edge `(a, b)` runs along the bounding rectangle on
    /// some axis (within one grid unit of the extremes).
    pub fn edge_hugs_boundary(&self, a: u32, b: u32) -> bool {
        const SLACK: i32 = 1;

        let pa = self.ipts[a as usize];
        let pb = self.ipts[b as usize];

        for (ca, cb) in [(pa.x, pb.x), (pa.y, pb.y)] {
            if ca <= SLACK && cb <= SLACK {
                return true;
            }
            if ca >= BOX_DIM - SLACK && cb >= BOX_DIM - SLACK {
                return true;
            }
        }

        false
    }

    /// Discretize all contours of `input`. Returns the generated contours
    /// and the winding offset accumulated from reduced contours.
    pub fn generate_path(&mut self, input: &SubPath) -> (Path, i32) {
        let mut output = Path::new();
        let mut winding_offset = 0;
        for contour in input.contours() {
            winding_offset += self.add_contour_to_path(contour, &mut output);
        }
        (output, winding_offset)
    }

    fn add_contour_to_path(&mut self, input: &SubContour, output: &mut Path) -> i32 {
        debug_assert!(!input.is_empty());

        let generated = self.generate_contour(input);
        let mut unlooped = Vec::new();
        unloop_contour(generated, &mut unlooped);

        let mut winding = 0;
        for mut contour in unlooped {
            winding += reduce_contour(&mut contour);
            if !contour.is_empty() {
                output.push(contour);
            }
        }

        winding
    }

    /// Map a sub-contour through `fetch_discretized`, dropping the edges
    /// that snapping collapsed and closing the cycle cleanly.
    fn generate_contour(&mut self, input: &SubContour) -> Contour {
        debug_assert!(!input.is_empty());

        let mut output = Contour::new();
        for q in input {
            let vertex = self.fetch_discretized(q.position, q.flags);
            if output.last().map_or(true, |p| p.vertex != vertex) {
                output.push(ContourPoint {
                    vertex,
                    flags: q.flags,
                });
            }
        }

        while !output.is_empty() && output[output.len() - 1].vertex == output[0].vertex {
            output.pop();
        }

        if output.len() < 3 {
            output.clear();
        }

        output
    }
}

/// Extract every cyclic sub-range that starts and ends at the same vertex
/// as its own closed contour, so that each output contour never visits a
/// vertex twice. The triangulator falls apart on looped contours.
fn unloop_contour(mut contour: Contour, output: &mut Vec<Contour>) {
    if contour.is_empty() {
        return;
    }

    let mut i = 0;
    while i < contour.len() {
        let looking_for = contour[i].vertex;
        let mut j = i + 1;
        while j < contour.len() {
            if contour[j].vertex == looking_for {
                // [i, j) is a loop with no loops of its own, otherwise an
                // earlier j would have matched.
                output.push(contour[i..j].to_vec());
                contour.drain(i..j);
                j = i + 1;
            } else {
                j += 1;
            }
        }
        i += 1;
    }

    if !contour.is_empty() {
        output.push(contour);
    }
}

/// If the contour lies entirely on the bounding rectangle with monotone
/// corner progress, clear it and return its winding contribution.
fn reduce_contour(contour: &mut Contour) -> i32 {
    if contour.len() <= 2 {
        // No edges, or two edges that cancel each other.
        contour.clear();
        return 0;
    }

    let mut prev = contour[contour.len() - 1].flags;
    let mut bcount = 0;
    for q in contour.iter() {
        let r = prev.boundary_progress(q.flags);
        if r == 0 {
            return 0;
        }
        bcount += r;
        prev = q.flags;
    }

    contour.clear();
    debug_assert_eq!(bcount % 4, 0);
    -bcount / 4
}
