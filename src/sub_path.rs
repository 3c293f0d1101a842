//! Path fragments bound to a bounding box, and their half-plane splits.

use crate::boundary::BoundaryFlags;
use crate::consts::SIZE_MAX_RATIO;
use crate::flattened_path::FlattenedPath;
use crate::math::{DBox2D, DPoint};

/// A contour point tagged with the boundaries it lies on.
#[derive(Copy, Clone, Debug)]
pub(crate) struct SubContourPoint {
    pub position: DPoint,
    pub flags: BoundaryFlags,
}

impl SubContourPoint {
    pub fn new(position: DPoint, flags: BoundaryFlags) -> Self {
        debug_assert!(flags.is_valid());
        SubContourPoint { position, flags }
    }
}

pub(crate) type SubContour = Vec<SubContourPoint>;

/// A fragment of the input path bound to an f64 bounding box.
///
/// The root sub-path covers the whole input; splitting produces two
/// children whose contours keep the points on their side of the splitting
/// line, with interpolated crossing points inserted on the line itself.
pub(crate) struct SubPath {
    num_points: usize,
    bounds: DBox2D,
    contours: Vec<SubContour>,
    generation: u32,
}

impl SubPath {
    /// The root sub-path: the input contours in a box inflated by 1% of
    /// its size on every side.
    pub fn new_root(path: &FlattenedPath) -> Self {
        debug_assert!(!path.is_empty());

        let mut pmin = DPoint::new(f64::MAX, f64::MAX);
        let mut pmax = DPoint::new(f64::MIN, f64::MIN);
        for p in path.points() {
            pmin.x = pmin.x.min(p.x as f64);
            pmin.y = pmin.y.min(p.y as f64);
            pmax.x = pmax.x.max(p.x as f64);
            pmax.y = pmax.y.max(p.y as f64);
        }

        let size = pmax - pmin;
        let bounds = DBox2D::new(pmin - size * 0.01, pmax + size * 0.01);

        let contours = path
            .sub_paths()
            .map(|sp| {
                sp.points()
                    .iter()
                    .map(|p| {
                        SubContourPoint::new(
                            DPoint::new(p.x as f64, p.y as f64),
                            BoundaryFlags::NONE,
                        )
                    })
                    .collect()
            })
            .filter(|c: &SubContour| !c.is_empty())
            .collect();

        SubPath::from_parts(bounds, contours, 0)
    }

    fn from_parts(bounds: DBox2D, contours: Vec<SubContour>, generation: u32) -> Self {
        let mut num_points = 0;
        for contour in &contours {
            debug_assert!(!contour.is_empty());
            if !SubPath::contour_is_reducible(contour) {
                num_points += contour.len();
            }
        }

        SubPath {
            num_points,
            bounds,
            contours,
            generation,
        }
    }

    /// Assemble a sub-path directly from tagged contours.
    #[cfg(test)]
    pub fn for_tests(bounds: DBox2D, contours: Vec<SubContour>) -> Self {
        SubPath::from_parts(bounds, contours, 0)
    }

    pub fn contours(&self) -> &[SubContour] {
        &self.contours
    }

    pub fn bounds(&self) -> &DBox2D {
        &self.bounds
    }

    /// Number of points, counting only contours that cannot be reduced to
    /// a winding offset.
    pub fn num_points(&self) -> usize {
        self.num_points
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// True if every edge of the contour makes progress along the
    /// bounding rectangle; such a contour only shifts the winding number
    /// of the whole sub-region.
    pub fn contour_is_reducible(contour: &SubContour) -> bool {
        let mut prev = contour[contour.len() - 1].flags;
        for q in contour {
            if prev.boundary_progress(q.flags) == 0 {
                return false;
            }
            prev = q.flags;
        }
        true
    }

    /// Split into two children along the chosen axis.
    pub fn split(&self) -> (SubPath, SubPath) {
        let (axis, value) = self.choose_splitting_coordinate();

        let mut b0_max = self.bounds.max;
        let mut b1_min = self.bounds.min;
        set_coord(&mut b0_max, axis, value);
        set_coord(&mut b1_min, axis, value);
        let b0 = DBox2D::new(self.bounds.min, b0_max);
        let b1 = DBox2D::new(b1_min, self.bounds.max);

        let mut c0 = Vec::with_capacity(self.contours.len());
        let mut c1 = Vec::with_capacity(self.contours.len());
        for contour in &self.contours {
            let mut half0 = SubContour::new();
            let mut half1 = SubContour::new();
            split_contour(contour, axis, value, &mut half0, &mut half1);
            if !half0.is_empty() {
                c0.push(half0);
            }
            if !half1.is_empty() {
                c1.push(half1);
            }
        }

        (
            SubPath::from_parts(b0, c0, self.generation + 1),
            SubPath::from_parts(b1, c1, self.generation + 1),
        )
    }

    /// Pick the axis and value to split at.
    ///
    /// An overly elongated box is always split across its long axis at the
    /// midpoint. Otherwise both axes are tried at the median of the point
    /// projections and the one producing fewer total points wins.
    ///
    /// TODO: when the point balance heavily favors one side, it may be
    /// worth ignoring the aspect-ratio override; perhaps weight the point
    /// difference against the ratio.
    fn choose_splitting_coordinate(&self) -> (usize, f64) {
        let mid = DPoint::new(
            0.5 * (self.bounds.min.x + self.bounds.max.x),
            0.5 * (self.bounds.min.y + self.bounds.max.y),
        );

        if SIZE_MAX_RATIO > 0.0 {
            let wh = self.bounds.max - self.bounds.min;
            if wh.x >= SIZE_MAX_RATIO * wh.y {
                return (0, mid.x);
            } else if wh.y >= SIZE_MAX_RATIO * wh.x {
                return (1, mid.y);
            }
        }

        let mut work = Vec::new();
        let (vx, bx, ax) = self.compute_splitting_location(0, &mut work);
        let (vy, by, ay) = self.compute_splitting_location(1, &mut work);

        if bx + ax < by + ay {
            (0, vx)
        } else {
            (1, vy)
        }
    }

    /// The median of the point projections on `axis`, and how many contour
    /// points land before/after it (a point on the split value counts on
    /// both sides, and so does each edge crossing).
    fn compute_splitting_location(&self, axis: usize, work: &mut Vec<f64>) -> (f64, usize, usize) {
        work.clear();
        for contour in &self.contours {
            for p in contour {
                work.push(coord(p.position, axis));
            }
        }
        work.sort_unstable_by(f64::total_cmp);
        let value = work[work.len() / 2];

        let mut before = 0;
        let mut after = 0;
        for contour in &self.contours {
            let mut prev = coord(contour[contour.len() - 1].position, axis);
            for q in contour {
                let pt = coord(q.position, axis);
                let prev_b = prev < value;
                let b = pt < value;

                if b || pt == value {
                    before += 1;
                }
                if !b || pt == value {
                    after += 1;
                }
                if prev != value && prev_b != b {
                    before += 1;
                    after += 1;
                }

                prev = pt;
            }
        }

        (value, before, after)
    }
}

/// Split one contour against `coord(p, axis) = value`, `half0` keeping the
/// `<=` side and `half1` the `>=` side. Crossing points inherit the AND of
/// the endpoint flags minus the bit the split invalidates, plus the bit
/// for the splitting line itself.
fn split_contour(
    src: &SubContour,
    axis: usize,
    value: f64,
    half0: &mut SubContour,
    half1: &mut SubContour,
) {
    let (max_flag, min_flag) = if axis == 0 {
        (BoundaryFlags::ON_MAX_X, BoundaryFlags::ON_MIN_X)
    } else {
        (BoundaryFlags::ON_MAX_Y, BoundaryFlags::ON_MIN_Y)
    };

    let mut prev = src[src.len() - 1];
    for &pt in src {
        let prev_b0 = coord(prev.position, axis) <= value;
        let b0 = coord(pt.position, axis) <= value;
        let prev_b1 = coord(prev.position, axis) >= value;
        let b1 = coord(pt.position, axis) >= value;

        let split_pt = if prev_b0 != b0 || prev_b1 != b1 {
            Some(compute_split_point(prev.position, pt.position, axis, value))
        } else {
            None
        };

        if prev_b0 != b0 {
            let flags = max_flag | (pt.flags & prev.flags & !min_flag);
            half0.push(SubContourPoint::new(split_pt.unwrap(), flags));
        }
        if b0 {
            half0.push(pt);
        }

        if prev_b1 != b1 {
            let flags = min_flag | (pt.flags & prev.flags & !max_flag);
            half1.push(SubContourPoint::new(split_pt.unwrap(), flags));
        }
        if b1 {
            half1.push(pt);
        }

        prev = pt;
    }
}

fn compute_split_point(a: DPoint, b: DPoint, axis: usize, value: f64) -> DPoint {
    let n = value - coord(a, axis);
    let d = coord(b, axis) - coord(a, axis);
    let t = n / d;

    let aa = coord(a, 1 - axis);
    let bb = coord(b, 1 - axis);

    let mut result = DPoint::new(0.0, 0.0);
    set_coord(&mut result, axis, value);
    set_coord(&mut result, 1 - axis, (1.0 - t) * aa + t * bb);
    result
}

#[inline]
fn coord(p: DPoint, axis: usize) -> f64 {
    if axis == 0 {
        p.x
    } else {
        p.y
    }
}

#[inline]
fn set_coord(p: &mut DPoint, axis: usize, v: f64) {
    if axis == 0 {
        p.x = v;
    } else {
        p.y = v;
    }
}
