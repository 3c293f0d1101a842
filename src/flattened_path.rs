//! Storage for already-flattened paths.
//!
//! Curves are out of scope here: the filled-path machinery consumes closed
//! polygonal contours. `FlattenedPath` stores all sub-path points in one
//! contiguous vector, with per-sub-path ranges on the side. Open sub-paths
//! are treated as implicitly closed by the fill.

use crate::math::Point;

use std::ops::Range;

#[derive(Clone, Debug)]
struct SubPathInfo {
    range: Range<usize>,
    is_closed: bool,
}

/// A set of flattened closed contours, used as the input of
/// [`FilledPath`](crate::FilledPath).
#[derive(Clone, Debug, Default)]
pub struct FlattenedPath {
    points: Vec<Point>,
    sub_paths: Vec<SubPathInfo>,
}

impl FlattenedPath {
    pub fn new() -> Self {
        FlattenedPath {
            points: Vec::new(),
            sub_paths: Vec::new(),
        }
    }

    pub fn builder() -> Builder {
        Builder::new()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// All points of all sub-paths.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn num_sub_paths(&self) -> usize {
        self.sub_paths.len()
    }

    pub fn sub_path(&self, index: usize) -> SubPathSlice {
        SubPathSlice {
            points: &self.points[self.sub_paths[index].range.clone()],
            is_closed: self.sub_paths[index].is_closed,
        }
    }

    pub fn sub_paths(&self) -> SubPaths {
        SubPaths {
            points: &self.points,
            sub_paths: &self.sub_paths,
        }
    }
}

/// Iterator over the sub-paths of a `FlattenedPath`.
pub struct SubPaths<'l> {
    points: &'l [Point],
    sub_paths: &'l [SubPathInfo],
}

impl<'l> Iterator for SubPaths<'l> {
    type Item = SubPathSlice<'l>;
    fn next(&mut self) -> Option<SubPathSlice<'l>> {
        let (sp, rest) = self.sub_paths.split_first()?;
        self.sub_paths = rest;

        Some(SubPathSlice {
            points: &self.points[sp.range.clone()],
            is_closed: sp.is_closed,
        })
    }
}

/// A view on one sub-path.
#[derive(Copy, Clone, Debug)]
pub struct SubPathSlice<'l> {
    points: &'l [Point],
    is_closed: bool,
}

impl<'l> SubPathSlice<'l> {
    pub fn points(&self) -> &'l [Point] {
        self.points
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }
}

/// Builds a `FlattenedPath` from polygons or move/line/close events.
#[derive(Default)]
pub struct Builder {
    points: Vec<Point>,
    sub_paths: Vec<SubPathInfo>,
    sp_start: usize,
}

impl Builder {
    pub fn new() -> Self {
        Builder {
            points: Vec::new(),
            sub_paths: Vec::new(),
            sp_start: 0,
        }
    }

    /// Add a closed polygonal contour.
    pub fn polygon(&mut self, points: &[Point]) {
        if points.is_empty() {
            return;
        }

        for &p in points {
            nan_check(p);
        }

        let start = self.points.len();
        self.points.extend_from_slice(points);
        let end = self.points.len();

        self.sub_paths.push(SubPathInfo {
            range: start..end,
            is_closed: true,
        });
    }

    pub fn move_to(&mut self, to: Point) {
        nan_check(to);
        self.end_sub_path(false);
        self.points.push(to);
    }

    pub fn line_to(&mut self, to: Point) {
        nan_check(to);
        self.points.push(to);
    }

    pub fn close(&mut self) {
        self.end_sub_path(true);
    }

    pub fn build(mut self) -> FlattenedPath {
        self.end_sub_path(false);
        FlattenedPath {
            points: self.points,
            sub_paths: self.sub_paths,
        }
    }

    fn end_sub_path(&mut self, is_closed: bool) {
        let sp_end = self.points.len();
        if self.sp_start != sp_end {
            self.sub_paths.push(SubPathInfo {
                range: self.sp_start..sp_end,
                is_closed,
            });
        }
        self.sp_start = sp_end;
    }
}

#[inline]
fn nan_check(p: Point) {
    debug_assert!(p.x.is_finite());
    debug_assert!(p.y.is_finite());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::point;

    #[test]
    fn polygon_sub_paths() {
        let mut builder = FlattenedPath::builder();
        builder.polygon(&[point(0.0, 0.0), point(1.0, 0.0), point(1.0, 1.0)]);
        builder.polygon(&[point(2.0, 0.0), point(3.0, 0.0), point(3.0, 1.0)]);
        builder.polygon(&[]);
        let path = builder.build();

        assert_eq!(path.num_sub_paths(), 2);
        assert_eq!(path.points().len(), 6);
        assert!(path.sub_path(0).is_closed());
        assert_eq!(path.sub_path(1).points()[0], point(2.0, 0.0));
    }

    #[test]
    fn events_sub_paths() {
        let mut builder = FlattenedPath::builder();
        builder.move_to(point(0.0, 0.0));
        builder.line_to(point(1.0, 0.0));
        builder.line_to(point(1.0, 1.0));
        builder.close();
        builder.move_to(point(5.0, 5.0));
        builder.line_to(point(6.0, 5.0));
        let path = builder.build();

        assert_eq!(path.num_sub_paths(), 2);
        assert!(path.sub_path(0).is_closed());
        assert!(!path.sub_path(1).is_closed());

        let mut iter = path.sub_paths();
        assert_eq!(iter.next().map(|sp| sp.points().len()), Some(3));
        assert_eq!(iter.next().map(|sp| sp.points().len()), Some(2));
        assert!(iter.next().is_none());
    }
}
