//! Per-sub-path orchestration: hoard, triangulation, index packing.

use crate::hoard::PointHoard;
use crate::sub_path::SubPath;
use crate::tesser::{EdgeList, PerWindingComponents, Tesser};
use crate::triangulator::Triangulator;

use std::collections::BTreeMap;
use std::ops::Range;

/// The packed triangle indices of one sub-path.
///
/// Indices are laid out in three contiguous groups: first every odd
/// winding, then every even non-zero winding, then winding zero. This way
/// one contiguous sub-range serves each fill rule:
///
/// * non-zero: `[0, zero_start)`
/// * even-odd: `[0, even_non_zero_start)`
/// * complement of even-odd: `[even_non_zero_start, len)`
/// * complement of non-zero: `[zero_start, len)`
pub(crate) struct FillIndices {
    pub indices: Vec<u32>,
    /// Per winding number, the sub-range of `indices` holding its
    /// triangles.
    pub winding_ranges: BTreeMap<i32, Range<usize>>,
    pub even_non_zero_start: usize,
    pub zero_start: usize,
}

/// Triangulates one sub-path and exposes its winding components.
pub(crate) struct Builder {
    components: PerWindingComponents,
    points: PointHoard,
    failed: bool,
}

impl Builder {
    pub fn new<T: Triangulator>(sub_path: &SubPath) -> Self {
        let mut points = PointHoard::new(sub_path.bounds());
        let (path, winding_offset) = points.generate_path(sub_path);

        let mut components = PerWindingComponents::new();
        let failed = Tesser::run::<T>(&mut points, &path, winding_offset, &mut components);

        components.retain(|_, c| !c.triangles.is_empty());

        let mut builder = Builder {
            components,
            points,
            failed,
        };

        if builder.components.is_empty() {
            // Nothing survived; draw the bounding rectangle at the offset
            // winding so the complement fill rules still cover it.
            let max_max = builder.points.fetch_corner(true, true);
            let max_min = builder.points.fetch_corner(true, false);
            let min_min = builder.points.fetch_corner(false, false);
            let min_max = builder.points.fetch_corner(false, true);

            let component = builder.components.entry(winding_offset).or_default();
            component
                .triangles
                .extend_from_slice(&[max_max, max_min, min_min, max_max, min_min, min_max]);
        }

        builder
    }

    pub fn triangulation_failed(&self) -> bool {
        self.failed
    }

    pub fn points(&self) -> &PointHoard {
        &self.points
    }

    pub fn components(&self) -> &PerWindingComponents {
        &self.components
    }

    pub fn edge_list(&self, winding: i32) -> &EdgeList {
        &self.components[&winding].edges
    }

    /// Pack every component's triangles into one index buffer, grouped so
    /// that each fill rule is a contiguous range.
    pub fn fill_indices(&self) -> FillIndices {
        let mut num_odd = 0;
        let mut num_even_non_zero = 0;
        let mut num_zero = 0;
        for (&winding, component) in &self.components {
            let count = component.triangles.len();
            if winding == 0 {
                num_zero += count;
            } else if winding % 2 == 0 {
                num_even_non_zero += count;
            } else {
                num_odd += count;
            }
        }

        let total = num_odd + num_even_non_zero + num_zero;
        let mut indices = vec![0; total];
        let mut current_odd = 0;
        let mut current_even_non_zero = num_odd;
        let mut current_zero = num_odd + num_even_non_zero;

        let mut winding_ranges = BTreeMap::new();
        for (&winding, component) in &self.components {
            let count = component.triangles.len();
            if count == 0 {
                continue;
            }

            let cursor = if winding == 0 {
                &mut current_zero
            } else if winding % 2 == 0 {
                &mut current_even_non_zero
            } else {
                &mut current_odd
            };

            indices[*cursor..*cursor + count].copy_from_slice(&component.triangles);
            winding_ranges.insert(winding, *cursor..*cursor + count);
            *cursor += count;
        }

        debug_assert_eq!(current_odd, num_odd);
        debug_assert_eq!(current_even_non_zero, num_odd + num_even_non_zero);
        debug_assert_eq!(current_zero, total);

        FillIndices {
            indices,
            winding_ranges,
            even_non_zero_start: num_odd,
            zero_start: num_odd + num_even_non_zero,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::Corner;
    use crate::math::{dpoint, DBox2D};
    use crate::slab_triangulator::SlabTriangulator;
    use crate::sub_path::{SubContour, SubContourPoint, SubPath};
    use crate::boundary::BoundaryFlags;

    fn unit_bounds() -> DBox2D {
        DBox2D::new(dpoint(0.0, 0.0), dpoint(1.0, 1.0))
    }

    fn square_contour(min: f64, max: f64) -> SubContour {
        [(min, min), (max, min), (max, max), (min, max)]
            .iter()
            .map(|&(x, y)| SubContourPoint::new(dpoint(x, y), BoundaryFlags::NONE))
            .collect()
    }

    #[test]
    fn fill_index_grouping() {
        // Two nested counter-clockwise squares: windings 1 and 2.
        let sub_path = SubPath::for_tests(
            unit_bounds(),
            vec![square_contour(0.1, 0.9), square_contour(0.3, 0.7)],
        );
        let builder = Builder::new::<SlabTriangulator>(&sub_path);
        assert!(!builder.triangulation_failed());

        let fill = builder.fill_indices();
        let windings: Vec<i32> = fill.winding_ranges.keys().copied().collect();
        assert_eq!(windings, vec![1, 2]);

        // Odd (winding 1) first, then even non-zero (winding 2), and no
        // zero group.
        assert_eq!(fill.winding_ranges[&1].start, 0);
        assert_eq!(fill.winding_ranges[&1].end, fill.even_non_zero_start);
        assert_eq!(fill.winding_ranges[&2].start, fill.even_non_zero_start);
        assert_eq!(fill.winding_ranges[&2].end, fill.zero_start);
        assert_eq!(fill.zero_start, fill.indices.len());

        for range in fill.winding_ranges.values() {
            assert_eq!(range.len() % 3, 0);
            assert!(!range.is_empty());
        }
    }

    #[test]
    fn empty_result_synthesizes_bounding_rectangle() {
        // A contour that reduces to a pure winding offset: the builder
        // substitutes the bounding rectangle at the offset winding.
        let bounds = unit_bounds();
        let corner_pos = |c: Corner| match c {
            Corner::MinXMinY => bounds.min,
            Corner::MinXMaxY => dpoint(bounds.min.x, bounds.max.y),
            Corner::MaxXMaxY => bounds.max,
            Corner::MaxXMinY => dpoint(bounds.max.x, bounds.min.y),
        };
        let contour: SubContour = [
            Corner::MinXMinY,
            Corner::MinXMaxY,
            Corner::MaxXMaxY,
            Corner::MaxXMinY,
        ]
        .iter()
        .map(|&c| SubContourPoint::new(corner_pos(c), c.flags()))
        .collect();

        let sub_path = SubPath::for_tests(bounds, vec![contour]);
        let builder = Builder::new::<SlabTriangulator>(&sub_path);

        let fill = builder.fill_indices();
        let windings: Vec<i32> = fill.winding_ranges.keys().copied().collect();
        assert_eq!(windings, vec![-1]);
        assert_eq!(fill.indices.len(), 6);
        assert_eq!(fill.even_non_zero_start, 6);
        assert_eq!(fill.zero_start, 6);
    }
}
