//! The subset hierarchy and the caller-facing surface.

use crate::attribute::{
    self, merge_fill_data, merge_fuzz_data, pack_fill_data, pack_fuzz_data, AttributeData,
};
use crate::builder::Builder;
use crate::clip::clip_against_planes;
use crate::consts::{POINTS_PER_SUBSET, RECURSION_DEPTH};
use crate::flattened_path::FlattenedPath;
use crate::math::{Box2D, DBox2D, Point, Vector3F};
use crate::sub_path::SubPath;
use crate::triangulator::Triangulator;
use crate::FillRule;

use std::collections::BTreeSet;
use std::marker::PhantomData;

/// One node of the hierarchy.
///
/// Exactly one of `sub_path` (unrealized leaf) and `children` is present;
/// realization replaces the sub-path with attribute data, and interior
/// nodes realize by merging their children rather than re-triangulating.
struct SubsetData {
    bounds: DBox2D,
    bounds_f: Box2D,
    bounding_path: [Point; 4],

    sub_path: Option<SubPath>,
    children: Option<[u32; 2]>,

    fill_data: Option<AttributeData>,
    fuzz_data: Option<AttributeData>,
    winding_numbers: Vec<i32>,

    /// Size upper bounds for culling; overwritten with exact values once
    /// the node is realized.
    sizes_ready: bool,
    num_attributes: usize,
    largest_index_block: usize,
    aa_largest_attribute_block: usize,
    aa_largest_index_block: usize,
}

impl SubsetData {
    fn new(bounds: DBox2D) -> Self {
        let bounds_f = Box2D::new(bounds.min.cast::<f32>(), bounds.max.cast::<f32>());
        let min = bounds_f.min;
        let max = bounds_f.max;

        SubsetData {
            bounds,
            bounds_f,
            bounding_path: [
                Point::new(min.x, min.y),
                Point::new(min.x, max.y),
                Point::new(max.x, max.y),
                Point::new(max.x, min.y),
            ],
            sub_path: None,
            children: None,
            fill_data: None,
            fuzz_data: None,
            winding_numbers: Vec::new(),
            sizes_ready: false,
            num_attributes: 0,
            largest_index_block: 0,
            aa_largest_attribute_block: 0,
            aa_largest_index_block: 0,
        }
    }

    fn corners(&self) -> [Point; 4] {
        let min = self.bounds_f.min;
        let max = self.bounds_f.max;
        [
            Point::new(min.x, min.y),
            Point::new(max.x, min.y),
            Point::new(max.x, max.y),
            Point::new(min.x, max.y),
        ]
    }
}

/// Depth-first construction; a node's id is its position in `subsets`.
fn build_hierarchy(subsets: &mut Vec<SubsetData>, sub_path: SubPath, max_recursion: u32) -> u32 {
    let id = subsets.len() as u32;
    subsets.push(SubsetData::new(*sub_path.bounds()));

    if max_recursion > 0 && sub_path.num_points() > POINTS_PER_SUBSET {
        let (c0, c1) = sub_path.split();
        // Keep the split only if it makes progress; a degenerate contour
        // astride the splitting line can leave both children as large as
        // the parent.
        if c0.num_points() < sub_path.num_points() || c1.num_points() < sub_path.num_points() {
            let a = build_hierarchy(subsets, c0, max_recursion - 1);
            let b = build_hierarchy(subsets, c1, max_recursion - 1);
            subsets[id as usize].children = Some([a, b]);
        }
    }

    if subsets[id as usize].children.is_none() {
        subsets[id as usize].sub_path = Some(sub_path);
    }

    id
}

#[derive(Default)]
struct ClipScratch {
    output: Vec<Point>,
    tmp: Vec<Point>,
}

/// A filled path, partitioned into a hierarchy of triangulated subsets.
///
/// Construction builds the full hierarchy skeleton (all splits decided)
/// but triangulates nothing; each subset is realized on first access,
/// either explicitly through [`subset`](FilledPath::subset) or lazily by
/// [`select_subsets`](FilledPath::select_subsets) when it needs size
/// bounds for culling.
///
/// The type parameter is the external triangulator; one instance is
/// created and dropped per subset realization.
pub struct FilledPath<T: Triangulator> {
    subsets: Vec<SubsetData>,
    _triangulator: PhantomData<T>,
}

impl<T: Triangulator> FilledPath<T> {
    pub fn new(path: &FlattenedPath) -> Self {
        assert!(!path.is_empty());

        let root = SubPath::new_root(path);
        let mut subsets = Vec::new();
        build_hierarchy(&mut subsets, root, RECURSION_DEPTH);

        FilledPath {
            subsets,
            _triangulator: PhantomData,
        }
    }

    pub fn number_subsets(&self) -> usize {
        self.subsets.len()
    }

    /// Access one subset, idempotently forcing its realization.
    pub fn subset(&mut self, index: usize) -> Subset<'_> {
        self.make_ready(index as u32);
        Subset {
            data: &self.subsets[index],
        }
    }

    /// Select the subsets to draw for the given clip region.
    ///
    /// `clip_equations` are half-planes in clip space (keeping
    /// `eq.x * x + eq.y * y + eq.z >= 0`) and `clip_matrix_local` the
    /// columns of the matrix mapping local coordinates into that space.
    /// A subset is emitted only when its attribute and index counts fit
    /// under the given caps; a node fully inside the clip region is
    /// emitted as one aggregated piece, a partially clipped node recurses
    /// so fully clipped sub-regions are skipped.
    ///
    /// Subset ids are written to `dst` (which must be able to hold
    /// `number_subsets()` entries); the number written is returned.
    pub fn select_subsets(
        &mut self,
        clip_equations: &[Vector3F],
        clip_matrix_local: &[Vector3F; 3],
        max_attribute_count: usize,
        max_index_count: usize,
        dst: &mut [u32],
    ) -> usize {
        assert!(dst.len() >= self.subsets.len());

        // Transform the clip equations into local coordinates.
        let adjusted: Vec<Vector3F> = clip_equations
            .iter()
            .map(|eq| {
                Vector3F::new(
                    eq.dot(clip_matrix_local[0]),
                    eq.dot(clip_matrix_local[1]),
                    eq.dot(clip_matrix_local[2]),
                )
            })
            .collect();

        let mut scratch = ClipScratch::default();
        let mut current = 0;
        self.select_subsets_impl(
            0,
            &adjusted,
            max_attribute_count,
            max_index_count,
            dst,
            &mut current,
            &mut scratch,
        );
        current
    }

    fn select_subsets_impl(
        &mut self,
        id: u32,
        equations: &[Vector3F],
        max_attribute_count: usize,
        max_index_count: usize,
        dst: &mut [u32],
        current: &mut usize,
        scratch: &mut ClipScratch,
    ) {
        let polygon = self.subsets[id as usize].corners();
        let unclipped =
            clip_against_planes(equations, &polygon, &mut scratch.output, &mut scratch.tmp);

        // Completely clipped.
        if scratch.output.is_empty() {
            return;
        }

        match self.subsets[id as usize].children {
            Some([a, b]) if !unclipped => {
                self.select_subsets_impl(
                    a,
                    equations,
                    max_attribute_count,
                    max_index_count,
                    dst,
                    current,
                    scratch,
                );
                self.select_subsets_impl(
                    b,
                    equations,
                    max_attribute_count,
                    max_index_count,
                    dst,
                    current,
                    scratch,
                );
            }
            // Completely unclipped, or a leaf.
            _ => self.select_all_unculled(id, max_attribute_count, max_index_count, dst, current),
        }
    }

    fn select_all_unculled(
        &mut self,
        id: u32,
        max_attribute_count: usize,
        max_index_count: usize,
        dst: &mut [u32],
        current: &mut usize,
    ) {
        {
            let node = &self.subsets[id as usize];
            if !node.sizes_ready && node.children.is_none() && node.sub_path.is_some() {
                // The subset is about to be selected; its sizes require
                // the actual triangulation.
                self.make_ready_from_sub_path(id);
            }
        }

        let node = &self.subsets[id as usize];
        if node.sizes_ready
            && node.num_attributes <= max_attribute_count
            && node.largest_index_block <= max_index_count
            && node.aa_largest_attribute_block <= max_attribute_count
            && node.aa_largest_index_block <= max_index_count
        {
            dst[*current] = id;
            *current += 1;
        } else if let Some([a, b]) = node.children {
            self.select_all_unculled(a, max_attribute_count, max_index_count, dst, current);
            self.select_all_unculled(b, max_attribute_count, max_index_count, dst, current);
            if !self.subsets[id as usize].sizes_ready {
                self.ready_sizes_from_children(id);
            }
        } else {
            debug_assert!(
                false,
                "childless subset exceeds the attribute or index limits"
            );
        }
    }

    fn ready_sizes_from_children(&mut self, id: u32) {
        let [a, b] = self.subsets[id as usize]
            .children
            .expect("sizes from children on a leaf");
        debug_assert!(!self.subsets[id as usize].sizes_ready);
        debug_assert!(self.subsets[a as usize].sizes_ready);
        debug_assert!(self.subsets[b as usize].sizes_ready);

        // Upper bounds; realizing the node overwrites them with exact
        // values.
        let ca = &self.subsets[a as usize];
        let cb = &self.subsets[b as usize];
        let num_attributes = ca.num_attributes + cb.num_attributes;
        let largest_index_block = ca.largest_index_block + cb.largest_index_block;
        let aa_largest_attribute_block =
            ca.aa_largest_attribute_block + cb.aa_largest_attribute_block;
        let aa_largest_index_block = ca.aa_largest_index_block + cb.aa_largest_index_block;

        let node = &mut self.subsets[id as usize];
        node.sizes_ready = true;
        node.num_attributes = num_attributes;
        node.largest_index_block = largest_index_block;
        node.aa_largest_attribute_block = aa_largest_attribute_block;
        node.aa_largest_index_block = aa_largest_index_block;
    }

    fn make_ready(&mut self, id: u32) {
        if self.subsets[id as usize].fill_data.is_some() {
            return;
        }
        if self.subsets[id as usize].sub_path.is_some() {
            self.make_ready_from_sub_path(id);
        } else {
            self.make_ready_from_children(id);
        }
    }

    fn make_ready_from_sub_path(&mut self, id: u32) {
        let node = &mut self.subsets[id as usize];
        debug_assert!(node.children.is_none());
        debug_assert!(node.fill_data.is_none());
        debug_assert!(!node.sizes_ready);

        let sub_path = node.sub_path.take().expect("unrealized leaf without sub-path");
        let builder = Builder::new::<T>(&sub_path);

        let fill_indices = builder.fill_indices();
        let winding_numbers: Vec<i32> = fill_indices.winding_ranges.keys().copied().collect();

        let fill_data = pack_fill_data(builder.points().points(), &fill_indices);
        let fuzz_data = if winding_numbers.is_empty() {
            AttributeData::default()
        } else {
            pack_fuzz_data(&winding_numbers, builder.points().points(), &builder)
        };

        if cfg!(debug_assertions) && builder.triangulation_failed() {
            eprintln!(
                "filled_path: triangulation failed, subset {} degrades to its bounding rectangle",
                id
            );
        }

        let total = fill_indices.indices.len();
        let m1 = fill_indices
            .zero_start
            .max(total - fill_indices.zero_start);
        let m2 = fill_indices
            .even_non_zero_start
            .max(total - fill_indices.even_non_zero_start);

        let node = &mut self.subsets[id as usize];
        node.sizes_ready = true;
        node.num_attributes = fill_data.attributes().len();
        node.largest_index_block = m1.max(m2);
        node.aa_largest_attribute_block = fuzz_data.largest_attribute_chunk();
        node.aa_largest_index_block = fuzz_data.largest_index_chunk();
        node.winding_numbers = winding_numbers;
        node.fill_data = Some(fill_data);
        node.fuzz_data = Some(fuzz_data);
    }

    fn make_ready_from_children(&mut self, id: u32) {
        let [a, b] = self.subsets[id as usize]
            .children
            .expect("unrealized interior node without children");
        self.make_ready(a);
        self.make_ready(b);

        let (fill_data, fuzz_data, winding_numbers) = {
            let da = &self.subsets[a as usize];
            let db = &self.subsets[b as usize];
            let not_ready = "child subset not realized";

            let fill = merge_fill_data(
                da.fill_data.as_ref().expect(not_ready),
                db.fill_data.as_ref().expect(not_ready),
            );
            let fuzz = merge_fuzz_data(
                da.fuzz_data.as_ref().expect(not_ready),
                db.fuzz_data.as_ref().expect(not_ready),
            );

            let mut windings = BTreeSet::new();
            windings.extend(&da.winding_numbers);
            windings.extend(&db.winding_numbers);

            (fill, fuzz, windings.into_iter().collect::<Vec<i32>>())
        };

        let node = &mut self.subsets[id as usize];
        node.sizes_ready = true;
        node.num_attributes = fill_data.largest_attribute_chunk();
        node.largest_index_block = fill_data.largest_index_chunk();
        node.aa_largest_attribute_block = fuzz_data.largest_attribute_chunk();
        node.aa_largest_index_block = fuzz_data.largest_index_chunk();
        node.winding_numbers = winding_numbers;
        node.fill_data = Some(fill_data);
        node.fuzz_data = Some(fuzz_data);
    }

    #[cfg(test)]
    pub(crate) fn children_of(&self, id: u32) -> Option<[u32; 2]> {
        self.subsets[id as usize].children
    }

    #[cfg(test)]
    pub(crate) fn num_realized(&self) -> usize {
        self.subsets
            .iter()
            .filter(|s| s.fill_data.is_some())
            .count()
    }
}

/// A view on one realized subset of a [`FilledPath`].
#[derive(Copy, Clone)]
pub struct Subset<'l> {
    data: &'l SubsetData,
}

impl<'l> Subset<'l> {
    /// The fill attribute data: one attribute chunk, one index chunk per
    /// fill rule and per winding number present.
    pub fn fill_data(&self) -> &'l AttributeData {
        self.data.fill_data.as_ref().expect("subset not realized")
    }

    /// The anti-alias fuzz data: one attribute and index chunk per
    /// winding number present.
    pub fn aa_fuzz_data(&self) -> &'l AttributeData {
        self.data.fuzz_data.as_ref().expect("subset not realized")
    }

    /// The winding numbers whose triangles appear in this subset, sorted.
    pub fn winding_numbers(&self) -> &'l [i32] {
        debug_assert!(self.data.fill_data.is_some());
        &self.data.winding_numbers
    }

    /// The subset's bounding rectangle as a closed four-point path.
    pub fn bounding_path(&self) -> &'l [Point; 4] {
        &self.data.bounding_path
    }

    pub fn bounds(&self) -> &'l DBox2D {
        &self.data.bounds
    }

    /// The fill index chunk holding the triangles of one specific winding
    /// number.
    pub fn fill_chunk_from_winding_number(winding: i32) -> usize {
        attribute::fill_chunk_from_winding_number(winding)
    }

    /// The fill index chunk implementing a fill rule.
    pub fn fill_chunk_from_fill_rule(fill_rule: FillRule) -> usize {
        fill_rule as usize
    }

    /// The fuzz chunk of one winding number.
    pub fn aa_fuzz_chunk_from_winding_number(winding: i32) -> usize {
        attribute::signed_to_unsigned(winding)
    }
}
