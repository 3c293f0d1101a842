#![allow(clippy::float_cmp)]
#![allow(clippy::too_many_arguments)]
#![allow(dead_code)]

//! Hierarchical triangulation of filled 2D paths.
//!
//! This crate turns a flattened path (closed polygonal contours) into a
//! binary spatial hierarchy of triangulated sub-regions suitable for GPU
//! rasterization under any fill rule, together with anti-aliasing "fuzz"
//! geometry along the silhouette edges of each winding component.
//!
//! ## Overview
//!
//! The actual planar triangulation is delegated to an external collaborator
//! described by the [`Triangulator`](triangulator/trait.Triangulator.html)
//! trait. What this crate provides is everything around it:
//!
//! * Robustness against overlapping and coincident edges. The input is
//!   single precision; a general polygon triangulator cannot tolerate edges
//!   that overlap at more than a point. Input positions are discretized
//!   onto the integer grid `[1, 1 + 2^24]²` and each position delivered to
//!   the triangulator receives an f64 offset that is below f32 precision at
//!   that magnitude, so no two delivered points ever coincide while the
//!   rendered coordinates stay bit-identical in f32.
//! * A recursive half-plane partition of the path into a binary hierarchy
//!   where each leaf holds a bounded number of vertices. Leaves are
//!   triangulated independently and on demand; interior nodes lazily merge
//!   their children's output.
//! * Winding bookkeeping across splits: a contour that wraps around the
//!   boundary of a sub-region is folded into a scalar winding offset for
//!   that sub-region instead of being kept as geometry.
//! * Extraction of the real silhouette edges between adjacent winding
//!   regions, packed as quads and bevels for anti-aliasing.
//!
//! The entry point is [`FilledPath`](struct.FilledPath.html), built from a
//! [`FlattenedPath`](struct.FlattenedPath.html):
//!
//! ```
//! use filled_path::FlattenedPath;
//! use filled_path::math::point;
//!
//! let mut builder = FlattenedPath::builder();
//! builder.polygon(&[
//!     point(0.0, 0.0),
//!     point(1.0, 0.0),
//!     point(1.0, 1.0),
//!     point(0.0, 1.0),
//! ]);
//! let path = builder.build();
//! assert_eq!(path.num_sub_paths(), 1);
//! ```
//!
//! Triangle indices for one subset are packed so that a single contiguous
//! sub-range of the index buffer serves each of the four fill rules; see
//! [`FillRule`](enum.FillRule.html) and the chunk encodings on
//! [`Subset`](struct.Subset.html).

pub extern crate euclid;

mod attribute;
mod boundary;
mod builder;
mod clip;
mod coordinate;
pub mod flattened_path;
mod hoard;
mod sub_path;
mod tesser;
pub mod triangulator;

mod filled_path;

#[cfg(test)]
mod slab_triangulator;


#[doc(inline)]
pub use crate::attribute::{Attribute, AttributeData};
#[doc(inline)]
pub use crate::filled_path::{FilledPath, Subset};
#[doc(inline)]
pub use crate::flattened_path::FlattenedPath;
#[doc(inline)]
pub use crate::triangulator::{TriangulationOutput, Triangulator, NULL_CLIENT_ID};

pub mod math {
    //! f32 and f64 euclid aliases used throughout this crate.

    /// Alias for `euclid::default::Point2D<f32>`.
    pub type Point = euclid::default::Point2D<f32>;

    /// Alias for `euclid::default::Vector2D<f32>`.
    pub type Vector = euclid::default::Vector2D<f32>;

    /// Alias for `euclid::default::Box2D<f32>`.
    pub type Box2D = euclid::default::Box2D<f32>;

    /// Alias for `euclid::default::Point2D<f64>`.
    pub type DPoint = euclid::default::Point2D<f64>;

    /// Alias for `euclid::default::Vector2D<f64>`.
    pub type DVector = euclid::default::Vector2D<f64>;

    /// Alias for `euclid::default::Box2D<f64>`.
    pub type DBox2D = euclid::default::Box2D<f64>;

    /// Alias for `euclid::default::Point2D<i32>` (integer grid positions).
    pub type IntPoint = euclid::default::Point2D<i32>;

    /// Alias for `euclid::default::Vector3D<f32>` (clip plane equations).
    pub type Vector3F = euclid::default::Vector3D<f32>;

    /// Shorthand for `Point::new(x, y)`.
    #[inline]
    pub fn point(x: f32, y: f32) -> Point {
        Point::new(x, y)
    }

    /// Shorthand for `DPoint::new(x, y)`.
    #[inline]
    pub fn dpoint(x: f64, y: f64) -> DPoint {
        DPoint::new(x, y)
    }

    /// Shorthand for `IntPoint::new(x, y)`.
    #[inline]
    pub fn int_point(x: i32, y: i32) -> IntPoint {
        IntPoint::new(x, y)
    }

    /// Shorthand for `Vector3F::new(x, y, z)`.
    #[inline]
    pub fn vector3f(x: f32, y: f32, z: f32) -> Vector3F {
        Vector3F::new(x, y, z)
    }
}

pub(crate) mod consts {
    //! Compile-time tuning constants.
    //!
    //! The integer grid is `[1, 1 + 2^24]²`: an f32 has a 23-bit
    //! significand so any integer in `[-2^24, 2^24]` is exact, while the
    //! fudge offset `2^-20` is more than 30 f64 ulps at that magnitude yet
    //! under one f32 ulp. The triangulator therefore sees pairwise
    //! distinct f64 positions that all round to the snapped f32 values.

    pub const LOG2_BOX_DIM: i32 = 24;
    pub const BOX_DIM: i32 = 1 << LOG2_BOX_DIM;
    pub const NEGATIVE_LOG2_FUDGE: i32 = 20;

    /// Minimum altitude of an accepted triangle, in grid units. Triangles
    /// thinner than this are below display resolution: the target
    /// resolution is at most 2^13 with subsets zoomed in by up to 2^4,
    /// leaving 24 - 13 - 4 = 7 bits.
    pub const MIN_HEIGHT: f64 = (1u32 << 7) as f64;

    pub const RECURSION_DEPTH: u32 = 12;
    pub const POINTS_PER_SUBSET: usize = 64;

    /// Maximum allowed aspect ratio of a subset's bounding box; if
    /// non-positive the ratio is not enforced.
    pub const SIZE_MAX_RATIO: f64 = 4.0;
}

/// A predicate on winding numbers selecting the points inside a fill.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum FillRule {
    EvenOdd,
    NonZero,
    ComplementEvenOdd,
    ComplementNonZero,
}

impl FillRule {
    /// Number of fill rules; per-winding index chunk ids start here.
    pub const COUNT: usize = 4;

    #[inline]
    pub fn is_in(self, winding_number: i32) -> bool {
        match self {
            FillRule::EvenOdd => winding_number % 2 != 0,
            FillRule::NonZero => winding_number != 0,
            FillRule::ComplementEvenOdd => winding_number % 2 == 0,
            FillRule::ComplementNonZero => winding_number == 0,
        }
    }
}

#[test]
fn fill_rule_complement() {
    for w in -3..=3 {
        assert_ne!(
            FillRule::EvenOdd.is_in(w),
            FillRule::ComplementEvenOdd.is_in(w)
        );
        assert_ne!(
            FillRule::NonZero.is_in(w),
            FillRule::ComplementNonZero.is_in(w)
        );
    }
    assert!(FillRule::NonZero.is_in(-2));
    assert!(!FillRule::EvenOdd.is_in(-2));
}
