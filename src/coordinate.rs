//! Affine remap of a bounding box onto the integer grid.

use crate::consts::{BOX_DIM, NEGATIVE_LOG2_FUDGE};
use crate::math::{DBox2D, DPoint, DVector, IntPoint};

/// Remaps an f64 bounding box onto `[1, 1 + 2^24]²` and supplies the fudge
/// offset applied to positions delivered to the triangulator.
#[derive(Clone, Debug)]
pub(crate) struct CoordinateConverter {
    bounds: DBox2D,
    delta_fudge: f64,
    scale: DVector,
    translate: DVector,
}

impl CoordinateConverter {
    pub fn new(pmin: DPoint, pmax: DPoint) -> Self {
        let delta = pmax - pmin;
        CoordinateConverter {
            bounds: DBox2D::new(pmin, pmax),
            delta_fudge: (-NEGATIVE_LOG2_FUDGE as f64).exp2(),
            scale: DVector::new(BOX_DIM as f64 / delta.x, BOX_DIM as f64 / delta.y),
            translate: pmin.to_vector(),
        }
    }

    /// Forward map onto the integer grid.
    pub fn iapply(&self, pt: DPoint) -> IntPoint {
        let rx = self.scale.x * (pt.x - self.translate.x);
        let ry = self.scale.y * (pt.y - self.translate.y);
        IntPoint::new(1 + clamp_int(rx), 1 + clamp_int(ry))
    }

    /// Inverse of `iapply` for an exact grid position.
    pub fn unapply(&self, ipt: IntPoint) -> DPoint {
        self.unapply_f64(DPoint::new(ipt.x as f64, ipt.y as f64))
    }

    /// Inverse map for a fractional grid position (e.g. an intersection
    /// reported by the triangulator).
    pub fn unapply_f64(&self, pt: DPoint) -> DPoint {
        DPoint::new(
            (pt.x - 1.0) / self.scale.x + self.translate.x,
            (pt.y - 1.0) / self.scale.y + self.translate.y,
        )
    }

    pub fn fudge_delta(&self) -> f64 {
        self.delta_fudge
    }

    pub fn bounds(&self) -> &DBox2D {
        &self.bounds
    }
}

fn clamp_int(v: f64) -> i32 {
    (v as i32).clamp(0, BOX_DIM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::dpoint;

    fn converter() -> CoordinateConverter {
        CoordinateConverter::new(dpoint(-2.0, 1.0), dpoint(6.0, 5.0))
    }

    #[test]
    fn grid_range() {
        let c = converter();

        assert_eq!(c.iapply(dpoint(-2.0, 1.0)), IntPoint::new(1, 1));
        assert_eq!(
            c.iapply(dpoint(6.0, 5.0)),
            IntPoint::new(BOX_DIM + 1, BOX_DIM + 1)
        );
        // Out-of-box positions clamp to the grid.
        assert_eq!(c.iapply(dpoint(-100.0, -100.0)), IntPoint::new(1, 1));
        assert_eq!(
            c.iapply(dpoint(100.0, 100.0)),
            IntPoint::new(BOX_DIM + 1, BOX_DIM + 1)
        );

        let mid = c.iapply(dpoint(2.0, 3.0));
        assert_eq!(mid, IntPoint::new(1 + BOX_DIM / 2, 1 + BOX_DIM / 2));
    }

    #[test]
    fn round_trip() {
        let c = converter();
        for &p in &[dpoint(-2.0, 1.0), dpoint(0.0, 2.5), dpoint(5.0, 4.0)] {
            let q = c.unapply(c.iapply(p));
            assert!((q.x - p.x).abs() < 1e-5);
            assert!((q.y - p.y).abs() < 1e-5);
        }
    }

    #[test]
    fn fudge_magnitude() {
        let c = converter();
        let fudge = c.fudge_delta();
        assert_eq!(fudge, (0.5f64).powi(20));

        // Visible in f64 at grid magnitudes, invisible in f32.
        let big = BOX_DIM as f64;
        assert_ne!(big + fudge, big);
        assert_eq!((big + fudge) as f32, big as f32);
    }
}
