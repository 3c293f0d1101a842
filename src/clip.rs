//! Convex polygon clipping against half-planes.

use crate::math::{Point, Vector3F};

/// Clip `polygon` against every half-plane `eq`, keeping the side where
/// `eq.x * x + eq.y * y + eq.z >= 0`. The result lands in `output` (empty
/// when fully clipped away). Returns true when the polygon was entirely
/// inside every half-plane.
pub(crate) fn clip_against_planes(
    equations: &[Vector3F],
    polygon: &[Point],
    output: &mut Vec<Point>,
    scratch: &mut Vec<Point>,
) -> bool {
    output.clear();
    output.extend_from_slice(polygon);

    let mut unclipped = true;
    for eq in equations {
        if output.is_empty() {
            break;
        }

        scratch.clear();
        let mut prev = output[output.len() - 1];
        let mut prev_d = eq.x * prev.x + eq.y * prev.y + eq.z;
        for &p in output.iter() {
            let d = eq.x * p.x + eq.y * p.y + eq.z;

            if d >= 0.0 {
                if prev_d < 0.0 {
                    scratch.push(intersect(prev, prev_d, p, d));
                }
                scratch.push(p);
            } else {
                unclipped = false;
                if prev_d >= 0.0 {
                    scratch.push(intersect(prev, prev_d, p, d));
                }
            }

            prev = p;
            prev_d = d;
        }

        std::mem::swap(output, scratch);
    }

    unclipped
}

fn intersect(a: Point, da: f32, b: Point, db: f32) -> Point {
    let t = da / (da - db);
    a + (b - a) * t
}
