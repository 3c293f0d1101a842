//! GPU attribute and index chunks for fill and fuzz geometry.
//!
//! Fill data carries a single attribute chunk (one attribute per hoard
//! point) and one index chunk per fill rule plus one per winding number.
//! Fuzz data carries one attribute and one index chunk per winding number;
//! fuzz indices are relative to the start of their chunk.

use crate::builder::{Builder, FillIndices};
use crate::math::{DPoint, DVector};
use crate::tesser::Edge;
use crate::FillRule;

use std::ops::Range;

/// One packed GPU vertex.
///
/// `attrib0` is `[x, y, normal_x, normal_y]`; `attrib1` holds the f32
/// bits of the anti-alias sign in `[0]` and the z layer in `[1]`. Fill
/// attributes only use the position.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub attrib0: [f32; 4],
    pub attrib1: [u32; 4],
}

/// Attribute and index buffers split into chunks.
///
/// A chunk id out of range reads as an empty chunk, so data sets with
/// different chunk counts can be merged uniformly.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeData {
    attributes: Vec<Attribute>,
    indices: Vec<u32>,
    attribute_chunks: Vec<Range<u32>>,
    index_chunks: Vec<Range<u32>>,
    z_ranges: Vec<Range<i32>>,
}

impl AttributeData {
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn num_attribute_chunks(&self) -> usize {
        self.attribute_chunks.len()
    }

    pub fn num_index_chunks(&self) -> usize {
        self.index_chunks.len()
    }

    pub fn attribute_chunk(&self, chunk: usize) -> &[Attribute] {
        match self.attribute_chunks.get(chunk) {
            Some(r) => &self.attributes[r.start as usize..r.end as usize],
            None => &[],
        }
    }

    pub fn index_chunk(&self, chunk: usize) -> &[u32] {
        match self.index_chunks.get(chunk) {
            Some(r) => &self.indices[r.start as usize..r.end as usize],
            None => &[],
        }
    }

    /// The z layers used by a fuzz chunk; empty for fill data.
    pub fn z_range(&self, chunk: usize) -> Range<i32> {
        self.z_ranges.get(chunk).cloned().unwrap_or(0..0)
    }

    pub fn largest_attribute_chunk(&self) -> usize {
        self.attribute_chunks
            .iter()
            .map(|r| r.len())
            .max()
            .unwrap_or(0)
    }

    pub fn largest_index_chunk(&self) -> usize {
        self.index_chunks.iter().map(|r| r.len()).max().unwrap_or(0)
    }
}

/// Index chunk id for triangles of one specific winding number.
///
/// Chunk ids below [`FillRule::COUNT`] are the fill rules themselves;
/// specific windings follow in the order 1, -1, 2, -2, ... Winding zero is
/// exactly the complement-non-zero rule.
pub(crate) fn fill_chunk_from_winding_number(winding: i32) -> usize {
    if winding == 0 {
        return FillRule::ComplementNonZero as usize;
    }

    let sign = if winding < 0 { 1 } else { 0 };
    FillRule::COUNT + sign + 2 * (winding.unsigned_abs() as usize - 1)
}

/// Interleaves windings as 0, -1, +1, -2, +2, ... onto chunk ids.
pub(crate) fn signed_to_unsigned(winding: i32) -> usize {
    let v = 2 * winding.unsigned_abs() as usize;
    if winding < 0 {
        v - 1
    } else {
        v
    }
}

/// Pack the fill attributes and the per-rule/per-winding index chunks of
/// one sub-path.
pub(crate) fn pack_fill_data(points: &[DPoint], fill: &FillIndices) -> AttributeData {
    let mut data = AttributeData {
        attributes: points
            .iter()
            .map(|p| Attribute {
                attrib0: [p.x as f32, p.y as f32, 0.0, 0.0],
                attrib1: [0; 4],
            })
            .collect(),
        ..AttributeData::default()
    };
    data.attribute_chunks.push(0..data.attributes.len() as u32);

    let num_chunks = fill
        .winding_ranges
        .keys()
        .map(|&w| fill_chunk_from_winding_number(w))
        .max()
        .map_or(FillRule::COUNT, |m| (m + 1).max(FillRule::COUNT));
    data.index_chunks = vec![0..0; num_chunks];

    let push_chunk =
        |data: &mut AttributeData, chunk: usize, src: &[u32]| {
            let start = data.indices.len() as u32;
            data.indices.extend_from_slice(src);
            data.index_chunks[chunk] = start..data.indices.len() as u32;
        };

    push_chunk(
        &mut data,
        FillRule::EvenOdd as usize,
        &fill.indices[..fill.even_non_zero_start],
    );
    push_chunk(
        &mut data,
        FillRule::NonZero as usize,
        &fill.indices[..fill.zero_start],
    );
    push_chunk(
        &mut data,
        FillRule::ComplementEvenOdd as usize,
        &fill.indices[fill.even_non_zero_start..],
    );
    push_chunk(
        &mut data,
        FillRule::ComplementNonZero as usize,
        &fill.indices[fill.zero_start..],
    );

    for (&winding, range) in &fill.winding_ranges {
        // Winding zero is already covered by complement-non-zero.
        if winding != 0 {
            push_chunk(
                &mut data,
                fill_chunk_from_winding_number(winding),
                &fill.indices[range.clone()],
            );
        }
    }

    data
}

/// Pack the silhouette-edge quads and bevels of one sub-path, one chunk
/// per winding number.
pub(crate) fn pack_fuzz_data(windings: &[i32], points: &[DPoint], builder: &Builder) -> AttributeData {
    let num_chunks = windings
        .iter()
        .map(|&w| signed_to_unsigned(w))
        .max()
        .map_or(0, |m| m + 1);

    let mut by_chunk: Vec<Option<i32>> = vec![None; num_chunks];
    for &w in windings {
        by_chunk[signed_to_unsigned(w)] = Some(w);
    }

    let mut data = AttributeData {
        attribute_chunks: vec![0..0; num_chunks],
        index_chunks: vec![0..0; num_chunks],
        z_ranges: vec![0..0; num_chunks],
        ..AttributeData::default()
    };

    for (chunk, winding) in by_chunk.iter().enumerate() {
        let attr_start = data.attributes.len() as u32;
        let index_start = data.indices.len() as u32;

        if let Some(winding) = *winding {
            let edge_list = builder.edge_list(winding);
            let num_edges = edge_list.edge_count();

            for (k, edge) in edge_list.edges().iter().enumerate() {
                let z = (num_edges - 1 - k) as u32;
                pack_edge(edge, points, z, attr_start, &mut data);
            }

            data.z_ranges[chunk] = 0..num_edges as i32;
        }

        data.attribute_chunks[chunk] = attr_start..data.attributes.len() as u32;
        data.index_chunks[chunk] = index_start..data.indices.len() as u32;
    }

    data
}

/// The anti-alias quad of a drawn edge and the bevel joining it to the
/// next edge. Quad corners carry the edge normal and a sign selecting the
/// extrusion side; the bevel fans between the normals of the two edges
/// meeting at the shared point.
fn pack_edge(edge: &Edge, points: &[DPoint], z: u32, attr_start: u32, data: &mut AttributeData) {
    debug_assert!(edge.draw_edge || edge.draw_bevel);

    let start = points[edge.start as usize];
    let end = points[edge.end as usize];
    let tangent = end - start;
    let normal = DVector::new(-tangent.y, tangent.x);

    if edge.draw_edge {
        const SIGNS: [f32; 4] = [-1.0, 1.0, 1.0, -1.0];

        let base = data.attributes.len() as u32 - attr_start;
        for (k, &sign) in SIGNS.iter().enumerate() {
            let position = if k < 2 { start } else { end };
            data.attributes.push(Attribute {
                attrib0: [
                    position.x as f32,
                    position.y as f32,
                    normal.x as f32,
                    normal.y as f32,
                ],
                attrib1: [sign.to_bits(), z, 0, 0],
            });
        }
        for offset in [0, 1, 2, 0, 2, 3] {
            data.indices.push(base + offset);
        }
    }

    if edge.draw_bevel {
        let next_tangent = points[edge.next as usize] - end;
        let next_normal = DVector::new(-next_tangent.y, next_tangent.x);
        let sign = if next_tangent.dot(normal) < 0.0 {
            1.0f32
        } else {
            -1.0
        };

        let base = data.attributes.len() as u32 - attr_start;
        for k in 0..3 {
            let n = if k == 2 { next_normal } else { normal };
            let s = if k == 1 { 0.0 } else { sign };
            data.attributes.push(Attribute {
                attrib0: [end.x as f32, end.y as f32, n.x as f32, n.y as f32],
                attrib1: [s.to_bits(), z, 0, 0],
            });
        }
        for offset in 0..3 {
            data.indices.push(base + offset);
        }
    }
}

/// Merge two children's fill data: attributes are concatenated into the
/// common chunk and the second child's indices are rebased past the first
/// child's attributes.
pub(crate) fn merge_fill_data(a: &AttributeData, b: &AttributeData) -> AttributeData {
    let mut data = AttributeData::default();

    data.attributes.extend_from_slice(a.attribute_chunk(0));
    data.attributes.extend_from_slice(b.attribute_chunk(0));
    data.attribute_chunks.push(0..data.attributes.len() as u32);

    let adjust = a.attribute_chunk(0).len() as u32;
    let num_chunks = a.num_index_chunks().max(b.num_index_chunks());
    for chunk in 0..num_chunks {
        let start = data.indices.len() as u32;
        data.indices.extend_from_slice(a.index_chunk(chunk));
        data.indices
            .extend(b.index_chunk(chunk).iter().map(|&i| i + adjust));
        data.index_chunks.push(start..data.indices.len() as u32);
    }

    data
}

/// Merge two children's fuzz data chunk by chunk. The first child draws
/// over the second, so its z layers are shifted up by the second child's
/// z range.
pub(crate) fn merge_fuzz_data(a: &AttributeData, b: &AttributeData) -> AttributeData {
    let mut data = AttributeData::default();

    let num_chunks = a.num_attribute_chunks().max(b.num_attribute_chunks());
    for chunk in 0..num_chunks {
        let z_shift = b.z_range(chunk).end;

        let attr_start = data.attributes.len() as u32;
        for attribute in a.attribute_chunk(chunk) {
            let mut attribute = *attribute;
            attribute.attrib1[1] += z_shift as u32;
            data.attributes.push(attribute);
        }
        data.attributes.extend_from_slice(b.attribute_chunk(chunk));
        data.attribute_chunks
            .push(attr_start..data.attributes.len() as u32);

        let adjust = a.attribute_chunk(chunk).len() as u32;
        let index_start = data.indices.len() as u32;
        data.indices.extend_from_slice(a.index_chunk(chunk));
        data.indices
            .extend(b.index_chunk(chunk).iter().map(|&i| i + adjust));
        data.index_chunks
            .push(index_start..data.indices.len() as u32);

        debug_assert_eq!(a.z_range(chunk).start, 0);
        debug_assert_eq!(b.z_range(chunk).start, 0);
        data.z_ranges.push(0..a.z_range(chunk).end + z_shift);
    }

    data
}
