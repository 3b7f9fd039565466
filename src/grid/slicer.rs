use std::ops::Range;

use itertools::Itertools;

use crate::extent::Span;

/// The part of a chunk that makes up part of a selection through the variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChunkSlice {
    /// Coordinates of the first element of the chunk.
    pub offset: Vec<usize>,
    /// Region within the chunk.
    pub chunk: Vec<Range<usize>>,
    /// Region within the selection.
    pub selection: Vec<Range<usize>>,
}

/// The chunk slices which if joined will make up the selection `spans`, in
/// row-major chunk order. Only chunks overlapping the selection are visited.
pub(crate) fn chunk_slices(chunk_shape: &[usize], spans: &[Span]) -> Vec<ChunkSlice> {
    debug_assert_eq!(chunk_shape.len(), spans.len());

    // Scalar variable: a single chunk with a single value.
    if spans.is_empty() {
        return vec![ChunkSlice {
            offset: vec![],
            chunk: vec![],
            selection: vec![],
        }];
    }

    if spans.iter().any(|s| s.count == 0) {
        return vec![];
    }

    spans
        .iter()
        .zip(chunk_shape)
        .map(|(s, &c)| (s.start / c)..s.end().div_ceil(c))
        .multi_cartesian_product()
        .map(|ci| {
            let offset: Vec<usize> = ci.iter().zip(chunk_shape).map(|(i, c)| i * c).collect();

            let (chunk, selection) = spans
                .iter()
                .zip(chunk_shape)
                .zip(&offset)
                .map(|((s, &c), &o)| {
                    let lo = s.start.max(o);
                    let hi = s.end().min(o.saturating_add(c));

                    ((lo - o)..(hi - o), (lo - s.start)..(hi - s.start))
                })
                .unzip();

            ChunkSlice {
                offset,
                chunk,
                selection,
            }
        })
        .collect()
}
