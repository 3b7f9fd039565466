//! Chunked storage of the values of a single variable.
//!
//! The index space of a variable is split into a regular grid of chunks of
//! equal shape. Chunks that were never written are not stored and read back
//! as the fill value of the element type. Chunks written since the file was
//! opened are held decoded in memory until the file is closed, committed
//! chunks are looked up in the chunk index and read through the chunk cache.

pub mod chunk;
pub(crate) mod slicer;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{Read, Seek};

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, Slice};
use serde::{Deserialize, Serialize};

use crate::extent::{counts, Span};
use crate::filters::{quantize::quantize, Filters};
use crate::reader::ChunkCache;
use crate::types::{decode, encode, Element};
use crate::{Error, Result};
use chunk::Chunk;
use slicer::chunk_slices;

/// Upper bound of the decoded size of a default chunk.
pub const CHUNK_BYTES: usize = 4 * 1024 * 1024;

/// Chunk shape used when none is given: one record along unlimited axes, the
/// full length along the others, reducing the leading fixed axes until a
/// chunk is no larger than [`CHUNK_BYTES`].
pub fn default_chunk_shape(shape: &[usize], unlimited: &[bool], dsz: usize) -> Vec<usize> {
    debug_assert_eq!(shape.len(), unlimited.len());

    let mut chunk: Vec<usize> = shape
        .iter()
        .zip(unlimited)
        .map(|(&len, &u)| if u { 1 } else { len.max(1) })
        .collect();

    for i in 0..chunk.len() {
        let bytes = chunk.iter().product::<usize>() * dsz;
        if bytes <= CHUNK_BYTES {
            break;
        }

        if unlimited[i] {
            continue;
        }

        let rest = bytes / chunk[i];
        chunk[i] = (CHUNK_BYTES / rest).max(1);
    }

    chunk
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Grid {
    pub chunk_shape: Vec<usize>,
    pub filters: Filters,

    /// Committed chunks, sorted by offset.
    chunks: Vec<Chunk>,

    /// Decoded chunks written since the file was opened.
    #[serde(skip)]
    pending: BTreeMap<Vec<usize>, Vec<u8>>,
}

impl Grid {
    pub fn new(chunk_shape: Vec<usize>, filters: Filters) -> Grid {
        Grid {
            chunk_shape,
            filters,
            chunks: Vec::new(),
            pending: BTreeMap::new(),
        }
    }

    /// Number of elements in a chunk.
    pub fn chunk_len(&self) -> usize {
        self.chunk_shape.iter().product()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    fn committed(&self, offset: &[usize]) -> Option<&Chunk> {
        self.chunks
            .binary_search_by(|c| c.offset.as_slice().cmp(offset))
            .ok()
            .map(|i| &self.chunks[i])
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Written chunks not yet committed, in offset order.
    pub fn pending(&self) -> impl Iterator<Item = (&Vec<usize>, &Vec<u8>)> {
        self.pending.iter()
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Add a committed chunk to the index, replacing any chunk at the same
    /// offset.
    pub fn install(&mut self, chunk: Chunk) {
        match self.chunks.binary_search(&chunk) {
            Ok(i) => self.chunks[i] = chunk,
            Err(i) => self.chunks.insert(i, chunk),
        }
    }

    /// Swap out the whole chunk index, returning the previous one.
    pub fn replace_index(&mut self, chunks: Vec<Chunk>) -> Vec<Chunk> {
        std::mem::replace(&mut self.chunks, chunks)
    }

    /// Decoded values of the chunk at `offset`, `None` if it has never been
    /// written.
    fn chunk_values<T, R>(
        &self,
        offset: &[usize],
        src: Option<&RefCell<ChunkCache<R>>>,
    ) -> Result<Option<ArrayD<T>>>
    where
        T: Element,
        R: Read + Seek,
    {
        let dsz = T::DATATYPE.dsize();

        let values = if let Some(bytes) = self.pending.get(offset) {
            decode::<T>(bytes)
        } else if let Some(chunk) = self.committed(offset) {
            let src = src.ok_or_else(|| {
                Error::Corrupt(format!("chunk {offset:?} is indexed but there is no storage"))
            })?;
            let bytes = src
                .borrow_mut()
                .fetch(chunk, &self.filters, self.chunk_len() * dsz, dsz)?;
            decode::<T>(&bytes)
        } else {
            return Ok(None);
        };

        ArrayD::from_shape_vec(IxDyn(&self.chunk_shape), values)
            .map(Some)
            .map_err(|e| Error::Corrupt(format!("chunk {offset:?}: {e}")))
    }

    /// Read the selection `spans`. Axes selected by index are dropped from
    /// the result.
    pub fn read<T, R>(&self, src: Option<&RefCell<ChunkCache<R>>>, spans: &[Span]) -> Result<ArrayD<T>>
    where
        T: Element,
        R: Read + Seek,
    {
        let mut out = ArrayD::from_elem(IxDyn(&counts(spans)), T::FILL);

        for cs in chunk_slices(&self.chunk_shape, spans) {
            let Some(chunk) = self.chunk_values::<T, R>(&cs.offset, src)? else {
                continue;
            };

            out.slice_each_axis_mut(|ax| Slice::from(cs.selection[ax.axis.index()].clone()))
                .assign(&chunk.slice_each_axis(|ax| Slice::from(cs.chunk[ax.axis.index()].clone())));
        }

        for (axis, s) in spans.iter().enumerate().rev() {
            if s.index {
                out = out.index_axis_move(Axis(axis), 0);
            }
        }

        Ok(out)
    }

    /// Write `values` to the selection `spans`. `values` either has the shape
    /// of the selection, or that shape with the index axes dropped.
    ///
    /// Every affected chunk is staged before any of them is modified, so a
    /// failure leaves the grid untouched.
    pub fn write<T, R>(
        &mut self,
        src: Option<&RefCell<ChunkCache<R>>>,
        spans: &[Span],
        values: ArrayViewD<'_, T>,
        least_significant_digit: Option<i32>,
    ) -> Result<()>
    where
        T: Element,
        R: Read + Seek,
    {
        let mut values = values;
        if values.ndim() < spans.len() {
            for (axis, s) in spans.iter().enumerate() {
                if s.index {
                    values = values.insert_axis(Axis(axis));
                }
            }
        }

        if values.shape() != counts(spans).as_slice() {
            return Err(Error::ShapeMismatch {
                expected: counts(spans),
                found: values.shape().to_vec(),
            });
        }

        let quantized;
        let values = match least_significant_digit {
            Some(digits) => {
                let mut owned = values.as_standard_layout().into_owned();
                if let Some(v) = owned.as_slice_mut() {
                    quantize(v, digits);
                }
                quantized = owned;
                quantized.view()
            }
            None => values.view(),
        };

        let slices = chunk_slices(&self.chunk_shape, spans);

        let mut staged = Vec::with_capacity(slices.len());
        for cs in &slices {
            let chunk = match self.chunk_values::<T, R>(&cs.offset, src)? {
                Some(chunk) => chunk,
                None => ArrayD::from_elem(IxDyn(&self.chunk_shape), T::FILL),
            };
            staged.push(chunk);
        }

        for (cs, mut chunk) in slices.into_iter().zip(staged) {
            chunk
                .slice_each_axis_mut(|ax| Slice::from(cs.chunk[ax.axis.index()].clone()))
                .assign(&values.slice_each_axis(|ax| Slice::from(cs.selection[ax.axis.index()].clone())));

            let chunk: Vec<T> = chunk.iter().copied().collect();
            self.pending.insert(cs.offset, encode(&chunk));
        }

        Ok(())
    }
}
