//! Extents used for putting and getting data
//! from a variable

use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo, RangeToInclusive};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// An extent of a dimension
///
/// This enum has many ways to be constructed using `TryFrom`:
/// ```rust
/// # use gridfix::extent::Extent;
/// fn take_extent(e: impl TryInto<Extent>) {}
/// take_extent(3);
/// take_extent(..);
/// take_extent(..5);
/// take_extent(..=5);
/// take_extent(3..);
/// // Start at 3 up to the 74th index
/// take_extent(3..74);
/// take_extent(3..=74);
/// // Start at 3 with 74 elements
/// take_extent((3, 74));
/// ```
pub enum Extent {
    /// A slice to the end of the dimension
    Slice {
        /// Start of slice
        start: usize,
    },
    /// A slice with a given end
    SliceEnd {
        /// Start of slice
        start: usize,
        /// End of slice
        end: usize,
    },
    /// A slice with a given count
    SliceCount {
        /// Start of slice
        start: usize,
        /// Number of elements in slice
        count: usize,
    },
    /// A single index, the axis is dropped from values read
    Index(usize),
}

macro_rules! impl_for_ref {
    ($from: ty : $item: ty) => {
        impl From<&$from> for $item {
            fn from(e: &$from) -> Self {
                Self::from(e.clone())
            }
        }
    };
}

impl From<usize> for Extent {
    fn from(start: usize) -> Self {
        Self::Index(start)
    }
}
impl_for_ref!(usize: Extent);

impl From<RangeFrom<usize>> for Extent {
    fn from(range: RangeFrom<usize>) -> Self {
        Self::Slice { start: range.start }
    }
}
impl_for_ref!(RangeFrom<usize> : Extent);

impl From<Range<usize>> for Extent {
    fn from(range: Range<usize>) -> Self {
        Self::SliceEnd {
            start: range.start,
            end: range.end,
        }
    }
}
impl_for_ref!(Range<usize> : Extent);

impl From<RangeTo<usize>> for Extent {
    fn from(range: RangeTo<usize>) -> Self {
        Self::SliceEnd {
            start: 0,
            end: range.end,
        }
    }
}
impl_for_ref!(RangeTo<usize> : Extent);

impl From<RangeToInclusive<usize>> for Extent {
    fn from(range: RangeToInclusive<usize>) -> Self {
        Self::SliceEnd {
            start: 0,
            end: range.end.saturating_add(1),
        }
    }
}
impl_for_ref!(RangeToInclusive<usize> : Extent);

impl From<RangeInclusive<usize>> for Extent {
    fn from(range: RangeInclusive<usize>) -> Self {
        Self::SliceEnd {
            start: *range.start(),
            end: range.end().saturating_add(1),
        }
    }
}
impl_for_ref!(RangeInclusive<usize> : Extent);

impl From<RangeFull> for Extent {
    fn from(_: RangeFull) -> Self {
        Self::Slice { start: 0 }
    }
}
impl_for_ref!(RangeFull: Extent);

impl From<(usize, usize)> for Extent {
    fn from((start, count): (usize, usize)) -> Self {
        Self::SliceCount { start, count }
    }
}
impl_for_ref!((usize, usize): Extent);

#[derive(Debug, Clone, Default)]
/// A selector for getting or putting data in a variable
///
/// This type can be constructed in many ways
/// ```rust
/// # use gridfix::extent::{Extent, Extents};
/// fn take_extents(extents: impl TryInto<Extents>) {}
/// // Get all values
/// take_extents(..);
/// // Get array with only first 10 of the first dimension
/// // and the first 2 of the second dimension
/// take_extents([..10, ..2]);
/// // Get values after some index
/// take_extents([1.., 2..]);
/// // The above syntax (using arrays) does not allow arbitrary types
/// // for each `Extent`, for this use tuples
/// take_extents((
///     1..10,
///     (2..=100),
///     4,
///     (3, 4),
/// ));
/// // Or specify counts using slices of `Extent`
/// take_extents([
///     Extent::SliceCount { start: 0, count: 10 },
///     (5..).into(),
/// ]);
/// // One can use two slices to specify start and count separately
/// take_extents((vec![1, 2, 3], vec![3, 2, 1]));
/// // The `ndarray::s!` macro can also be used
/// take_extents(ndarray::s![3, 5..]);
/// ```
pub enum Extents {
    /// The full variable
    #[default]
    All,
    /// A selection along each dimension
    Extent(Vec<Extent>),
}

impl From<std::ops::RangeFull> for Extents {
    fn from(_: std::ops::RangeFull) -> Self {
        Self::All
    }
}

impl From<Vec<Extent>> for Extents {
    fn from(slice: Vec<Extent>) -> Self {
        Self::Extent(slice)
    }
}

impl From<&'_ [Extent]> for Extents {
    fn from(slice: &[Extent]) -> Self {
        Self::Extent(slice.to_owned())
    }
}

impl<const N: usize> From<[Extent; N]> for Extents {
    fn from(slice: [Extent; N]) -> Self {
        Self::Extent(slice.to_vec())
    }
}

macro_rules! impl_extent_as_extents {
    ($item: ty) => {
        impl From<$item> for Extents {
            fn from(item: $item) -> Self {
                Self::from(&item)
            }
        }

        impl From<&$item> for Extents {
            fn from(item: &$item) -> Self {
                Self::Extent(vec![item.into()])
            }
        }
    };
}

impl_extent_as_extents!(usize);
impl_extent_as_extents!(RangeFrom<usize>);
impl_extent_as_extents!(Range<usize>);
impl_extent_as_extents!(RangeTo<usize>);
impl_extent_as_extents!(RangeToInclusive<usize>);
impl_extent_as_extents!(RangeInclusive<usize>);

macro_rules! impl_extent_arrlike {
    ($item: ty) => {
        impl From<&'_ [$item]> for Extents {
            fn from(slice: &[$item]) -> Self {
                Self::Extent(slice.iter().map(|s| s.into()).collect())
            }
        }
        impl From<Vec<$item>> for Extents {
            fn from(slice: Vec<$item>) -> Self {
                Self::from(slice.as_slice())
            }
        }

        impl<const N: usize> From<[$item; N]> for Extents {
            fn from(slice: [$item; N]) -> Self {
                Self::from(slice.as_slice())
            }
        }
    };
}

impl_extent_arrlike!(usize);
impl_extent_arrlike!(RangeFrom<usize>);
impl_extent_arrlike!(Range<usize>);
impl_extent_arrlike!(RangeTo<usize>);
impl_extent_arrlike!(RangeToInclusive<usize>);
impl_extent_arrlike!(RangeFull);
impl_extent_arrlike!((usize, usize));

macro_rules! impl_tuple {
    () => ();

    ($head:ident, $($tail:ident,)*) => (
        #[allow(non_snake_case)]
        impl<$head, $($tail,)*> TryFrom<($head, $($tail,)*)> for Extents
            where
                $head: TryInto<Extent>,
                $head::Error: Into<Error>,
                $(
                    $tail: TryInto<Extent>,
                    $tail::Error: Into<Error>,
                )*
        {
            type Error = Error;
            fn try_from(slice: ($head, $($tail,)*)) -> Result<Self, Self::Error> {
                let ($head, $($tail,)*) = slice;
                Ok(vec![($head).try_into().map_err(|e| e.into())?, $(($tail).try_into().map_err(|e| e.into())?,)*].into())
            }
        }

        impl_tuple! { $($tail,)* }
    )
}

impl_tuple! { T0, T1, T2, T3, T4, T5, T6, T7, T8, T9, }

impl From<()> for Extents {
    fn from(_: ()) -> Self {
        Self::Extent(vec![])
    }
}

/// A resolved extent: always has a known count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: usize,
    pub count: usize,
    /// Selected with `Extent::Index`, the axis is dropped from the values.
    pub index: bool,
}

impl Span {
    pub fn end(&self) -> usize {
        self.start + self.count
    }
}

/// Shape of the selection, with index axes kept as length 1.
pub(crate) fn counts(spans: &[Span]) -> Vec<usize> {
    spans.iter().map(|s| s.count).collect()
}

/// Shape of the selection with index axes dropped.
pub(crate) fn reduced_counts(spans: &[Span]) -> Vec<usize> {
    spans.iter().filter(|s| !s.index).map(|s| s.count).collect()
}

impl Extent {
    /// Resolve against an axis of length `len`, failing when the extent
    /// reaches beyond it. With `open_count`, an open ended slice takes its
    /// count from there and no upper bound is enforced (unlimited axis being
    /// written to).
    fn resolve(&self, axis: usize, len: usize, open_count: Option<usize>) -> Result<Span> {
        let bounded = open_count.is_none();
        let out_of_range = |end: usize| Error::OutOfRange { axis, end, len };

        let span = match *self {
            Self::Index(i) => {
                if bounded && i >= len {
                    return Err(out_of_range(i));
                }
                Span {
                    start: i,
                    count: 1,
                    index: true,
                }
            }
            Self::Slice { start } => {
                let count = match open_count {
                    Some(count) => count,
                    None if start <= len => len - start,
                    None => return Err(out_of_range(start)),
                };
                Span {
                    start,
                    count,
                    index: false,
                }
            }
            Self::SliceEnd { start, end } => {
                if bounded && end > len {
                    return Err(out_of_range(end));
                }
                Span {
                    start,
                    count: end.saturating_sub(start),
                    index: false,
                }
            }
            Self::SliceCount { start, count } => {
                let end = start
                    .checked_add(count)
                    .ok_or_else(|| out_of_range(usize::MAX))?;
                if bounded && end > len {
                    return Err(out_of_range(end));
                }
                Span {
                    start,
                    count,
                    index: false,
                }
            }
        };

        span.start
            .checked_add(span.count)
            .ok_or_else(|| out_of_range(usize::MAX))?;

        Ok(span)
    }
}

impl Extents {
    fn to_vec(&self, rank: usize) -> Result<Vec<Extent>> {
        match self {
            Extents::All => Ok(vec![Extent::Slice { start: 0 }; rank]),
            Extents::Extent(extents) => {
                if extents.len() != rank {
                    return Err(Error::SelectorRank {
                        expected: rank,
                        found: extents.len(),
                    });
                }
                Ok(extents.clone())
            }
        }
    }

    /// Resolve for reading a variable of `shape`.
    pub(crate) fn resolve(&self, shape: &[usize]) -> Result<Vec<Span>> {
        self.to_vec(shape.len())?
            .iter()
            .zip(shape)
            .enumerate()
            .map(|(axis, (e, &len))| e.resolve(axis, len, None))
            .collect()
    }

    /// Resolve for writing `values` into a variable of `shape`.
    ///
    /// Along unlimited axes every index is accepted and open ended slices
    /// take their count from `values`. `values` may either keep the index
    /// axes (with length 1) or drop them.
    pub(crate) fn resolve_put(
        &self,
        shape: &[usize],
        unlimited: &[bool],
        values: &[usize],
    ) -> Result<Vec<Span>> {
        debug_assert_eq!(shape.len(), unlimited.len());

        let extents = self.to_vec(shape.len())?;
        let full = values.len() == extents.len();

        let mut value_axis = 0;
        let mut spans = Vec::with_capacity(extents.len());

        for (axis, (e, (&len, &unlimited))) in extents.iter().zip(shape.iter().zip(unlimited)).enumerate() {
            let is_index = matches!(e, Extent::Index(_));

            let open_count = if unlimited {
                let from_values = if full || !is_index {
                    values.get(value_axis).copied()
                } else {
                    None
                };
                Some(from_values.unwrap_or_else(|| len.saturating_sub(start_of(e))))
            } else {
                None
            };

            if full || !is_index {
                value_axis += 1;
            }

            spans.push(e.resolve(axis, len, open_count)?);
        }

        // The grown variable must stay addressable.
        let mut elements: usize = 1;
        for (axis, (s, &len)) in spans.iter().zip(shape).enumerate() {
            let end = len.max(s.end());
            elements = elements
                .checked_mul(end)
                .filter(|&n| n <= isize::MAX as usize)
                .ok_or(Error::OutOfRange { axis, end, len })?;
        }

        let expected = reduced_counts(&spans);
        if values != expected.as_slice() && values != counts(&spans).as_slice() {
            return Err(Error::ShapeMismatch {
                expected,
                found: values.to_vec(),
            });
        }

        Ok(spans)
    }
}

fn start_of(e: &Extent) -> usize {
    match *e {
        Extent::Index(i) => i,
        Extent::Slice { start }
        | Extent::SliceEnd { start, .. }
        | Extent::SliceCount { start, .. } => start,
    }
}

mod ndarray_impl {
    use super::*;
    use ndarray::{Dimension, SliceInfo, SliceInfoElem};

    impl<T, Din: Dimension, Dout: Dimension> TryFrom<&'_ SliceInfo<T, Din, Dout>> for Extents
    where
        T: AsRef<[SliceInfoElem]>,
    {
        type Error = Error;
        fn try_from(slice: &SliceInfo<T, Din, Dout>) -> Result<Self, Self::Error> {
            let slice: &[SliceInfoElem] = slice.as_ref();

            let negative = || Error::InvalidSelector("negative indices are not supported".into());

            Ok(slice
                .iter()
                .map(|&s| match s {
                    SliceInfoElem::Slice { start, end, step } => {
                        let start = usize::try_from(start).map_err(|_| negative())?;
                        if step != 1 {
                            Err(Error::InvalidSelector("strides are not supported".into()))
                        } else if let Some(end) = end {
                            let end = usize::try_from(end).map_err(|_| negative())?;
                            Ok(Extent::SliceEnd { start, end })
                        } else {
                            Ok(Extent::Slice { start })
                        }
                    }
                    SliceInfoElem::Index(index) => {
                        let index = usize::try_from(index).map_err(|_| negative())?;
                        Ok(Extent::Index(index))
                    }
                    SliceInfoElem::NewAxis => Err(Error::InvalidSelector(
                        "can't add new axis in this context".into(),
                    )),
                })
                .collect::<Result<Vec<Extent>, Self::Error>>()?
                .into())
        }
    }

    impl<T, Din: Dimension, Dout: Dimension> TryFrom<SliceInfo<T, Din, Dout>> for Extents
    where
        T: AsRef<[SliceInfoElem]>,
    {
        type Error = Error;
        fn try_from(slice: SliceInfo<T, Din, Dout>) -> Result<Self, Self::Error> {
            Self::try_from(&slice)
        }
    }
}

impl TryFrom<(&[usize], &[usize])> for Extents {
    type Error = Error;
    fn try_from((start, count): (&[usize], &[usize])) -> Result<Self, Self::Error> {
        if start.len() == count.len() {
            Ok(Self::Extent(
                start
                    .iter()
                    .zip(count)
                    .map(|(&start, &count)| Extent::SliceCount { start, count })
                    .collect(),
            ))
        } else {
            Err(Error::InvalidSelector(
                "indices and counts do not have the same length".into(),
            ))
        }
    }
}

impl TryFrom<(Vec<usize>, Vec<usize>)> for Extents {
    type Error = Error;
    fn try_from((start, count): (Vec<usize>, Vec<usize>)) -> Result<Self, Self::Error> {
        Self::try_from((start.as_slice(), count.as_slice()))
    }
}

impl From<&Self> for Extents {
    fn from(extents: &Self) -> Self {
        extents.clone()
    }
}
