//! Variables: typed, chunked n-dimensional arrays laid out over the
//! dimensions of their group.

use std::fmt;

use itertools::Itertools;
use ndarray::{arr0, ArrayD, ArrayView};
use serde::{Deserialize, Serialize};

use crate::attribute::{AttrValue, Attributes};
use crate::dimension::Dimension;
use crate::extent::Extents;
use crate::filters::Filters;
use crate::grid::{default_chunk_shape, Grid};
use crate::reader::Backing;
use crate::types::{Datatype, Element};
use crate::{Error, Result};

/// zlib level used by [`VariableOptions::zlib`].
pub const DEFAULT_DEFLATE: u8 = 4;

/// Name of the attribute recording the quantization of a variable.
pub const LEAST_SIGNIFICANT_DIGIT: &str = "least_significant_digit";

/// Storage options of a variable, fixed when it is created.
///
/// ```
/// use gridfix::VariableOptions;
///
/// let opts = VariableOptions::new().zlib().shuffle(true).least_significant_digit(1);
/// assert_eq!(opts.deflate, Some(4));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableOptions {
    /// Chunk shape, one entry per dimension. Derived from the shape when not set.
    pub chunking: Option<Vec<usize>>,

    /// zlib compression level (0 to 9).
    pub deflate: Option<u8>,

    pub shuffle: bool,

    /// Keep this many decimal digits of precision in written floats.
    pub least_significant_digit: Option<i32>,
}

impl VariableOptions {
    pub fn new() -> VariableOptions {
        VariableOptions::default()
    }

    pub fn zlib(self) -> VariableOptions {
        self.deflate(DEFAULT_DEFLATE)
    }

    pub fn deflate(mut self, level: u8) -> VariableOptions {
        self.deflate = Some(level);
        self
    }

    pub fn shuffle(mut self, shuffle: bool) -> VariableOptions {
        self.shuffle = shuffle;
        self
    }

    pub fn chunking(mut self, chunk_shape: &[usize]) -> VariableOptions {
        self.chunking = Some(chunk_shape.to_vec());
        self
    }

    pub fn least_significant_digit(mut self, digits: i32) -> VariableOptions {
        self.least_significant_digit = Some(digits);
        self
    }

    pub(crate) fn validate(&self, dtype: Datatype, rank: usize) -> Result<()> {
        if let Some(level) = self.deflate {
            if level > 9 {
                return Err(Error::InvalidOption(format!(
                    "zlib level {level} is not in 0..=9"
                )));
            }
        }

        if let Some(chunking) = &self.chunking {
            if chunking.len() != rank {
                return Err(Error::InvalidOption(format!(
                    "chunk shape {chunking:?} does not have {rank} axes"
                )));
            }

            if chunking.iter().any(|&c| c == 0) {
                return Err(Error::InvalidOption(format!(
                    "chunk shape {chunking:?} has an empty axis"
                )));
            }
        }

        if self.least_significant_digit.is_some() && !dtype.is_float() {
            return Err(Error::InvalidOption(format!(
                "least_significant_digit on {dtype} variable"
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct VariableData {
    pub name: String,
    pub dtype: Datatype,

    /// Indices into the dimensions of the owning group.
    pub dimensions: Vec<usize>,

    pub attributes: Attributes,
    pub least_significant_digit: Option<i32>,
    pub grid: Grid,
}

impl VariableData {
    /// A new variable over `dimensions` (indices into `dims`), with options
    /// already validated.
    pub fn new(
        name: &str,
        dtype: Datatype,
        dimensions: Vec<usize>,
        dims: &[Dimension],
        options: &VariableOptions,
    ) -> VariableData {
        let chunk_shape = match &options.chunking {
            Some(chunking) => chunking.clone(),
            None => {
                let shape: Vec<usize> = dimensions.iter().map(|&d| dims[d].len).collect();
                let unlimited: Vec<bool> = dimensions.iter().map(|&d| dims[d].unlimited).collect();
                default_chunk_shape(&shape, &unlimited, dtype.dsize())
            }
        };

        let filters = Filters {
            deflate: options.deflate,
            shuffle: options.shuffle,
        };

        let mut attributes = Attributes::default();
        if let Some(digits) = options.least_significant_digit {
            attributes.put(LEAST_SIGNIFICANT_DIGIT, AttrValue::I32(digits));
        }

        VariableData {
            name: name.to_string(),
            dtype,
            dimensions,
            attributes,
            least_significant_digit: options.least_significant_digit,
            grid: Grid::new(chunk_shape, filters),
        }
    }
}

/// A variable of an open file.
#[derive(Debug, Clone, Copy)]
pub struct Variable<'f> {
    data: &'f VariableData,
    dims: &'f [Dimension],
    source: Option<&'f Backing>,
}

impl<'f> Variable<'f> {
    pub(crate) fn new(
        data: &'f VariableData,
        dims: &'f [Dimension],
        source: Option<&'f Backing>,
    ) -> Variable<'f> {
        Variable { data, dims, source }
    }

    pub fn name(&self) -> &'f str {
        &self.data.name
    }

    pub fn dtype(&self) -> Datatype {
        self.data.dtype
    }

    /// Dimensions in axis order.
    pub fn dimensions(&self) -> Vec<&'f Dimension> {
        self.data.dimensions.iter().map(|&d| &self.dims[d]).collect()
    }

    pub fn dimension_names(&self) -> Vec<&'f str> {
        self.dimensions().into_iter().map(|d| d.name()).collect()
    }

    /// Current shape, unlimited axes at their current length.
    pub fn shape(&self) -> Vec<usize> {
        self.data.dimensions.iter().map(|&d| self.dims[d].len).collect()
    }

    pub fn ndim(&self) -> usize {
        self.data.dimensions.len()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn chunk_shape(&self) -> &'f [usize] {
        &self.data.grid.chunk_shape
    }

    /// Storage options the variable was created with.
    pub fn options(&self) -> VariableOptions {
        VariableOptions {
            chunking: Some(self.data.grid.chunk_shape.clone()),
            deflate: self.data.grid.filters.deflate,
            shuffle: self.data.grid.filters.shuffle,
            least_significant_digit: self.data.least_significant_digit,
        }
    }

    pub fn attribute(&self, name: &str) -> Result<&'f AttrValue> {
        self.data.attributes.get(name)
    }

    pub fn attribute_names(&self) -> Vec<&'f str> {
        self.data.attributes.names()
    }

    pub fn attributes(&self) -> &'f Attributes {
        &self.data.attributes
    }

    fn check_type<T: Element>(&self) -> Result<()> {
        if T::DATATYPE != self.data.dtype {
            return Err(Error::TypeMismatch {
                expected: self.data.dtype,
                found: T::DATATYPE,
            });
        }

        Ok(())
    }

    fn unlimited(&self) -> Vec<bool> {
        self.data.dimensions.iter().map(|&d| self.dims[d].unlimited).collect()
    }

    /// Read the values selected by `extents`. Axes selected with an index
    /// are dropped, never written elements read as the fill value.
    ///
    /// ```no_run
    /// use ndarray::s;
    ///
    /// let f = gridfix::open("sample.gfx")?;
    /// let g = f.group("Temp_data")?.unwrap();
    /// let t = g.variable("Temperature").unwrap();
    ///
    /// let surface = t.values::<f32, _>(s![0, .., .., 0])?;
    /// assert_eq!(surface.shape(), [28, 22]);
    /// # Ok::<(), gridfix::Error>(())
    /// ```
    pub fn values<T, E>(&self, extents: E) -> Result<ArrayD<T>>
    where
        T: Element,
        E: TryInto<Extents>,
        E::Error: Into<Error>,
    {
        self.check_type::<T>()?;

        let extents: Extents = extents.try_into().map_err(Into::<Error>::into)?;
        let spans = extents.resolve(&self.shape())?;

        self.data.grid.read::<T, _>(self.source, &spans)
    }

    /// Read a single value.
    pub fn value<T, E>(&self, extents: E) -> Result<T>
    where
        T: Element,
        E: TryInto<Extents>,
        E::Error: Into<Error>,
    {
        let values = self.values::<T, E>(extents)?;

        match (values.len(), values.iter().next()) {
            (1, Some(v)) => Ok(*v),
            _ => Err(Error::ShapeMismatch {
                expected: vec![],
                found: values.shape().to_vec(),
            }),
        }
    }
}

impl fmt::Display for Variable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\t{} {}", self.dtype().cdl_name(), self.name())?;
        if self.ndim() > 0 {
            write!(f, "({})", self.dimension_names().iter().join(", "))?;
        }
        writeln!(f, " ;")?;

        for (name, value) in self.attributes().iter() {
            writeln!(f, "\t\t{}:{} = {} ;", self.name(), name, value)?;
        }

        Ok(())
    }
}

/// A variable of a file open for writing.
#[derive(Debug)]
pub struct VariableMut<'f> {
    data: &'f mut VariableData,
    dims: &'f mut [Dimension],
    source: Option<&'f Backing>,
}

impl<'f> VariableMut<'f> {
    pub(crate) fn new(
        data: &'f mut VariableData,
        dims: &'f mut [Dimension],
        source: Option<&'f Backing>,
    ) -> VariableMut<'f> {
        VariableMut { data, dims, source }
    }

    /// Read access to the variable.
    pub fn view(&self) -> Variable<'_> {
        Variable::new(&*self.data, &*self.dims, self.source)
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn shape(&self) -> Vec<usize> {
        self.view().shape()
    }

    pub fn values<T, E>(&self, extents: E) -> Result<ArrayD<T>>
    where
        T: Element,
        E: TryInto<Extents>,
        E::Error: Into<Error>,
    {
        self.view().values(extents)
    }

    /// Write `values` to the region selected by `extents`.
    ///
    /// `values` must have the shape of the selection, either with the axes
    /// selected by an index kept (length 1) or dropped. Along an unlimited
    /// axis the selection may reach beyond the current length, which grows
    /// the dimension to cover it.
    ///
    /// Nothing is written if any part of the request is invalid.
    pub fn put<T, E, D>(&mut self, extents: E, values: ArrayView<'_, T, D>) -> Result<()>
    where
        T: Element,
        E: TryInto<Extents>,
        E::Error: Into<Error>,
        D: ndarray::Dimension,
    {
        let view = self.view();
        view.check_type::<T>()?;

        let extents: Extents = extents.try_into().map_err(Into::<Error>::into)?;
        let values = values.into_dyn();
        let spans = extents.resolve_put(&view.shape(), &view.unlimited(), values.shape())?;

        self.data
            .grid
            .write::<T, _>(self.source, &spans, values, self.data.least_significant_digit)?;

        if spans.iter().all(|s| s.count > 0) {
            for (s, &d) in spans.iter().zip(&self.data.dimensions) {
                let dim = &mut self.dims[d];
                if dim.unlimited {
                    dim.grow(s.end());
                }
            }
        }

        log::trace!("{}: wrote {:?}", self.data.name, spans);

        Ok(())
    }

    /// Write a single value. Every axis must be selected with an index.
    pub fn put_value<T, E>(&mut self, extents: E, value: T) -> Result<()>
    where
        T: Element,
        E: TryInto<Extents>,
        E::Error: Into<Error>,
    {
        self.put(extents, arr0(value).view())
    }

    /// Set an attribute on the variable, replacing any previous value.
    pub fn put_attribute<V: Into<AttrValue>>(&mut self, name: &str, value: V) -> Result<()> {
        self.data.attributes.put(name, value.into());
        Ok(())
    }
}
