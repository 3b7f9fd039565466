//! Groups: a namespace of dimensions, variables and attributes.
//!
//! A file has an unnamed root group and any number of named groups below
//! it. Groups do not nest further. Dimensions are only visible to variables
//! of the group they were declared in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attribute::{AttrValue, Attributes};
use crate::dimension::{Dimension, MAX_UNLIMITED_DIMENSIONS};
use crate::reader::Backing;
use crate::types::{Datatype, Element};
use crate::variable::{Variable, VariableData, VariableMut, VariableOptions};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct GroupData {
    pub name: String,
    pub dimensions: Vec<Dimension>,
    pub variables: Vec<VariableData>,
    pub attributes: Attributes,
}

impl GroupData {
    pub fn new(name: &str) -> GroupData {
        GroupData {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn dimension_index(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d.name == name)
    }

    fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    /// Any variable with chunks not yet committed.
    pub fn has_pending(&self) -> bool {
        self.variables.iter().any(|v| v.grid.has_pending())
    }

    /// Check that every variable refers to dimensions of this group and has
    /// a chunk shape of the right rank.
    pub fn validate(&self) -> Result<()> {
        for v in &self.variables {
            if let Some(&d) = v.dimensions.iter().find(|&&d| d >= self.dimensions.len()) {
                return Err(Error::Corrupt(format!(
                    "variable `{}` refers to missing dimension {d}",
                    v.name
                )));
            }

            let chunk_shape = &v.grid.chunk_shape;
            if chunk_shape.len() != v.dimensions.len() || chunk_shape.contains(&0) {
                return Err(Error::Corrupt(format!(
                    "variable `{}` has invalid chunk shape {chunk_shape:?}",
                    v.name
                )));
            }
        }

        Ok(())
    }
}

/// A group of an open file.
#[derive(Debug, Clone, Copy)]
pub struct Group<'f> {
    data: &'f GroupData,
    source: Option<&'f Backing>,
}

impl<'f> Group<'f> {
    pub(crate) fn new(data: &'f GroupData, source: Option<&'f Backing>) -> Group<'f> {
        Group { data, source }
    }

    /// Name of the group, empty for the root group.
    pub fn name(&self) -> &'f str {
        &self.data.name
    }

    pub fn dimensions(&self) -> &'f [Dimension] {
        &self.data.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&'f Dimension> {
        self.data.dimensions.iter().find(|d| d.name == name)
    }

    /// Variables in the order they were added.
    pub fn variables(&self) -> impl Iterator<Item = Variable<'f>> + 'f {
        let Group { data, source } = *self;
        data.variables
            .iter()
            .map(move |v| Variable::new(v, &data.dimensions, source))
    }

    pub fn variable(&self, name: &str) -> Option<Variable<'f>> {
        self.data
            .variable_index(name)
            .map(|i| Variable::new(&self.data.variables[i], &self.data.dimensions, self.source))
    }

    pub fn variable_names(&self) -> Vec<&'f str> {
        self.data.variables.iter().map(|v| v.name.as_str()).collect()
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
}

impl fmt::Display for Group<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.dimensions().is_empty() {
            writeln!(f, "dimensions:")?;
            for d in self.dimensions() {
                if d.is_unlimited() {
                    writeln!(f, "\t{} = UNLIMITED ; // ({} currently)", d.name(), d.len())?;
                } else {
                    writeln!(f, "\t{} = {} ;", d.name(), d.len())?;
                }
            }
        }

        if !self.data.variables.is_empty() {
            writeln!(f, "variables:")?;
            for v in self.variables() {
                write!(f, "{v}")?;
            }
        }

        if !self.attributes().is_empty() {
            if self.name().is_empty() {
                writeln!(f, "\n// global attributes:")?;
            } else {
                writeln!(f, "\n// group attributes:")?;
            }
            for (name, value) in self.attributes().iter() {
                writeln!(f, "\t\t:{name} = {value} ;")?;
            }
        }

        Ok(())
    }
}

/// A group of a file open for writing.
#[derive(Debug)]
pub struct GroupMut<'f> {
    data: &'f mut GroupData,
    source: Option<&'f Backing>,
}

impl<'f> GroupMut<'f> {
    pub(crate) fn new(data: &'f mut GroupData, source: Option<&'f Backing>) -> GroupMut<'f> {
        GroupMut { data, source }
    }

    /// Read access to the group.
    pub fn view(&self) -> Group<'_> {
        Group::new(&*self.data, self.source)
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    fn check_dimension_name(&self, name: &str) -> Result<()> {
        if self.data.dimension_index(name).is_some() {
            return Err(Error::DuplicateName(name.to_string()));
        }

        Ok(())
    }

    /// Declare a dimension of fixed length `len`.
    pub fn add_dimension(&mut self, name: &str, len: usize) -> Result<&Dimension> {
        self.check_dimension_name(name)?;

        if len == 0 {
            return Err(Error::InvalidLength {
                name: name.to_string(),
                len,
            });
        }

        self.data.dimensions.push(Dimension::fixed(name, len));
        log::debug!("{}: dimension `{name}` = {len}", self.data.name);

        Ok(&self.data.dimensions[self.data.dimensions.len() - 1])
    }

    /// Declare an unlimited dimension, its length grows as records are
    /// written.
    pub fn add_unlimited_dimension(&mut self, name: &str) -> Result<&Dimension> {
        self.check_dimension_name(name)?;

        let unlimited = self.data.dimensions.iter().filter(|d| d.unlimited).count();
        if unlimited >= MAX_UNLIMITED_DIMENSIONS {
            return Err(Error::TooManyUnlimited(name.to_string()));
        }

        self.data.dimensions.push(Dimension::unlimited(name));
        log::debug!("{}: dimension `{name}` = UNLIMITED", self.data.name);

        Ok(&self.data.dimensions[self.data.dimensions.len() - 1])
    }

    /// Add a variable of element type `T` over the named dimensions.
    pub fn add_variable<T: Element>(&mut self, name: &str, dims: &[&str]) -> Result<VariableMut<'_>> {
        self.add_variable_with_options(name, T::DATATYPE, dims, VariableOptions::default())
    }

    /// Add a variable with its element type given as a type code, e.g. `"f4"`.
    pub fn add_variable_with_type(
        &mut self,
        name: &str,
        dtype: &str,
        dims: &[&str],
    ) -> Result<VariableMut<'_>> {
        let dtype: Datatype = dtype.parse()?;
        self.add_variable_with_options(name, dtype, dims, VariableOptions::default())
    }

    pub fn add_variable_with_options(
        &mut self,
        name: &str,
        dtype: Datatype,
        dims: &[&str],
        options: VariableOptions,
    ) -> Result<VariableMut<'_>> {
        if self.data.variable_index(name).is_some() {
            return Err(Error::DuplicateName(name.to_string()));
        }

        let dimensions = dims
            .iter()
            .map(|&d| {
                self.data
                    .dimension_index(d)
                    .ok_or_else(|| Error::UnknownDimension(d.to_string()))
            })
            .collect::<Result<Vec<usize>>>()?;

        options.validate(dtype, dimensions.len())?;

        let v = VariableData::new(name, dtype, dimensions, &self.data.dimensions, &options);
        log::debug!(
            "{}: variable `{name}` {dtype} {dims:?}, chunks {:?}",
            self.data.name,
            v.grid.chunk_shape
        );
        self.data.variables.push(v);

        let GroupData {
            dimensions,
            variables,
            ..
        } = &mut *self.data;

        let last = variables.len() - 1;
        Ok(VariableMut::new(&mut variables[last], dimensions, self.source))
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<VariableMut<'_>> {
        let i = self.data.variable_index(name)?;
        let GroupData {
            dimensions,
            variables,
            ..
        } = &mut *self.data;

        Some(VariableMut::new(&mut variables[i], dimensions, self.source))
    }

    pub fn variable(&self, name: &str) -> Option<Variable<'_>> {
        self.view().variable(name)
    }

    pub fn variable_names(&self) -> Vec<&str> {
        self.view().variable_names()
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.view().dimension(name)
    }

    /// Set an attribute on the group, replacing any previous value.
    pub fn add_attribute<V: Into<AttrValue>>(&mut self, name: &str, value: V) -> Result<()> {
        self.data.attributes.put(name, value.into());
        Ok(())
    }

    pub fn attribute(&self, name: &str) -> Result<&AttrValue> {
        self.data.attributes.get(name)
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.data.attributes.names()
    }
}
