//! Shape classification of document values
//!
//! Introspection only cares whether a value is a leaf, an object or an
//! array. [`FieldValue`] makes that split explicit and [`ShapeVisitor`]
//! lets each analysis pass handle the three cases without re-matching on
//! `serde_json::Value` everywhere.

use serde_json::{Map, Value};

/// A document value classified by shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    /// String, number, boolean or null
    Scalar(&'a Value),
    /// Nested object
    Object(&'a Map<String, Value>),
    /// Array
    Array(&'a [Value]),
}

impl<'a> FieldValue<'a> {
    /// Classify a value
    #[inline]
    #[must_use]
    pub fn classify(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => Self::Object(map),
            Value::Array(items) => Self::Array(items),
            other => Self::Scalar(other),
        }
    }

    /// True for leaves
    #[inline]
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// Dispatch to the visitor method for this shape
    ///
    /// # Errors
    /// Propagates the visitor's error
    pub fn accept<V: ShapeVisitor<'a>>(self, key: &'a str, visitor: &mut V) -> Result<(), V::Error> {
        match self {
            Self::Scalar(value) => visitor.visit_scalar(key, value),
            Self::Object(map) => visitor.visit_object(key, map),
            Self::Array(items) => visitor.visit_array(key, items),
        }
    }
}

/// Per-shape callbacks for walking the entries of an object
pub trait ShapeVisitor<'a> {
    /// Error produced by the visitor
    type Error;

    /// Called for leaf entries
    ///
    /// # Errors
    /// Visitor-defined
    fn visit_scalar(&mut self, key: &'a str, value: &'a Value) -> Result<(), Self::Error>;

    /// Called for object entries
    ///
    /// # Errors
    /// Visitor-defined
    fn visit_object(&mut self, key: &'a str, map: &'a Map<String, Value>) -> Result<(), Self::Error>;

    /// Called for array entries
    ///
    /// # Errors
    /// Visitor-defined
    fn visit_array(&mut self, key: &'a str, items: &'a [Value]) -> Result<(), Self::Error>;
}

/// Visit every entry of `map` in document order
///
/// # Errors
/// Stops at and returns the first visitor error
pub fn walk<'a, V: ShapeVisitor<'a>>(map: &'a Map<String, Value>, visitor: &mut V) -> Result<(), V::Error> {
    for (key, value) in map {
        FieldValue::classify(value).accept(key, visitor)?;
    }
    Ok(())
}
