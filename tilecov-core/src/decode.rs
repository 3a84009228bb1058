//! Declarative decoding of game data records.
//!
//! Game JSON writes many fields either as a bare scalar or as an array of
//! scalars, and some fields as either a bare string or a richer object. A
//! record shape declares those fields once in a [`FieldTable`]; the
//! [`RecordDecoder`] built from it decodes every other field with plain
//! `serde` rules and then overwrites the declared ones.
//!
//! Declared fields must be `#[serde(skip)]` on the shape so that the
//! structural pass leaves them at their default.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Result, TilecovError};
use crate::store::{Arity, Decoded, RecordStore};

/// A JSON record shape understood by [`RecordDecoder`].
pub trait Record: DeserializeOwned + Sized + 'static {
    /// Shape name used in error messages.
    const SHAPE: &'static str;

    /// Declared list-like and nested fields of the shape.
    ///
    /// Shapes without declarations decode structurally only.
    fn field_table() -> FieldTable<Self> {
        FieldTable::<Self>::new()
    }
}

/// A structured value that may also be written as a bare JSON primitive.
pub trait NestedValue: Record {
    /// Build the value from the textual form of a primitive.
    fn from_primitive(text: String) -> Self;
}

type ListSetter<T> = fn(&mut T, Vec<String>);
type NestedSetter<T> = Box<dyn Fn(&mut T, &Value) -> Result<()> + Send + Sync>;

/// Per-shape table of declared fields, keyed by JSON property name.
pub struct FieldTable<T> {
    list_like: BTreeMap<&'static str, ListSetter<T>>,
    nested: BTreeMap<&'static str, NestedSetter<T>>,
    problems: Vec<TilecovError>,
}

impl<T: Record> FieldTable<T> {
    /// An empty table; every field decodes structurally.
    pub fn new() -> Self {
        Self {
            list_like: BTreeMap::new(),
            nested: BTreeMap::new(),
            problems: Vec::new(),
        }
    }

    /// Declare `key` as list-like: a scalar or an array of scalars.
    pub fn list_like(mut self, key: &'static str, setter: ListSetter<T>) -> Self {
        if self.nested.contains_key(key) {
            self.conflict(key);
        }
        self.list_like.insert(key, setter);
        self
    }

    /// Declare `key` as a nested value written as a primitive or an object.
    pub fn nested<N: NestedValue>(self, key: &'static str, setter: fn(&mut T, N)) -> Self {
        let store = match RecordDecoder::<N>::declared() {
            Ok(decoder) => RecordStore::<N>::create()
                .arity(Arity::Single)
                .with_decoder(decoder),
            Err(err) => return self.problem(err),
        };
        self.insert_nested(
            key,
            Box::new(move |target, value| {
                let nested = resolve_nested(&store, value, key, T::SHAPE)?;
                setter(target, nested);
                Ok(())
            }),
        )
    }

    /// Declare `key` as a list of nested records decoded with their own table.
    pub fn nested_list<N: Record>(self, key: &'static str, setter: fn(&mut T, Vec<N>)) -> Self {
        let store = match RecordDecoder::<N>::declared() {
            Ok(decoder) => RecordStore::<N>::create()
                .arity(Arity::List)
                .with_decoder(decoder),
            Err(err) => return self.problem(err),
        };
        self.insert_nested(
            key,
            Box::new(move |target, value| {
                let decoded = store
                    .execute_value(value)?
                    .ok_or(TilecovError::MissingNestedValue {
                        field: key,
                        shape: T::SHAPE,
                    })?;
                setter(target, decoded.into_vec());
                Ok(())
            }),
        )
    }

    fn insert_nested(mut self, key: &'static str, setter: NestedSetter<T>) -> Self {
        if self.list_like.contains_key(key) {
            self.conflict(key);
        }
        self.nested.insert(key, setter);
        self
    }

    fn conflict(&mut self, key: &'static str) {
        self.problems.push(TilecovError::ConflictingFieldDeclaration {
            shape: T::SHAPE,
            field: key,
        });
    }

    fn problem(mut self, err: TilecovError) -> Self {
        self.problems.push(err);
        self
    }
}

impl<T: Record> Default for FieldTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FieldTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldTable")
            .field("list_like", &self.list_like.keys().collect::<Vec<_>>())
            .field("nested", &self.nested.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Decodes JSON values into records of shape `T` using a [`FieldTable`].
#[derive(Debug)]
pub struct RecordDecoder<T> {
    table: FieldTable<T>,
}

impl<T: Record> RecordDecoder<T> {
    /// Build a decoder from an explicit table, rejecting invalid declarations.
    pub fn new(mut table: FieldTable<T>) -> Result<Self> {
        if !table.problems.is_empty() {
            return Err(table.problems.remove(0));
        }
        Ok(Self { table })
    }

    /// Build a decoder from the table the shape declares for itself.
    pub fn declared() -> Result<Self> {
        Self::new(T::field_table())
    }

    /// Decode one JSON object.
    pub fn decode_object(&self, value: &Value) -> Result<T> {
        let Value::Object(object) = value else {
            return Err(expected_object::<T>(value));
        };
        let mut target = structural::<T>(value)?;

        for (key, setter) in &self.table.nested {
            if let Some(field) = object.get(*key) {
                setter(&mut target, field)?;
            }
        }
        for (key, setter) in &self.table.list_like {
            if let Some(field) = object.get(*key) {
                setter(&mut target, normalize_list(field, key, T::SHAPE)?);
            }
        }

        Ok(target)
    }

    /// Decode an object or an array of objects; any failing element fails the whole value.
    pub fn decode(&self, value: &Value) -> Result<Vec<T>> {
        match value {
            Value::Array(items) => items.iter().map(|item| self.decode_object(item)).collect(),
            Value::Object(_) => Ok(vec![self.decode_object(value)?]),
            other => Err(expected_object::<T>(other)),
        }
    }
}

/// Decode a JSON value with plain `serde` rules only.
pub(crate) fn structural<T: Record>(value: &Value) -> Result<T> {
    T::deserialize(value).map_err(|err| TilecovError::malformed(T::SHAPE, &err))
}

/// Normalize a list-like field into an ordered list of strings.
///
/// `null` yields an empty list, an array yields its elements in order and any
/// other scalar yields a single element. Numbers and booleans keep their
/// textual form; objects and nested arrays are rejected.
pub fn normalize_list(value: &Value, field: &str, shape: &str) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| scalar_text(item).ok_or_else(|| not_a_scalar(item, field, shape)))
            .collect(),
        other => scalar_text(other)
            .map(|text| vec![text])
            .ok_or_else(|| not_a_scalar(other, field, shape)),
    }
}

/// Resolve a nested field through the record store configured for its shape.
pub(crate) fn resolve_nested<N: NestedValue>(
    store: &RecordStore<N>,
    value: &Value,
    field: &'static str,
    shape: &'static str,
) -> Result<N> {
    if let Some(text) = scalar_text(value) {
        return Ok(N::from_primitive(text));
    }
    store
        .execute_value(value)?
        .and_then(Decoded::into_single)
        .ok_or(TilecovError::MissingNestedValue { field, shape })
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn not_a_scalar(value: &Value, field: &str, shape: &str) -> TilecovError {
    TilecovError::MalformedJson {
        origin: format!("{shape}.{field}"),
        location: None,
        message: format!("expected a string or an array of strings, found {value}"),
    }
}

fn expected_object<T: Record>(value: &Value) -> TilecovError {
    TilecovError::MalformedJson {
        origin: T::SHAPE.to_string(),
        location: None,
        message: format!("expected a JSON object, found {}", kind_of(value)),
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
