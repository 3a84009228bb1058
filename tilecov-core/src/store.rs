//! Configure-then-execute front end over [`RecordDecoder`].

use std::path::{Path, PathBuf};

use log::debug;
use serde_json::Value;

use crate::decode::{Record, RecordDecoder, kind_of, structural};
use crate::error::{Result, TilecovError};
use crate::fs::FileSystem;

/// How many records a store expects to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one JSON object.
    Single,
    /// An array of objects; a lone object is read as a one-element list.
    List,
}

/// Result of executing a [`RecordStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    /// Produced by [`Arity::Single`].
    Single(T),
    /// Produced by [`Arity::List`].
    List(Vec<T>),
}

impl<T> Decoded<T> {
    /// All decoded records in source order.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Single(value) => vec![value],
            Self::List(values) => values,
        }
    }

    /// The single record, or the first one of a list.
    pub fn into_single(self) -> Option<T> {
        match self {
            Self::Single(value) => Some(value),
            Self::List(values) => values.into_iter().next(),
        }
    }
}

/// Builder that decodes records of shape `T` from files or strings.
///
/// ```
/// use tilecov_core::{Arity, GameObject, RecordDecoder, RecordStore};
///
/// let objects = RecordStore::<GameObject>::create()
///     .arity(Arity::List)
///     .with_decoder(RecordDecoder::declared()?)
///     .execute_str(r#"[{ "type": "GENERIC", "id": "rock" }]"#)?
///     .map(|decoded| decoded.into_vec())
///     .unwrap_or_default();
/// assert_eq!(objects[0].ids(), ["rock"]);
/// # Ok::<(), tilecov_core::TilecovError>(())
/// ```
#[derive(Debug)]
pub struct RecordStore<T> {
    arity: Option<Arity>,
    decoder: Option<RecordDecoder<T>>,
    root: Option<PathBuf>,
}

impl<T: Record> RecordStore<T> {
    /// Start configuring a store for shape `T`.
    pub fn create() -> Self {
        Self {
            arity: None,
            decoder: None,
            root: None,
        }
    }

    /// Set the expected number of records.
    pub fn arity(mut self, arity: Arity) -> Self {
        self.arity = Some(arity);
        self
    }

    /// Decode with a declarative decoder instead of structural rules only.
    pub fn with_decoder(mut self, decoder: RecordDecoder<T>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Resolve relative paths passed to [`RecordStore::execute_path`] against `root`.
    pub fn resource_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Read and decode the file at `path`.
    pub fn execute_path<F: FileSystem + ?Sized>(
        &self,
        fs: &F,
        path: &Path,
    ) -> Result<Option<Decoded<T>>> {
        let arity = self.configured_arity()?;
        let resolved = match &self.root {
            Some(root) => root.join(path),
            None => path.to_path_buf(),
        };
        if !fs.is_file(&resolved) {
            return Err(TilecovError::ResourceNotFound(resolved));
        }
        debug!("decoding {} from {}", T::SHAPE, resolved.display());
        let contents = fs.read_to_string(&resolved)?;
        self.execute_text(arity, &contents, &resolved.display().to_string())
    }

    /// Decode an in-memory JSON document.
    pub fn execute_str(&self, json: &str) -> Result<Option<Decoded<T>>> {
        let arity = self.configured_arity()?;
        self.execute_text(arity, json, "<string>")
    }

    /// Decode an already parsed JSON value.
    pub fn execute_value(&self, value: &Value) -> Result<Option<Decoded<T>>> {
        let arity = self.configured_arity()?;
        self.decode_value(arity, value)
    }

    fn configured_arity(&self) -> Result<Arity> {
        self.arity
            .ok_or(TilecovError::BuilderMisconfigured("arity was not defined"))
    }

    fn execute_text(&self, arity: Arity, text: &str, origin: &str) -> Result<Option<Decoded<T>>> {
        if text.trim().is_empty() {
            return Ok(None);
        }
        let value: Value =
            serde_json::from_str(text).map_err(|err| TilecovError::malformed(origin, &err))?;
        self.decode_value(arity, &value)
            .map_err(|err| err.within(origin))
    }

    fn decode_value(&self, arity: Arity, value: &Value) -> Result<Option<Decoded<T>>> {
        if value.is_null() {
            return Ok(None);
        }
        let decoded = match arity {
            Arity::Single => Decoded::Single(self.decode_one(value)?),
            Arity::List => Decoded::List(self.decode_many(value)?),
        };
        Ok(Some(decoded))
    }

    fn decode_one(&self, value: &Value) -> Result<T> {
        if !value.is_object() {
            return Err(TilecovError::MalformedJson {
                origin: T::SHAPE.to_string(),
                location: None,
                message: format!("expected a JSON object, found {}", kind_of(value)),
            });
        }
        match &self.decoder {
            Some(decoder) => decoder.decode_object(value),
            None => structural(value),
        }
    }

    fn decode_many(&self, value: &Value) -> Result<Vec<T>> {
        match (&self.decoder, value) {
            (Some(decoder), _) => decoder.decode(value),
            (None, Value::Array(items)) => items.iter().map(|item| self.decode_one(item)).collect(),
            (None, _) => Ok(vec![self.decode_one(value)?]),
        }
    }
}

impl<T: Record> Default for RecordStore<T> {
    fn default() -> Self {
        Self::create()
    }
}
