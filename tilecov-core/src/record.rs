//! Game object records decoded from the game's JSON data.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::decode::{FieldTable, NestedValue, Record};
use crate::filter::Identifiable;

/// Display text of a record, written either as a bare string or as an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayText {
    #[serde(rename = "str", default)]
    text: Option<String>,
    #[serde(default)]
    str_sp: Option<String>,
    #[serde(default)]
    str_pl: Option<String>,
    #[serde(default)]
    ctxt: Option<String>,
}

impl DisplayText {
    /// Display text holding only a singular form.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Singular form; falls back to the same-plural form, then to empty.
    pub fn text(&self) -> &str {
        self.text
            .as_deref()
            .or(self.str_sp.as_deref())
            .unwrap_or_default()
    }

    /// Plural form, if the data declares one.
    pub fn plural(&self) -> Option<&str> {
        self.str_pl.as_deref().or(self.str_sp.as_deref())
    }

    /// Translation context, if any.
    pub fn context(&self) -> Option<&str> {
        self.ctxt.as_deref()
    }
}

impl Record for DisplayText {
    const SHAPE: &'static str = "DisplayText";
}

impl NestedValue for DisplayText {
    fn from_primitive(text: String) -> Self {
        Self::plain(text)
    }
}

/// A single game object such as an item or a monster.
///
/// Two objects are equal when their type and ids are equal.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameObject {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(skip)]
    ids: Vec<String>,
    #[serde(skip)]
    name: DisplayText,
    #[serde(skip)]
    description: DisplayText,
    #[serde(skip)]
    foreground_color: Vec<String>,
    #[serde(skip)]
    background_color: Vec<String>,
    #[serde(default)]
    looks_like: Option<String>,
    #[serde(rename = "copy-from", default)]
    copy_from: Option<String>,
}

impl GameObject {
    /// Object of `kind` with the given ids and nothing else set.
    pub fn new<I, S>(kind: impl Into<String>, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: kind.into(),
            ids: ids.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Same object, borrowing its look from `id`.
    pub fn with_looks_like(mut self, id: impl Into<String>) -> Self {
        self.looks_like = Some(id.into());
        self
    }

    /// The JSON `type`; empty when absent.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Ids in declaration order.
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// First id, which names the object in coverage maps.
    pub fn primary_id(&self) -> Option<&str> {
        self.ids.first().map(String::as_str)
    }

    /// Display name.
    pub fn name(&self) -> &DisplayText {
        &self.name
    }

    /// Description text.
    pub fn description(&self) -> &DisplayText {
        &self.description
    }

    /// Foreground colors, one per season when seasonal.
    pub fn foreground_color(&self) -> &[String] {
        &self.foreground_color
    }

    /// Background colors, one per season when seasonal.
    pub fn background_color(&self) -> &[String] {
        &self.background_color
    }

    /// Id of the object this one looks like; `None` when absent or empty.
    pub fn looks_like(&self) -> Option<&str> {
        self.looks_like.as_deref().filter(|id| !id.is_empty())
    }

    /// Id of the object this one copies its definition from.
    pub fn copy_from(&self) -> Option<&str> {
        self.copy_from.as_deref()
    }

    /// Whether both objects have the same type and ids.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.kind == other.kind && self.ids == other.ids
    }
}

impl Identifiable for GameObject {
    fn ids(&self) -> &[String] {
        GameObject::ids(self)
    }
}

impl PartialEq for GameObject {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Eq for GameObject {}

impl Hash for GameObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.ids.hash(state);
    }
}

impl Record for GameObject {
    const SHAPE: &'static str = "GameObject";

    fn field_table() -> FieldTable<Self> {
        FieldTable::<Self>::new()
            .list_like("id", |object, ids| object.ids = ids)
            .list_like("color", |object, colors| object.foreground_color = colors)
            .list_like("bgcolor", |object, colors| object.background_color = colors)
            .nested::<DisplayText>("name", |object, name| object.name = name)
            .nested::<DisplayText>("description", |object, text| object.description = text)
    }
}
