//! Schema entry types and normalization.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Bare type tag.
///
/// Serialized as the upper-case name (`"NUMBER"`, `"OBJECT"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaType {
    Object,
    Number,
    String,
    Array,
    Bool,
    Any,
}

/// A type tag together with its modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    /// Type the value must have once presence and nullability are settled.
    #[serde(rename = "type")]
    pub kind: SchemaType,

    /// Value may be absent.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_optional: bool,

    /// Value may be an explicit `null`.
    #[serde(default, skip_serializing_if = "is_false")]
    pub allow_null: bool,

    /// Declared object keys. When present, undeclared keys are rejected unless
    /// `extra_keys` covers them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<BTreeMap<String, SchemaEntry>>,

    /// Schema for object keys not listed in `entries`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_keys: Option<Box<SchemaEntry>>,

    /// Schema every array element must satisfy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaEntry>>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

impl Descriptor {
    /// Descriptor with no modifiers, equivalent to the bare tag.
    #[must_use]
    pub const fn new(kind: SchemaType) -> Self {
        Self {
            kind,
            is_optional: false,
            allow_null: false,
            entries: None,
            extra_keys: None,
            items: None,
        }
    }

    /// Allow the value to be absent.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.is_optional = true;
        self
    }

    /// Allow the value to be an explicit `null`.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.allow_null = true;
        self
    }

    /// Declare an object key.
    #[must_use]
    pub fn entry(mut self, key: impl Into<String>, schema: impl Into<SchemaEntry>) -> Self {
        self.entries
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), schema.into());
        self
    }

    /// Schema for undeclared object keys.
    #[must_use]
    pub fn extra_keys(mut self, schema: impl Into<SchemaEntry>) -> Self {
        self.extra_keys = Some(Box::new(schema.into()));
        self
    }

    /// Element schema for arrays.
    #[must_use]
    pub fn items(mut self, schema: impl Into<SchemaEntry>) -> Self {
        self.items = Some(Box::new(schema.into()));
        self
    }
}

/// A schema: a bare tag, a descriptor, or a union of alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaEntry {
    Type(SchemaType),
    Descriptor(Box<Descriptor>),
    Union(Vec<SchemaEntry>),
}

/// Canonical view of a schema entry used by the validator.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized<'a> {
    /// Accepts everything, including absent and null.
    Any,
    /// Ordered alternatives.
    Union(&'a [SchemaEntry]),
    /// Type with modifiers.
    Descriptor(Cow<'a, Descriptor>),
}

impl SchemaEntry {
    #[must_use]
    pub const fn number() -> Self {
        Self::Type(SchemaType::Number)
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::Type(SchemaType::String)
    }

    #[must_use]
    pub const fn bool() -> Self {
        Self::Type(SchemaType::Bool)
    }

    #[must_use]
    pub const fn any() -> Self {
        Self::Type(SchemaType::Any)
    }

    #[must_use]
    pub const fn object() -> Self {
        Self::Type(SchemaType::Object)
    }

    #[must_use]
    pub const fn array() -> Self {
        Self::Type(SchemaType::Array)
    }

    /// Union: the value must satisfy at least one alternative.
    #[must_use]
    pub fn one_of(alternatives: impl IntoIterator<Item = Self>) -> Self {
        Self::Union(alternatives.into_iter().collect())
    }

    /// Collapse a bare tag into its descriptor form.
    ///
    /// `ANY` normalizes to [`Normalized::Any`] whether written as a tag or as
    /// a descriptor, so `NUMBER` and `{ "type": "NUMBER" }` (and likewise
    /// `ANY` and `{ "type": "ANY" }`) always validate identically.
    #[must_use]
    pub fn normalize(&self) -> Normalized<'_> {
        match self {
            Self::Type(SchemaType::Any) => Normalized::Any,
            Self::Type(kind) => Normalized::Descriptor(Cow::Owned(Descriptor::new(*kind))),
            Self::Descriptor(descriptor) if descriptor.kind == SchemaType::Any => Normalized::Any,
            Self::Descriptor(descriptor) => Normalized::Descriptor(Cow::Borrowed(descriptor)),
            Self::Union(alternatives) => Normalized::Union(alternatives),
        }
    }
}

impl From<SchemaType> for SchemaEntry {
    fn from(kind: SchemaType) -> Self {
        Self::Type(kind)
    }
}

impl From<Descriptor> for SchemaEntry {
    fn from(descriptor: Descriptor) -> Self {
        Self::Descriptor(Box::new(descriptor))
    }
}

impl From<Vec<Self>> for SchemaEntry {
    fn from(alternatives: Vec<Self>) -> Self {
        Self::Union(alternatives)
    }
}
