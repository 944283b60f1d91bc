use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Shape of an attribute value, as far as naming and binding care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Null,
    /// Strings, numbers, booleans.
    Simple,
    /// Arrays / collections.
    Sequence,
    /// Untyped JSON objects.
    Map,
    /// Objects carrying a declared domain type name.
    Object,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AttributeKind::Null => "null",
            AttributeKind::Simple => "simple",
            AttributeKind::Sequence => "sequence",
            AttributeKind::Map => "map",
            AttributeKind::Object => "object",
        };
        f.write_str(s)
    }
}

/// A model, session or request attribute.
///
/// The payload is JSON so it can cross the session store and reach the view
/// layer unchanged; the optional type name stands in for the declared type
/// that session-attribute declarations and naming conventions key on. For
/// sequences the type name is the element type.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeValue {
    value: Value,
    type_name: Option<Arc<str>>,
}

impl AttributeValue {
    /// Untyped value; its kind follows the JSON shape.
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            type_name: None,
        }
    }

    /// Value of a declared domain type.
    pub fn typed(type_name: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            type_name: Some(type_name.into()),
        }
    }

    /// Serialize a Rust value, recording its short type name.
    ///
    /// `Vec<Item>` records `Item`, so the conventional name becomes `itemList`.
    /// Maps and raw JSON values stay untyped and keep the `Map` kind.
    pub fn of<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        let full = std::any::type_name::<T>();
        let value = serde_json::to_value(value)?;
        if is_untyped_container(full) {
            return Ok(Self::new(value));
        }
        Ok(Self::typed(short_type_name(full), value))
    }

    #[must_use]
    pub fn null() -> Self {
        Self::new(Value::Null)
    }

    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        match &self.value {
            Value::Null => AttributeKind::Null,
            Value::Bool(_) | Value::Number(_) | Value::String(_) => AttributeKind::Simple,
            Value::Array(_) => AttributeKind::Sequence,
            Value::Object(_) if self.type_name.is_some() => AttributeKind::Object,
            Value::Object(_) => AttributeKind::Map,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Empty sequences are silently skipped when added without a name.
    #[must_use]
    pub fn is_empty_sequence(&self) -> bool {
        matches!(&self.value, Value::Array(items) if items.is_empty())
    }

    /// Name derived from the value's type: `ShoppingCart` -> `shoppingCart`,
    /// sequence of `Item` -> `itemList`. Untyped values fall back to
    /// `string`/`number`/`boolean`/`map`/`list`. Null has no name.
    #[must_use]
    pub fn conventional_name(&self) -> Option<String> {
        if let Some(type_name) = self.type_name() {
            let base = decapitalize(type_name);
            if base.is_empty() {
                return None;
            }
            return Some(match self.kind() {
                AttributeKind::Sequence => format!("{base}List"),
                _ => base,
            });
        }
        let name = match &self.value {
            Value::Null => return None,
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "list",
            Value::Object(_) => "map",
        };
        Some(name.to_string())
    }
}

macro_rules! untyped_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttributeValue {
                fn from(value: $ty) -> Self {
                    Self::new(value)
                }
            }
        )*
    };
}

untyped_from!(Value, &str, String, bool, i32, i64, u32, u64, usize, f64);

/// Lower-case the first character unless the name starts with an acronym
/// (`URL` stays `URL`).
#[must_use]
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (None, _) => String::new(),
        (Some(first), Some(second)) if first.is_uppercase() && second.is_uppercase() => {
            name.to_string()
        }
        (Some(first), _) => {
            let mut out: String = first.to_lowercase().collect();
            out.push_str(&name[first.len_utf8()..]);
            out
        }
    }
}

const SEQUENCE_WRAPPERS: [&str; 5] = ["Vec", "VecDeque", "HashSet", "BTreeSet", "SmallVec"];

const MAP_WRAPPERS: [&str; 4] = ["HashMap", "BTreeMap", "IndexMap", "DashMap"];

/// Key/value containers and `serde_json` values carry no domain type.
fn is_untyped_container(full: &str) -> bool {
    let full = full.trim_start_matches('&').trim_start_matches("mut ");
    if full.starts_with("serde_json::") {
        return true;
    }
    let outer = full.split('<').next().unwrap_or(full);
    let outer_short = outer.rsplit("::").next().unwrap_or(outer);
    MAP_WRAPPERS.contains(&outer_short)
}

/// `alloc::vec::Vec<shop::Item>` -> `Item`, `shop::model::Cart` -> `Cart`.
#[must_use]
pub fn short_type_name(full: &str) -> String {
    let (outer, inner) = match (full.find('<'), full.rfind('>')) {
        (Some(open), Some(close)) if close > open => (&full[..open], Some(&full[open + 1..close])),
        _ => (full, None),
    };
    let outer_short = outer.rsplit("::").next().unwrap_or(outer);
    match inner {
        Some(inner) if SEQUENCE_WRAPPERS.contains(&outer_short) => {
            let element = inner.split(',').next().unwrap_or(inner).trim();
            short_type_name(element.trim_start_matches('[').trim_end_matches(']'))
        }
        _ => outer_short.trim_start_matches('&').to_string(),
    }
}
