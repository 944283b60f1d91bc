use super::value::AttributeValue;
use crate::error::DispatchError;

/// Ordered name -> value mapping with unique names.
///
/// Insertion order is preserved; replacing an existing name keeps its
/// original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelMap {
    entries: Vec<(String, AttributeValue)>,
}

impl ModelMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `value` under `name`, replacing any previous value.
    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Put `value` under its conventional name.
    ///
    /// Empty sequences are skipped; values without a derivable name fail with
    /// [`DispatchError::UnnamedAttribute`].
    pub fn add_value(&mut self, value: AttributeValue) -> Result<(), DispatchError> {
        if value.is_empty_sequence() {
            return Ok(());
        }
        let name = value
            .conventional_name()
            .ok_or_else(|| DispatchError::UnnamedAttribute {
                kind: value.kind().to_string(),
            })?;
        self.add_attribute(name, value);
        Ok(())
    }

    /// Copy every entry of `other`, overwriting existing names.
    pub fn add_all(&mut self, other: &ModelMap) {
        for (name, value) in other.iter() {
            self.add_attribute(name, value.clone());
        }
    }

    /// Copy the entries of `other` whose names are not present yet.
    pub fn merge_attributes<'a, I>(&mut self, other: I)
    where
        I: IntoIterator<Item = (&'a str, &'a AttributeValue)>,
    {
        for (name, value) in other {
            if !self.contains(name) {
                self.entries.push((name.to_string(), value.clone()));
            }
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        self.position(name).map(|idx| self.entries.remove(idx).1)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    #[inline]
    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == name)
    }
}

impl<'a> IntoIterator for &'a ModelMap {
    type Item = (&'a str, &'a AttributeValue);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a AttributeValue)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

impl IntoIterator for ModelMap {
    type Item = (String, AttributeValue);
    type IntoIter = std::vec::IntoIter<(String, AttributeValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for ModelMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = ModelMap::new();
        for (k, v) in iter {
            map.add_attribute(k, v);
        }
        map
    }
}
