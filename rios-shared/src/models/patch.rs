/// Partial-update primitives
///
/// Update requests only carry the fields the client wants to change. A
/// field is "supplied" when its key is present in the request body, no matter
/// the value: `""`, `false` and `null` are real updates, an absent key is not.
///
/// # Example
///
/// ```
/// use rios_shared::models::patch::{Patch, UpdateSet};
///
/// let mut name = "Acme".to_string();
/// let mut changes = UpdateSet::new();
///
/// changes.apply("name", Patch::Present(String::new()), &mut name);
/// assert_eq!(name, "");
/// assert!(changes.contains("name"));
///
/// changes.apply("email", Patch::<String>::Missing, &mut name);
/// assert!(!changes.contains("email"));
/// ```

use serde::{Deserialize, Deserializer};

/// A field of an update request
///
/// Use with `#[serde(default)]` so an absent key deserializes to
/// [`Patch::Missing`]. Nullable columns are modeled as `Patch<Option<T>>`,
/// where an explicit `null` becomes `Present(None)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Key was not present in the request
    Missing,

    /// Key was present, with this value
    Present(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Missing
    }
}

impl<T> Patch<T> {
    /// Returns true if the key was supplied
    pub fn is_present(&self) -> bool {
        matches!(self, Patch::Present(_))
    }

    /// Borrows the supplied value
    pub fn as_ref(&self) -> Patch<&T> {
        match self {
            Patch::Missing => Patch::Missing,
            Patch::Present(value) => Patch::Present(value),
        }
    }

    /// Transforms the supplied value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Patch<U> {
        match self {
            Patch::Missing => Patch::Missing,
            Patch::Present(value) => Patch::Present(f(value)),
        }
    }

    /// Converts into `Option`, losing the distinction for nullable fields
    pub fn into_option(self) -> Option<T> {
        match self {
            Patch::Missing => None,
            Patch::Present(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Patch::Present(value),
            None => Patch::Missing,
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Patch::Present)
    }
}

/// Columns written by an update
///
/// Built while merging a patch into a stored row. Stores write only these
/// columns (plus `updated_at`, which is always stamped).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSet {
    columns: Vec<&'static str>,
}

impl UpdateSet {
    /// Creates an empty update set
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a patch to a field, recording the column when supplied
    ///
    /// Returns true if the field was written.
    pub fn apply<T>(&mut self, column: &'static str, patch: Patch<T>, slot: &mut T) -> bool {
        match patch {
            Patch::Missing => false,
            Patch::Present(value) => {
                *slot = value;
                self.touch(column);
                true
            }
        }
    }

    /// Records a column as written
    pub fn touch(&mut self, column: &'static str) {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
    }

    /// Returns true if the column was written
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| *c == column)
    }

    /// Written columns, in merge order
    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// Returns true if nothing was supplied
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        name: Patch<String>,
        #[serde(default)]
        state: Patch<bool>,
        #[serde(default)]
        note: Patch<Option<String>>,
    }

    #[test]
    fn test_absent_key_is_missing() {
        let body: Body = serde_json::from_str("{}").unwrap();
        assert_eq!(body.name, Patch::Missing);
        assert_eq!(body.state, Patch::Missing);
        assert_eq!(body.note, Patch::Missing);
    }

    #[test]
    fn test_falsy_values_are_present() {
        let body: Body =
            serde_json::from_str(r#"{"name": "", "state": false, "note": null}"#).unwrap();
        assert_eq!(body.name, Patch::Present(String::new()));
        assert_eq!(body.state, Patch::Present(false));
        assert_eq!(body.note, Patch::Present(None));
    }

    #[test]
    fn test_apply_records_only_supplied_columns() {
        let mut name = "Acme".to_string();
        let mut active = true;
        let mut changes = UpdateSet::new();

        assert!(!changes.apply("name", Patch::Missing, &mut name));
        assert!(changes.apply("active", Patch::Present(false), &mut active));

        assert_eq!(name, "Acme");
        assert!(!active);
        assert_eq!(changes.columns(), &["active"]);
    }

    #[test]
    fn test_touch_is_deduplicated() {
        let mut changes = UpdateSet::new();
        changes.touch("status");
        changes.touch("status");
        assert_eq!(changes.columns().len(), 1);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Patch::from(Some(3)), Patch::Present(3));
        assert_eq!(Patch::<i32>::from(None), Patch::Missing);
        assert_eq!(Patch::Present(2).map(|v| v * 2).into_option(), Some(4));
    }
}
