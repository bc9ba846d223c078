//! The value held per key in a shared array (spec §4.C).
//!
//! A container is either a plain string or a list of strings. Every read
//! handed back to a caller and every write taken from a caller is a deep
//! copy: two actors can never see the same backing allocation, mirroring
//! spec §4.C's isolation requirement for cross-interpreter sharing.

/// One variable's value inside a shared array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueContainer {
    /// A scalar string value.
    Str(String),
    /// A list of string elements.
    List(Vec<String>),
}

impl ValueContainer {
    /// Render this value the way a script would see it if it read the
    /// variable as a plain string (lists join on a single space, matching
    /// the source representation where a list *is* its string form).
    #[must_use]
    pub fn as_display(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::List(items) => items.join(" "),
        }
    }

    /// View this container as a list, treating a scalar as a one-element
    /// (or zero-element, if empty) list — the same coercion the source
    /// list commands apply to a plain string variable.
    #[must_use]
    pub fn as_list(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            Self::Str(s) if s.is_empty() => Vec::new(),
            Self::Str(s) => s.split_whitespace().map(str::to_string).collect(),
        }
    }
}

impl From<String> for ValueContainer {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<String>> for ValueContainer {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_round_trips_as_display() {
        let v = ValueContainer::Str("hello".into());
        assert_eq!(v.as_display(), "hello");
    }

    #[test]
    fn list_joins_with_spaces() {
        let v = ValueContainer::List(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(v.as_display(), "a b c");
    }

    #[test]
    fn scalar_coerces_to_list_by_whitespace() {
        let v = ValueContainer::Str("a b  c".into());
        assert_eq!(v.as_list(), vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_scalar_coerces_to_empty_list() {
        let v = ValueContainer::Str(String::new());
        assert!(v.as_list().is_empty());
    }
}
