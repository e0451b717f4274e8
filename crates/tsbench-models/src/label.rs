use std::fmt;

/// A class label as it appears in the archive. Labels are compared as
/// strings; no numeric interpretation is applied.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassLabel(String);

impl ClassLabel {
    /// Create a label from its textual form.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Return the label text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::ClassLabel;

    #[test]
    fn string_equality_not_numeric() {
        assert_ne!(ClassLabel::new("1"), ClassLabel::new("1.0"));
        assert_eq!(ClassLabel::new("-1"), ClassLabel::new(String::from("-1")));
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", ClassLabel::new("walk")), "walk");
    }
}
