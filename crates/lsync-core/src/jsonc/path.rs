//! Paths addressing a value inside a JSON document

use std::fmt;

/// One step of a [`JsonPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<usize> for Segment {
    fn from(index: usize) -> Self {
        Segment::Index(index)
    }
}

/// Location of a value, e.g. `configurations[2].presentation.hidden`
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct JsonPath(Vec<Segment>);

impl JsonPath {
    /// The document root
    pub fn root() -> Self {
        Self::default()
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.0.push(Segment::Key(key.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.0.push(Segment::Index(index));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The last segment and the path of its parent
    pub fn split_last(&self) -> Option<(&Segment, &[Segment])> {
        self.0.split_last()
    }
}

impl<S: Into<Segment>> FromIterator<S> for JsonPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display_segments(&self.0, f)
    }
}

/// Render a segment slice the same way [`JsonPath`] displays
pub fn format_segments(segments: &[Segment]) -> String {
    struct Wrapper<'a>(&'a [Segment]);
    impl fmt::Display for Wrapper<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            display_segments(self.0, f)
        }
    }
    Wrapper(segments).to_string()
}

fn display_segments(segments: &[Segment], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if segments.is_empty() {
        return f.write_str("$");
    }
    for (i, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Key(key) if i == 0 => write!(f, "{}", key)?,
            Segment::Key(key) => write!(f, ".{}", key)?,
            Segment::Index(index) => write!(f, "[{}]", index)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_display() {
        let path = JsonPath::root()
            .key("configurations")
            .index(2)
            .key("presentation")
            .key("hidden");
        assert_eq!(path.to_string(), "configurations[2].presentation.hidden");
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_root_display() {
        assert_eq!(JsonPath::root().to_string(), "$");
        assert!(JsonPath::root().is_empty());
    }

    #[test]
    fn test_split_last() {
        let path = JsonPath::root().key("a").index(0);
        let (last, parent) = path.split_last().unwrap();
        assert_eq!(last, &Segment::Index(0));
        assert_eq!(format_segments(parent), "a");
    }

    #[test]
    fn test_collect_from_segments() {
        let path: JsonPath = vec![Segment::from("a"), Segment::from(1usize)].into_iter().collect();
        assert_eq!(path, JsonPath::root().key("a").index(1));
    }
}
