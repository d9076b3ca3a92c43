use serde::{Deserialize, Serialize};

/// A named grouping that users can belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Database-assigned identifier; `None` until the segment is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

impl Segment {
    /// A segment that has not been stored yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// A reference to an already stored segment.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

/// A user and the segments they currently belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub segments: Vec<Segment>,
}

impl User {
    pub fn is_member_of(&self, segment_id: &str) -> bool {
        self.segments.iter().any(|s| s.id() == Some(segment_id))
    }
}
