use bson::{Bson, Document};
use serde::{Deserialize, Deserializer, Serialize};

/// Comparison operator of a single condition.
///
/// Wire names are camelCase. Any name outside the known set deserializes to
/// `Unrecognized`; the compiler skips such conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equal,
    NotEqual,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    #[serde(other)]
    Unrecognized,
}

/// `attribute <operator> value`, where `attribute` is a dotted document path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub attribute: String,
    pub operator: Operator,
    #[serde(default)]
    pub value: Bson,
}

impl Condition {
    pub fn new(attribute: impl Into<String>, operator: Operator, value: impl Into<Bson>) -> Self {
        Self { attribute: attribute.into(), operator, value: value.into() }
    }
}

/// Conjunction of conditions.
pub type AndGroup = Vec<Condition>;

/// Disjunction of AND-groups. Grouping is preserved exactly as given.
pub type Filter = Vec<AndGroup>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Native sort weight: `1` ascending, `-1` descending.
    #[must_use]
    pub const fn weight(self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }
}

// Only "desc" sorts descending; every other string falls back to ascending.
impl<'de> Deserialize<'de> for Direction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(match raw.as_deref() {
            Some("desc") => Self::Desc,
            _ => Self::Asc,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub attribute: String,
    #[serde(default)]
    pub direction: Direction,
}

impl SortSpec {
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self { attribute: attribute.into(), direction: Direction::Asc }
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self { attribute: attribute.into(), direction: Direction::Desc }
    }
}

/// Inbound request envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub database: String,
    pub collection: String,
    #[serde(default)]
    pub filter: Option<Filter>,
    #[serde(default)]
    pub attributes: Option<Vec<String>>,
    #[serde(default)]
    pub limit: Option<u64>,
    /// 1-based; only meaningful together with `limit`.
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub order: Option<Vec<SortSpec>>,
    #[serde(default)]
    pub search: Option<String>,
}

impl Request {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self { database: database.into(), collection: collection.into(), ..Self::default() }
    }
}

/// Native find options derived from a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeOptions {
    pub projection: Option<Document>,
    pub limit: Option<i64>,
    pub skip: Option<u64>,
    pub sort: Option<Vec<(String, i32)>>,
}

impl NativeOptions {
    /// Sort keys as an ordered native document, primary key first.
    #[must_use]
    pub fn sort_document(&self) -> Option<Document> {
        self.sort.as_ref().map(|keys| {
            let mut doc = Document::new();
            for (attribute, weight) in keys {
                doc.insert(attribute.clone(), *weight);
            }
            doc
        })
    }
}

/// Output of the compiler: native filter plus native options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledQuery {
    pub filter: Document,
    pub options: NativeOptions,
}
