use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::AppError;

pub type Fields = Map<String, Value>;

/// 集合路径，段数为奇数，例如 `decks/{deckId}/cards`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(Vec<String>);

/// 文档路径，段数为偶数
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath(Vec<String>);

impl CollectionPath {
    pub fn root(name: &str) -> Self {
        Self(vec![name.to_string()])
    }

    pub fn doc(&self, id: &str) -> DocumentPath {
        let mut segments = self.0.clone();
        segments.push(id.to_string());
        DocumentPath(segments)
    }
}

impl DocumentPath {
    pub fn collection(&self, name: &str) -> CollectionPath {
        let mut segments = self.0.clone();
        segments.push(name.to_string());
        CollectionPath(segments)
    }

    pub fn id(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or_default()
    }

    pub fn parent(&self) -> CollectionPath {
        CollectionPath(self.0[..self.0.len().saturating_sub(1)].to_vec())
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

pub mod paths {
    use super::{CollectionPath, DocumentPath};

    pub fn decks() -> CollectionPath {
        CollectionPath::root("decks")
    }

    pub fn deck(deck_id: &str) -> DocumentPath {
        decks().doc(deck_id)
    }

    pub fn cards(deck_id: &str) -> CollectionPath {
        deck(deck_id).collection("cards")
    }

    pub fn card(deck_id: &str, card_id: &str) -> DocumentPath {
        cards(deck_id).doc(card_id)
    }

    pub fn logs(deck_id: &str, card_id: &str) -> CollectionPath {
        card(deck_id, card_id).collection("logs")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocumentPath,
    pub fields: Fields,
}

impl Document {
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|source| {
            AppError::Decode {
                path: self.path.to_string(),
                source,
            }
        })
    }
}

/// 将结构体序列化为文档字段
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, serde_json::Error> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            Ok(map)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub equals: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: CollectionPath,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.to_string(),
            equals: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        doc.path.parent() == self.collection
            && self
                .filters
                .iter()
                .all(|f| doc.fields.get(&f.field) == Some(&f.equals))
    }
}

/// 字段值排序：缺失值最小，其次布尔、数字、字符串
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(v: Option<&Value>) -> u8 {
        match v {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
