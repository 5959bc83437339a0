use serde_json::{Map, Value};

/// Direction of a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One sort key, parsed from `"field"`, `"+field"` or `"-field"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn parse(spec: &str) -> Self {
        let order = if spec.starts_with('-') {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        };
        Self {
            field: spec.trim_matches(|c| c == '+' || c == '-').to_string(),
            order,
        }
    }

    /// `{field: "asc" | "desc"}`
    pub fn compile(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.field.clone(), Value::from(self.order.as_str()));
        Value::Object(map)
    }
}
