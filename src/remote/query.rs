use crate::core::EntityId;
use serde_json::Value;

/// Cardinality of an embedded relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedKind {
    /// `local_key` on the parent row points at `foreign_key` of one related row.
    One,
    /// Related rows carry the parent's `id` in `foreign_key`.
    Many,
}

/// A related collection joined into each returned row under `alias`.
#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub alias: String,
    pub collection: String,
    pub kind: EmbedKind,
    /// Parent column holding the reference (used by `One`).
    pub local_key: String,
    /// Column on the related collection matched against the parent.
    pub foreign_key: String,
    pub columns: Vec<String>,
}

impl Embed {
    /// `alias:local_key(..)`, e.g. the profile behind `orders.user_id`.
    pub fn one(alias: &str, collection: &str, local_key: &str) -> Self {
        Self {
            alias: alias.to_string(),
            collection: collection.to_string(),
            kind: EmbedKind::One,
            local_key: local_key.to_string(),
            foreign_key: "id".to_string(),
            columns: Vec::new(),
        }
    }

    /// `alias:collection(..)`, e.g. the line items of an order.
    pub fn many(alias: &str, collection: &str, foreign_key: &str) -> Self {
        Self {
            alias: alias.to_string(),
            collection: collection.to_string(),
            kind: EmbedKind::Many,
            local_key: "id".to_string(),
            foreign_key: foreign_key.to_string(),
            columns: Vec::new(),
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    fn render(&self) -> String {
        let columns = render_columns(&self.columns);
        match self.kind {
            EmbedKind::One => format!("{}:{}({})", self.alias, self.local_key, columns),
            EmbedKind::Many => format!("{}:{}({})", self.alias, self.collection, columns),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

/// Read request against one named collection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    pub collection: String,
    pub columns: Vec<String>,
    pub embeds: Vec<Embed>,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    pub fn from(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            columns: Vec::new(),
            embeds: Vec::new(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            column: column.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn eq_id(self, id: &EntityId) -> Self {
        self.eq("id", id.to_value())
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            descending: true,
        });
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.order = Some(OrderBy {
            column: column.to_string(),
            descending: false,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The `select=` expression in the REST dialect: columns then embeds.
    pub fn render_select(&self) -> String {
        let mut parts = vec![render_columns(&self.columns)];
        parts.extend(self.embeds.iter().map(Embed::render));
        parts.join(",")
    }

    /// Human-readable filter description, used in `NotFound` errors.
    pub fn describe_filters(&self) -> String {
        if self.filters.is_empty() {
            return "(no filter)".to_string();
        }
        self.filters
            .iter()
            .map(|f| format!("{} = {}", f.column, render_value(&f.value)))
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

fn render_columns(columns: &[String]) -> String {
    if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(",")
    }
}

/// Filter values as they appear in `column=eq.<value>` parameters.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
