//! Resolved table schema: the ordered list of fields actually present.
//!
//! The first name is always the index (timestamp) field. Every other field
//! carries a role. OHLCV roles are matched case-insensitively by exact name
//! and keep their source spelling.

use serde::{Deserialize, Serialize};

/// What a column means once the ingester has recognized it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldRole {
    Open,
    High,
    Low,
    Close,
    Volume,
    /// Any other numeric column (moving averages, open interest, ...).
    Extra,
}

impl FieldRole {
    pub const PRICES: [FieldRole; 4] = [
        FieldRole::Open,
        FieldRole::High,
        FieldRole::Low,
        FieldRole::Close,
    ];

    /// Role for a column name. Unknown names are `Extra`.
    pub fn recognize(name: &str) -> FieldRole {
        let name = name.trim();
        if name.eq_ignore_ascii_case("open") {
            FieldRole::Open
        } else if name.eq_ignore_ascii_case("high") {
            FieldRole::High
        } else if name.eq_ignore_ascii_case("low") {
            FieldRole::Low
        } else if name.eq_ignore_ascii_case("close") {
            FieldRole::Close
        } else if name.eq_ignore_ascii_case("volume") {
            FieldRole::Volume
        } else {
            FieldRole::Extra
        }
    }
}

/// A non-index field of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub role: FieldRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    index: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Build a schema from the index name and the remaining column names in
    /// source order. Only the first column of each OHLCV role gets the role;
    /// repeats are carried as extras.
    pub fn from_columns<I, S>(index: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields: Vec<Field> = Vec::new();
        for name in columns {
            let name = name.into();
            let mut role = FieldRole::recognize(&name);
            if role != FieldRole::Extra && fields.iter().any(|f| f.role == role) {
                role = FieldRole::Extra;
            }
            fields.push(Field { name, role });
        }
        Self {
            index: index.into(),
            fields,
        }
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    /// Non-index fields in order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// All field names, index first.
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(self.index.as_str())
            .chain(self.fields.iter().map(|f| f.name.as_str()))
            .collect()
    }

    pub fn has(&self, role: FieldRole) -> bool {
        role != FieldRole::Extra && self.fields.iter().any(|f| f.role == role)
    }

    /// Source name of the column holding `role`.
    pub fn name_of(&self, role: FieldRole) -> Option<&str> {
        if role == FieldRole::Extra {
            return None;
        }
        self.fields
            .iter()
            .find(|f| f.role == role)
            .map(|f| f.name.as_str())
    }

    pub fn extra_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.role == FieldRole::Extra)
            .map(|f| f.name.as_str())
    }

    pub fn extra_count(&self) -> usize {
        self.extra_fields().count()
    }

    /// Position of an extra field among the extras (exact name match).
    pub fn extra_position(&self, name: &str) -> Option<usize> {
        self.extra_fields().position(|n| n == name)
    }
}
