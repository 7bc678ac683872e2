//! ORDER BY / LIMIT assembly for post listings.
//!
//! Column and direction are closed enums, so no caller-supplied text ever
//! reaches the SQL string.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderColumn {
    Id,
    Title,
    CreatedAt,
    UpdatedAt,
}

impl OrderColumn {
    pub fn as_sql(self) -> &'static str {
        match self {
            OrderColumn::Id => "id",
            OrderColumn::Title => "title",
            OrderColumn::CreatedAt => "created_at",
            OrderColumn::UpdatedAt => "updated_at",
        }
    }

    /// Map a known column name; anything else is rejected.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "id" => Some(OrderColumn::Id),
            "title" => Some(OrderColumn::Title),
            "created_at" => Some(OrderColumn::CreatedAt),
            "updated_at" => Some(OrderColumn::UpdatedAt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }

    /// Accepts `asc`/`desc` in any case; anything else is rejected.
    pub fn parse(dir: &str) -> Option<Self> {
        let dir = dir.trim();
        if dir.eq_ignore_ascii_case("asc") {
            Some(OrderDirection::Asc)
        } else if dir.eq_ignore_ascii_case("desc") {
            Some(OrderDirection::Desc)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    pub order: Option<(OrderColumn, OrderDirection)>,
    pub limit: Option<u32>,
}

impl Default for QueryOptions {
    /// Newest first, unbounded.
    fn default() -> Self {
        Self {
            order: Some((OrderColumn::CreatedAt, OrderDirection::Desc)),
            limit: None,
        }
    }
}

impl QueryOptions {
    pub fn unordered() -> Self {
        Self {
            order: None,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_order(mut self, column: OrderColumn, direction: OrderDirection) -> Self {
        self.order = Some((column, direction));
        self
    }

    /// Set the order from untrusted text. Unknown columns or directions
    /// drop the ordering instead of passing the text through.
    pub fn with_order_str(mut self, column: &str, direction: &str) -> Self {
        self.order = OrderColumn::parse(column).zip(OrderDirection::parse(direction));
        self
    }

    /// SQL suffix with a leading space, or an empty string.
    pub fn to_sql(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for QueryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some((column, direction)) = self.order {
            write!(f, " ORDER BY {} {}", column.as_sql(), direction.as_sql())?;
            // equal timestamps still come back in insertion order
            if column != OrderColumn::Id {
                write!(f, ", id {}", direction.as_sql())?;
            }
        }
        if let Some(limit) = self.limit.filter(|n| *n > 0) {
            write!(f, " LIMIT {limit}")?;
        }
        Ok(())
    }
}
