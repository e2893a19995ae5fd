use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("{kind} must not be empty")]
    Empty { kind: &'static str },

    #[error("{kind} '{value}' contains an invalid character")]
    InvalidCharacter { kind: &'static str, value: String },

    #[error("'{value}' must have {expected} dot-separated parts, found {found}")]
    WrongArity {
        value: String,
        expected: usize,
        found: usize,
    },
}

/// Accepts ASCII letters, digits, `_`, `-` and `$`. The `.` separator used by
/// [`TableRef`] and [`ColumnRef`] can therefore never appear in a component.
pub(crate) fn validate_component(kind: &'static str, value: &str) -> Result<(), IdentifierError> {
    if value.is_empty() {
        return Err(IdentifierError::Empty { kind });
    }
    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '$'));
    if !valid {
        return Err(IdentifierError::InvalidCharacter {
            kind,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallerId(String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(IdentifierError::Empty { kind: "caller" });
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(IdentifierError::InvalidCharacter {
                kind: "caller",
                value: id,
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableRef {
    catalog: String,
    schema: String,
    table: String,
}

impl TableRef {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Result<Self, IdentifierError> {
        let (catalog, schema, table) = (catalog.into(), schema.into(), table.into());
        validate_component("catalog", &catalog)?;
        validate_component("schema", &schema)?;
        validate_component("table", &table)?;
        Ok(Self {
            catalog,
            schema,
            table,
        })
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self, column: impl Into<String>) -> Result<ColumnRef, IdentifierError> {
        ColumnRef::new(self.clone(), column)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.catalog, self.schema, self.table)
    }
}

impl FromStr for TableRef {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [catalog, schema, table] => TableRef::new(*catalog, *schema, *table),
            _ => Err(IdentifierError::WrongArity {
                value: s.to_string(),
                expected: 3,
                found: parts.len(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnRef {
    table: TableRef,
    column: String,
}

impl ColumnRef {
    pub fn new(table: TableRef, column: impl Into<String>) -> Result<Self, IdentifierError> {
        let column = column.into();
        validate_component("column", &column)?;
        Ok(Self { table, column })
    }

    pub fn table(&self) -> &TableRef {
        &self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn belongs_to(&self, table: &TableRef) -> bool {
        &self.table == table
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

impl FromStr for ColumnRef {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [catalog, schema, table, column] => {
                ColumnRef::new(TableRef::new(*catalog, *schema, *table)?, *column)
            }
            _ => Err(IdentifierError::WrongArity {
                value: s.to_string(),
                expected: 4,
                found: parts.len(),
            }),
        }
    }
}
