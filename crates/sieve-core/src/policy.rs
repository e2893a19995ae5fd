use std::fmt;

use crate::resource::{IdentifierError, TableRef};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyIdError {
    #[error("malformed policy id '{0}': expected catalog.schema.table.attribute")]
    Malformed(String),
}

/// A filter attribute. It is embedded unquoted as the column of the generated
/// `IN` clause, so only plain SQL identifiers are accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttributeName(String);

impl AttributeName {
    pub fn new(name: impl Into<String>) -> Result<Self, IdentifierError> {
        let name = name.into();
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return Err(IdentifierError::Empty { kind: "attribute" });
        };
        let valid = (first.is_ascii_alphabetic() || first == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(IdentifierError::InvalidCharacter {
                kind: "attribute",
                value: name,
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttributeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a row-filter policy, `catalog.schema.table.attribute`.
///
/// Values read back from the store are wrapped with [`PolicyId::from_raw`]
/// without validation; use [`parse_attribute`] or [`parse_policy_id`] to check
/// their shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PolicyId(String);

impl PolicyId {
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn derive_policy_id(table: &TableRef, attribute: &AttributeName) -> PolicyId {
    PolicyId(format!("{table}.{attribute}"))
}

pub fn parse_policy_id(policy_id: &PolicyId) -> Result<(TableRef, AttributeName), PolicyIdError> {
    let malformed = || PolicyIdError::Malformed(policy_id.0.clone());

    let parts: Vec<&str> = policy_id.0.split('.').collect();
    let [catalog, schema, table, attribute] = parts.as_slice() else {
        return Err(malformed());
    };

    let table = TableRef::new(*catalog, *schema, *table).map_err(|_| malformed())?;
    let attribute = AttributeName::new(*attribute).map_err(|_| malformed())?;
    Ok((table, attribute))
}

pub fn parse_attribute(policy_id: &PolicyId) -> Result<AttributeName, PolicyIdError> {
    parse_policy_id(policy_id).map(|(_, attribute)| attribute)
}
