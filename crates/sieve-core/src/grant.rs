use crate::policy::AttributeName;

/// Sentinel value meaning "no restriction for this attribute".
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrantError {
    #[error("allowed_values for attribute '{0}' must not be empty")]
    EmptyValues(AttributeName),
}

/// The values of one attribute a caller may see under one policy.
///
/// Values keep their first-seen order with duplicates removed, so predicates
/// built from the same grant are byte-identical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeGrant {
    attribute_name: AttributeName,
    allowed_values: Vec<String>,
}

impl AttributeGrant {
    pub fn new<I, V>(attribute_name: AttributeName, values: I) -> Result<Self, GrantError>
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let mut allowed_values: Vec<String> = Vec::new();
        for value in values {
            let value = value.into();
            if !allowed_values.contains(&value) {
                allowed_values.push(value);
            }
        }

        if allowed_values.is_empty() {
            return Err(GrantError::EmptyValues(attribute_name));
        }

        Ok(Self {
            attribute_name,
            allowed_values,
        })
    }

    pub fn attribute_name(&self) -> &AttributeName {
        &self.attribute_name
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.allowed_values
    }

    pub fn is_wildcard(&self) -> bool {
        self.allowed_values.iter().any(|v| v == WILDCARD)
    }
}
