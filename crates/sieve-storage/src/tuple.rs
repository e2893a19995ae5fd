use std::fmt;

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectRef {
    pub object_type: String,
    pub object_id: String,
}

impl ObjectRef {
    pub fn new(object_type: impl Into<String>, object_id: impl Into<String>) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.object_type, self.object_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubjectRef {
    pub subject_type: String,
    pub subject_id: String,
}

impl SubjectRef {
    pub fn new(subject_type: impl Into<String>, subject_id: impl Into<String>) -> Self {
        Self {
            subject_type: subject_type.into(),
            subject_id: subject_id.into(),
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject_type, self.subject_id)
    }
}

/// `object#relation@subject`, optionally carrying a JSON context document.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    pub object: ObjectRef,
    pub relation: String,
    pub subject: SubjectRef,
    pub context: Option<Value>,
}

impl Tuple {
    pub fn new(object: ObjectRef, relation: impl Into<String>, subject: SubjectRef) -> Self {
        Self {
            object,
            relation: relation.into(),
            subject,
            context: None,
        }
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.object, self.relation, self.subject)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleWrite {
    pub object: ObjectRef,
    pub relation: String,
    pub subject: SubjectRef,
    pub context: Option<Value>,
}

impl TupleWrite {
    pub fn new(object: ObjectRef, relation: impl Into<String>, subject: SubjectRef) -> Self {
        Self {
            object,
            relation: relation.into(),
            subject,
            context: None,
        }
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}

impl From<TupleWrite> for Tuple {
    fn from(write: TupleWrite) -> Self {
        Self {
            object: write.object,
            relation: write.relation,
            subject: write.subject,
            context: write.context,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TupleFilter {
    pub object_type: Option<String>,
    pub object_id: Option<String>,
    pub relation: Option<String>,
    pub subject_type: Option<String>,
    pub subject_id: Option<String>,
}

impl TupleFilter {
    /// Filter matching exactly one tuple key.
    pub fn exact(object: &ObjectRef, relation: &str, subject: &SubjectRef) -> Self {
        Self {
            object_type: Some(object.object_type.clone()),
            object_id: Some(object.object_id.clone()),
            relation: Some(relation.to_string()),
            subject_type: Some(subject.subject_type.clone()),
            subject_id: Some(subject.subject_id.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.object_type.is_none()
            && self.object_id.is_none()
            && self.relation.is_none()
            && self.subject_type.is_none()
            && self.subject_id.is_none()
    }

    pub fn matches(&self, tuple: &Tuple) -> bool {
        if let Some(ref ot) = self.object_type
            && ot != &tuple.object.object_type
        {
            return false;
        }
        if let Some(ref oi) = self.object_id
            && oi != &tuple.object.object_id
        {
            return false;
        }
        if let Some(ref r) = self.relation
            && r != &tuple.relation
        {
            return false;
        }
        if let Some(ref st) = self.subject_type
            && st != &tuple.subject.subject_type
        {
            return false;
        }
        if let Some(ref si) = self.subject_id
            && si != &tuple.subject.subject_id
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn viewer_tuple() -> Tuple {
        Tuple::new(
            ObjectRef::new("row_filter_policy", "prod.public.customers.region"),
            "viewer",
            SubjectRef::new("user", "alice"),
        )
    }

    #[test]
    fn tuple_display_format() {
        assert_eq!(
            viewer_tuple().to_string(),
            "row_filter_policy:prod.public.customers.region#viewer@user:alice"
        );
    }

    #[test]
    fn write_carries_context_into_tuple() {
        let context = json!({"attribute_name": "region", "allowed_values": ["north"]});
        let write = TupleWrite::new(
            ObjectRef::new("row_filter_policy", "p"),
            "viewer",
            SubjectRef::new("user", "alice"),
        )
        .with_context(context.clone());

        let tuple = Tuple::from(write);

        assert_eq!(tuple.context, Some(context));
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = TupleFilter::default();

        assert!(filter.is_empty());
        assert!(filter.matches(&viewer_tuple()));
    }

    #[test]
    fn filter_on_subject_only() {
        let filter = TupleFilter {
            subject_type: Some("user".to_string()),
            subject_id: Some("alice".to_string()),
            ..Default::default()
        };

        assert!(!filter.is_empty());
        assert!(filter.matches(&viewer_tuple()));
    }

    #[test]
    fn filter_rejects_mismatched_relation() {
        let filter = TupleFilter {
            relation: Some("applies_to".to_string()),
            ..Default::default()
        };

        assert!(!filter.matches(&viewer_tuple()));
    }

    #[test]
    fn exact_filter_matches_only_its_key() {
        let tuple = viewer_tuple();
        let filter = TupleFilter::exact(&tuple.object, &tuple.relation, &tuple.subject);
        let other = Tuple::new(
            tuple.object.clone(),
            "viewer",
            SubjectRef::new("user", "bob"),
        );

        assert!(filter.matches(&tuple));
        assert!(!filter.matches(&other));
    }
}
