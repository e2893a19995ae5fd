use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::traits::{RelationshipStore, StorageError};
use crate::tuple::{ObjectRef, SubjectRef, Tuple, TupleFilter, TupleWrite};

type TupleKey = (ObjectRef, String, SubjectRef);

/// Relationship store held in process memory. Clones share the same tuples.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tuples: Arc<Mutex<BTreeMap<TupleKey, Option<Value>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<TupleKey, Option<Value>>>, StorageError> {
        self.tuples
            .lock()
            .map_err(|_| StorageError::Internal("in-memory store lock poisoned".to_string()))
    }
}

fn to_tuple(key: &TupleKey, context: &Option<Value>) -> Tuple {
    let (object, relation, subject) = key;
    Tuple {
        object: object.clone(),
        relation: relation.clone(),
        subject: subject.clone(),
        context: context.clone(),
    }
}

impl RelationshipStore for InMemoryStore {
    async fn write(
        &self,
        writes: &[TupleWrite],
        deletes: &[TupleFilter],
    ) -> Result<(), StorageError> {
        if deletes.iter().any(TupleFilter::is_empty) {
            return Err(StorageError::EmptyDeleteFilter);
        }

        let mut tuples = self.lock()?;

        for filter in deletes {
            tuples.retain(|key, context| !filter.matches(&to_tuple(key, context)));
        }

        for w in writes {
            tuples.insert(
                (w.object.clone(), w.relation.clone(), w.subject.clone()),
                w.context.clone(),
            );
        }

        Ok(())
    }

    async fn read(
        &self,
        filter: &TupleFilter,
        limit: Option<usize>,
    ) -> Result<Vec<Tuple>, StorageError> {
        let tuples = self.lock()?;

        let matching = tuples
            .iter()
            .map(|(key, context)| to_tuple(key, context))
            .filter(|t| filter.matches(t));

        Ok(match limit {
            Some(n) => matching.take(n).collect(),
            None => matching.collect(),
        })
    }
}
