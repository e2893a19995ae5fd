use serde_json::Value;

use crate::traits::StorageError;
use crate::tuple::{ObjectRef, SubjectRef, Tuple, TupleFilter, TupleWrite};

pub(crate) fn to_storage_error(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Unavailable(e.to_string())
        }
        other => StorageError::Internal(other.to_string()),
    }
}

/// Appends one `column = $n` condition per set filter field, numbering
/// placeholders from `first_bind`.
fn filter_conditions<'f>(
    filter: &'f TupleFilter,
    first_bind: usize,
) -> (Vec<String>, Vec<&'f str>) {
    let fields = [
        ("object_type", &filter.object_type),
        ("object_id", &filter.object_id),
        ("relation", &filter.relation),
        ("subject_type", &filter.subject_type),
        ("subject_id", &filter.subject_id),
    ];

    let mut conditions = Vec::new();
    let mut binds = Vec::new();
    for (column, value) in fields {
        if let Some(value) = value {
            conditions.push(format!("{column} = ${}", first_bind + binds.len()));
            binds.push(value.as_str());
        }
    }
    (conditions, binds)
}

pub async fn upsert_tuple<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    write: &TupleWrite,
) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        INSERT INTO relation_tuples
            (object_type, object_id, relation, subject_type, subject_id, context)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (object_type, object_id, relation, subject_type, subject_id)
        DO UPDATE SET context = EXCLUDED.context, updated_at = now()
        "#,
    )
    .bind(&write.object.object_type)
    .bind(&write.object.object_id)
    .bind(&write.relation)
    .bind(&write.subject.subject_type)
    .bind(&write.subject.subject_id)
    .bind(write.context.clone())
    .execute(executor)
    .await
    .map_err(to_storage_error)?;
    Ok(())
}

pub async fn delete_matching_tuples<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    filter: &TupleFilter,
) -> Result<u64, StorageError> {
    let (conditions, binds) = filter_conditions(filter, 1);
    if conditions.is_empty() {
        return Err(StorageError::EmptyDeleteFilter);
    }

    let query = format!(
        "DELETE FROM relation_tuples WHERE {}",
        conditions.join(" AND ")
    );

    let mut q = sqlx::query(&query);
    for bind in binds {
        q = q.bind(bind);
    }
    let result = q.execute(executor).await.map_err(to_storage_error)?;
    Ok(result.rows_affected())
}

pub async fn read_tuples<'e>(
    executor: impl sqlx::PgExecutor<'e>,
    filter: &TupleFilter,
    limit: Option<usize>,
) -> Result<Vec<Tuple>, StorageError> {
    let (conditions, binds) = filter_conditions(filter, 1);

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let limit_clause = match limit {
        Some(n) => format!(" LIMIT {n}"),
        None => String::new(),
    };
    let query = format!(
        r#"SELECT object_type, object_id, relation, subject_type, subject_id, context
           FROM relation_tuples{where_clause}
           ORDER BY object_type, object_id, relation, subject_type, subject_id{limit_clause}"#
    );

    let mut q =
        sqlx::query_as::<_, (String, String, String, String, String, Option<Value>)>(&query);
    for bind in binds {
        q = q.bind(bind);
    }

    let rows = q.fetch_all(executor).await.map_err(to_storage_error)?;

    let tuples = rows
        .into_iter()
        .map(
            |(object_type, object_id, relation, subject_type, subject_id, context)| Tuple {
                object: ObjectRef::new(object_type, object_id),
                relation,
                subject: SubjectRef::new(subject_type, subject_id),
                context,
            },
        )
        .collect();

    Ok(tuples)
}
