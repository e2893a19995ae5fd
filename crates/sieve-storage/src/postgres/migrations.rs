use sqlx::PgPool;

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS relation_tuples (
            object_type     TEXT NOT NULL,
            object_id       TEXT NOT NULL,
            relation        TEXT NOT NULL,
            subject_type    TEXT NOT NULL,
            subject_id      TEXT NOT NULL,
            context         JSONB,
            created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
            PRIMARY KEY (object_type, object_id, relation, subject_type, subject_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_tuples_reverse
        ON relation_tuples (subject_type, subject_id, relation)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("relation_tuples migrations applied");
    Ok(())
}
