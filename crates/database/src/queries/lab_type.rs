use directory::database::Result;
use model::{lab_type::LabType, WithId};
use sqlx::{Executor, Postgres};
use utility::{id::Id, let_also::LetAlso};

use crate::data_model::{lab_type::LabTypeRow, with_id, with_ids};

use super::convert_error;

pub async fn get_by_name<'c, E>(
    executor: E,
    name: &str,
) -> Result<Option<WithId<LabType>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT id, name
        FROM lab_types
        WHERE name = $1;
        ",
    )
    .bind(name)
    .fetch_optional(executor)
    .await
    .map_err(convert_error)
    .map(|row: Option<LabTypeRow>| row.map(with_id))
}

/// Inserts the lab type unless one with the same name exists. The no-op
/// update makes `RETURNING` yield the existing row on conflict, also when a
/// concurrent transaction created it first.
pub async fn upsert<'c, E>(executor: E, name: &str) -> Result<WithId<LabType>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        INSERT INTO lab_types(id, name)
        VALUES ($1, $2)
        ON CONFLICT (name)
        DO UPDATE SET name = EXCLUDED.name
        RETURNING id, name;
        ",
    )
    .bind(Id::<LabType>::generate().raw())
    .bind(name)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: LabTypeRow| with_id(row))
}

pub async fn get_all<'c, E>(executor: E) -> Result<Vec<WithId<LabType>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT id, name
        FROM lab_types
        ORDER BY name;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<LabTypeRow>| Ok(with_ids(rows)))
}
