use std::collections::HashMap;

use directory::database::{DatabaseError, LabOrder, Result};
use itertools::Itertools;
use model::{lab::Lab, lab_type::LabType, WithId};
use sqlx::{Executor, Postgres};
use utility::{
    id::{Id, IdWrapper},
    let_also::LetAlso,
};

use crate::data_model::{
    lab::LabRow,
    lab_type::{LabTypeLinkRow, LabTypeRow},
    with_id, with_ids, DatabaseRow,
};

use super::convert_error;

// Lab rows

pub async fn get<'c, E>(executor: E, id: &Id<Lab>) -> Result<WithId<Lab>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT id, name, address, latitude, longitude, lab_photo_url,
            head1_name, head1_photo_url, head2_name, head2_photo_url,
            phone, website_url, created_at
        FROM labs
        WHERE id = $1;
        ",
    )
    .bind(id.raw_ref::<str>())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: LabRow| with_id(row))
}

pub async fn get_all<'c, E>(executor: E, order: LabOrder) -> Result<Vec<WithId<Lab>>>
where
    E: Executor<'c, Database = Postgres>,
{
    let query = match order {
        LabOrder::Newest => {
            "
            SELECT id, name, address, latitude, longitude, lab_photo_url,
                head1_name, head1_photo_url, head2_name, head2_photo_url,
                phone, website_url, created_at
            FROM labs
            ORDER BY created_at DESC;
            "
        }
        LabOrder::Name => {
            "
            SELECT id, name, address, latitude, longitude, lab_photo_url,
                head1_name, head1_photo_url, head2_name, head2_photo_url,
                phone, website_url, created_at
            FROM labs
            ORDER BY name, created_at DESC;
            "
        }
    };

    sqlx::query_as(query)
        .fetch_all(executor)
        .await
        .map_err(convert_error)?
        .let_owned(|rows: Vec<LabRow>| Ok(with_ids(rows)))
}

pub async fn insert<'c, E>(executor: E, lab: WithId<Lab>) -> Result<WithId<Lab>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = LabRow::from_model(lab);
    sqlx::query_as(
        "
        INSERT INTO labs(
            id,
            name,
            address,
            latitude,
            longitude,
            lab_photo_url,
            head1_name,
            head1_photo_url,
            head2_name,
            head2_photo_url,
            phone,
            website_url,
            created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING id, name, address, latitude, longitude, lab_photo_url,
            head1_name, head1_photo_url, head2_name, head2_photo_url,
            phone, website_url, created_at;
        ",
    )
    .bind(&row.id)
    .bind(&row.name)
    .bind(&row.address)
    .bind(row.latitude)
    .bind(row.longitude)
    .bind(&row.lab_photo_url)
    .bind(&row.head1_name)
    .bind(&row.head1_photo_url)
    .bind(&row.head2_name)
    .bind(&row.head2_photo_url)
    .bind(&row.phone)
    .bind(&row.website_url)
    .bind(row.created_at)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: LabRow| with_id(row))
}

pub async fn update<'c, E>(executor: E, lab: WithId<Lab>) -> Result<WithId<Lab>>
where
    E: Executor<'c, Database = Postgres>,
{
    let row = LabRow::from_model(lab);
    sqlx::query_as(
        "
        UPDATE labs
        SET name = $1,
            address = $2,
            latitude = $3,
            longitude = $4,
            lab_photo_url = $5,
            head1_name = $6,
            head1_photo_url = $7,
            head2_name = $8,
            head2_photo_url = $9,
            phone = $10,
            website_url = $11
        WHERE id = $12
        RETURNING id, name, address, latitude, longitude, lab_photo_url,
            head1_name, head1_photo_url, head2_name, head2_photo_url,
            phone, website_url, created_at;
        ",
    )
    .bind(&row.name)
    .bind(&row.address)
    .bind(row.latitude)
    .bind(row.longitude)
    .bind(&row.lab_photo_url)
    .bind(&row.head1_name)
    .bind(&row.head1_photo_url)
    .bind(&row.head2_name)
    .bind(&row.head2_photo_url)
    .bind(&row.phone)
    .bind(&row.website_url)
    .bind(&row.id)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: LabRow| with_id(row))
}

pub async fn exists<'c, E>(executor: E, id: &Id<Lab>) -> Result<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM labs WHERE id = $1);")
        .bind(id.raw_ref::<str>())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
}

pub async fn delete<'c, E>(executor: E, id: &Id<Lab>) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM labs WHERE id = $1;")
        .bind(id.raw_ref::<str>())
        .execute(executor)
        .await
        .map_err(convert_error)?;

    if result.rows_affected() == 0 {
        Err(DatabaseError::NotFound)
    } else {
        Ok(())
    }
}

// Type links

pub async fn types_of_lab<'c, E>(
    executor: E,
    id: &Id<Lab>,
) -> Result<Vec<WithId<LabType>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT lab_types.id, lab_types.name
        FROM lab_type_links
        JOIN lab_types ON lab_types.id = lab_type_links.lab_type_id
        WHERE lab_type_links.lab_id = $1
        ORDER BY lab_types.name;
        ",
    )
    .bind(id.raw_ref::<str>())
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<LabTypeRow>| Ok(with_ids(rows)))
}

/// Types of every lab that has at least one, keyed by the raw lab id.
pub async fn types_of_all_labs<'c, E>(
    executor: E,
) -> Result<HashMap<String, Vec<WithId<LabType>>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT lab_type_links.lab_id, lab_types.id, lab_types.name
        FROM lab_type_links
        JOIN lab_types ON lab_types.id = lab_type_links.lab_type_id
        ORDER BY lab_types.name;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<LabTypeLinkRow>| {
        Ok(rows
            .into_iter()
            .map(LabTypeLinkRow::into_pair)
            .into_group_map())
    })
}

pub async fn clear_types<'c, E>(executor: E, id: &Id<Lab>) -> Result<u64>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query("DELETE FROM lab_type_links WHERE lab_id = $1;")
        .bind(id.raw_ref::<str>())
        .execute(executor)
        .await
        .map_err(convert_error)
        .map(|result| result.rows_affected())
}

pub async fn link_types<'c, E>(
    executor: E,
    id: &Id<Lab>,
    types: &[Id<LabType>],
) -> Result<u64>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        INSERT INTO lab_type_links(lab_id, lab_type_id)
        SELECT $1, UNNEST($2::text[])
        ON CONFLICT DO NOTHING;
        ",
    )
    .bind(id.raw_ref::<str>())
    .bind(types.raw())
    .execute(executor)
    .await
    .map_err(|why| match why {
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
            DatabaseError::NotFound
        }
        _ => convert_error(why),
    })
    .map(|result| result.rows_affected())
}
