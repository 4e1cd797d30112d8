use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directory::database::{LabOrder, LabRepo, Result};
use model::{lab::Lab, lab_type::LabType, WithId};
use sqlx::prelude::FromRow;
use utility::id::Id;

use crate::queries::lab::{
    clear_types, delete, exists, get, get_all, insert, link_types, types_of_all_labs,
    types_of_lab, update,
};
use crate::PgDatabaseAutocommit;
use crate::PgDatabaseTransaction;

use super::DatabaseRow;

#[derive(Debug, Clone, FromRow)]
pub struct LabRow {
    pub id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub lab_photo_url: String,
    pub head1_name: Option<String>,
    pub head1_photo_url: Option<String>,
    pub head2_name: Option<String>,
    pub head2_photo_url: Option<String>,
    pub phone: Option<String>,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DatabaseRow for LabRow {
    type Model = Lab;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Self::Model {
        Lab {
            name: self.name,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            lab_photo_url: self.lab_photo_url,
            head1_name: self.head1_name,
            head1_photo_url: self.head1_photo_url,
            head2_name: self.head2_name,
            head2_photo_url: self.head2_photo_url,
            phone: self.phone,
            website_url: self.website_url,
            created_at: self.created_at,
            types: vec![],
        }
    }

    fn from_model(lab: WithId<Lab>) -> Self {
        Self {
            id: lab.id.raw(),
            name: lab.content.name,
            address: lab.content.address,
            latitude: lab.content.latitude,
            longitude: lab.content.longitude,
            lab_photo_url: lab.content.lab_photo_url,
            head1_name: lab.content.head1_name,
            head1_photo_url: lab.content.head1_photo_url,
            head2_name: lab.content.head2_name,
            head2_photo_url: lab.content.head2_photo_url,
            phone: lab.content.phone,
            website_url: lab.content.website_url,
            created_at: lab.content.created_at,
        }
    }
}

fn attach_types(
    labs: Vec<WithId<Lab>>,
    mut types: HashMap<String, Vec<WithId<LabType>>>,
) -> Vec<WithId<Lab>> {
    labs.into_iter()
        .map(|lab| {
            let lab_types = types.remove(lab.id.raw_ref::<str>()).unwrap_or_default();
            lab.map(|lab| lab.with_types(lab_types))
        })
        .collect()
}

#[async_trait]
impl LabRepo for PgDatabaseAutocommit {
    async fn get_lab(&mut self, id: &Id<Lab>) -> Result<WithId<Lab>> {
        let lab = get(&self.pool, id).await?;
        let types = types_of_lab(&self.pool, id).await?;
        Ok(lab.map(|lab| lab.with_types(types)))
    }

    async fn get_labs(&mut self, order: LabOrder) -> Result<Vec<WithId<Lab>>> {
        let labs = get_all(&self.pool, order).await?;
        let types = types_of_all_labs(&self.pool).await?;
        Ok(attach_types(labs, types))
    }

    async fn insert_lab(&mut self, lab: WithId<Lab>) -> Result<WithId<Lab>> {
        insert(&self.pool, lab).await
    }

    async fn update_lab(&mut self, lab: WithId<Lab>) -> Result<WithId<Lab>> {
        update(&self.pool, lab).await
    }

    async fn lab_exists(&mut self, id: &Id<Lab>) -> Result<bool> {
        exists(&self.pool, id).await
    }

    async fn delete_lab(&mut self, id: &Id<Lab>) -> Result<()> {
        delete(&self.pool, id).await
    }

    async fn get_types_of_lab(&mut self, id: &Id<Lab>) -> Result<Vec<WithId<LabType>>> {
        types_of_lab(&self.pool, id).await
    }

    async fn set_lab_types(&mut self, id: &Id<Lab>, types: &[Id<LabType>]) -> Result<()> {
        // not atomic outside of a transaction
        clear_types(&self.pool, id).await?;
        if !types.is_empty() {
            link_types(&self.pool, id, types).await?;
        }
        Ok(())
    }

    async fn clear_lab_types(&mut self, id: &Id<Lab>) -> Result<()> {
        clear_types(&self.pool, id).await.map(|_| ())
    }
}

#[async_trait]
impl<'a> LabRepo for PgDatabaseTransaction<'a> {
    async fn get_lab(&mut self, id: &Id<Lab>) -> Result<WithId<Lab>> {
        let lab = get(&mut *self.tx, id).await?;
        let types = types_of_lab(&mut *self.tx, id).await?;
        Ok(lab.map(|lab| lab.with_types(types)))
    }

    async fn get_labs(&mut self, order: LabOrder) -> Result<Vec<WithId<Lab>>> {
        let labs = get_all(&mut *self.tx, order).await?;
        let types = types_of_all_labs(&mut *self.tx).await?;
        Ok(attach_types(labs, types))
    }

    async fn insert_lab(&mut self, lab: WithId<Lab>) -> Result<WithId<Lab>> {
        insert(&mut *self.tx, lab).await
    }

    async fn update_lab(&mut self, lab: WithId<Lab>) -> Result<WithId<Lab>> {
        update(&mut *self.tx, lab).await
    }

    async fn lab_exists(&mut self, id: &Id<Lab>) -> Result<bool> {
        exists(&mut *self.tx, id).await
    }

    async fn delete_lab(&mut self, id: &Id<Lab>) -> Result<()> {
        delete(&mut *self.tx, id).await
    }

    async fn get_types_of_lab(&mut self, id: &Id<Lab>) -> Result<Vec<WithId<LabType>>> {
        types_of_lab(&mut *self.tx, id).await
    }

    async fn set_lab_types(&mut self, id: &Id<Lab>, types: &[Id<LabType>]) -> Result<()> {
        clear_types(&mut *self.tx, id).await?;
        if !types.is_empty() {
            link_types(&mut *self.tx, id, types).await?;
        }
        Ok(())
    }

    async fn clear_lab_types(&mut self, id: &Id<Lab>) -> Result<()> {
        clear_types(&mut *self.tx, id).await.map(|_| ())
    }
}
