use async_trait::async_trait;
use directory::database::{LabTypeRepo, Result};
use model::{lab_type::LabType, WithId};
use sqlx::prelude::FromRow;
use utility::id::Id;

use crate::queries::lab_type::{get_all, get_by_name, upsert};
use crate::PgDatabaseAutocommit;
use crate::PgDatabaseTransaction;

use super::{with_id, DatabaseRow};

#[derive(Debug, Clone, FromRow)]
pub struct LabTypeRow {
    pub id: String,
    pub name: String,
}

impl DatabaseRow for LabTypeRow {
    type Model = LabType;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id.clone())
    }

    fn to_model(self) -> Self::Model {
        LabType { name: self.name }
    }

    fn from_model(lab_type: WithId<LabType>) -> Self {
        Self {
            id: lab_type.id.raw(),
            name: lab_type.content.name,
        }
    }
}

/// A lab type joined with the id of a lab it is linked to.
#[derive(Debug, Clone, FromRow)]
pub struct LabTypeLinkRow {
    pub lab_id: String,
    pub id: String,
    pub name: String,
}

impl LabTypeLinkRow {
    pub fn into_pair(self) -> (String, WithId<LabType>) {
        let lab_type = LabTypeRow {
            id: self.id,
            name: self.name,
        };
        (self.lab_id, with_id(lab_type))
    }
}

#[async_trait]
impl LabTypeRepo for PgDatabaseAutocommit {
    async fn lab_type_by_name(&mut self, name: &str) -> Result<Option<WithId<LabType>>> {
        get_by_name(&self.pool, name).await
    }

    async fn upsert_lab_type(&mut self, name: &str) -> Result<WithId<LabType>> {
        upsert(&self.pool, name).await
    }

    async fn lab_types(&mut self) -> Result<Vec<WithId<LabType>>> {
        get_all(&self.pool).await
    }
}

#[async_trait]
impl<'a> LabTypeRepo for PgDatabaseTransaction<'a> {
    async fn lab_type_by_name(&mut self, name: &str) -> Result<Option<WithId<LabType>>> {
        get_by_name(&mut *self.tx, name).await
    }

    async fn upsert_lab_type(&mut self, name: &str) -> Result<WithId<LabType>> {
        upsert(&mut *self.tx, name).await
    }

    async fn lab_types(&mut self) -> Result<Vec<WithId<LabType>>> {
        get_all(&mut *self.tx).await
    }
}
