//! An in-memory [`Database`], used by the tests of this workspace.
//!
//! A transaction holds the lock on the whole state until it is committed or
//! dropped, so transactions are serialized. Dropping an uncommitted
//! transaction restores the state it started from.

use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use itertools::Itertools;
use model::{lab::Lab, lab_type::LabType, WithId};
use tokio::sync::{Mutex, OwnedMutexGuard};
use utility::id::Id;

use crate::database::{
    Database, DatabaseAutocommit, DatabaseError, DatabaseOperations,
    DatabaseTransaction, LabOrder, LabRepo, LabTypeRepo, Result,
};

#[derive(Debug, Clone, Default)]
struct State {
    labs: Vec<WithId<Lab>>,
    lab_types: Vec<WithId<LabType>>,
    links: Vec<(Id<Lab>, Id<LabType>)>,
}

impl State {
    fn lab_type_by_name(&self, name: &str) -> Option<WithId<LabType>> {
        self.lab_types
            .iter()
            .find(|lab_type| lab_type.content.name == name)
            .cloned()
    }

    fn upsert_lab_type(&mut self, name: &str) -> WithId<LabType> {
        if let Some(existing) = self.lab_type_by_name(name) {
            return existing;
        }
        let created = WithId::new(Id::generate(), LabType::new(name));
        self.lab_types.push(created.clone());
        created
    }

    fn lab_types(&self) -> Vec<WithId<LabType>> {
        self.lab_types
            .iter()
            .cloned()
            .sorted_by(|a, b| a.content.name.cmp(&b.content.name))
            .collect()
    }

    fn types_of_lab(&self, id: &Id<Lab>) -> Vec<WithId<LabType>> {
        self.links
            .iter()
            .filter(|(lab_id, _)| lab_id == id)
            .filter_map(|(_, type_id)| {
                self.lab_types
                    .iter()
                    .find(|lab_type| &lab_type.id == type_id)
                    .cloned()
            })
            .collect()
    }

    fn with_types(&self, lab: &WithId<Lab>) -> WithId<Lab> {
        let types = self.types_of_lab(&lab.id);
        lab.clone().map(|content| content.with_types(types))
    }

    fn get_lab(&self, id: &Id<Lab>) -> Result<WithId<Lab>> {
        self.labs
            .iter()
            .find(|lab| &lab.id == id)
            .map(|lab| self.with_types(lab))
            .ok_or(DatabaseError::NotFound)
    }

    fn get_labs(&self, order: LabOrder) -> Vec<WithId<Lab>> {
        let labs = self.labs.iter().map(|lab| self.with_types(lab));
        match order {
            LabOrder::Newest => labs
                .sorted_by(|a, b| b.content.created_at.cmp(&a.content.created_at))
                .collect(),
            LabOrder::Name => labs
                .sorted_by(|a, b| {
                    a.content
                        .name
                        .cmp(&b.content.name)
                        .then_with(|| b.content.created_at.cmp(&a.content.created_at))
                })
                .collect(),
        }
    }

    fn insert_lab(&mut self, lab: WithId<Lab>) -> Result<WithId<Lab>> {
        if self.labs.iter().any(|existing| existing.id == lab.id) {
            return Err(DatabaseError::Other(Box::new(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("lab {} already exists", lab.id),
            ))));
        }
        let lab = lab.map(|content| content.with_types(vec![]));
        self.labs.push(lab.clone());
        Ok(lab)
    }

    fn update_lab(&mut self, lab: WithId<Lab>) -> Result<WithId<Lab>> {
        let existing = self
            .labs
            .iter_mut()
            .find(|existing| existing.id == lab.id)
            .ok_or(DatabaseError::NotFound)?;
        let created_at = existing.content.created_at;
        *existing = lab.map(|content| Lab {
            created_at,
            types: vec![],
            ..content
        });
        Ok(existing.clone())
    }

    fn delete_lab(&mut self, id: &Id<Lab>) -> Result<()> {
        if self.links.iter().any(|(lab_id, _)| lab_id == id) {
            return Err(DatabaseError::Other(Box::new(io::Error::new(
                io::ErrorKind::Other,
                format!("lab {} is still linked to lab types", id),
            ))));
        }
        let before = self.labs.len();
        self.labs.retain(|lab| &lab.id != id);
        if self.labs.len() == before {
            Err(DatabaseError::NotFound)
        } else {
            Ok(())
        }
    }

    fn set_lab_types(&mut self, id: &Id<Lab>, types: &[Id<LabType>]) -> Result<()> {
        if !self.labs.iter().any(|lab| &lab.id == id) {
            return Err(DatabaseError::NotFound);
        }
        self.links.retain(|(lab_id, _)| lab_id != id);
        for type_id in types.iter().unique() {
            self.links.push((id.clone(), type_id.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<State>>,
    reject_relation_clears: Arc<AtomicBool>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following `clear_lab_types` call fail, to simulate a
    /// store which can not clear the relation.
    pub fn reject_relation_clears(&self, reject: bool) {
        self.reject_relation_clears.store(reject, Ordering::SeqCst);
    }

    fn check_relation_clear(&self) -> Result<()> {
        if self.reject_relation_clears.load(Ordering::SeqCst) {
            Err(DatabaseError::Other(Box::new(io::Error::new(
                io::ErrorKind::Unsupported,
                "clearing lab types is rejected",
            ))))
        } else {
            Ok(())
        }
    }
}

pub struct MemoryTransaction {
    database: MemoryDatabase,
    state: OwnedMutexGuard<State>,
    rollback: Option<State>,
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        if let Some(rollback) = self.rollback.take() {
            *self.state = rollback;
        }
    }
}

pub struct MemoryAutocommit {
    database: MemoryDatabase,
}

#[async_trait]
impl Database for MemoryDatabase {
    type Transaction = MemoryTransaction;
    type Autocommit = MemoryAutocommit;

    async fn transaction(&self) -> Result<Self::Transaction> {
        let state = self.state.clone().lock_owned().await;
        let rollback = Some(state.clone());
        Ok(MemoryTransaction {
            database: self.clone(),
            state,
            rollback,
        })
    }

    fn auto(&self) -> Self::Autocommit {
        MemoryAutocommit {
            database: self.clone(),
        }
    }
}

#[async_trait]
impl DatabaseTransaction for MemoryTransaction {
    async fn commit(mut self) -> Result<()> {
        self.rollback = None;
        Ok(())
    }
}

impl DatabaseOperations for MemoryTransaction {}

impl DatabaseOperations for MemoryAutocommit {}

impl DatabaseAutocommit for MemoryAutocommit {}

// Lab Type Repo

#[async_trait]
impl LabTypeRepo for MemoryAutocommit {
    async fn lab_type_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<WithId<LabType>>> {
        Ok(self.database.state.lock().await.lab_type_by_name(name))
    }

    async fn upsert_lab_type(&mut self, name: &str) -> Result<WithId<LabType>> {
        Ok(self.database.state.lock().await.upsert_lab_type(name))
    }

    async fn lab_types(&mut self) -> Result<Vec<WithId<LabType>>> {
        Ok(self.database.state.lock().await.lab_types())
    }
}

#[async_trait]
impl LabTypeRepo for MemoryTransaction {
    async fn lab_type_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<WithId<LabType>>> {
        Ok(self.state.lab_type_by_name(name))
    }

    async fn upsert_lab_type(&mut self, name: &str) -> Result<WithId<LabType>> {
        Ok(self.state.upsert_lab_type(name))
    }

    async fn lab_types(&mut self) -> Result<Vec<WithId<LabType>>> {
        Ok(self.state.lab_types())
    }
}

// Lab Repo

#[async_trait]
impl LabRepo for MemoryAutocommit {
    async fn get_lab(&mut self, id: &Id<Lab>) -> Result<WithId<Lab>> {
        self.database.state.lock().await.get_lab(id)
    }

    async fn get_labs(&mut self, order: LabOrder) -> Result<Vec<WithId<Lab>>> {
        Ok(self.database.state.lock().await.get_labs(order))
    }

    async fn insert_lab(&mut self, lab: WithId<Lab>) -> Result<WithId<Lab>> {
        self.database.state.lock().await.insert_lab(lab)
    }

    async fn update_lab(&mut self, lab: WithId<Lab>) -> Result<WithId<Lab>> {
        self.database.state.lock().await.update_lab(lab)
    }

    async fn lab_exists(&mut self, id: &Id<Lab>) -> Result<bool> {
        Ok(self.database.state.lock().await.get_lab(id).is_ok())
    }

    async fn delete_lab(&mut self, id: &Id<Lab>) -> Result<()> {
        self.database.state.lock().await.delete_lab(id)
    }

    async fn get_types_of_lab(
        &mut self,
        id: &Id<Lab>,
    ) -> Result<Vec<WithId<LabType>>> {
        Ok(self.database.state.lock().await.types_of_lab(id))
    }

    async fn set_lab_types(
        &mut self,
        id: &Id<Lab>,
        types: &[Id<LabType>],
    ) -> Result<()> {
        self.database.state.lock().await.set_lab_types(id, types)
    }

    async fn clear_lab_types(&mut self, id: &Id<Lab>) -> Result<()> {
        self.database.check_relation_clear()?;
        self.database.state.lock().await.set_lab_types(id, &[])
    }
}

#[async_trait]
impl LabRepo for MemoryTransaction {
    async fn get_lab(&mut self, id: &Id<Lab>) -> Result<WithId<Lab>> {
        self.state.get_lab(id)
    }

    async fn get_labs(&mut self, order: LabOrder) -> Result<Vec<WithId<Lab>>> {
        Ok(self.state.get_labs(order))
    }

    async fn insert_lab(&mut self, lab: WithId<Lab>) -> Result<WithId<Lab>> {
        self.state.insert_lab(lab)
    }

    async fn update_lab(&mut self, lab: WithId<Lab>) -> Result<WithId<Lab>> {
        self.state.update_lab(lab)
    }

    async fn lab_exists(&mut self, id: &Id<Lab>) -> Result<bool> {
        Ok(self.state.get_lab(id).is_ok())
    }

    async fn delete_lab(&mut self, id: &Id<Lab>) -> Result<()> {
        self.state.delete_lab(id)
    }

    async fn get_types_of_lab(
        &mut self,
        id: &Id<Lab>,
    ) -> Result<Vec<WithId<LabType>>> {
        Ok(self.state.types_of_lab(id))
    }

    async fn set_lab_types(
        &mut self,
        id: &Id<Lab>,
        types: &[Id<LabType>],
    ) -> Result<()> {
        self.state.set_lab_types(id, types)
    }

    async fn clear_lab_types(&mut self, id: &Id<Lab>) -> Result<()> {
        self.database.check_relation_clear()?;
        self.state.set_lab_types(id, &[])
    }
}
