use chrono::Utc;
use model::{
    lab::{Lab, LabPayload},
    lab_type::LabType,
    WithId,
};
use utility::id::Id;

use crate::{
    database::{Database, DatabaseTransaction, LabOrder, LabRepo, LabTypeRepo},
    reconcile::reconcile,
    validate::{validate, ValidLab},
    Admin, RequestError, RequestResult,
};

/// Create, read, update and delete operations on labs.
///
/// Writes take an [`Admin`] capability. Reads are public.
#[derive(Debug, Clone)]
pub struct Client<D>
where
    D: Database,
{
    pub database: D,
}

impl<D> Client<D>
where
    D: Database,
{
    pub fn new(database: D) -> Self {
        Self { database }
    }
}

// read

impl<D> Client<D>
where
    D: Database,
{
    pub async fn get_lab(&self, id: Id<Lab>) -> RequestResult<WithId<Lab>> {
        Ok(self.database.auto().get_lab(&id).await?)
    }

    /// All labs, most recently created first.
    pub async fn get_labs_for_admin(&self) -> RequestResult<Vec<WithId<Lab>>> {
        Ok(self.database.auto().get_labs(LabOrder::Newest).await?)
    }

    /// All labs sorted by name, as shown on the public map.
    pub async fn get_labs_for_map(&self) -> RequestResult<Vec<WithId<Lab>>> {
        Ok(self.database.auto().get_labs(LabOrder::Name).await?)
    }

    pub async fn get_lab_types(&self) -> RequestResult<Vec<WithId<LabType>>> {
        Ok(self.database.auto().lab_types().await?)
    }
}

// write

impl<D> Client<D>
where
    D: Database,
{
    /// Validates the payload, inserts the lab and links it to the requested
    /// lab types, all within one transaction.
    pub async fn create_lab(
        &self,
        admin: &Admin,
        payload: LabPayload,
    ) -> RequestResult<WithId<Lab>> {
        let ValidLab { lab, type_names } = validate(payload, Utc::now())?;

        let mut tx = self.database.transaction().await?;
        let created = tx.insert_lab(WithId::new(Id::generate(), lab)).await?;
        let types = reconcile(&mut tx, &created.id, &type_names).await?;
        tx.commit().await?;

        log::info!(
            "{} created lab {} ({}) with {} type(s)",
            admin.name(),
            created.id,
            created.content.name,
            types.len()
        );
        Ok(created.map(|lab| lab.with_types(types)))
    }

    /// Overwrites every field of the lab with the payload and replaces its
    /// types with exactly the requested ones.
    pub async fn update_lab(
        &self,
        admin: &Admin,
        id: Id<Lab>,
        payload: LabPayload,
    ) -> RequestResult<WithId<Lab>> {
        let ValidLab { lab, type_names } = validate(payload, Utc::now())?;

        let mut tx = self.database.transaction().await?;
        let updated = tx.update_lab(WithId::new(id, lab)).await?;
        let types = reconcile(&mut tx, &updated.id, &type_names).await?;
        tx.commit().await?;

        log::info!(
            "{} updated lab {} ({})",
            admin.name(),
            updated.id,
            updated.content.name
        );
        Ok(updated.map(|lab| lab.with_types(types)))
    }

    /// Deletes a lab. Its type links are removed first; if that fails the
    /// failure is logged and the deletion is attempted anyway.
    pub async fn delete_lab(&self, admin: &Admin, id: Id<Lab>) -> RequestResult<()> {
        let mut db = self.database.auto();
        if !db.lab_exists(&id).await? {
            return Err(RequestError::NotFound);
        }

        if let Err(why) = db.clear_lab_types(&id).await {
            log::warn!(
                "could not clear the types of lab {} before deleting it: {}",
                id,
                why
            );
        }

        db.delete_lab(&id).await?;
        log::info!("{} deleted lab {}", admin.name(), id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, time::Duration};

    use super::*;
    use crate::{memory::MemoryDatabase, ValidationError};

    fn client() -> Client<MemoryDatabase> {
        Client::new(MemoryDatabase::new())
    }

    fn admin() -> Admin {
        Admin::verified("admin")
    }

    fn payload(name: &str) -> LabPayload {
        LabPayload::new(name, "Jl. Pasteur No. 1", -6.9, 107.6)
    }

    fn names(lab: &WithId<Lab>) -> HashSet<String> {
        lab.content
            .type_names()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    #[tokio::test]
    async fn create_dedupes_requested_types() {
        let client = client();
        let lab = client
            .create_lab(
                &admin(),
                payload("Lab A").with_types(["BLUD", "BLUD", "LABKESMAS"]),
            )
            .await
            .unwrap();

        assert_eq!(lab.content.types.len(), 2);
        assert_eq!(
            names(&lab),
            HashSet::from(["BLUD".to_owned(), "LABKESMAS".to_owned()])
        );
        assert_eq!(client.get_lab_types().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn create_without_types() {
        let client = client();
        let lab = client
            .create_lab(&admin(), payload("Lab A"))
            .await
            .unwrap();

        assert!(lab.content.types.is_empty());
        let stored = client.get_lab(lab.id.clone()).await.unwrap();
        assert!(stored.content.types.is_empty());
    }

    #[tokio::test]
    async fn labs_share_one_type_row() {
        let client = client();
        let a = client
            .create_lab(&admin(), payload("Lab A").with_types(["RS"]))
            .await
            .unwrap();
        let b = client
            .create_lab(&admin(), payload("Lab B").with_types(["RS"]))
            .await
            .unwrap();

        assert_eq!(a.content.types[0].id, b.content.types[0].id);
        assert_eq!(client.get_lab_types().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_replaces_types_and_keeps_orphans() {
        let client = client();
        let lab = client
            .create_lab(&admin(), payload("Lab A").with_types(["BLUD"]))
            .await
            .unwrap();

        let updated = client
            .update_lab(
                &admin(),
                lab.id.clone(),
                payload("Lab A").with_types(["LABKESMAS"]),
            )
            .await
            .unwrap();

        assert_eq!(names(&updated), HashSet::from(["LABKESMAS".to_owned()]));
        let stored = client.get_lab(lab.id).await.unwrap();
        assert_eq!(names(&stored), HashSet::from(["LABKESMAS".to_owned()]));

        let all_types = client.get_lab_types().await.unwrap();
        assert!(all_types.iter().any(|t| t.content.name == "BLUD"));
    }

    #[tokio::test]
    async fn update_overwrites_scalar_fields() {
        let client = client();
        let lab = client
            .create_lab(
                &admin(),
                LabPayload {
                    phone: Some("022 123".to_owned()),
                    ..payload("Lab A")
                },
            )
            .await
            .unwrap();

        let updated = client
            .update_lab(&admin(), lab.id.clone(), payload("Lab A2"))
            .await
            .unwrap();

        assert_eq!(updated.content.name, "Lab A2");
        assert_eq!(updated.content.phone, None);
        assert_eq!(updated.content.created_at, lab.content.created_at);
    }

    #[tokio::test]
    async fn invalid_payload_persists_nothing() {
        let client = client();
        let invalid = [
            LabPayload {
                name: Some(String::new()),
                ..payload("x")
            },
            LabPayload {
                address: Some(String::new()),
                ..payload("x")
            },
            LabPayload {
                latitude: Some(f64::NAN),
                ..payload("x")
            },
            LabPayload {
                longitude: None,
                ..payload("x")
            },
        ];

        for payload in invalid {
            let result = client
                .create_lab(&admin(), payload.with_types(["RS"]))
                .await;
            assert!(matches!(result, Err(RequestError::Validation(_))));
        }

        assert!(client.get_labs_for_admin().await.unwrap().is_empty());
        assert!(client.get_lab_types().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_update_changes_nothing() {
        let client = client();
        let lab = client
            .create_lab(&admin(), payload("Lab A").with_types(["RS"]))
            .await
            .unwrap();

        let result = client
            .update_lab(
                &admin(),
                lab.id.clone(),
                LabPayload {
                    address: None,
                    ..payload("Lab B")
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(RequestError::Validation(ValidationError::MissingAddress))
        ));

        let stored = client.get_lab(lab.id).await.unwrap();
        assert_eq!(stored.content.name, "Lab A");
        assert_eq!(names(&stored), HashSet::from(["RS".to_owned()]));
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let client = client();
        let unknown: Id<Lab> = Id::generate();

        assert!(matches!(
            client
                .update_lab(&admin(), unknown.clone(), payload("Lab"))
                .await,
            Err(RequestError::NotFound)
        ));
        assert!(matches!(
            client.delete_lab(&admin(), unknown.clone()).await,
            Err(RequestError::NotFound)
        ));
        assert!(matches!(
            client.get_lab(unknown).await,
            Err(RequestError::NotFound)
        ));
        assert!(client.get_lab_types().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleted_lab_is_gone() {
        let client = client();
        let lab = client
            .create_lab(&admin(), payload("Lab A").with_types(["RS"]))
            .await
            .unwrap();

        client.delete_lab(&admin(), lab.id.clone()).await.unwrap();

        assert!(matches!(
            client.get_lab(lab.id).await,
            Err(RequestError::NotFound)
        ));
        assert!(client.get_labs_for_map().await.unwrap().is_empty());
        assert_eq!(client.get_lab_types().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn failing_relation_clear_is_tolerated() {
        let database = MemoryDatabase::new();
        let client = Client::new(database.clone());
        let lab = client
            .create_lab(&admin(), payload("Lab A"))
            .await
            .unwrap();

        database.reject_relation_clears(true);
        client.delete_lab(&admin(), lab.id.clone()).await.unwrap();

        assert!(client.get_labs_for_admin().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_relation_clear_still_protects_linked_rows() {
        let database = MemoryDatabase::new();
        let client = Client::new(database.clone());
        let lab = client
            .create_lab(&admin(), payload("Lab A").with_types(["RS"]))
            .await
            .unwrap();

        database.reject_relation_clears(true);
        let result = client.delete_lab(&admin(), lab.id.clone()).await;

        assert!(matches!(result, Err(RequestError::Other(_))));
        assert!(client.get_lab(lab.id).await.is_ok());
    }

    #[tokio::test]
    async fn listings_have_their_own_order() {
        let client = client();
        for name in ["Labkesda Bekasi", "Labkesda Cimahi", "Labkesda Banten"] {
            client.create_lab(&admin(), payload(name)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let map = client.get_labs_for_map().await.unwrap();
        let map_names: Vec<_> = map.iter().map(|lab| lab.content.name.as_str()).collect();
        assert_eq!(
            map_names,
            vec!["Labkesda Banten", "Labkesda Bekasi", "Labkesda Cimahi"]
        );

        let admin_list = client.get_labs_for_admin().await.unwrap();
        let admin_names: Vec<_> = admin_list
            .iter()
            .map(|lab| lab.content.name.as_str())
            .collect();
        assert_eq!(
            admin_names,
            vec!["Labkesda Banten", "Labkesda Cimahi", "Labkesda Bekasi"]
        );
    }
}
