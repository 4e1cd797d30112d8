use itertools::Itertools;
use model::{lab::Lab, lab_type::LabType, WithId};
use utility::id::Id;

use crate::database::{LabRepo, LabTypeRepo, Result};

/// Trims the requested names, drops blank ones and removes duplicates while
/// keeping the order of first occurrence. Names are case-sensitive.
pub fn distinct_names<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    names
        .iter()
        .map(|name| name.as_ref().trim())
        .filter(|name| !name.is_empty())
        .unique()
        .map(str::to_owned)
        .collect()
}

/// Makes the types of `lab` exactly the lab types named in `names`.
///
/// Every distinct name is resolved to a lab type, creating the ones that do
/// not exist yet. Afterwards all links of the lab are replaced by links to
/// the resolved types. Running it twice with the same names yields the same
/// state, so a caller can simply retry after a failure.
///
/// Names are upserted in sorted order, so concurrent calls lock the rows of
/// shared lab types in the same order. The result is sorted by name.
///
/// Lab types that lose their last link are kept.
pub async fn reconcile<R, S>(
    repo: &mut R,
    lab: &Id<Lab>,
    names: &[S],
) -> Result<Vec<WithId<LabType>>>
where
    R: LabRepo + LabTypeRepo + Send + ?Sized,
    S: AsRef<str>,
{
    let names = distinct_names(names);
    if !names.is_empty() {
        log::debug!("resolving lab types {:?} for lab {}", names, lab);
    }

    let mut resolved = Vec::with_capacity(names.len());
    for name in names.iter().sorted() {
        resolved.push(repo.upsert_lab_type(name).await?);
    }

    let ids = resolved
        .iter()
        .map(|lab_type| lab_type.id.clone())
        .collect::<Vec<_>>();
    repo.set_lab_types(lab, &ids).await?;

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use model::{lab::LabPayload, WithId};
    use utility::id::Id;

    use super::*;
    use crate::{
        database::{Database, LabRepo},
        memory::MemoryDatabase,
        validate::validate,
    };

    async fn lab_in(database: &MemoryDatabase) -> Id<Lab> {
        let lab = validate(LabPayload::new("Lab", "Street 1", 0.0, 0.0), chrono::Utc::now())
            .unwrap()
            .lab;
        database
            .auto()
            .insert_lab(WithId::new(Id::generate(), lab))
            .await
            .unwrap()
            .id
    }

    #[test]
    fn distinct_names_dedupes_trims_and_keeps_order() {
        let names = distinct_names(&["BLUD", " LABKESMAS ", "BLUD", "", "  ", "blud"]);
        assert_eq!(names, vec!["BLUD", "LABKESMAS", "blud"]);
    }

    #[tokio::test]
    async fn duplicates_resolve_to_one_type() {
        let database = MemoryDatabase::new();
        let lab = lab_in(&database).await;

        let mut auto = database.auto();
        let types = reconcile(&mut auto, &lab, &["BLUD", "BLUD", "LABKESMAS"])
            .await
            .unwrap();

        assert_eq!(types.len(), 2);
        assert_eq!(auto.lab_types().await.unwrap().len(), 2);
        assert_eq!(auto.get_types_of_lab(&lab).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn replaces_previous_links_and_keeps_orphans() {
        let database = MemoryDatabase::new();
        let lab = lab_in(&database).await;
        let mut auto = database.auto();

        reconcile(&mut auto, &lab, &["BLUD"]).await.unwrap();
        reconcile(&mut auto, &lab, &["LABKESMAS"]).await.unwrap();

        let linked = auto.get_types_of_lab(&lab).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].content.name, "LABKESMAS");
        assert!(auto.lab_type_by_name("BLUD").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_names_clear_the_relation() {
        let database = MemoryDatabase::new();
        let lab = lab_in(&database).await;
        let mut auto = database.auto();

        reconcile(&mut auto, &lab, &["RS"]).await.unwrap();
        let types = reconcile::<_, &str>(&mut auto, &lab, &[]).await.unwrap();

        assert!(types.is_empty());
        assert!(auto.get_types_of_lab(&lab).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn existing_types_keep_their_id() {
        let database = MemoryDatabase::new();
        let first = lab_in(&database).await;
        let second = lab_in(&database).await;
        let mut auto = database.auto();

        let a = reconcile(&mut auto, &first, &["RS"]).await.unwrap();
        let b = reconcile(&mut auto, &second, &["RS"]).await.unwrap();

        assert_eq!(a[0].id, b[0].id);
        assert_eq!(auto.lab_types().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resolves_in_name_order_regardless_of_request_order() {
        let database = MemoryDatabase::new();
        let first = lab_in(&database).await;
        let second = lab_in(&database).await;
        let mut auto = database.auto();

        let a = reconcile(&mut auto, &first, &["RS", "BLUD", "LABKESMAS"])
            .await
            .unwrap();
        let b = reconcile(&mut auto, &second, &["LABKESMAS", "RS", "BLUD"])
            .await
            .unwrap();

        let names = |types: &[WithId<LabType>]| {
            types
                .iter()
                .map(|t| t.content.name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&a), vec!["BLUD", "LABKESMAS", "RS"]);
        assert_eq!(names(&a), names(&b));
        assert_eq!(auto.lab_types().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn is_idempotent() {
        let database = MemoryDatabase::new();
        let lab = lab_in(&database).await;
        let mut auto = database.auto();

        let first = reconcile(&mut auto, &lab, &["BLUD", "RS"]).await.unwrap();
        let second = reconcile(&mut auto, &lab, &["BLUD", "RS"]).await.unwrap();

        assert_eq!(
            first.iter().map(|t| t.id.clone()).collect::<Vec<_>>(),
            second.iter().map(|t| t.id.clone()).collect::<Vec<_>>()
        );
        assert_eq!(auto.get_types_of_lab(&lab).await.unwrap().len(), 2);
    }
}
