use std::{error, fmt, result};

use async_trait::async_trait;
use model::{lab::Lab, lab_type::LabType, WithId};
use utility::id::Id;

#[derive(Debug)]
pub enum DatabaseError {
    NotFound,
    Other(Box<dyn error::Error + Send + Sync>),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "row not found"),
            Self::Other(why) => write!(f, "{}", why),
        }
    }
}

impl error::Error for DatabaseError {}

pub type Result<T> = result::Result<T, DatabaseError>;

/// The two orderings labs are listed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabOrder {
    /// Most recently created first. Used by the admin table.
    Newest,
    /// Alphabetically by name. Used by the public map.
    Name,
}

#[async_trait]
pub trait LabTypeRepo {
    async fn lab_type_by_name(
        &mut self,
        name: &str,
    ) -> Result<Option<WithId<LabType>>>;

    /// Returns the lab type with the given name, creating it if it does not
    /// exist yet. Implementations must resolve a concurrent creation of the
    /// same name to the existing row instead of failing.
    async fn upsert_lab_type(&mut self, name: &str) -> Result<WithId<LabType>>;

    /// All lab types sorted by name, including ones no lab references.
    async fn lab_types(&mut self) -> Result<Vec<WithId<LabType>>>;
}

#[async_trait]
pub trait LabRepo {
    /// Returns the lab including its types.
    async fn get_lab(&mut self, id: &Id<Lab>) -> Result<WithId<Lab>>;

    /// Returns all labs including their types.
    async fn get_labs(&mut self, order: LabOrder) -> Result<Vec<WithId<Lab>>>;

    /// Inserts the scalar fields of a lab. The types of `lab` are ignored,
    /// the returned lab has none.
    async fn insert_lab(&mut self, lab: WithId<Lab>) -> Result<WithId<Lab>>;

    /// Overwrites all scalar fields except the creation time.
    /// Fails with `NotFound` if the lab does not exist. The returned lab
    /// carries no types.
    async fn update_lab(&mut self, lab: WithId<Lab>) -> Result<WithId<Lab>>;

    async fn lab_exists(&mut self, id: &Id<Lab>) -> Result<bool>;

    /// Deletes the lab row. Fails with `NotFound` if nothing was deleted.
    async fn delete_lab(&mut self, id: &Id<Lab>) -> Result<()>;

    async fn get_types_of_lab(
        &mut self,
        id: &Id<Lab>,
    ) -> Result<Vec<WithId<LabType>>>;

    /// Replaces all type links of a lab with exactly `types`.
    async fn set_lab_types(
        &mut self,
        id: &Id<Lab>,
        types: &[Id<LabType>],
    ) -> Result<()>;

    async fn clear_lab_types(&mut self, id: &Id<Lab>) -> Result<()>;
}

pub trait DatabaseOperations: LabRepo + LabTypeRepo {}

#[async_trait]
pub trait DatabaseTransaction: DatabaseOperations {
    async fn commit(self) -> Result<()>;
}

pub trait DatabaseAutocommit: DatabaseOperations {}

/// trait to implement a lab directory database.
/// multiple concurrent accesses should be possible by e.g. cloning the database object.
/// dropping a transaction without committing it rolls it back.
#[async_trait]
pub trait Database: Clone + Send + Sync + Sized {
    type Transaction: DatabaseTransaction + Send;
    type Autocommit: DatabaseAutocommit + Send;

    async fn transaction(&self) -> Result<Self::Transaction>;

    fn auto(&self) -> Self::Autocommit;
}
