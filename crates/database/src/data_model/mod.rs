use model::WithId;
use utility::id::{HasId, Id};

pub mod lab;
pub mod lab_type;

pub trait DatabaseRow {
    type Model: HasId<IdType = String>;

    fn get_id(&self) -> Id<Self::Model>;
    fn to_model(self) -> Self::Model;
    fn from_model(model: WithId<Self::Model>) -> Self;
}

pub fn with_ids<R: DatabaseRow>(rows: Vec<R>) -> Vec<WithId<R::Model>> {
    rows.into_iter().map(with_id).collect::<Vec<_>>()
}

pub fn with_id<R: DatabaseRow>(row: R) -> WithId<R::Model> {
    WithId::new(row.get_id(), row.to_model())
}
