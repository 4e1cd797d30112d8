use std::{error::Error, fmt};

pub mod client;
pub mod database;
pub mod memory;
pub mod reconcile;
pub mod validate;

pub use validate::ValidationError;

#[derive(Debug)]
pub enum RequestError {
    NotFound,
    Validation(ValidationError),
    Other(Box<dyn Error + Send + Sync>),
}

impl RequestError {
    pub fn other<T: Error + Send + Sync + 'static>(why: T) -> Self {
        Self::Other(Box::new(why))
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Validation(why) => write!(f, "{}", why),
            Self::Other(why) => write!(f, "{}", why),
        }
    }
}

impl Error for RequestError {}

impl From<database::DatabaseError> for RequestError {
    fn from(value: database::DatabaseError) -> Self {
        match value {
            database::DatabaseError::NotFound => Self::NotFound,
            database::DatabaseError::Other(why) => Self::Other(why),
        }
    }
}

impl From<ValidationError> for RequestError {
    fn from(why: ValidationError) -> Self {
        Self::Validation(why)
    }
}

pub type RequestResult<O> = Result<O, RequestError>;

/// Proof that the caller has been authenticated as administrator.
///
/// Write operations of the [`client::Client`] take this as an argument. It
/// is created by the boundary that checks sessions, the client itself never
/// inspects credentials.
#[derive(Debug, Clone)]
pub struct Admin {
    name: String,
}

impl Admin {
    pub fn verified<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
