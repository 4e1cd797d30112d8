use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::HasId;

use crate::ExampleData;

/// A category label such as "BLUD" or "LABKESMAS". Names are unique and
/// compared case-sensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabType {
    pub name: String,
}

impl LabType {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

impl HasId for LabType {
    type IdType = String;
}

impl ExampleData for LabType {
    fn example_data() -> Self {
        Self::new("LABKESMAS")
    }
}
