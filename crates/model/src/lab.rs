use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::{
    id::{HasId, Id},
    serde::{lenient_f64, lenient_string, lenient_strings},
};

use crate::{lab_type::LabType, ExampleData, WithId};

/// A laboratory facility shown on the map.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lab {
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Absolute URL or bare Google Drive file id.
    pub lab_photo_url: String,
    pub head1_name: Option<String>,
    pub head1_photo_url: Option<String>,
    pub head2_name: Option<String>,
    pub head2_photo_url: Option<String>,
    pub phone: Option<String>,
    pub website_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub types: Vec<WithId<LabType>>,
}

impl Lab {
    pub fn with_types(self, types: Vec<WithId<LabType>>) -> Self {
        Self { types, ..self }
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.types
            .iter()
            .map(|lab_type| lab_type.content.name.as_str())
            .collect()
    }
}

impl HasId for Lab {
    type IdType = String;
}

impl ExampleData for Lab {
    fn example_data() -> Self {
        Self {
            name: "UPTD Laboratorium Kesehatan Provinsi Jawa Barat".to_owned(),
            address: "Jl. Sederhana No. 3-5, Pasteur, Kota Bandung".to_owned(),
            latitude: -6.89407,
            longitude: 107.59702,
            lab_photo_url: "1PWxeE1axIWMnoB_example".to_owned(),
            head1_name: Some("dr. Kepala Laboratorium".to_owned()),
            head1_photo_url: None,
            head2_name: None,
            head2_photo_url: None,
            phone: Some("(022) 2034953".to_owned()),
            website_url: Some("labkesda.jabarprov.go.id".to_owned()),
            created_at: DateTime::from_timestamp(1_736_150_400, 0).unwrap_or_default(),
            types: vec![WithId::new(
                Id::new("3f1c2a9e-52a8-4c57-9a53-1b0f0d8d9b11".to_owned()),
                LabType::example_data(),
            )],
        }
    }
}

/// The body of a create or update request. Every field is optional at this
/// stage: wrongly typed values deserialize to `None` and are reported by
/// validation instead of failing the whole request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub lab_photo_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub head1_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub head1_photo_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub head2_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub head2_photo_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub website_url: Option<String>,
    /// Names of the lab types, e.g. `["BLUD", "LABKESMAS"]`.
    #[serde(default, deserialize_with = "lenient_strings")]
    pub types: Vec<String>,
}

impl LabPayload {
    /// A minimal valid payload, mostly useful in tests.
    pub fn new<N, A>(name: N, address: A, latitude: f64, longitude: f64) -> Self
    where
        N: Into<String>,
        A: Into<String>,
    {
        Self {
            name: Some(name.into()),
            address: Some(address.into()),
            latitude: Some(latitude),
            longitude: Some(longitude),
            ..Default::default()
        }
    }

    pub fn with_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.types = types.into_iter().map(Into::into).collect();
        self
    }
}

impl ExampleData for LabPayload {
    fn example_data() -> Self {
        Self {
            lab_photo_url: Some("1PWxeE1axIWMnoB_example".to_owned()),
            phone: Some("(022) 2034953".to_owned()),
            website_url: Some("labkesda.jabarprov.go.id".to_owned()),
            ..Self::new(
                "UPTD Laboratorium Kesehatan Provinsi Jawa Barat",
                "Jl. Sederhana No. 3-5, Pasteur, Kota Bandung",
                -6.89407,
                107.59702,
            )
        }
        .with_types(["BLUD", "LABKESMAS"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_from_form_json() {
        let payload: LabPayload = serde_json::from_str(
            r#"{
                "name": "Labkesda Kota Bogor",
                "address": "Jl. Kapten Muslihat",
                "latitude": "-6.595",
                "longitude": 106.79,
                "labPhotoUrl": "abc",
                "head1Name": null,
                "types": ["BLUD", 5, "RS"]
            }"#,
        )
        .unwrap();
        assert_eq!(payload.name.as_deref(), Some("Labkesda Kota Bogor"));
        assert_eq!(payload.latitude, Some(-6.595));
        assert_eq!(payload.longitude, Some(106.79));
        assert_eq!(payload.head1_name, None);
        assert_eq!(payload.types, vec!["BLUD".to_owned(), "RS".to_owned()]);
    }

    #[test]
    fn lab_serializes_in_camel_case_with_types() {
        let json = serde_json::to_value(Lab::example_data()).unwrap();
        assert_eq!(json["labPhotoUrl"], "1PWxeE1axIWMnoB_example");
        assert!(json["head2Name"].is_null());
        assert_eq!(json["types"][0]["name"], "LABKESMAS");
        assert!(json["types"][0]["id"].is_string());
    }
}
