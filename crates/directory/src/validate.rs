use std::{error::Error, fmt};

use chrono::{DateTime, Utc};
use model::lab::{Lab, LabPayload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingName,
    MissingAddress,
    InvalidLatitude,
    InvalidLongitude,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "The name of the lab is required."),
            Self::MissingAddress => write!(f, "The address of the lab is required."),
            Self::InvalidLatitude => write!(f, "The latitude must be a number."),
            Self::InvalidLongitude => write!(f, "The longitude must be a number."),
        }
    }
}

impl Error for ValidationError {}

/// A payload that passed validation, split into the scalar lab fields and
/// the requested type names.
#[derive(Debug, Clone)]
pub struct ValidLab {
    pub lab: Lab,
    pub type_names: Vec<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite())
}

/// Checks the required fields and normalizes whitespace. Optional text
/// fields that are blank become `None`.
pub fn validate(
    payload: LabPayload,
    created_at: DateTime<Utc>,
) -> Result<ValidLab, ValidationError> {
    let name = non_blank(payload.name).ok_or(ValidationError::MissingName)?;
    let address = non_blank(payload.address).ok_or(ValidationError::MissingAddress)?;
    let latitude = finite(payload.latitude).ok_or(ValidationError::InvalidLatitude)?;
    let longitude =
        finite(payload.longitude).ok_or(ValidationError::InvalidLongitude)?;

    let lab = Lab {
        name,
        address,
        latitude,
        longitude,
        lab_photo_url: payload
            .lab_photo_url
            .map(|url| url.trim().to_owned())
            .unwrap_or_default(),
        head1_name: non_blank(payload.head1_name),
        head1_photo_url: non_blank(payload.head1_photo_url),
        head2_name: non_blank(payload.head2_name),
        head2_photo_url: non_blank(payload.head2_photo_url),
        phone: non_blank(payload.phone),
        website_url: non_blank(payload.website_url),
        created_at,
        types: vec![],
    };

    Ok(ValidLab {
        lab,
        type_names: payload.types,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> LabPayload {
        LabPayload::new("Labkesda Kota Depok", "Jl. Margonda Raya", -6.4, 106.8)
    }

    #[test]
    fn accepts_minimal_payload() {
        let result = validate(valid().with_types(["RS"]), Utc::now()).unwrap();
        assert_eq!(result.lab.name, "Labkesda Kota Depok");
        assert_eq!(result.lab.lab_photo_url, "");
        assert!(result.lab.types.is_empty());
        assert_eq!(result.type_names, vec!["RS".to_owned()]);
    }

    #[test]
    fn trims_and_drops_blank_optionals() {
        let payload = LabPayload {
            name: Some("  Labkesda  ".to_owned()),
            phone: Some("   ".to_owned()),
            website_url: Some(" labkesda.go.id ".to_owned()),
            ..valid()
        };
        let lab = validate(payload, Utc::now()).unwrap().lab;
        assert_eq!(lab.name, "Labkesda");
        assert_eq!(lab.phone, None);
        assert_eq!(lab.website_url.as_deref(), Some("labkesda.go.id"));
    }

    #[test]
    fn rejects_missing_name_and_address() {
        let no_name = LabPayload {
            name: Some(" ".to_owned()),
            ..valid()
        };
        assert_eq!(
            validate(no_name, Utc::now()).unwrap_err(),
            ValidationError::MissingName
        );

        let no_address = LabPayload {
            address: None,
            ..valid()
        };
        assert_eq!(
            validate(no_address, Utc::now()).unwrap_err(),
            ValidationError::MissingAddress
        );
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let nan = LabPayload {
            latitude: Some(f64::NAN),
            ..valid()
        };
        assert_eq!(
            validate(nan, Utc::now()).unwrap_err(),
            ValidationError::InvalidLatitude
        );

        let missing = LabPayload {
            longitude: None,
            ..valid()
        };
        assert_eq!(
            validate(missing, Utc::now()).unwrap_err(),
            ValidationError::InvalidLongitude
        );

        let infinite = LabPayload {
            longitude: Some(f64::INFINITY),
            ..valid()
        };
        assert_eq!(
            validate(infinite, Utc::now()).unwrap_err(),
            ValidationError::InvalidLongitude
        );
    }
}
