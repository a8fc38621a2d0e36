//! Registered hospital records.

/// A hospital registered with the backend.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Hospital {
    /// Backend identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form location. The backend stores `null` when none was given.
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: Option<String>,
    /// Whether the hospital takes part in training.
    pub is_active: bool,
    /// Training samples contributed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub data_points: u64,
    /// ISO-8601 registration time. Absent on the create echo.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub joined_at: Option<String>,
}

/// Payload for registering a hospital.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct NewHospital {
    /// Display name (required by the backend).
    pub name: String,
    /// Free-form location.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub location: Option<String>,
    /// Training samples contributed.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub data_points: Option<u64>,
}

impl NewHospital {
    /// A registration with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            data_points: None,
        }
    }
}
