//! Lookup result records
//!
//! Field names follow the upstream camelCase wire format. Absent optional
//! fields serialize as `null`, except `telefonos` which is always a list.

use serde::{Deserialize, Serialize};

/// Person returned by a DNI lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub dni: String,
    pub nombres: String,
    pub apellido_paterno: String,
    pub apellido_materno: String,
    #[serde(default)]
    pub cod_verifica: Option<String>,
}

/// Company returned by a RUC lookup
///
/// Only `ruc` is required when decoding; missing optional fields become `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub ruc: String,
    pub razon_social: Option<String>,
    pub nombre_comercial: Option<String>,
    /// Empty list when the upstream has no phone numbers
    #[serde(default, deserialize_with = "null_as_empty")]
    pub telefonos: Vec<String>,
    pub tipo: Option<String>,
    pub estado: Option<String>,
    pub condicion: Option<String>,
    pub direccion: Option<String>,
    pub departamento: Option<String>,
    pub provincia: Option<String>,
    pub distrito: Option<String>,
    pub fecha_inscripcion: Option<String>,
    pub sistema_emision: Option<String>,
    pub actividad_exterior: Option<String>,
    pub sistema_contabilidad: Option<String>,
    pub comercio_exterior: Option<String>,
    pub emision_electronica: Option<String>,
    pub fecha_emisor_fe: Option<String>,
    pub cpe: Option<Vec<String>>,
    pub fecha_ple: Option<String>,
    pub padrones: Option<Vec<String>>,
    pub fecha_baja: Option<String>,
    pub profesion: Option<String>,
}

impl Company {
    /// Company with only the RUC set
    pub fn new(ruc: impl Into<String>) -> Self {
        Self {
            ruc: ruc.into(),
            ..Self::default()
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}
