//! Symptom normalization endpoint.
//!
//! ```text
//! POST /api/v1/symptoms/normalize {"symptoms":"my head is pounding"}
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use crate::domain::{Error, SymptomDescription, SymptomNormalizationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, require};

const SYMPTOMS: FieldName = FieldName::new("symptoms");

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct NormalizeSymptomsRequest {
    /// Free-text description, passed to the model verbatim.
    #[schema(example = "my head is pounding and my nose is runny")]
    pub symptoms: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeSymptomsResponse {
    #[schema(example = "Severe headache, rhinorrhea")]
    pub normalized_symptoms: String,
}

/// Rewrite a symptom description in clinical terms.
#[utoipa::path(
    post,
    path = "/api/v1/symptoms/normalize",
    request_body = NormalizeSymptomsRequest,
    responses(
        (status = 200, description = "Normalized symptoms", body = NormalizeSymptomsResponse),
        (status = 400, description = "Missing or empty symptoms", body = Error),
        (status = 500, description = "Normalizer not configured", body = Error),
        (status = 502, description = "Model failure or schema mismatch", body = Error)
    ),
    tags = ["symptoms"],
    operation_id = "normalizeSymptoms",
    security([])
)]
#[post("/symptoms/normalize")]
pub async fn normalize_symptoms(
    state: web::Data<HttpState>,
    payload: web::Json<NormalizeSymptomsRequest>,
) -> ApiResult<web::Json<NormalizeSymptomsResponse>> {
    let raw = require(payload.into_inner().symptoms, SYMPTOMS)?;
    let description = SymptomDescription::new(raw).map_err(SymptomNormalizationError::from)?;
    let normalized = state
        .symptoms
        .normalize(&description)
        .await
        .inspect_err(|err| warn!(error = %err, "symptom normalization failed"))?;
    Ok(web::Json(NormalizeSymptomsResponse {
        normalized_symptoms: normalized.as_str().to_owned(),
    }))
}
