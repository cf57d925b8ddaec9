//! Proposal submission routes
//!
//! The two-step submission protocol over JSON: declare package names, then
//! supply one wheel reference per package. GET on either step describes the
//! expected input; POST advances the workflow.

use crate::error::{malformed_input, AppError};
use crate::models::SuccessResponse;
use crate::proposal::Submission;
use crate::state::SharedState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct DeclarePackagesRequest {
    /// Comma-separated package names
    #[validate(length(min = 1, message = "Package list is required"))]
    pub pkg: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionStarted {
    pub submission: Uuid,
    pub packages: Vec<String>,
    pub next: String,
}

#[derive(Debug, Deserialize)]
pub struct WheelsQuery {
    pub submission: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelsForm {
    pub submission: Uuid,
    /// One wheel reference expected per package name
    pub packages: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitWheelsRequest {
    pub submission: Uuid,
    /// Posted form fields: package name -> wheel reference, plus the
    /// submit marker which is never stored
    pub fields: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictResponse {
    pub proposal_id: String,
    pub conflict: bool,
    pub summary: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSummaryResponse {
    pub proposal_id: String,
    pub wheels: Vec<String>,
    /// `null` until the workflow has recorded a verdict
    pub conflict: Option<bool>,
}

/// GET /api/propose/packages
pub async fn packages_form() -> Json<SuccessResponse<serde_json::Value>> {
    Json(SuccessResponse::with_data(
        "Declare the packages to update",
        serde_json::json!({
            "fields": { "pkg": "comma-separated package names" }
        }),
    ))
}

/// POST /api/propose/packages
///
/// Parses the declared package list and parks it under a fresh submission
/// token for the wheel step.
pub async fn declare_packages(
    State(state): State<SharedState>,
    Json(req): Json<DeclarePackagesRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<SubmissionStarted>>), AppError> {
    req.validate().map_err(|e| malformed_input(e.to_string()))?;

    let submission = Submission::start().declare_packages(&req.pkg)?;
    let packages = submission
        .packages()
        .ok_or_else(|| AppError::Internal("submission did not advance".to_string()))?
        .to_vec();
    let token = state.submissions.put(packages.clone()).await;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            "Packages declared",
            SubmissionStarted {
                submission: token,
                packages,
                next: format!("/api/propose/wheels?submission={token}"),
            },
        )),
    ))
}

/// GET /api/propose/wheels?submission=<token>
pub async fn wheels_form(
    State(state): State<SharedState>,
    Query(query): Query<WheelsQuery>,
) -> Result<Json<SuccessResponse<WheelsForm>>, AppError> {
    let packages = state
        .submissions
        .get(query.submission)
        .await
        .ok_or_else(|| AppError::NotFound("Unknown or expired submission".to_string()))?;

    Ok(Json(SuccessResponse::with_data(
        "Provide one wheel reference per package",
        WheelsForm {
            submission: query.submission,
            packages,
        },
    )))
}

/// POST /api/propose/wheels
///
/// Claims the submission token, writes the proposal and records the
/// conflict verdict. The token is spent either way; a rejected batch means
/// starting a new submission.
pub async fn submit_wheels(
    State(state): State<SharedState>,
    Json(req): Json<SubmitWheelsRequest>,
) -> Result<(StatusCode, Json<SuccessResponse<VerdictResponse>>), AppError> {
    let packages = state
        .submissions
        .take(req.submission)
        .await
        .ok_or_else(|| AppError::NotFound("Unknown or expired submission".to_string()))?;

    let submission = Submission::AwaitingWheels { packages }
        .submit_wheels(&state.proposals, state.checker.as_ref(), &req.fields)
        .await?;
    let verdict = submission
        .verdict()
        .ok_or_else(|| AppError::Internal("submission did not complete".to_string()))?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            if verdict.conflict {
                "Conflicts found in proposed wheels"
            } else {
                "No conflicts found"
            },
            VerdictResponse {
                proposal_id: verdict.proposal_id.clone(),
                conflict: verdict.conflict,
                summary: format!("/api/proposals/{}", verdict.proposal_id),
            },
        )),
    ))
}

/// GET /api/proposals/{id}
///
/// Summary view of a proposal's stored wheels and verdict. Handles are
/// views, so an unknown id reads back as an empty, unchecked proposal.
pub async fn proposal_summary(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse<ProposalSummaryResponse>>, AppError> {
    let proposal = state.proposals.get(id.clone());
    let wheels = proposal.wheels().await?;
    let conflict = proposal.status().await?;

    Ok(Json(SuccessResponse::with_data(
        "Proposal summary",
        ProposalSummaryResponse {
            proposal_id: id,
            wheels,
            conflict,
        },
    )))
}
