//! Axum route handlers for the analysis API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::analysis::parser::{self, SanitizeOptions};
use crate::analysis::prompts;
use crate::errors::AppError;
use crate::llm_client::{
    CompletionRequest, LlmError, ANALYZE_MAX_TOKENS, GROQ_MODEL, PERPLEXITY_MODEL, TEMPERATURE,
};
use crate::state::AppState;
use crate::terms::merge::{merge_terms, total_mentions};
use crate::terms::{TermCount, TermSource};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeSkillsRequest {
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub responsibilities: Option<String>,
    #[serde(default)]
    pub qualifications: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeSkillsResponse {
    pub terms: Vec<TermCount>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AutoGenerateRequest {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AutoGenerateResponse {
    pub terms: Vec<TermCount>,
    #[serde(rename = "totalListings")]
    pub total_listings: u32,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/analyze-skills
///
/// Extracts weighted terms from pasted job-listing text via Groq. Every
/// returned term is attributed to the single (company, role) the caller
/// supplied; duplicate term strings within one reply are collapsed.
pub async fn handle_analyze_skills(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeSkillsRequest>,
) -> Result<Json<AnalyzeSkillsResponse>, AppError> {
    let responsibilities = text_or_empty(&request.responsibilities);
    let qualifications = text_or_empty(&request.qualifications);

    if responsibilities.is_empty() && qualifications.is_empty() {
        return Err(AppError::Validation("No content provided".to_string()));
    }

    let prompt = prompts::build_analyze_prompt(responsibilities, qualifications);

    let reply = state
        .groq
        .complete(CompletionRequest {
            model: GROQ_MODEL,
            prompt: &prompt,
            temperature: TEMPERATURE,
            max_tokens: Some(ANALYZE_MAX_TOKENS),
        })
        .await
        .map_err(|e| upstream_error("Groq", e))?;

    let value = parser::parse_reply(&reply).map_err(|e| {
        error!("Error parsing Groq response: {e}");
        AppError::ReplyParse { provider: "Groq" }
    })?;

    let mut terms = parser::terms_from_value(
        &value,
        &SanitizeOptions {
            clamp_counts: false,
            fallback_source: None,
        },
    );

    // the model only saw the listing text; attribution comes from the caller
    let source = TermSource {
        company: non_empty(&request.company)
            .unwrap_or("Unspecified Company")
            .to_string(),
        role: non_empty(&request.role)
            .unwrap_or("Unspecified Role")
            .to_string(),
    };
    for term in &mut terms {
        term.sources = vec![source.clone()];
    }

    let terms = merge_terms(&[], &terms);

    info!(
        "analyze-skills extracted {} terms ({} mentions)",
        terms.len(),
        total_mentions(&terms)
    );

    Ok(Json(AnalyzeSkillsResponse { terms }))
}

/// POST /api/auto-generate
///
/// Researches live job listings for a role/experience pair via Perplexity's
/// online model and returns sourced terms plus the number of listings the
/// model reports having analyzed.
pub async fn handle_auto_generate(
    State(state): State<AppState>,
    Json(request): Json<AutoGenerateRequest>,
) -> Result<Json<AutoGenerateResponse>, AppError> {
    let (Some(role), Some(experience)) =
        (non_empty(&request.role), non_empty(&request.experience))
    else {
        return Err(AppError::Validation(
            "Role and experience level are required".to_string(),
        ));
    };

    let prompt = prompts::build_auto_generate_prompt(
        role,
        experience,
        non_empty(&request.company),
        non_empty(&request.sector),
    );

    let reply = state
        .perplexity
        .complete(CompletionRequest {
            model: PERPLEXITY_MODEL,
            prompt: &prompt,
            temperature: TEMPERATURE,
            max_tokens: None,
        })
        .await
        .map_err(|e| upstream_error("Perplexity", e))?;

    let value = parser::parse_reply(&reply).map_err(|e| {
        error!("Error parsing Perplexity response: {e}");
        AppError::ReplyParse {
            provider: "Perplexity",
        }
    })?;

    let fallback = TermSource {
        company: "Market Research".to_string(),
        role: format!("{role} ({experience})"),
    };
    let terms = parser::terms_from_value(
        &value,
        &SanitizeOptions {
            clamp_counts: true,
            fallback_source: Some(fallback),
        },
    );
    let terms = merge_terms(&[], &terms);
    let total_listings = parser::total_listings(&value);

    info!(
        "auto-generate extracted {} terms from {} listings",
        terms.len(),
        total_listings
    );

    Ok(Json(AutoGenerateResponse {
        terms,
        total_listings,
    }))
}

fn upstream_error(provider: &'static str, error: LlmError) -> AppError {
    error!("Error calling {provider} API: {error}");
    match error {
        LlmError::Api { status, .. } => AppError::Upstream { provider, status },
        other => AppError::Internal(anyhow::Error::new(other)),
    }
}

fn text_or_empty(field: &Option<String>) -> &str {
    field.as_deref().map(str::trim).unwrap_or("")
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
