use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use ingestion_pipeline::ingest_document;
use rag_pipeline::{generate_report, parse_topics};

use crate::{api_state::ApiState, error::ApiError};

#[derive(Debug, TryFromMultipart)]
pub struct ContractParams {
    #[form_data(limit = "16777216")]
    pub file: FieldData<Bytes>,
    pub rule: String,
}

#[derive(Debug, TryFromMultipart)]
pub struct UploadParams {
    #[form_data(limit = "16777216")]
    pub file: FieldData<Bytes>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub id: String,
    pub rule: String,
}

/// One-shot path: ingest the uploaded contract and run the review for every
/// requested topic in a single request. Responds with the report as text.
pub async fn create_report(
    State(state): State<ApiState>,
    TypedMultipart(input): TypedMultipart<ContractParams>,
) -> Result<impl IntoResponse, ApiError> {
    let source_id = validate_pdf_upload(&input.file)?;
    info!(
        source_id = %source_id,
        rule = %input.rule,
        bytes = input.file.contents.len(),
        "received one-shot contract review"
    );

    let index = ingest_document(
        input.file.contents.to_vec(),
        &source_id,
        &state.embedding,
        state.config.chunk_max_tokens,
        state.config.chunk_overlap_tokens,
    )
    .await?;

    let engine = state.engine_for(Arc::new(index));
    let report = generate_report(&engine, &parse_topics(&input.rule)).await?;

    Ok((StatusCode::OK, report.render_text()))
}

/// First half of the two-phase path: ingest now, review later. Responds with
/// the opaque session id the summary request presents.
pub async fn upload_contract(
    State(state): State<ApiState>,
    TypedMultipart(input): TypedMultipart<UploadParams>,
) -> Result<impl IntoResponse, ApiError> {
    let source_id = validate_pdf_upload(&input.file)?;
    info!(
        source_id = %source_id,
        bytes = input.file.contents.len(),
        "received contract upload"
    );

    let index = ingest_document(
        input.file.contents.to_vec(),
        &source_id,
        &state.embedding,
        state.config.chunk_max_tokens,
        state.config.chunk_overlap_tokens,
    )
    .await?;

    let session_id = state.sessions.put(index).await;
    info!(session_id = %session_id, "contract index cached");

    Ok((StatusCode::OK, session_id))
}

/// Second half of the two-phase path. An unknown or expired id is a 404 and
/// triggers no retrieval or generation work.
pub async fn get_summary(
    State(state): State<ApiState>,
    Json(input): Json<SummaryParams>,
) -> Result<impl IntoResponse, ApiError> {
    let index = state
        .sessions
        .get(&input.id)
        .await
        .ok_or_else(|| ApiError::NotFound("id not found".to_string()))?;

    info!(session_id = %input.id, rule = %input.rule, "received summary request");

    let engine = state.engine_for(index);
    let report = generate_report(&engine, &parse_topics(&input.rule)).await?;

    Ok((StatusCode::OK, report.render_text()))
}

/// Mirror of the original upload validation: PDFs only, judged by the
/// declared content type or the file name. Returns the source id used for
/// chunk provenance.
fn validate_pdf_upload(file: &FieldData<Bytes>) -> Result<String, ApiError> {
    let file_name = file
        .metadata
        .file_name
        .clone()
        .unwrap_or_else(|| "contract.pdf".to_string());

    let declared_pdf = file
        .metadata
        .content_type
        .as_deref()
        .is_some_and(|content_type| content_type == "application/pdf");
    let named_pdf = file_name.to_ascii_lowercase().ends_with(".pdf");

    if !declared_pdf && !named_pdf {
        return Err(ApiError::ValidationError(
            "only PDF documents are supported".to_string(),
        ));
    }
    if file.contents.is_empty() {
        return Err(ApiError::ValidationError(
            "uploaded file is empty".to_string(),
        ));
    }

    Ok(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use axum_typed_multipart::FieldMetadata;

    fn field(
        file_name: Option<&str>,
        content_type: Option<&str>,
        contents: &'static [u8],
    ) -> FieldData<Bytes> {
        FieldData {
            metadata: FieldMetadata {
                name: Some("file".to_string()),
                file_name: file_name.map(ToString::to_string),
                content_type: content_type.map(ToString::to_string),
                headers: HeaderMap::default(),
            },
            contents: Bytes::from_static(contents),
        }
    }

    #[test]
    fn pdf_by_content_type_is_accepted() {
        let file = field(None, Some("application/pdf"), b"%PDF-1.5");
        assert!(validate_pdf_upload(&file).is_ok());
    }

    #[test]
    fn pdf_by_file_name_is_accepted() {
        let file = field(Some("kontrak.PDF"), Some("application/octet-stream"), b"%PDF");
        assert_eq!(validate_pdf_upload(&file).unwrap(), "kontrak.PDF");
    }

    #[test]
    fn non_pdf_upload_is_rejected() {
        let file = field(Some("notes.txt"), Some("text/plain"), b"hello");
        assert!(matches!(
            validate_pdf_upload(&file),
            Err(ApiError::ValidationError(_))
        ));
    }

    #[test]
    fn empty_upload_is_rejected() {
        let file = field(Some("kontrak.pdf"), Some("application/pdf"), b"");
        assert!(matches!(
            validate_pdf_upload(&file),
            Err(ApiError::ValidationError(_))
        ));
    }
}
