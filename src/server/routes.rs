use super::{ApiError, ApiResult, AppState};
use crate::backend::{
    ChatReply, ChatRequest, DistributionResponse, EmbedRequest, EmbedResourceRequest,
    EmbedResponse, EmbeddedChunk, EmbeddedResource, HealthResponse, ProcessedFile, StatsResponse,
    TopicsRequest, TopicsResponse,
};
use crate::chat::{build_prompt, unique_sources, UNPROCESSABLE_REPLY};
use crate::ingest::{chunk_words, extract_text};
use crate::search::{candidates, top_k};
use crate::topics::{discover_topics, MIN_TEXTS};
use crate::types::NewChat;
use crate::Error;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::Json;

/// JSON body whose rejection is rendered as an `{"error"}` body
type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;

/// GET /api/health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// POST /api/process-file - extract and chunk the multipart `file` field
pub async fn process_file(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> ApiResult<ProcessedFile> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) = upload.ok_or_else(|| ApiError::bad_request("No file part"))?;
    if file_name.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }

    tracing::info!("[PROCESS] {} ({} bytes)", file_name, data.len());
    let name = file_name.clone();
    let extracted = tokio::task::spawn_blocking(move || extract_text(&name, &data))
        .await
        .map_err(Error::from)??;

    let chunks = chunk_words(
        &extracted.text,
        state.processing.chunk_size,
        state.processing.chunk_overlap,
    );
    tracing::info!("[PROCESS] {} -> {} chunks", file_name, chunks.len());

    Ok(Json(ProcessedFile {
        text: extracted.text,
        file_type: extracted.file_type,
        chunks,
    }))
}

/// POST /api/embed-resource - embed every non-blank chunk, skipping failures
pub async fn embed_resource(
    State(state): State<AppState>,
    payload: JsonBody<EmbedResourceRequest>,
) -> ApiResult<EmbeddedResource> {
    let Json(request) = payload?;
    if request.chunks.is_empty() {
        return Err(ApiError::bad_request("No chunks provided"));
    }

    let mut embedded_chunks = Vec::new();
    for (index, text) in request.chunks.into_iter().enumerate() {
        if text.trim().is_empty() {
            tracing::debug!("[EMBED] Skipping empty chunk {}", index);
            continue;
        }
        match state.embedder.embed(&text).await {
            Ok(embedding) if !embedding.is_empty() => embedded_chunks.push(EmbeddedChunk {
                index,
                text,
                embedding,
            }),
            Ok(_) => tracing::warn!("[EMBED] Empty embedding for chunk {}", index),
            Err(e) => tracing::warn!("[EMBED] Failed to embed chunk {}: {}", index, e),
        }
    }

    Ok(Json(EmbeddedResource {
        total_embedded: embedded_chunks.len(),
        embedded_chunks,
    }))
}

/// POST /api/embed
pub async fn embed(
    State(state): State<AppState>,
    payload: JsonBody<EmbedRequest>,
) -> ApiResult<EmbedResponse> {
    let Json(request) = payload?;
    match state.embedder.embed(&request.text).await {
        Ok(embedding) if !embedding.is_empty() => Ok(Json(EmbedResponse { embedding })),
        Ok(_) => Err(ApiError::internal("Failed to generate embedding")),
        Err(e) => {
            tracing::warn!("[EMBED] {}", e);
            Err(ApiError::internal("Failed to generate embedding"))
        }
    }
}

/// POST /api/chat - retrieve the closest chunks, answer from them and record
/// the exchange
pub async fn chat(
    State(state): State<AppState>,
    payload: JsonBody<ChatRequest>,
) -> ApiResult<ChatReply> {
    let Json(request) = payload?;
    let message = request.message;

    let embedded = if message.trim().is_empty() {
        None
    } else {
        match state.embedder.embed(&message).await {
            Ok(embedding) if !embedding.is_empty() => Some(embedding),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("[CHAT] Could not embed question: {}", e);
                None
            }
        }
    };
    let Some(query) = embedded else {
        return Ok(Json(ChatReply {
            response: UNPROCESSABLE_REPLY.to_string(),
            source_resources: Vec::new(),
        }));
    };

    let resources = state.repo.list_resources().await?;
    let pool = candidates(resources);
    let context = top_k(&query, &pool, state.processing.top_k);
    tracing::info!("[CHAT] {} of {} chunks selected as context", context.len(), pool.len());

    let prompt = build_prompt(&message, &context);
    let response = match state.chat.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("[CHAT] Generation failed: {}", e);
            format!("Error generating response from AI model: {e}")
        }
    };
    let source_resources = unique_sources(&context);

    match request.user_id.filter(|u| !u.trim().is_empty()) {
        Some(user_id) => {
            state
                .repo
                .record_chat(&NewChat {
                    user_id,
                    message,
                    response: response.clone(),
                    source_resources: source_resources.clone(),
                })
                .await?;
        }
        None => tracing::warn!("[CHAT] No userId supplied, exchange not recorded"),
    }

    Ok(Json(ChatReply {
        response,
        source_resources,
    }))
}

/// POST /api/topics
pub async fn topics(payload: JsonBody<TopicsRequest>) -> ApiResult<TopicsResponse> {
    let Json(request) = payload?;
    if request.texts.len() < MIN_TEXTS {
        return Err(ApiError::bad_request(format!(
            "Need at least {MIN_TEXTS} documents for topic modeling"
        )));
    }
    let topics = discover_topics(&request.texts)?;
    Ok(Json(TopicsResponse { topics }))
}

/// GET /api/analytics/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<StatsResponse> {
    let stats = state.repo.stats().await?;
    Ok(Json(StatsResponse { stats }))
}

/// GET /api/analytics/resource-distribution
pub async fn resource_distribution(State(state): State<AppState>) -> ApiResult<DistributionResponse> {
    let distribution = state.repo.resource_distribution().await?;
    Ok(Json(DistributionResponse { distribution }))
}
