use crate::bridge;
use crate::language::Language;
use crate::models::ChatRequest;
use crate::prompts;
use crate::server::AppState;
use crate::transcoder::{Transcoder, WireStream};
use crate::workflow::WorkflowInput;
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, info_span, Span};
use uuid::Uuid;

/// `POST /api/chat`: always answers 200 with a `0:<json>\n` record stream.
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Response {
    let span = info_span!(
        "chat",
        request_id = %Uuid::new_v4(),
        model = %request.model,
        locale = request.locale.as_str()
    );
    info!(
        parent: &span,
        "Chat request ({} messages, web search: {})",
        request.messages.len(),
        request.web_search
    );

    let stream = if request.is_palmreading() {
        palmreading_stream(&state, request, span)
    } else {
        bridge::chat_stream(state.providers.clone(), request, span)
    };

    stream_response(stream)
}

fn workflow_input(state: &AppState, request: &ChatRequest) -> WorkflowInput {
    let input = request
        .last_user_text()
        .or_else(|| state.default_input.clone())
        .unwrap_or_else(|| prompts::PALM_DEFAULT_INPUT.trim().to_string());

    WorkflowInput {
        input,
        image_url: request.effective_image_url(),
        language_tag: Language::from(request.locale).workflow_tag().to_string(),
    }
}

fn palmreading_stream(state: &AppState, request: ChatRequest, span: Span) -> WireStream {
    let input = workflow_input(state, &request);
    info!(
        parent: &span,
        "Running palm reading workflow (has image: {})",
        input.image_url.is_some()
    );

    let workflow = state.workflow.clone();
    Transcoder::new(&request.model, request.locale, state.pacing, span)
        .with_translator(state.translator.clone())
        .transcode(async move { workflow.run(&input).await })
}

fn stream_response(stream: WireStream) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache, no-transform"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}
