use axum::Router;
use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use tracing::{info, warn};

use crate::application::routes::{render_html, support};
use crate::application::state::AppState;
use crate::domain::posts::GenerationRequest;
use crate::presentation::web::templates::HomeTemplate;
use crate::presentation::web::views::{HistoryEntryView, ResultView};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home_page))
        .route("/history/{id}", get(view_history_entry))
        .route("/history/clear", post(clear_history))
}

pub(crate) fn generate_router() -> Router<AppState> {
    Router::new().route("/generate", post(generate))
}

#[tracing::instrument(skip(state))]
pub(crate) async fn home_page(State(state): State<AppState>) -> Result<Response, StatusCode> {
    let template = HomeTemplate {
        book_title: String::new(),
        error: None,
        result: None,
        history: history_views(&state).await,
    };
    render_html(template).map(IntoResponse::into_response)
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateForm {
    #[serde(default)]
    book_title: String,
}

#[tracing::instrument(skip(state, form))]
pub(crate) async fn generate(
    State(state): State<AppState>,
    Form(form): Form<GenerateForm>,
) -> Result<Response, StatusCode> {
    let request = GenerationRequest::new(form.book_title).normalize();

    if let Err(message) = request.validate() {
        let template = HomeTemplate {
            book_title: request.book_title,
            error: Some(message),
            result: None,
            history: history_views(&state).await,
        };
        return render_html(template).map(IntoResponse::into_response);
    }

    let request = support::with_scraped_context(request);

    match support::run_generation(&state, &request).await {
        Ok(post) => {
            let outcome = state.history.record(&request.book_title, post).await;
            info!(
                entry_id = %outcome.entry.id,
                book_title = %outcome.entry.book_title,
                "generated post"
            );
            let template = HomeTemplate {
                book_title: request.book_title,
                error: None,
                result: Some(ResultView::from_entry(
                    &outcome.entry,
                    outcome.persist_error,
                )),
                history: outcome
                    .entries
                    .iter()
                    .map(HistoryEntryView::from_domain)
                    .collect(),
            };
            render_html(template).map(IntoResponse::into_response)
        }
        Err(err) => {
            warn!(error = %err, book_title = %request.book_title, "generation failed");
            let template = HomeTemplate {
                book_title: request.book_title,
                error: Some(format!("生成内容失败: {err}")),
                result: None,
                history: history_views(&state).await,
            };
            render_html(template).map(IntoResponse::into_response)
        }
    }
}

#[tracing::instrument(skip(state))]
pub(crate) async fn view_history_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, StatusCode> {
    let Some(entry) = state.history.get(&id).await else {
        return Err(StatusCode::NOT_FOUND);
    };

    let template = HomeTemplate {
        book_title: entry.book_title.clone(),
        error: None,
        result: Some(ResultView::from_entry(&entry, None)),
        history: history_views(&state).await,
    };
    render_html(template).map(IntoResponse::into_response)
}

#[tracing::instrument(skip(state))]
pub(crate) async fn clear_history(State(state): State<AppState>) -> Response {
    if let Err(err) = state.history.clear().await {
        warn!(error = %err, "failed to remove persisted history");
    }
    Redirect::to("/").into_response()
}

async fn history_views(state: &AppState) -> Vec<HistoryEntryView> {
    state
        .history
        .list()
        .await
        .iter()
        .map(HistoryEntryView::from_domain)
        .collect()
}
