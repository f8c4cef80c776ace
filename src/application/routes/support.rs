use tracing::{info, warn};

use crate::application::errors::AppError;
use crate::application::state::AppState;
use crate::domain::posts::{GeneratedPost, GenerationRequest, placeholder_scraped_content};
use crate::infrastructure::ai::{self, Usage};

/// Run the full generation flow: the text call, then (when an image model is
/// configured) the illustration call. Image failure degrades to a text-only
/// result rather than failing the generation.
pub(crate) async fn run_generation(
    state: &AppState,
    request: &GenerationRequest,
) -> Result<GeneratedPost, AppError> {
    let (blog_post, usage) = ai::generate_post(
        &state.http_client,
        &state.openrouter_url,
        &state.openrouter_api_key,
        &state.openrouter_model,
        request,
    )
    .await?;
    log_ai_usage("generate-post", &state.openrouter_model, usage);

    let mut post = GeneratedPost::text_only(blog_post);

    if let Some(image_model) = &state.openrouter_image_model {
        match ai::generate_images(
            &state.http_client,
            &state.openrouter_url,
            &state.openrouter_api_key,
            image_model,
            &request.book_title,
        )
        .await
        {
            Ok((urls, usage)) => {
                log_ai_usage("generate-images", image_model, usage);
                post.cover_image_url = urls.first().cloned();
                post.image_urls = urls;
            }
            Err(err) => {
                warn!(error = %err, "image generation failed; returning text-only post");
            }
        }
    }

    Ok(post)
}

/// Fill in the placeholder "scraped" context when the caller supplied none.
pub(crate) fn with_scraped_context(mut request: GenerationRequest) -> GenerationRequest {
    if request.scraped_content.is_none() {
        request.scraped_content = Some(placeholder_scraped_content(&request.book_title));
    }
    request
}

fn log_ai_usage(endpoint: &str, model: &str, usage: Option<Usage>) {
    let Some(usage) = usage else { return };
    info!(
        endpoint,
        model,
        prompt_tokens = usage.prompt_tokens,
        completion_tokens = usage.completion_tokens,
        total_tokens = usage.total_tokens,
        cost = usage.cost,
        "AI usage"
    );
}
