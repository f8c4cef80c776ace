use std::fmt::Write;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::application::errors::AppError;
use crate::domain::posts::GenerationRequest;

pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const USER_AGENT: &str = "RedBookify/1.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Most illustration images kept from a single generation.
pub const MAX_IMAGES: usize = 4;

/// Build the Xiaohongshu post prompt for a book title plus optional scraped
/// context. The content strategies are the heart of the product and are kept
/// in the original Chinese wording.
fn post_prompt(book_title: &str, scraped_content: Option<&str>) -> String {
    let mut prompt = format!(
        r#"You are an expert social media content creator, specializing in the XiaoHongShu (Little Red Book) platform.
Your primary goal is to generate an engaging and insightful blog post about the book titled "{book_title}"."#
    );

    if let Some(context) = scraped_content.filter(|s| !s.trim().is_empty()) {
        let _ = write!(
            prompt,
            "\nIf available, use the following scraped content for additional context:\n{context}"
        );
    }

    prompt.push_str(r#"

To craft a high-quality post that resonates with the XiaoHongShu audience, please utilize the following advanced content generation strategies and examples. You can select the most fitting strategy or combine elements from several. The final output must be in Chinese, incorporate emojis and relevant hashtags, maintain a conversational tone, and be approximately 300-500 words, structured with short paragraphs and potentially headings.

**Content Generation Strategies & Examples (参照以下模板进行创作):**

**1. 明确书籍类型+核心受众 (Clarify Book Type + Core Audience)**
分析书中3个最能引发核心人群（请根据书籍内容具体化，例如：年轻职场女性、初为人母的妈妈、创业者等）共鸣的情节，比如情感困境/职场难题/成长痛点相关片段。需要具体到角色在某个具体场景中的心理转折，例如主人公如何用某个方法解决某个具体问题。

**2. 痛点具象化+解决方案提取 (Concrete Pain Points + Solution Extraction)**
提取书中解决具体痛点（例如：拖延症、沟通障碍、情绪内耗等）的颠覆性观点，对比常规认知：当大多数人认为某个常见误区时，书中通过某角色故事或具体章节内容证明了反常识结论，需要包含数据/实验结果/人物前后对比等说服要素（如有则引用）。

**3. 场景化片段+感官描写 (Scene-based Snippets + Sensory Descriptions)**
寻找包含五感描写的关键场景：比如深夜办公室的键盘声/咖啡凉透的触感/项目失败后地铁站台的冷风，要求该片段同时展现某种人性洞察，类似"她发现自己拼命追逐的KPI不过是贴在墓碑上的奖状"这类隐喻。

**4. 金句二次创作公式 (Golden Sentence Re-creation Formula)**
将书中某个复杂理论或核心观点转化为"痛点+比喻+行动指令"句式：例如"当你在具体场景反复陷入某种痛苦，就像某个隐喻物，记住书中解决方案提炼成的具体行动步骤，就像书中某人物在某章节的做法"。

**5. 悬念结构设计 (Suspense Structure Design)**
用书中某个未解谜题或关键转折点设计互动钩子：先给出常规结局或普遍看法，在关键点截断，引导评论区猜测接下来会发生什么。

**进阶技巧 (Advanced Techniques):**

*   **认知冲突法 (Cognitive Conflict Method):** 列出书中违反直觉的结论，例如"拖延不是时间管理问题而是情绪调节失败"，并匹配对应的书中案例或论证片段。
*   **时间锚点法 (Time Anchor Method):** 提取包含明确时间地点的片段增强真实感。
*   **多维度证据链 (Multi-dimensional Evidence Chain):** 将书中某个核心理论拆解为：1个实验数据（如有）+1个企业/名人案例（如有）+1个角色故事片段+1句专家/作者访谈引语（如有）。

**请确保最终生成的笔记:**
*   具有具体场景代入感
*   能引发认知冲突和好奇感
*   提供可视化的解决方案或启发
*   包含符合平台算法的互动要素 (如提问、悬念、引导评论)
*   语言为简体中文。

Return a JSON object with this field:
- "blogPost": the generated XiaoHongShu-style blog post

Return ONLY the JSON object, no other text."#);

    prompt
}

fn image_prompt(book_title: &str) -> String {
    format!(
        "为一篇关于《{book_title}》的小红书图文笔记生成配图：一张书籍主题封面图，\
         以及若干张呼应内容的插图。画面风格温暖明亮，适合社交媒体分享，不要包含文字。"
    )
}

// --- Public types ---

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
    pub cost: f64,
}

// --- Public functions ---

/// Run the post-generation flow: one chat completion returning the blog post
/// text as structured JSON.
pub async fn generate_post(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    model: &str,
    request: &GenerationRequest,
) -> Result<(String, Option<Usage>), AppError> {
    let prompt = post_prompt(&request.book_title, request.scraped_content.as_deref());
    let (message, usage) = call_openrouter(client, url, api_key, model, &prompt, false).await?;

    let json = extract_json(&message.content);
    let payload: PostPayload = serde_json::from_str(json).map_err(|e| {
        AppError::unexpected(format!("Failed to parse AI response as a blog post: {e}"))
    })?;

    if payload.blog_post.trim().is_empty() {
        return Err(AppError::unexpected(
            "AI returned an empty blog post".to_string(),
        ));
    }

    Ok((payload.blog_post, usage))
}

/// Request cover/illustration images as data URIs from an image-capable
/// model. Returns at most [`MAX_IMAGES`] URIs, in the order the model
/// produced them.
pub async fn generate_images(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    model: &str,
    book_title: &str,
) -> Result<(Vec<String>, Option<Usage>), AppError> {
    let prompt = image_prompt(book_title);
    let (message, usage) = call_openrouter(client, url, api_key, model, &prompt, true).await?;

    let mut urls: Vec<String> = message
        .images
        .unwrap_or_default()
        .into_iter()
        .map(|image| image.image_url.url)
        .filter(|u| !u.trim().is_empty())
        .collect();
    urls.truncate(MAX_IMAGES);

    Ok((urls, usage))
}

// --- Internal helpers ---

async fn call_openrouter(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
    want_images: bool,
) -> Result<(ResponseMessage, Option<Usage>), AppError> {
    let request_body = ChatRequest {
        model: model.to_string(),
        messages: vec![Message {
            role: "user".to_string(),
            content: prompt.to_string(),
        }],
        modalities: want_images.then(|| vec!["image".to_string(), "text".to_string()]),
    };

    let response = client
        .post(url)
        .header("User-Agent", USER_AGENT)
        .header("Authorization", format!("Bearer {api_key}"))
        .timeout(REQUEST_TIMEOUT)
        .json(&request_body)
        .send()
        .await
        .map_err(|e| AppError::unexpected(format!("OpenRouter request failed: {e}")))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "(unreadable body)".to_string());
        return Err(AppError::unexpected(format!(
            "OpenRouter returned status {status}: {body}"
        )));
    }

    let body = response.text().await.map_err(|e| {
        AppError::unexpected(format!("Failed to read OpenRouter response body: {e}"))
    })?;

    let chat_response: ChatResponse = serde_json::from_str(&body)
        .map_err(|e| AppError::unexpected(format!("Failed to parse OpenRouter response: {e}")))?;

    let message = chat_response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| {
            AppError::unexpected("OpenRouter returned no completion choices".to_string())
        })?;

    if message.content.trim().is_empty() && message.images.as_ref().is_none_or(Vec::is_empty) {
        return Err(AppError::unexpected(
            "OpenRouter returned an empty response".to_string(),
        ));
    }

    Ok((message, chat_response.usage))
}

/// Extract a JSON object from a model response that may contain markdown
/// fences (```json ... ```) or surrounding prose.
fn extract_json(raw: &str) -> &str {
    let trimmed = raw.trim();

    // Strip ```json ... ``` or ``` ... ``` fences
    if let Some(after) = trimmed.strip_prefix("```json")
        && let Some(inner) = after.strip_suffix("```")
    {
        return inner.trim();
    }
    if let Some(after) = trimmed.strip_prefix("```")
        && let Some(inner) = after.strip_suffix("```")
    {
        return inner.trim();
    }

    // Find the first '{' and last '}' to extract the JSON object
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && start < end
    {
        return &trimmed[start..=end];
    }

    trimmed
}

// --- OpenRouter API types ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostPayload {
    blog_post: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    modalities: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
    images: Option<Vec<ResponseImage>>,
}

#[derive(Debug, Deserialize)]
struct ResponseImage {
    image_url: ImageUrlDetail,
}

#[derive(Debug, Deserialize)]
struct ImageUrlDetail {
    url: String,
}
