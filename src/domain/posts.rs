use serde::{Deserialize, Serialize};

/// Minimum book title length, counted in Unicode scalar values so short CJK
/// titles like 「三体」 are accepted.
pub const MIN_TITLE_CHARS: usize = 2;

/// Input to the generation flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub book_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_content: Option<String>,
}

impl GenerationRequest {
    pub fn new(book_title: impl Into<String>) -> Self {
        Self {
            book_title: book_title.into(),
            scraped_content: None,
        }
    }

    pub fn normalize(mut self) -> Self {
        self.book_title = self.book_title.trim().to_string();
        self.scraped_content = self
            .scraped_content
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    /// Validate the title, returning a display-ready message on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.book_title.chars().count() < MIN_TITLE_CHARS {
            return Err(format!("书名至少需要{MIN_TITLE_CHARS}个字符。"));
        }
        Ok(())
    }
}

/// Output of the generation flow, immutable once returned by the model.
/// Field names match the wire format of the original Genkit flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPost {
    pub blog_post: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
}

impl GeneratedPost {
    pub fn text_only(blog_post: impl Into<String>) -> Self {
        Self {
            blog_post: blog_post.into(),
            cover_image_url: None,
            image_urls: Vec::new(),
        }
    }
}

/// Stand-in for the unimplemented scraping feature: generic context the
/// prompt can lean on when the caller supplies none.
pub fn placeholder_scraped_content(book_title: &str) -> String {
    format!(
        "关于 \"{book_title}\" 的一些通用占位符内容。\n\
         读者发现这本书引人入胜，因为它情节错综复杂，角色 relatable。\n\
         网络上的许多讨论都围绕着其出乎意料的转折和所探讨的深刻主题展开。\n\
         流行的引言和粉丝理论也被广泛分享。\n\
         该书因其独特的叙事方式获得了众多赞誉。\n"
    )
}
