use chrono::{DateTime, Utc};

use crate::domain::history::HistoryEntry;

const EXCERPT_CHARS: usize = 60;

/// A generation rendered on the result card.
pub struct ResultView {
    pub book_title: String,
    pub blog_post: String,
    pub cover_image_url: Option<String>,
    pub cover_download_url: String,
    pub images: Vec<ImageView>,
    pub persist_warning: Option<String>,
}

pub struct ImageView {
    pub number: usize,
    pub url: String,
    pub download_url: String,
}

impl ResultView {
    pub fn from_entry(entry: &HistoryEntry, persist_warning: Option<String>) -> Self {
        let content = &entry.generated_content;
        let images = content
            .image_urls
            .iter()
            .enumerate()
            .map(|(index, url)| ImageView {
                number: index + 1,
                url: url.clone(),
                download_url: format!("/api/v1/history/{}/images/{index}", entry.id),
            })
            .collect();

        Self {
            book_title: entry.book_title.clone(),
            blog_post: content.blog_post.clone(),
            cover_image_url: content.cover_image_url.clone(),
            cover_download_url: format!("/api/v1/history/{}/cover", entry.id),
            images,
            persist_warning,
        }
    }
}

/// One row in the history list.
pub struct HistoryEntryView {
    pub id: String,
    pub book_title: String,
    pub generated_at: String,
    pub excerpt: String,
    pub view_url: String,
}

impl HistoryEntryView {
    pub fn from_domain(entry: &HistoryEntry) -> Self {
        Self {
            id: entry.id.clone(),
            book_title: entry.book_title.clone(),
            generated_at: format_timestamp(entry.occurred_at()),
            excerpt: excerpt(&entry.generated_content.blog_post),
            view_url: format!("/history/{}", entry.id),
        }
    }
}

fn format_timestamp(occurred_at: Option<DateTime<Utc>>) -> String {
    occurred_at
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn excerpt(blog_post: &str) -> String {
    let mut excerpt: String = blog_post
        .chars()
        .filter(|c| *c != '\n')
        .take(EXCERPT_CHARS)
        .collect();
    if blog_post.chars().count() > EXCERPT_CHARS {
        excerpt.push('…');
    }
    excerpt
}
