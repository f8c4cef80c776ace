use askama::Template;

use super::views::{HistoryEntryView, ResultView};

/// The single page: form, one of the mutually exclusive error/result states,
/// and the history list. The idle state is both options `None`; the loading
/// state is client-side (submit disabled while the request is in flight).
#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    /// Value to re-fill the title input with.
    pub book_title: String,
    pub error: Option<String>,
    pub result: Option<ResultView>,
    pub history: Vec<HistoryEntryView>,
}

pub fn render_template<T: Template>(template: T) -> Result<String, askama::Error> {
    template.render()
}
