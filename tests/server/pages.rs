use redbookify::domain::posts::GeneratedPost;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{PNG_URI, assert_full_page, mock_openrouter_response, spawn_app};

#[tokio::test]
async fn home_page_renders() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(app.page_url("/"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("Failed to read body");
    assert_full_page(&body);
    assert!(body.contains("RedBookify"));
    assert!(body.contains("暂无历史记录"));
}

#[tokio::test]
async fn generate_form_shows_post_and_history() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(mock_openrouter_response(r#"{"blogPost": "测试内容"}"#))
        .mount(&app.mock_server)
        .await;

    let client = reqwest::Client::new();
    let response = client
        .post(app.page_url("/generate"))
        .form(&[("book_title", "三体")])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("测试内容"));
    assert!(body.contains("三体"));
    assert!(body.contains("您的小红书笔记"));
}

#[tokio::test]
async fn generate_form_shows_validation_error_for_short_title() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(app.page_url("/generate"))
        .form(&[("book_title", "三")])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("书名至少需要2个字符。"));
    assert!(app.history.list().await.is_empty());
}

#[tokio::test]
async fn generate_form_shows_ai_error_and_keeps_history_unchanged() {
    let app = spawn_app().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("timeout"))
        .mount(&app.mock_server)
        .await;

    let client = reqwest::Client::new();
    let response = client
        .post(app.page_url("/generate"))
        .form(&[("book_title", "三体")])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("生成失败"));
    assert!(body.contains("timeout"));
    assert!(app.history.list().await.is_empty());
}

#[tokio::test]
async fn history_entry_page_shows_saved_post() {
    let app = spawn_app().await;
    let post = GeneratedPost {
        blog_post: "测试内容".to_string(),
        cover_image_url: Some(PNG_URI.to_string()),
        image_urls: vec![PNG_URI.to_string()],
    };
    let outcome = app.history.record("三体", post).await;

    let client = reqwest::Client::new();
    let response = client
        .get(app.page_url(&format!("/history/{}", outcome.entry.id)))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("测试内容"));
    assert!(body.contains("下载封面图"));
    assert!(body.contains(&format!("/api/v1/history/{}/cover", outcome.entry.id)));
}

#[tokio::test]
async fn history_entry_page_returns_404_for_unknown_id() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(app.page_url("/history/no-such-id"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn clear_history_form_redirects_home() {
    let app = spawn_app().await;
    app.history
        .record("三体", GeneratedPost::text_only("post"))
        .await;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    let response = client
        .post(app.page_url("/history/clear"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 303);
    assert_eq!(response.headers()["location"].to_str().unwrap(), "/");
    assert!(app.history.list().await.is_empty());
}
