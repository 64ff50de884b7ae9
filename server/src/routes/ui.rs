use axum::response::Html;

const UI_HTML: &str = include_str!("../../assets/ui.html");

/// `GET /`
pub async fn index() -> Html<&'static str> {
    Html(UI_HTML)
}
