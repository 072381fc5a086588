//! HTML Pages

use axum::response::Html;

const INDEX_PAGE: &str = include_str!("../../templates/index.html");
const ANALYSIS_PAGE: &str = include_str!("../../templates/analysis.html");

/// Prediction form
pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Chart gallery
pub async fn analysis() -> Html<&'static str> {
    Html(ANALYSIS_PAGE)
}
