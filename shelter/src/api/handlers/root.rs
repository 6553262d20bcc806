use axum::response::Html;

const GREETING: &str = r#"
    <html>
        <head>
            <title>Guane Inter FastAPI</title>
        </head>
        <body>
            <h1>Hello World!!!</h1>
        </body>
    </html>
    "#;

/// Static HTML greeting
#[utoipa::path(
    get,
    path = "/",
    tag = "root",
    responses(
        (status = 200, description = "HTML greeting", content_type = "text/html", body = String),
    )
)]
pub async fn root() -> Html<&'static str> {
    Html(GREETING)
}

/// Liveness check
#[utoipa::path(
    get,
    path = "/healthz",
    tag = "root",
    responses(
        (status = 200, description = "Service is up", body = String),
    )
)]
pub async fn healthz() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, routing::get};
    use axum_test::TestServer;

    #[tokio::test]
    async fn test_root_serves_greeting() {
        let app = Router::new().route("/", get(root)).route("/healthz", get(healthz));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/").await;
        response.assert_status_ok();
        assert!(response.header("content-type").to_str().unwrap().starts_with("text/html"));
        let body = response.text();
        assert!(body.contains("<title>Guane Inter FastAPI</title>"));
        assert!(body.contains("<h1>Hello World!!!</h1>"));

        server.get("/healthz").await.assert_text("OK");
    }
}
