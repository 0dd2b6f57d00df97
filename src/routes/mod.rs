//! Router assembly: quiz endpoints, static frontend, no-cache headers, CORS and HTTP tracing.

use std::{path::Path, sync::Arc};

use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - `POST /api/getGame`, `POST /api/getWord` (plus the `/.netlify/functions/*` paths the game used)
/// - `GET /api/health`
/// - Static frontend from `static_dir` with index fallback
/// - `Cache-Control: no-store` (and the Pragma/Expires pair) on every response
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>, static_dir: &Path) -> Router {
    let static_service = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/api/health", get(http::http_health))
        .route("/api/getGame", post(http::http_post_game))
        .route("/api/getWord", post(http::http_post_word))
        .route("/.netlify/functions/getGame", post(http::http_post_game))
        .route("/.netlify/functions/getWord", post(http::http_post_word))
        .with_state(state)
        .fallback_service(static_service)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(header::PRAGMA, HeaderValue::from_static("no-cache")))
        .layer(SetResponseHeaderLayer::overriding(header::EXPIRES, HeaderValue::from_static("0")))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::AppConfig;
    use crate::error::QuizError;
    use crate::protocol::ErrorOut;
    use crate::providers::RawProviderResponse;
    use crate::quiz::testing::ScriptedProvider;

    fn config() -> AppConfig {
        AppConfig::from_lookup(|k| match k {
            "GAME_PROVIDER" | "WORD_PROVIDER" => Some("diagnostic".into()),
            "QUIZ_RETRY_DELAY_MS" => Some("0".into()),
            _ => None,
        })
        .unwrap()
    }

    fn router(game: Arc<ScriptedProvider>, word: Arc<ScriptedProvider>) -> Router {
        let cfg = config();
        let state = Arc::new(AppState::new(game, word, &cfg));
        build_router(state, Path::new("./static"))
    }

    fn question(word: &str) -> Value {
        json!({
            "word": word,
            "category": "Natura",
            "correct": format!("Significato di {word}"),
            "distractors": ["uno", "due", "tre"]
        })
    }

    fn ten() -> RawProviderResponse {
        let items: Vec<Value> = (0..10).map(|i| question(&format!("Parola{i}"))).collect();
        RawProviderResponse::Text(format!("```json\n{}\n```", json!({ "questions": items })))
    }

    async fn post(app: Router, uri: &str, body: &str) -> Response {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        app.oneshot(req).await.unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(res: Response) -> T {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn game_returns_ten_canonical_questions_with_no_cache_headers() {
        let game = Arc::new(ScriptedProvider::new(vec![Ok(ten())]));
        let res = post(router(game.clone(), Arc::default()), "/api/getGame", r#"{"difficulty": 2}"#).await;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CACHE_CONTROL], "no-store, no-cache, must-revalidate");
        assert_eq!(res.headers()[header::PRAGMA], "no-cache");
        assert_eq!(res.headers()[header::EXPIRES], "0");

        let questions: Vec<Value> = body_json(res).await;
        assert_eq!(questions.len(), 10);
        assert_eq!(questions[0]["word"], "Parola0");
        assert_eq!(questions[0]["distractors"].as_array().map(Vec::len), Some(3));
        assert_eq!(game.requests.lock().unwrap()[0].difficulty.level(), 2);
    }

    #[tokio::test]
    async fn game_without_body_defaults_to_base_tier() {
        let game = Arc::new(ScriptedProvider::new(vec![Ok(ten())]));
        let res = post(router(game.clone(), Arc::default()), "/api/getGame", "").await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(game.requests.lock().unwrap()[0].difficulty.level(), 1);
    }

    #[tokio::test]
    async fn invalid_difficulty_is_rejected_without_calling_the_provider() {
        for body in [r#"{"difficulty": 4}"#, r#"{"difficulty": "2"}"#, r#"{"difficulty": 0}"#, "not json"] {
            let game = Arc::new(ScriptedProvider::default());
            let res = post(router(game.clone(), Arc::default()), "/api/getGame", body).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{body}");
            let err: ErrorOut = body_json(res).await;
            assert!(err.details.is_none());
            assert_eq!(game.calls(), 0);
        }
    }

    #[tokio::test]
    async fn word_requires_difficulty() {
        let word = Arc::new(ScriptedProvider::default());
        let res = post(router(Arc::default(), word.clone()), "/api/getWord", r#"{"usedWords": []}"#).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(word.calls(), 0);
    }

    #[tokio::test]
    async fn word_skips_used_word_and_returns_canonical_names() {
        let gioia = json!({
            "parola": "Gioia",
            "categoria": "Emozioni",
            "corretta": "Sentimento di viva contentezza",
            "distrattori": ["a", "b", "c"]
        });
        let word = Arc::new(ScriptedProvider::new(vec![
            Ok(RawProviderResponse::Structured(gioia)),
            Ok(RawProviderResponse::Structured(question("Quiete"))),
        ]));
        let res = post(
            router(Arc::default(), word.clone()),
            "/.netlify/functions/getWord",
            r#"{"difficulty": 3, "usedWords": ["Gioia"]}"#,
        )
        .await;

        assert_eq!(res.status(), StatusCode::OK);
        let q: Value = body_json(res).await;
        assert_eq!(q["word"], "Quiete");
        assert_eq!(q["level"], 3);
        assert!(q.get("parola").is_none());
        assert_eq!(word.calls(), 2);
    }

    #[tokio::test]
    async fn exhausted_retries_become_500_with_details() {
        let word = Arc::new(ScriptedProvider::new(vec![
            Err(QuizError::provider("scripted", "HTTP 401: Invalid API key")),
            Ok(RawProviderResponse::Text("Mi dispiace, non posso.".into())),
            Ok(RawProviderResponse::Structured(json!({ "parola": "Vuoto" }))),
        ]));
        let res = post(router(Arc::default(), word.clone()), "/api/getWord", r#"{"difficulty": 1}"#).await;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.headers()[header::CACHE_CONTROL], "no-store, no-cache, must-revalidate");
        let err: ErrorOut = body_json(res).await;
        assert_eq!(err.error, "Errore durante la generazione della parola.");
        let details = err.details.unwrap();
        assert!(details.contains("3 attempt(s)"), "{details}");
        assert!(details.contains("missing category"), "{details}");
        assert_eq!(word.calls(), 3);
    }

    #[tokio::test]
    async fn health_reports_providers() {
        let res = router(Arc::default(), Arc::default())
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let v: Value = body_json(res).await;
        assert_eq!(v, json!({ "ok": true, "gameProvider": "scripted", "wordProvider": "scripted" }));
    }
}
