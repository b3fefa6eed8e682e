#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use base64::{engine::general_purpose, Engine as _};
    use devsummit::api::server::{create_app, AppState};
    use devsummit::config::Settings;
    use devsummit::db;
    use devsummit::mail::RecordingMailer;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tower::ServiceExt;

    const SECRET: &str = "route-test-secret";

    fn settings(open: bool) -> Settings {
        let vars: HashMap<&str, String> = [
            ("DATABASE_URL", "postgres://devsummit@localhost/devsummit_test".to_string()),
            ("SECRET_KEY", SECRET.to_string()),
            ("SITE_TITLE", "Test Summit".to_string()),
            ("REGISTRATION_IS_OPEN", open.to_string()),
        ]
        .into_iter()
        .collect();

        Settings::from_lookup(|name| vars.get(name).cloned()).unwrap()
    }

    // Every request below is answered before the handler touches the
    // database, so a pool that never connects is enough.
    fn app(open: bool) -> Router {
        let settings = settings(open);
        let pool = db::create_lazy_pool(&settings.database_url).unwrap();
        create_app(AppState::new(pool, settings, Arc::new(RecordingMailer::default())))
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app(false).oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"OK");
    }

    #[tokio::test]
    async fn test_site_info() {
        let response = app(true).oneshot(get("/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({
                "title": "Test Summit",
                "registration_open": true,
                "currency": { "name": "GBP", "symbol": "£" }
            })
        );
    }

    #[tokio::test]
    async fn test_organizer_pages_require_credentials() {
        for uri in ["/org/", "/org/attendees/", "/org/attendees/attendees.csv", "/org/purchases/"] {
            let response = app(false).oneshot(get(uri)).await.unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
            let challenge = response.headers().get(header::WWW_AUTHENTICATE).unwrap();
            assert!(challenge.to_str().unwrap().starts_with("Basic"));

            let body = json_body(response).await;
            assert_eq!(body["error"], "unauthorized");
            assert_eq!(body["message"], "This page is only available to the organizers");
        }
    }

    #[tokio::test]
    async fn test_malformed_credentials_are_refused() {
        let headers = [
            "Bearer abc".to_string(),
            "Basic not-base64!".to_string(),
            format!("Basic {}", general_purpose::STANDARD.encode("no-colon")),
            format!("Basic {}", general_purpose::STANDARD.encode(":password")),
        ];

        for value in headers {
            let request = Request::builder()
                .uri("/org/")
                .header(header::AUTHORIZATION, value.as_str())
                .body(Body::empty())
                .unwrap();
            let response = app(false).oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", value);
        }
    }

    #[tokio::test]
    async fn test_organizer_writes_require_credentials() {
        let request = Request::builder()
            .method("DELETE")
            .uri("/org/payments/3")
            .body(Body::empty())
            .unwrap();
        let response = app(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_closed_registration_is_forbidden() {
        let response = app(false).oneshot(get("/register")).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(json_body(response).await["error"], "forbidden");

        let response = app(false)
            .oneshot(get("/register?preregistration=guess"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let request = Request::builder()
            .method("POST")
            .uri("/register")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({ "name": "Ada", "username": "ada", "address": "London" }).to_string(),
            ))
            .unwrap();
        let response = app(false).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_bad_buy_links_all_look_alike() {
        for uri in [
            "/buy",
            "/buy?item=x&buyer=1&auth=abc",
            "/buy?item=1&buyer=y&auth=abc",
            "/buy?item=1&buyer=1",
        ] {
            let response = app(true).oneshot(get(uri)).await.unwrap();

            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
            assert_eq!(
                json_body(response).await["message"],
                "No such person, item or authorization code"
            );
        }
    }

    #[tokio::test]
    async fn test_attendee_page_requires_token() {
        for uri in ["/attendee/1", "/attendee/abc?auth=deadbeef"] {
            let response = app(true).oneshot(get(uri)).await.unwrap();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(
                json_body(response).await["message"],
                "Access to an attendee's details requires an authorization code"
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response = app(true).oneshot(get("/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
