use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};

use crate::{
    server::AppState,
    transport::{
        middleware::{add_response_headers, check_auth},
        routes::{guilds, info},
    },
};

const API_V1: &str = "/v1";

pub fn router(state: Arc<AppState>) -> Router {
    let v1_routes = Router::new()
        .route("/sessions", get(guilds::get_sessions))
        .route("/guilds/{guild_id}", delete(guilds::destroy_session))
        .route("/guilds/{guild_id}/events", post(guilds::post_events))
        .route("/guilds/{guild_id}/refresh", post(guilds::refresh_controls))
        .route("/guilds/{guild_id}/queue", get(guilds::get_queue));

    Router::new()
        .nest(API_V1, v1_routes)
        .route("/version", get(info::get_version))
        .layer(middleware::from_fn_with_state(state.clone(), check_auth))
        .layer(middleware::from_fn(add_response_headers))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        common::types::{GuildId, now_ms},
        configs::Config,
        controls::{ControlRenderer, QueuePaginator, RoutedEvent, Synchronizer},
        messaging::{MemoryTransport, memory::Op},
        playback::{PlayerEvent, SnapshotStore},
        server::SessionRegistry,
        transport::middleware::API_VERSION_HEADER,
    };

    const PASSWORD: &str = "youshallnotpass";

    struct Fixture {
        state: Arc<AppState>,
        transport: Arc<MemoryTransport>,
        events: flume::Receiver<RoutedEvent>,
    }

    fn fixture() -> Fixture {
        let config = Config::default();
        let store = Arc::new(SnapshotStore::new());
        let transport = Arc::new(MemoryTransport::new());
        let synchronizer = Arc::new(Synchronizer::new(
            store.clone(),
            transport.clone(),
            ControlRenderer::new(&config.controls),
        ));
        let registry = Arc::new(SessionRegistry::new(
            synchronizer,
            config.controls.refresh_interval(),
        ));
        let (tx, rx) = flume::unbounded();
        let state = Arc::new(AppState {
            paginator: QueuePaginator::from_config(&config.controls),
            config,
            registry,
            store,
            events: tx,
            started_at: now_ms(),
        });
        Fixture {
            state,
            transport,
            events: rx,
        }
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", PASSWORD);
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn playing_state(upcoming: usize) -> Value {
        let upcoming: Vec<Value> = (1..=upcoming)
            .map(|i| json!({ "title": format!("Track {}", i), "durationMs": 60_000 }))
            .collect();
        json!({
            "current": { "title": "Song", "durationMs": "3:00" },
            "upcoming": upcoming,
            "isPlaying": true,
            "isReady": true,
            "positionMs": 0
        })
    }

    #[tokio::test]
    async fn test_requires_password() {
        let f = fixture();
        let response = router(f.state)
            .oneshot(
                Request::builder()
                    .uri("/version")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[API_VERSION_HEADER], "1");
    }

    #[tokio::test]
    async fn test_version() {
        let f = fixture();
        let response = router(f.state)
            .oneshot(request("GET", "/version", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[API_VERSION_HEADER], "1");
        let body = json_body(response).await;
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(body["sessions"], 0);
    }

    #[tokio::test]
    async fn test_events_open_session_and_forward() {
        let f = fixture();
        let response = router(f.state.clone())
            .oneshot(request(
                "POST",
                "/v1/guilds/42/events",
                Some(json!({
                    "channelId": "7",
                    "state": playing_state(0),
                    "event": { "type": "error", "message": "disk full" }
                })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let guild = GuildId::from("42");
        let session = f.state.registry.get(&guild).unwrap();
        assert_eq!(session.channel_id().to_string(), "7");
        assert!(f.state.store.get(&guild).is_some());

        let routed = f.events.try_recv().unwrap();
        assert_eq!(routed.guild_id, guild);
        assert_eq!(
            routed.event,
            PlayerEvent::Error {
                message: "disk full".into()
            }
        );
    }

    #[tokio::test]
    async fn test_state_only_push_sends_no_event() {
        let f = fixture();
        let response = router(f.state.clone())
            .oneshot(request(
                "POST",
                "/v1/guilds/42/events",
                Some(json!({ "channelId": "7", "state": playing_state(0) })),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(f.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_refresh_publishes() {
        let f = fixture();
        let app = router(f.state.clone());
        app.clone()
            .oneshot(request(
                "POST",
                "/v1/guilds/42/events",
                Some(json!({ "channelId": "7", "state": playing_state(1) })),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(request("POST", "/v1/guilds/42/refresh", Some(json!({}))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ran"], true);
        assert_eq!(body["outcome"], "published");
        assert_eq!(f.transport.count(Op::Send), 1);
    }

    #[tokio::test]
    async fn test_unknown_guild_is_not_found() {
        let f = fixture();
        let app = router(f.state);
        for (method, uri, body) in [
            ("POST", "/v1/guilds/9/refresh", Some(json!({}))),
            ("GET", "/v1/guilds/9/queue", None),
            ("DELETE", "/v1/guilds/9", None),
        ] {
            let response = app.clone().oneshot(request(method, uri, body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{} {}", method, uri);
            let body = json_body(response).await;
            assert_eq!(body["status"], 404);
            assert_eq!(body["error"], "Not Found");
        }
    }

    #[tokio::test]
    async fn test_queue_page() {
        let f = fixture();
        let app = router(f.state.clone());
        app.clone()
            .oneshot(request(
                "POST",
                "/v1/guilds/42/events",
                Some(json!({ "channelId": "7", "state": playing_state(23) })),
            ))
            .await
            .unwrap();

        let response = app
            .oneshot(request("GET", "/v1/guilds/42/queue?page=2", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["ephemeral"], false);
        assert_eq!(body["page"]["pageIndex"], 2);
        assert_eq!(body["page"]["pageCount"], 3);
        assert_eq!(body["page"]["rows"][0]["number"], 21);
        assert!(
            body["content"]
                .as_str()
                .unwrap()
                .starts_with("> Playing **Song** out of 24")
        );
    }

    #[tokio::test]
    async fn test_delete_and_list_sessions() {
        let f = fixture();
        let app = router(f.state.clone());
        for guild in ["1", "2"] {
            app.clone()
                .oneshot(request(
                    "POST",
                    &format!("/v1/guilds/{}/events", guild),
                    Some(json!({ "channelId": "7", "state": playing_state(0) })),
                ))
                .await
                .unwrap();
        }

        let response = app
            .clone()
            .oneshot(request("DELETE", "/v1/guilds/1", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(request("GET", "/v1/sessions", None))
            .await
            .unwrap();
        let body = json_body(response).await;
        let sessions = body.as_array().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0]["guildId"], "2");
        assert_eq!(sessions[0]["controlMessage"], Value::Null);
        assert_eq!(sessions[0]["updating"], false);
    }

    #[tokio::test]
    async fn test_sessions_listing_does_not_wait_on_busy_gate() {
        let f = fixture();
        let app = router(f.state.clone());
        app.clone()
            .oneshot(request(
                "POST",
                "/v1/guilds/42/events",
                Some(json!({ "channelId": "7", "state": playing_state(0) })),
            ))
            .await
            .unwrap();

        let session = f.state.registry.get(&GuildId::from("42")).unwrap();
        let _in_flight = session.gate().try_enter().unwrap();

        let response = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            app.oneshot(request("GET", "/v1/sessions", None)),
        )
        .await
        .expect("listing blocked on a busy session")
        .unwrap();
        let body = json_body(response).await;
        assert_eq!(body[0]["guildId"], "42");
        assert_eq!(body[0]["updating"], true);
        assert_eq!(body[0]["controlMessage"], Value::Null);
    }
}
