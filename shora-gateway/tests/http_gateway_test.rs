//! Integration tests for [`shora_gateway::HttpGateway`] against a mockito server.
//!
//! Covers: request bodies and paths for every endpoint, envelope handling, bearer token routing,
//! and the error normalisation (status, rejected envelope, malformed body, unreachable backend).

use mockito::Matcher;
use serde_json::json;
use shora_core::{ConversationState, UserProfile};
use shora_gateway::{
    BackendGateway, BotReplyRequest, GatewayConfig, GatewayError, HttpGateway, IncidentReport,
    ProfileUpsert,
};

fn gateway_for(server: &mockito::ServerGuard) -> HttpGateway {
    HttpGateway::new(GatewayConfig::with_urls(server.url(), server.url())).unwrap()
}

/// **Test: register_profile posts the name and reads `_id` / `isNewUser`.**
#[tokio::test]
async fn test_register_profile_new_user() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chatbot-users/create-or-update")
        .match_body(Matcher::Json(json!({"name": "Awa"})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"success": true, "data": {"_id": "u-42"}, "isNewUser": true}"#)
        .create_async()
        .await;

    let registration = gateway_for(&server)
        .register_profile(&ProfileUpsert::name_only("Awa"))
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(registration.user_id.as_deref(), Some("u-42"));
    assert!(registration.newly_created);
}

/// **Test: `success: false` from the upsert is a Rejected error, not a silent success.**
#[tokio::test]
async fn test_register_profile_rejected() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chatbot-users/create-or-update")
        .with_status(200)
        .with_body(r#"{"success": false, "error": "db down"}"#)
        .create_async()
        .await;

    let err = gateway_for(&server)
        .register_profile(&ProfileUpsert::name_only("Awa"))
        .await
        .unwrap_err();
    assert_eq!(err, GatewayError::Rejected("db down".to_string()));
}

/// **Test: bot_reply sends text, profile and state; returns text_bot.**
#[tokio::test]
async fn test_bot_reply_round_trip() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/bot/voice-bot")
        .match_body(Matcher::PartialJson(json!({
            "text": "comment porter le harnais ?",
            "state": "active",
            "profile": {"name": "Awa", "completed": true}
        })))
        .with_status(200)
        .with_body(r#"{"text_bot": "Attache-le au point d'ancrage."}"#)
        .create_async()
        .await;

    let request = BotReplyRequest {
        text: "comment porter le harnais ?".to_string(),
        profile: UserProfile {
            name: Some("Awa".to_string()),
            complete: true,
            ..Default::default()
        },
        state: ConversationState::Active,
    };
    let reply = gateway_for(&server).bot_reply(&request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(reply.as_deref(), Some("Attache-le au point d'ancrage."));
}

/// **Test: a reply without text_bot is "no answer", not an error.**
#[tokio::test]
async fn test_bot_reply_without_text() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/bot/voice-bot")
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let request = BotReplyRequest {
        text: "salut".to_string(),
        profile: UserProfile::default(),
        state: ConversationState::Active,
    };
    assert_eq!(gateway_for(&server).bot_reply(&request).await.unwrap(), None);
}

/// **Test: a non-JSON 200 body is Malformed.**
#[tokio::test]
async fn test_bot_reply_malformed_body() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/bot/voice-bot")
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let request = BotReplyRequest {
        text: "salut".to_string(),
        profile: UserProfile::default(),
        state: ConversationState::Active,
    };
    let err = gateway_for(&server).bot_reply(&request).await.unwrap_err();
    assert!(matches!(err, GatewayError::Malformed(_)));
}

/// **Test: incidents go to the main API with the bearer token; server `error` is surfaced on 500.**
#[tokio::test]
async fn test_report_incident_uses_token_and_surfaces_status() {
    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("POST", "/api/incidents")
        .match_header("authorization", "Bearer secret")
        .match_body(Matcher::PartialJson(json!({
            "description": "y'a un accident grave",
            "type": "danger",
            "severity": "high",
            "reportedBy": "chatbot",
            "location": "Chantier"
        })))
        .with_status(201)
        .with_body(r#"{"success": true}"#)
        .expect(1)
        .create_async()
        .await;

    let config = GatewayConfig::with_urls(server.url(), server.url()).with_token(Some("secret".to_string()));
    let gateway = HttpGateway::new(config).unwrap();
    let report = IncidentReport::from_chat("y'a un accident grave", &UserProfile::default());
    gateway.report_incident(&report).await.unwrap();
    ok.assert_async().await;

    let mut failing_server = mockito::Server::new_async().await;
    let _failing = failing_server
        .mock("POST", "/api/incidents")
        .with_status(500)
        .with_body(r#"{"error": "validation failed"}"#)
        .create_async()
        .await;
    let err = gateway_for(&failing_server)
        .report_incident(&report)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GatewayError::Status {
            status: 500,
            message: "validation failed".to_string()
        }
    );
}

/// **Test: bot API requests never carry the main API token.**
#[tokio::test]
async fn test_bot_backend_has_no_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Regex(r"^/reminders/user/Awa%20Diop$".to_string()))
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"success": true, "data": []}"#)
        .create_async()
        .await;

    let config = GatewayConfig::with_urls(server.url(), server.url()).with_token(Some("secret".to_string()));
    let reminders = HttpGateway::new(config)
        .unwrap()
        .pending_reminders("Awa Diop")
        .await
        .unwrap();
    mock.assert_async().await;
    assert!(reminders.is_empty());
}

/// **Test: reminders are decoded from the envelope; mark-sent posts to the reminder path.**
#[tokio::test]
async fn test_reminders_and_mark_sent() {
    let mut server = mockito::Server::new_async().await;
    let _list = server
        .mock("GET", "/reminders/user/Awa")
        .with_status(200)
        .with_body(
            r#"{"success": true, "data": [
                {"_id": "r1", "message": "Casque obligatoire", "imageUrl": "https://img/1.png", "createdAt": "2026-10-18T07:00:00Z"},
                {"_id": "r2", "message": "Gants"}
            ]}"#,
        )
        .create_async()
        .await;
    let mark = server
        .mock("POST", "/reminders/r1/mark-sent")
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .expect(1)
        .create_async()
        .await;

    let gateway = gateway_for(&server);
    let reminders = gateway.pending_reminders("Awa").await.unwrap();
    assert_eq!(reminders.len(), 2);
    assert_eq!(reminders[0].image_url.as_deref(), Some("https://img/1.png"));
    assert!(reminders[0].created_at.is_some());
    assert!(reminders[1].image_url.is_none());

    gateway.mark_reminder_sent("r1").await.unwrap();
    mark.assert_async().await;
}

/// **Test: open incidents query carries limit and status filters.**
#[tokio::test]
async fn test_open_incidents_query() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/api/admin/incidents")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "20".into()),
            Matcher::UrlEncoded("status".into(), "open,in-progress".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"success": true, "data": {"data": [{"_id": "i1", "type": "accident", "description": "chute"}]}}"#)
        .create_async()
        .await;

    let incidents = gateway_for(&server).open_incidents(20).await.unwrap();
    mock.assert_async().await;
    assert_eq!(incidents.len(), 1);
    assert_eq!(incidents[0].title(), "Nouvel incident: accident");
}

/// **Test: an unreachable backend is reported as Unavailable naming the base URL.**
#[tokio::test]
async fn test_unreachable_backend_is_unavailable() {
    let config = GatewayConfig::with_urls("http://127.0.0.1:1", "http://127.0.0.1:1");
    let gateway = HttpGateway::new(config).unwrap();
    let err = gateway
        .register_profile(&ProfileUpsert::name_only("Awa"))
        .await
        .unwrap_err();
    assert!(err.is_unavailable(), "expected Unavailable, got {:?}", err);
    assert!(err.to_string().contains("http://127.0.0.1:1"));
}
