mod common;

use autofuturo_knowledge::{NOT_CONFIGURED_MESSAGE, NO_RESULTS_MESSAGE};
use autofuturo_server::config::Config;
use autofuturo_server::{app, build_state};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use common::{financing_record, test_state, CallEvent, FakeCalls, FixedStore, TRANSFER_LINE};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn health_check_returns_ok() {
    let app = app(test_state(Arc::new(FakeCalls::default()), None, None));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn inbound_job_greets_and_never_dials() {
    let calls = Arc::new(FakeCalls::default());
    let app = app(test_state(calls.clone(), None, None));

    let response = app
        .oneshot(post_json(
            "/api/jobs",
            json!({"room_name": "inbound-1", "metadata": "  "}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let plan = body_json(response).await;
    assert_eq!(plan["direction"], "inbound");
    assert_eq!(plan["agent_name"], "autofuturo-ia");
    assert_eq!(plan["greeting"], "Saluda al usuario y ofrécele tu ayuda.");
    assert_eq!(
        plan["farewell"],
        "Gracias por tu tiempo. Ha sido un placer ayudarte. La llamada está terminando."
    );
    assert_eq!(plan["session"]["noise_cancellation"], "bvc");
    assert_eq!(plan["mcp_servers"][0]["headers"]["token"], "mcp-token");
    assert!(plan.get("dial").is_none());
    assert!(plan["instructions"].as_str().unwrap().contains("(UTC-5)"));

    let tool_names: Vec<&str> = plan["tools"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(
        tool_names,
        ["buscar_en_base_de_conocimiento", "transfer_call", "end_call"]
    );
    assert!(calls.events().is_empty());
}

#[tokio::test]
async fn outbound_job_dials_without_greeting() {
    let calls = Arc::new(FakeCalls::default());
    let app = app(test_state(calls.clone(), None, None));

    let metadata = json!({
        "phone_number": "+51987654321",
        "name": "María",
        "appointment_time": "sábado 10 AM"
    })
    .to_string();
    let response = app
        .oneshot(post_json(
            "/api/jobs",
            json!({"room_name": "outbound-1", "metadata": metadata}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let plan = body_json(response).await;
    assert_eq!(plan["direction"], "outbound");
    assert!(plan["greeting"].is_null());
    assert_eq!(plan["session"]["noise_cancellation"], "bvc_telephony");
    assert_eq!(plan["dial"]["participant_identity"], "sip_51987654321");
    let instructions = plan["instructions"].as_str().unwrap();
    assert!(instructions.contains("María"));
    assert!(instructions.contains("sábado 10 AM"));

    assert_eq!(
        calls.events(),
        vec![CallEvent::Dial {
            room: "outbound-1".to_string(),
            phone: "+51987654321".to_string(),
        }]
    );
}

#[tokio::test]
async fn malformed_metadata_is_rejected_without_dialing() {
    let bad_metadata = [
        "not json",
        r#"{"phone_number": "987654321"}"#,
        r#"{"phone_number": "+51987654321", "transfer_to": "+1"}"#,
        r#"{"name": "María"}"#,
    ];

    for metadata in bad_metadata {
        let calls = Arc::new(FakeCalls::default());
        let app = app(test_state(calls.clone(), None, None));
        let response = app
            .oneshot(post_json(
                "/api/jobs",
                json!({"room_name": "outbound-2", "metadata": metadata}),
            ))
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::UNPROCESSABLE_ENTITY,
            "metadata {metadata:?}"
        );
        let error = body_json(response).await;
        assert!(!error["error"].as_str().unwrap().is_empty());
        assert!(calls.events().is_empty(), "dialed for {metadata:?}");
    }
}

#[tokio::test]
async fn inbound_phone_caller_gets_telephony_noise_model() {
    let calls = Arc::new(FakeCalls::default());
    let app = app(test_state(calls.clone(), None, None));

    let response = app
        .oneshot(post_json(
            "/api/jobs",
            json!({"room_name": "inbound-sip-1", "sip_caller": true}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let plan = body_json(response).await;
    assert_eq!(plan["direction"], "inbound");
    assert_eq!(plan["session"]["noise_cancellation"], "bvc_telephony");
    assert!(calls.events().is_empty());
}

#[tokio::test]
async fn rejected_bodies_answer_with_json_errors() {
    let cases = [
        ("/api/jobs", "application/json", "{\"room_name\": ", StatusCode::BAD_REQUEST),
        ("/api/jobs", "application/json", "{\"room_name\": 5}", StatusCode::UNPROCESSABLE_ENTITY),
        ("/api/jobs", "text/plain", "{\"room_name\": \"r\"}", StatusCode::UNSUPPORTED_MEDIA_TYPE),
        (
            "/api/tools/transfer_call",
            "application/json",
            "not json",
            StatusCode::BAD_REQUEST,
        ),
    ];

    for (uri, content_type, body, status) in cases {
        let app = app(test_state(Arc::new(FakeCalls::default()), None, None));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("Content-Type", content_type)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), status, "{uri} {body:?}");
        let error = body_json(response).await;
        assert!(
            !error["error"].as_str().unwrap().is_empty(),
            "{uri} {body:?}"
        );
    }
}

#[tokio::test]
async fn failed_dial_is_bad_gateway() {
    let calls = Arc::new(FakeCalls::failing());
    let app = app(test_state(calls, None, None));

    let response = app
        .oneshot(post_json(
            "/api/jobs",
            json!({"room_name": "outbound-3", "metadata": r#"{"phone_number": "+51987654321"}"#}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let error = body_json(response).await;
    assert!(error["error"].as_str().unwrap().contains("trunk down"));
}

#[tokio::test]
async fn blank_room_name_is_bad_request() {
    let app = app(test_state(Arc::new(FakeCalls::default()), None, None));
    let response = app
        .oneshot(post_json("/api/jobs", json!({"room_name": " "})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn knowledge_tool_returns_formatted_references() {
    let store = Arc::new(FixedStore(vec![financing_record()]));
    let app = app(test_state(Arc::new(FakeCalls::default()), Some(store), None));

    let response = app
        .oneshot(post_json(
            "/api/tools/buscar_en_base_de_conocimiento",
            json!({"arguments": {"pregunta": "¿Tienen financiamiento?"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "1. **referencia 1 - Inicio**\nid: 7\nsimilarity: 0.8123\ncontent: Ofrecemos financiamiento a 36 meses.\n**fin de referencia 1**\n\n"
    );
}

#[tokio::test]
async fn knowledge_tool_reports_empty_and_unconfigured_stores() {
    let empty = Arc::new(FixedStore(Vec::new()));
    let app_empty = app(test_state(Arc::new(FakeCalls::default()), Some(empty), None));
    let response = app_empty
        .oneshot(post_json(
            "/api/tools/buscar_en_base_de_conocimiento",
            json!({"arguments": {"pregunta": "¿Horario del sábado?"}}),
        ))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, NO_RESULTS_MESSAGE);

    let app_unconfigured = app(test_state(Arc::new(FakeCalls::default()), None, None));
    let response = app_unconfigured
        .oneshot(post_json(
            "/api/tools/buscar_en_base_de_conocimiento",
            json!({"arguments": {"pregunta": "¿Horario del sábado?"}}),
        ))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, NOT_CONFIGURED_MESSAGE);
}

#[tokio::test]
async fn unknown_tool_is_not_found() {
    let app = app(test_state(Arc::new(FakeCalls::default()), None, None));
    let response = app
        .oneshot(post_json("/api/tools/consultar_inventario", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_argument_is_bad_request() {
    let app = app(test_state(Arc::new(FakeCalls::default()), None, None));
    let response = app
        .oneshot(post_json(
            "/api/tools/buscar_en_base_de_conocimiento",
            json!({"arguments": {}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert!(error["error"].as_str().unwrap().contains("pregunta"));
}

#[tokio::test]
async fn transfer_tool_uses_configured_line() {
    let calls = Arc::new(FakeCalls::default());
    let app = app(test_state(calls.clone(), None, None));

    let response = app
        .oneshot(post_json(
            "/api/tools/transfer_call",
            json!({
                "arguments": {},
                "room_name": "inbound-9",
                "participant_identity": "sip_51999888777"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "transferencia iniciada");
    assert_eq!(
        calls.events(),
        vec![CallEvent::Transfer {
            room: "inbound-9".to_string(),
            participant: "sip_51999888777".to_string(),
            to: TRANSFER_LINE.to_string(),
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn scheduled_hang_up_outlives_the_router() {
    let calls = Arc::new(FakeCalls::default());
    let state = test_state(calls.clone(), None, None);
    let hangups = state.hangups.clone();

    let response = app(state)
        .oneshot(post_json(
            "/api/tools/end_call",
            json!({"room_name": "inbound-11", "participant_identity": "sip_1"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "llamada terminada exitosamente");
    assert!(calls.events().is_empty());
    assert_eq!(hangups.len(), 1);

    hangups.drain().await;
    assert_eq!(
        calls.events(),
        vec![CallEvent::HangUp("inbound-11".to_string())]
    );
}

#[tokio::test]
async fn list_tools_returns_declarations() {
    let app = app(test_state(Arc::new(FakeCalls::default()), None, None));
    let response = app
        .oneshot(Request::builder().uri("/api/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let tools = body_json(response).await;
    let search = &tools[0];
    assert_eq!(search["name"], "buscar_en_base_de_conocimiento");
    assert_eq!(search["parameters"]["required"], json!(["pregunta"]));
}

#[tokio::test]
async fn api_token_is_enforced() {
    let state = || test_state(Arc::new(FakeCalls::default()), None, Some("s3cret"));

    let response = app(state())
        .oneshot(Request::builder().uri("/api/tools").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app(state())
        .oneshot(
            Request::builder()
                .uri("/api/tools")
                .header("Authorization", "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app(state())
        .oneshot(
            Request::builder()
                .uri("/api/tools")
                .header("Authorization", "Bearer s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Health stays public.
    let response = app(state())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn state_built_from_config_issues_agent_tokens() {
    let mut config = Config::default();
    config.providers.openai_api_key = "sk-test".to_string();
    config.providers.deepgram_api_key = "dg-test".to_string();
    config.livekit.url = "ws://localhost:7880".to_string();
    config.livekit.api_key = "devkey".to_string();
    config.livekit.api_secret = "secret".to_string();

    let state = build_state(&config).unwrap();
    assert_eq!(state.tools.len(), 3);

    let response = app(state)
        .oneshot(post_json("/api/jobs", json!({"room_name": "web-1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let plan = body_json(response).await;
    assert_eq!(plan["direction"], "inbound");
    assert_eq!(plan["agent_identity"], "agent-alex");
    assert!(plan["agent_token"].as_str().unwrap().split('.').count() == 3);
    assert!(plan["mcp_servers"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn state_built_without_supabase_answers_not_configured() {
    let state = build_state(&Config::default()).unwrap();
    let response = app(state)
        .oneshot(post_json(
            "/api/tools/buscar_en_base_de_conocimiento",
            json!({"arguments": {"pregunta": "¿Tienen la RAV4?"}}),
        ))
        .await
        .unwrap();
    assert_eq!(body_text(response).await, NOT_CONFIGURED_MESSAGE);
}

#[tokio::test]
async fn missing_instructions_file_fails_startup() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.agent.instructions_path = Some(
        dir.path()
            .join("missing.md")
            .to_string_lossy()
            .into_owned(),
    );
    assert!(build_state(&config).is_err());
}
