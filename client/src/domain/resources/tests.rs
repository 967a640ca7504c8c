//! Resource methods against the scripted transport.

use rstest::rstest;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::domain::ports::CredentialStore;
use crate::domain::{AccessErrorKind, Credential, RequestBody, UploadPart};
use crate::test_support::TestHarness;

fn cancel() -> CancellationToken {
    CancellationToken::new()
}

fn sensitive_body(body: &RequestBody) -> serde_json::Value {
    match body {
        RequestBody::SensitiveJson(secret) => {
            serde_json::from_slice(secret.expose()).expect("body is JSON")
        }
        other => panic!("expected a sensitive JSON body, got {other:?}"),
    }
}

#[rstest]
#[case::empty("")]
#[case::blank("   ")]
#[case::slash("a/b")]
#[case::dot(".")]
#[case::dot_dot("..")]
fn unusable_ids_are_rejected(#[case] id: &str) {
    let error = resource_id("activity", id).expect_err("id should be rejected");
    assert_eq!(error.kind(), AccessErrorKind::Validation);
}

#[rstest]
fn ids_are_trimmed() {
    assert_eq!(resource_id("activity", " 42 ").expect("valid id"), "42");
}

#[tokio::test]
async fn login_stores_the_returned_token() {
    let harness = TestHarness::new();
    harness.transport.respond(
        200,
        r#"{"token":"tok-1","user":{"id":"u1","email":"a@example.test","displayName":"Ada"}}"#,
    );

    let user = harness
        .layer
        .login(&LoginRequest::new("a@example.test", "hunter2"), &cancel())
        .await
        .expect("login succeeds");

    assert_eq!(user.display_name.as_deref(), Some("Ada"));
    assert_eq!(
        harness.credentials.get(),
        Some(Credential::new("tok-1").expect("valid token"))
    );
    let request = &harness.transport.requests()[0];
    assert_eq!(request.url.as_str(), "https://origin.example.test/auth/login");
    assert_eq!(request.header("Authorization"), None);
    assert_eq!(request.header("Content-Type"), Some("application/json"));
    assert_eq!(
        sensitive_body(&request.body),
        json!({ "email": "a@example.test", "password": "hunter2" })
    );
    assert!(!format!("{:?}", request.body).contains("hunter2"));
}

#[tokio::test]
async fn sign_in_calls_never_reach_the_cdn() {
    let harness = TestHarness::new().signed_in("stale");
    let reply = r#"{"token":"tok-1","user":{"id":"u1","email":"a@example.test"}}"#;
    harness.transport.respond(200, reply).respond(201, reply);

    harness
        .layer
        .login(&LoginRequest::new("a@example.test", "pw"), &cancel())
        .await
        .expect("login succeeds");
    harness
        .layer
        .register(&RegistrationRequest::new("a@example.test", "pw"), &cancel())
        .await
        .expect("registration succeeds");

    assert_eq!(harness.transport.calls_to("cdn.example.test"), 0);
    assert_eq!(harness.transport.calls_to("origin.example.test"), 2);
    assert!(
        harness
            .transport
            .requests()
            .iter()
            .all(|request| request.header("Authorization").is_none())
    );
}

#[tokio::test]
async fn login_rejection_is_permission_denied_with_the_backend_message() {
    let harness = TestHarness::new().signed_in("previous");
    harness
        .transport
        .respond(401, r#"{"message":"Invalid email or password"}"#);

    let error = harness
        .layer
        .login(&LoginRequest::new("a@example.test", "nope"), &cancel())
        .await
        .expect_err("login fails");

    assert_eq!(error.kind(), AccessErrorKind::PermissionDenied);
    assert_eq!(error.message(), "Invalid email or password");
    assert_eq!(error.status(), Some(401));
    assert_eq!(harness.transport.requests().len(), 1);
    assert_eq!(harness.transport.calls_to("api.example.test"), 0);
    assert!(harness.layer.has_credential());
}

#[tokio::test]
async fn register_accepts_the_access_token_alias() {
    let harness = TestHarness::new();
    harness.transport.respond(
        201,
        r#"{"accessToken":"tok-2","user":{"id":"u2","email":"b@example.test"}}"#,
    );
    let request = RegistrationRequest::new("b@example.test", "pw").with_display_name("Bea");

    let user = harness
        .layer
        .register(&request, &cancel())
        .await
        .expect("registration succeeds");

    assert_eq!(user.id, "u2");
    assert!(harness.layer.has_credential());
    let sent = &harness.transport.requests()[0];
    assert_eq!(sent.url.path(), "/auth/register");
    assert_eq!(
        sensitive_body(&sent.body),
        json!({ "email": "b@example.test", "password": "pw", "displayName": "Bea" })
    );
}

#[tokio::test]
async fn unusable_token_is_reported_and_not_stored() {
    let harness = TestHarness::new();
    harness
        .transport
        .respond(200, r#"{"token":"  ","user":{"id":"u1","email":"a@example.test"}}"#);

    let error = harness
        .layer
        .login(&LoginRequest::new("a@example.test", "pw"), &cancel())
        .await
        .expect_err("blank token rejected");

    assert_eq!(error.kind(), AccessErrorKind::Unknown);
    assert!(!harness.layer.has_credential());
}

#[rstest]
fn logout_clears_the_credential() {
    let harness = TestHarness::new().signed_in("abc");
    harness.layer.logout().expect("logout succeeds");
    assert!(!harness.layer.has_credential());
}

#[rstest]
fn login_request_debug_redacts_the_password() {
    let rendered = format!("{:?}", LoginRequest::new("a@example.test", "hunter2"));
    assert!(!rendered.contains("hunter2"));
    assert!(rendered.contains("a@example.test"));
}

#[tokio::test]
async fn list_activities_sends_query_parameters() {
    let harness = TestHarness::new();
    harness.transport.respond(
        200,
        r#"{"items":[{"id":"a1","title":"Coastal walk"}],"nextPage":2}"#,
    );
    let query = ActivityQuery {
        page: Some(1),
        per_page: None,
        search: Some("sea & sky".to_owned()),
    };

    let page = harness
        .layer
        .list_activities(&query, &cancel())
        .await
        .expect("listing succeeds");

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.next_page, Some(2));
    assert_eq!(
        harness.transport.requests()[0].url.as_str(),
        "https://cdn.example.test/activities?page=1&search=sea+%26+sky"
    );
}

#[tokio::test]
async fn get_activity_keeps_content_opaque() {
    let harness = TestHarness::new();
    harness.transport.respond(
        200,
        r#"{"id":"a1","title":"Coastal walk","content":{"blocks":[{"kind":"text"}]}}"#,
    );

    let activity = harness
        .layer
        .get_activity("a1", &cancel())
        .await
        .expect("fetch succeeds");

    assert_eq!(activity.content["blocks"][0]["kind"], json!("text"));
}

#[tokio::test]
async fn invalid_id_fails_before_any_request() {
    let harness = TestHarness::new();

    let error = harness
        .layer
        .get_stage("../admin", &cancel())
        .await
        .expect_err("id rejected");

    assert_eq!(error.kind(), AccessErrorKind::Validation);
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn malformed_payload_is_unknown_with_status() {
    let harness = TestHarness::new();
    harness.transport.respond(200, "<html>");

    let error = harness
        .layer
        .get_activity("a1", &cancel())
        .await
        .expect_err("decode fails");

    assert_eq!(error.kind(), AccessErrorKind::Unknown);
    assert_eq!(error.status(), Some(200));
    assert_eq!(error.endpoint(), Some("GET /activities/a1"));
}

#[tokio::test]
async fn overview_degrades_to_no_stages() {
    let harness = TestHarness::new();
    harness
        .transport
        .respond(200, r#"{"id":"a1","title":"Coastal walk"}"#)
        .respond(404, r#"{"message":"No stages"}"#);

    let overview = harness
        .layer
        .activity_overview("a1", &cancel())
        .await
        .expect("overview succeeds");

    assert_eq!(overview.activity.id, "a1");
    assert!(overview.stages.is_empty());
    assert_eq!(
        harness.transport.requests()[1].url.path(),
        "/activities/a1/stages"
    );
}

#[tokio::test]
async fn overview_fails_when_the_activity_fails() {
    let harness = TestHarness::new();
    harness.transport.respond(404, r#"{"message":"Not found"}"#);

    let error = harness
        .layer
        .activity_overview("missing", &cancel())
        .await
        .expect_err("overview fails");

    assert_eq!(error.kind(), AccessErrorKind::Validation);
    assert_eq!(harness.transport.requests().len(), 1);
}

#[tokio::test]
async fn list_stages_decodes_positions() {
    let harness = TestHarness::new();
    harness.transport.respond(
        200,
        r#"[{"id":"s1","activityId":"a1","title":"Start","position":1}]"#,
    );

    let stages = harness
        .layer
        .list_stages("a1", &cancel())
        .await
        .expect("listing succeeds");

    assert_eq!(stages[0].position, 1);
    assert_eq!(stages[0].activity_id, "a1");
}

#[tokio::test]
async fn payment_session_uses_the_authenticated_channel() {
    let harness = TestHarness::new().signed_in("abc");
    harness.transport.respond(
        201,
        r#"{"id":"ps1","status":"requires_action","checkoutUrl":"https://pay.example.test/ps1","amountMinor":1500,"currency":"EUR"}"#,
    );
    let request = PaymentSessionRequest {
        activity_id: "a1".to_owned(),
        stage_id: None,
        amount_minor: 1500,
        currency: "EUR".to_owned(),
    };

    let session = harness
        .layer
        .submit_payment_session(&request, &cancel())
        .await
        .expect("session opens");

    assert_eq!(session.status, PaymentStatus::RequiresAction);
    let sent = &harness.transport.requests()[0];
    assert_eq!(sent.url.as_str(), "https://api.example.test/payments/sessions");
    assert!(sent.header("Idempotency-Key").is_some());
    match &sent.body {
        RequestBody::Json(body) => {
            assert_eq!(
                body,
                &json!({ "activityId": "a1", "amountMinor": 1500, "currency": "EUR" })
            );
        }
        other => panic!("expected a JSON body, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_payment_status_is_tolerated() {
    let harness = TestHarness::new().signed_in("abc");
    harness.transport.respond(
        200,
        r#"{"id":"ps1","status":"on_hold","amountMinor":1,"currency":"EUR"}"#,
    );

    let session = harness
        .layer
        .get_payment_session("ps1", &cancel())
        .await
        .expect("fetch succeeds");

    assert_eq!(session.status, PaymentStatus::Unknown);
}

#[tokio::test]
async fn zero_amount_is_rejected_locally() {
    let harness = TestHarness::new().signed_in("abc");
    let request = PaymentSessionRequest {
        activity_id: "a1".to_owned(),
        stage_id: None,
        amount_minor: 0,
        currency: "EUR".to_owned(),
    };

    let error = harness
        .layer
        .submit_payment_session(&request, &cancel())
        .await
        .expect_err("zero amount rejected");

    assert_eq!(error.kind(), AccessErrorKind::Validation);
    assert!(harness.transport.requests().is_empty());
}

#[tokio::test]
async fn forbidden_profile_read_is_permission_denied() {
    let harness = TestHarness::new().signed_in("abc");
    harness.transport.respond(403, "").respond(403, "");

    let error = harness
        .layer
        .get_profile(&cancel())
        .await
        .expect_err("profile read fails");

    assert_eq!(error.kind(), AccessErrorKind::PermissionDenied);
    assert_eq!(harness.transport.requests().len(), 2);
    assert!(harness.layer.has_credential());
}

#[tokio::test]
async fn profile_update_omits_unset_fields() {
    let harness = TestHarness::new().signed_in("abc");
    harness
        .transport
        .respond(200, r#"{"id":"u1","email":"a@example.test","bio":"Walker"}"#);
    let update = ProfileUpdate {
        display_name: None,
        bio: Some("Walker".to_owned()),
    };

    let profile = harness
        .layer
        .update_profile(&update, &cancel())
        .await
        .expect("update succeeds");

    assert_eq!(profile.bio.as_deref(), Some("Walker"));
    let sent = &harness.transport.requests()[0];
    assert!(matches!(sent.method, crate::domain::Method::Put));
    match &sent.body {
        RequestBody::Json(body) => assert_eq!(body, &json!({ "bio": "Walker" })),
        other => panic!("expected a JSON body, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_profile_update_is_rejected_locally() {
    let harness = TestHarness::new().signed_in("abc");

    let error = harness
        .layer
        .update_profile(&ProfileUpdate::default(), &cancel())
        .await
        .expect_err("empty update rejected");

    assert_eq!(error.kind(), AccessErrorKind::Validation);
}

#[tokio::test]
async fn profile_image_goes_to_the_upload_origin_as_multipart() {
    let harness = TestHarness::new().signed_in("abc");
    harness
        .transport
        .respond(200, r#"{"url":"https://img.example.test/u1.png"}"#);
    let image = ImageUpload {
        file_name: "me.png".to_owned(),
        content_type: "image/png".to_owned(),
        bytes: vec![137, 80, 78, 71],
    };

    let uploaded = harness
        .layer
        .upload_profile_image(image, &cancel())
        .await
        .expect("upload succeeds");

    assert_eq!(uploaded.url, "https://img.example.test/u1.png");
    let sent = &harness.transport.requests()[0];
    assert_eq!(sent.url.as_str(), "https://origin.example.test/profile/image");
    assert_eq!(sent.header("Content-Type"), None);
    match &sent.body {
        RequestBody::Multipart(form) => match form.parts() {
            [UploadPart::File { name, file_name, .. }] => {
                assert_eq!(name, "image");
                assert_eq!(file_name, "me.png");
            }
            parts => panic!("expected one file part, got {parts:?}"),
        },
        other => panic!("expected a multipart body, got {other:?}"),
    }
}

#[tokio::test]
async fn cancelled_call_surfaces_as_cancelled() {
    let harness = TestHarness::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let error = harness
        .layer
        .list_activities(&ActivityQuery::default(), &cancel)
        .await
        .expect_err("cancelled");

    assert_eq!(error.kind(), AccessErrorKind::Cancelled);
    assert!(harness.transport.requests().is_empty());
}
