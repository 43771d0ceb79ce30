pub mod utils;

use axum::http::StatusCode;
use serde_json::json;
use utils::{PROXY_HEADER, create_test_admin, create_test_app, create_test_user, survey_form_json};

use crate::{
    gate::{DriverScreen, SurveyState},
    session::{DriverFlow, FlowEvent, FlowScreen},
    store::memory::StoreOp,
};

/// A new user applies, is approved, and can then open the operational form
#[test_log::test(tokio::test)]
async fn test_e2e_apply_approve_drive() {
    let (app, store) = create_test_app();
    let admin = create_test_admin(&store);
    let ali = create_test_user(&store);
    let ali_header = ali.id.to_string();

    // First visit: no permission, no survey
    let access: serde_json::Value = app
        .get("/api/v1/drivers/current/access")
        .add_header(PROXY_HEADER, &ali_header)
        .await
        .json();
    assert_eq!(access["access"], "denied");
    assert_eq!(access["screen"]["screen"], "intake_form");

    app.post("/api/v1/drivers/current/survey")
        .add_header(PROXY_HEADER, &ali_header)
        .json(&survey_form_json("Ali", json!("25")))
        .await
        .assert_status(StatusCode::CREATED);

    // Pending: status screen, still denied
    let access: serde_json::Value = app
        .get("/api/v1/drivers/current/access")
        .add_header(PROXY_HEADER, &ali_header)
        .await
        .json();
    assert_eq!(access["access"], "denied");
    assert_eq!(access["screen"], json!({"screen": "application_status", "state": "under_review"}));

    let reviewed: serde_json::Value = app
        .patch(&format!("/api/v1/driver-surveys/{}", ali.id))
        .add_header(PROXY_HEADER, &admin.id.to_string())
        .json(&json!({"status": "approved"}))
        .await
        .json();
    assert_eq!(reviewed["survey"]["status"], "approved");
    assert_eq!(reviewed["permission"]["is_approved"], true);
    assert_eq!(reviewed["permission"]["approved_by"], admin.id.to_string());

    let access: serde_json::Value = app
        .get("/api/v1/drivers/current/access")
        .add_header(PROXY_HEADER, &ali_header)
        .await
        .json();
    assert_eq!(access["access"], "granted");
    assert_eq!(access["screen"]["screen"], "operational_form");

    // Revoking sends Ali back to the status screen, which still reports the acceptance
    app.post(&format!("/api/v1/driver-permissions/{}/toggle", ali.id))
        .add_header(PROXY_HEADER, &admin.id.to_string())
        .json(&json!({"current_approved": true}))
        .await
        .assert_status_ok();

    let access: serde_json::Value = app
        .get("/api/v1/drivers/current/access")
        .add_header(PROXY_HEADER, &ali_header)
        .await
        .json();
    assert_eq!(access["access"], "denied");
    assert_eq!(access["screen"], json!({"screen": "application_status", "state": "accepted"}));
}

/// A rejected applicant can't reapply and sees the rejection
#[test_log::test(tokio::test)]
async fn test_e2e_rejected_applicant() {
    let (app, store) = create_test_app();
    let admin = create_test_admin(&store);
    let user = create_test_user(&store);
    let header = user.id.to_string();

    app.post("/api/v1/drivers/current/survey")
        .add_header(PROXY_HEADER, &header)
        .json(&survey_form_json("Salem", json!(31)))
        .await
        .assert_status(StatusCode::CREATED);

    app.patch(&format!("/api/v1/driver-surveys/{}", user.id))
        .add_header(PROXY_HEADER, &admin.id.to_string())
        .json(&json!({"status": "rejected"}))
        .await
        .assert_status_ok();

    let status: serde_json::Value = app
        .get("/api/v1/drivers/current/survey")
        .add_header(PROXY_HEADER, &header)
        .await
        .json();
    assert_eq!(status["state"], "rejected");
    assert_eq!(status["message"], SurveyState::Rejected.message().unwrap());

    app.post("/api/v1/drivers/current/survey")
        .add_header(PROXY_HEADER, &header)
        .json(&survey_form_json("Salem", json!(31)))
        .await
        .assert_status(StatusCode::CONFLICT);
}

/// The client-side flow driven by real responses
#[test_log::test(tokio::test)]
async fn test_e2e_flow_follows_server_decisions() {
    let (app, store) = create_test_app();
    let user = create_test_user(&store);
    let header = user.id.to_string();
    let mut flow = DriverFlow::new();

    flow.handle(FlowEvent::DriverClicked);
    assert!(flow.is_loading());

    let access: serde_json::Value = app
        .get("/api/v1/drivers/current/access")
        .add_header(PROXY_HEADER, &header)
        .await
        .json();
    assert_eq!(access["screen"]["screen"], "intake_form");
    flow.handle(FlowEvent::Resolved(DriverScreen::IntakeForm));
    assert_eq!(flow.screen(), FlowScreen::IntakeForm);

    flow.handle(FlowEvent::Submit);
    assert!(flow.is_loading());
    let response = app
        .post("/api/v1/drivers/current/survey")
        .add_header(PROXY_HEADER, &header)
        .json(&survey_form_json("Ali", json!("25")))
        .await;
    response.assert_status(StatusCode::CREATED);
    flow.handle(FlowEvent::SubmitSucceeded);
    assert_eq!(flow.screen(), FlowScreen::Confirmation);

    flow.handle(FlowEvent::Close);
    assert_eq!(flow.screen(), FlowScreen::Main);
}

/// A failed permission insert leaves the survey in place and reports the backend message
#[test_log::test(tokio::test)]
async fn test_e2e_partial_submission_failure() {
    let (app, store) = create_test_app();
    let user = create_test_user(&store);
    let header = user.id.to_string();
    store.fail_on(StoreOp::InsertPermission, "insert or update on table \"driver_permissions\" violates row-level security");

    let response = app
        .post("/api/v1/drivers/current/survey")
        .add_header(PROXY_HEADER, &header)
        .json(&survey_form_json("Ali", json!("25")))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().starts_with("Backend failure: "));

    store.clear_failure(StoreOp::InsertPermission);
    let status: serde_json::Value = app
        .get("/api/v1/drivers/current/survey")
        .add_header(PROXY_HEADER, &header)
        .await
        .json();
    assert_eq!(status["state"], "under_review");

    let access: serde_json::Value = app
        .get("/api/v1/drivers/current/access")
        .add_header(PROXY_HEADER, &header)
        .await
        .json();
    assert_eq!(access["access"], "denied");
}

#[test_log::test(tokio::test)]
async fn test_health_and_docs_routes() {
    let (app, _store) = create_test_app();

    let health = app.get("/healthz").await;
    health.assert_status_ok();
    assert_eq!(health.text(), "OK");

    let doc: serde_json::Value = app.get("/api-docs/openapi.json").await.json();
    assert!(doc["paths"]["/drivers/current/access"].is_object());
    assert_eq!(doc["servers"][0]["url"], "/api/v1");

    app.get("/docs").await.assert_status_ok();
}
