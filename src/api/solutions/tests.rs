use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
async fn upsert_keeps_one_solution_and_grades_submitted_answers() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = test_support::insert_student(ctx.state.db(), "s@example.com", 10).await;
    let exercise = test_support::insert_exercise(&ctx.state, &admin.id, &["2", "ampere"]).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/solutions",
            Some(&token),
            Some(json!({
                "exercise_id": exercise.id,
                "answer_text": "Ohm's law gives $I = U / R$.",
                "submitted_answers": ["2", null]
            })),
        ))
        .await
        .expect("first upsert");

    let status = response.status();
    let first = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {first}");
    assert_eq!(first["correct_count"], 1);
    assert_eq!(first["is_correct"], false);
    assert_eq!(first["review_status"], "pending");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/solutions",
            Some(&token),
            Some(json!({
                "exercise_id": exercise.id,
                "submitted_answers": [null, " Ampere "]
            })),
        ))
        .await
        .expect("second upsert");

    let second = test_support::read_json(response).await;
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["submitted_answers"], json!(["2", "Ampere"]));
    assert_eq!(second["correct_count"], 2);
    assert_eq!(second["is_correct"], true);
    assert_eq!(second["answer_text"], "Ohm's law gives $I = U / R$.");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM solutions WHERE user_id = $1")
        .bind(&student.id)
        .fetch_one(ctx.state.db())
        .await
        .expect("solution count");
    assert_eq!(rows, 1);

    let attempts: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM exercise_answers WHERE user_id = $1")
            .bind(&student.id)
            .fetch_one(ctx.state.db())
            .await
            .expect("attempt count");
    assert_eq!(attempts, 2);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/solutions",
            Some(&token),
            Some(json!({ "exercise_id": exercise.id, "submitted_answers": ["2"] })),
        ))
        .await
        .expect("short sheet");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn upsert_rejects_empty_payload_and_unknown_exercise() {
    let ctx = test_support::setup_test_context().await;

    let student = test_support::insert_student(ctx.state.db(), "s@example.com", 10).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/solutions",
            Some(&token),
            Some(json!({ "exercise_id": "missing" })),
        ))
        .await
        .expect("empty upsert");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/solutions",
            Some(&token),
            Some(json!({ "exercise_id": "missing", "answer_text": "F = ma" })),
        ))
        .await
        .expect("unknown exercise");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/solutions",
            Some(&token),
            Some(json!({ "exercise_id": "missing", "image_key": "../etc/passwd" })),
        ))
        .await
        .expect("bad image key");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn students_see_only_their_own_solutions() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let alice = test_support::insert_student(ctx.state.db(), "alice@example.com", 10).await;
    let bob = test_support::insert_student(ctx.state.db(), "bob@example.com", 10).await;
    let exercise = test_support::insert_exercise(&ctx.state, &admin.id, &["1"]).await;
    let alice_token = test_support::bearer_token(&alice.id, ctx.state.settings());
    let bob_token = test_support::bearer_token(&bob.id, ctx.state.settings());
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let mut solution_ids = Vec::new();
    for token in [&alice_token, &bob_token] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/solutions",
                Some(token),
                Some(json!({ "exercise_id": exercise.id, "answer_text": "v = 1" })),
            ))
            .await
            .expect("upsert");
        let body = test_support::read_json(response).await;
        solution_ids.push(body["id"].as_str().expect("solution id").to_string());
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/solutions?user_id={}", bob.id),
            Some(&alice_token),
            None,
        ))
        .await
        .expect("alice list");
    let body = test_support::read_json(response).await;
    let items = body.as_array().expect("array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["user_id"], alice.id);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/solutions/{}", solution_ids[1]),
            Some(&alice_token),
            None,
        ))
        .await
        .expect("foreign detail");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/solutions?exercise_id={}", exercise.id),
            Some(&admin_token),
            None,
        ))
        .await
        .expect("admin list");
    let body = test_support::read_json(response).await;
    assert_eq!(body.as_array().expect("array").len(), 2);
}

#[tokio::test]
async fn admin_reviews_and_resubmission_resets_status() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = test_support::insert_student(ctx.state.db(), "s@example.com", 10).await;
    let exercise = test_support::insert_exercise(&ctx.state, &admin.id, &["1"]).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/solutions",
            Some(&token),
            Some(json!({ "exercise_id": exercise.id, "answer_text": "a = g" })),
        ))
        .await
        .expect("upsert");
    let solution = test_support::read_json(response).await;
    let status_uri = format!("/api/v1/solutions/{}/status", solution["id"].as_str().unwrap());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &status_uri,
            Some(&token),
            Some(json!({ "status": "approved" })),
        ))
        .await
        .expect("student review");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &status_uri,
            Some(&admin_token),
            Some(json!({ "status": "needs_work", "review_comment": "Show the projection." })),
        ))
        .await
        .expect("admin review");
    let status = response.status();
    let reviewed = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::OK, "response: {reviewed}");
    assert_eq!(reviewed["review_status"], "needs_work");
    assert_eq!(reviewed["review_comment"], "Show the projection.");
    assert_eq!(reviewed["reviewed_by"], admin.id);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/solutions",
            Some(&token),
            Some(json!({ "exercise_id": exercise.id, "answer_text": "a = g sin(30)" })),
        ))
        .await
        .expect("resubmit");
    let resubmitted = test_support::read_json(response).await;
    assert_eq!(resubmitted["review_status"], "pending");
    assert_eq!(resubmitted["review_comment"], serde_json::Value::Null);

    let delete_uri = format!("/api/v1/solutions/{}", solution["id"].as_str().unwrap());
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::DELETE, &delete_uri, Some(&admin_token), None))
        .await
        .expect("delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::DELETE, &delete_uri, Some(&admin_token), None))
        .await
        .expect("delete again");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
