use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::test_support;

#[tokio::test]
async fn admin_manages_sources_and_duplicates_conflict() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let token = test_support::bearer_token(&admin.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/sources",
            Some(&token),
            Some(json!({ "name": "  Irodov  " })),
        ))
        .await
        .expect("create source");
    let status = response.status();
    let created = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {created}");
    assert_eq!(created["name"], "Irodov");
    let source_id = created["id"].as_str().expect("source id").to_string();

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/sources",
            Some(&token),
            Some(json!({ "name": "Irodov" })),
        ))
        .await
        .expect("duplicate source");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/sources/{source_id}"),
            Some(&token),
            Some(json!({ "name": "Irodov, 1979" })),
        ))
        .await
        .expect("rename source");
    let renamed = test_support::read_json(response).await;
    assert_eq!(renamed["name"], "Irodov, 1979");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::DELETE,
            &format!("/api/v1/sources/{source_id}"),
            Some(&token),
            None,
        ))
        .await
        .expect("delete source");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::PATCH,
            &format!("/api/v1/sources/{source_id}"),
            Some(&token),
            Some(json!({ "name": "Gone" })),
        ))
        .await
        .expect("rename missing");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn kinds_are_separate_and_students_only_read() {
    let ctx = test_support::setup_test_context().await;

    let admin = test_support::insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = test_support::insert_student(ctx.state.db(), "s@example.com", 10).await;
    let admin_token = test_support::bearer_token(&admin.id, ctx.state.settings());
    let student_token = test_support::bearer_token(&student.id, ctx.state.settings());

    for uri in ["/api/v1/themes", "/api/v1/sections"] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                uri,
                Some(&admin_token),
                Some(json!({ "name": "Mechanics" })),
            ))
            .await
            .expect("create entry");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/themes",
            Some(&student_token),
            Some(json!({ "name": "Optics" })),
        ))
        .await
        .expect("student create");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/themes",
            Some(&student_token),
            None,
        ))
        .await
        .expect("list themes");
    let themes = test_support::read_json(response).await;
    assert_eq!(themes.as_array().expect("array").len(), 1);
    assert_eq!(themes[0]["name"], "Mechanics");

    let response = ctx
        .app
        .oneshot(test_support::json_request(Method::GET, "/api/v1/tags", Some(&student_token), None))
        .await
        .expect("list tags");
    assert_eq!(test_support::read_json(response).await, json!([]));
}
