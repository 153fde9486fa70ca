use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use tower::ServiceExt;

use crate::test_support;

fn multipart_request(token: &str, folder: &str, filename: &str, content_type: &str) -> Request<Body> {
    let boundary = "physics-tutor-boundary";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"folder\"\r\n\r\n{folder}\r\n\
         --{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
         Content-Type: {content_type}\r\n\r\nnot-really-an-image\r\n--{boundary}--\r\n"
    );

    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/uploads")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .expect("multipart request")
}

#[tokio::test]
async fn uploads_report_unavailable_without_storage() {
    let ctx = test_support::setup_test_context().await;

    let student = test_support::insert_student(ctx.state.db(), "s@example.com", 10).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(multipart_request(&token, "solutions", "work.png", "image/png"))
        .await
        .expect("upload");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = ctx
        .app
        .oneshot(test_support::json_request(
            Method::GET,
            &format!("/api/v1/uploads/view?key=solutions/{}/a.png", student.id),
            Some(&token),
            None,
        ))
        .await
        .expect("view");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn view_rejects_malformed_and_foreign_keys() {
    let ctx = test_support::setup_test_context().await;

    let student = test_support::insert_student(ctx.state.db(), "s@example.com", 10).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    for (key, expected) in [
        ("solutions/../secret.png", StatusCode::BAD_REQUEST),
        ("backups/user/a.png", StatusCode::BAD_REQUEST),
        ("solutions/someone-else/a.png", StatusCode::FORBIDDEN),
    ] {
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/uploads/view?key={key}"),
                Some(&token),
                None,
            ))
            .await
            .expect("view");
        assert_eq!(response.status(), expected, "key: {key}");
    }
}

#[tokio::test]
async fn upload_validates_folder_and_file_type() {
    let ctx = test_support::setup_test_context_with_storage().await;

    let student = test_support::insert_student(ctx.state.db(), "s@example.com", 10).await;
    let token = test_support::bearer_token(&student.id, ctx.state.settings());

    let response = ctx
        .app
        .clone()
        .oneshot(multipart_request(&token, "backups", "work.png", "image/png"))
        .await
        .expect("bad folder");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = ctx
        .app
        .clone()
        .oneshot(multipart_request(&token, "exercises", "work.png", "image/png"))
        .await
        .expect("exercise folder");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = ctx
        .app
        .oneshot(multipart_request(&token, "solutions", "work.exe", "application/octet-stream"))
        .await
        .expect("bad extension");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
