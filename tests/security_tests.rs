//! 认证与授权集成测试 / Security integration tests

#[macro_use]
mod common;

use actix_web::{http::header, test};
use common::{basic, context};

#[actix_web::test]
async fn test_public_paths_need_no_credentials() {
    let context = context("");
    let app = init_app!(context);

    for uri in ["/", "/status", "/v3/api-docs"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200, "{}", uri);
    }
}

#[actix_web::test]
async fn test_traverse_requires_authentication() {
    let context = context("");
    let app = init_app!(context);

    let req = test::TestRequest::get().uri("/api/v1/traverse").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));

    let req = test::TestRequest::get()
        .uri("/api/v1/traverse")
        .insert_header((header::AUTHORIZATION, basic("user", "user")))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body, "success");
}

#[actix_web::test]
async fn test_actuator_requires_admin() {
    let context = context("");
    let app = init_app!(context);

    let req = test::TestRequest::get().uri("/actuator/info").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::get()
        .uri("/actuator/info")
        .insert_header((header::AUTHORIZATION, basic("user", "user")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::get()
        .uri("/actuator/info")
        .insert_header((header::AUTHORIZATION, basic("admin", "admin")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);
}

#[actix_web::test]
async fn test_swagger_ui_requires_user_role() {
    let context = context("");
    let app = init_app!(context);

    let req = test::TestRequest::get().uri("/swagger-ui/").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::get()
        .uri("/swagger-ui/")
        .insert_header((header::AUTHORIZATION, basic("user", "user")))
        .to_request();
    assert_ne!(test::call_service(&app, req).await.status(), 401);
}

#[actix_web::test]
async fn test_rules_apply_under_context_path() {
    let context = context("/koat");
    let app = init_app!(context);

    let req = test::TestRequest::get().uri("/koat/status").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get().uri("/koat/api/v1/traverse").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);

    let req = test::TestRequest::get()
        .uri("/koat/actuator")
        .insert_header((header::AUTHORIZATION, basic("user", "user")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_web::test]
async fn test_configured_users_replace_defaults() {
    let toml = common::config_toml(
        "",
        r#"
[[security.users]]
username = "jane"
password = "secret"
roles = ["USER"]
"#,
    );
    let context = common::context_from(&toml, &[]);
    let app = init_app!(context);

    let req = test::TestRequest::get()
        .uri("/api/v1/traverse")
        .insert_header((header::AUTHORIZATION, basic("jane", "secret")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::get()
        .uri("/api/v1/traverse")
        .insert_header((header::AUTHORIZATION, basic("user", "user")))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 401);
}
