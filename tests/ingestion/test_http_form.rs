//! Form and multipart handler tests through `actix_web::test`.

use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use order_intake_lib::api;

use super::test_helpers::TestEnv;

const BOUNDARY: &str = "----order-intake-test-boundary";

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a [u8]),
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(filename, content) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"input\"; filename=\"{}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn submission(parts: &[Part<'_>]) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/gwup/process")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(parts))
}

/// The `flash=<value>` pair from the response's `Set-Cookie` header, as a browser
/// would send it back.
fn flash_pair(resp: &ServiceResponse) -> String {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("flash="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("flash cookie")
}

/// Notices a browser holding `pair` would be shown.
fn notices(env: &TestEnv, pair: &str) -> Vec<String> {
    let req = test::TestRequest::default()
        .insert_header((header::COOKIE, pair.to_string()))
        .to_http_request();
    api::flash::read(&req, &env.session_key)
}

macro_rules! init_app {
    ($env:expr, $max_upload_size:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($env.pool.clone()))
                .app_data(web::Data::new($env.pipeline()))
                .app_data(web::Data::new($max_upload_size as usize))
                .app_data(web::Data::new($env.session_key.clone()))
                .configure(api::configure_health_routes)
                .configure(api::configure_upload_routes),
        )
        .await
    };
}

#[actix_rt::test]
async fn test_form_renders() {
    let env = TestEnv::new().await;
    let app = init_app!(env, 1024 * 1024);

    let req = test::TestRequest::get().uri("/gwup").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = test::read_body(resp).await;
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("action=\"/gwup/process\""));
    assert!(html.contains("name=\"input\""));
    assert!(!html.contains("<pre>"));
}

#[actix_rt::test]
async fn test_submission_redirects_with_notices() {
    let env = TestEnv::new().await;
    let app = init_app!(env, 1024 * 1024);

    let req = submission(&[
        Part::Text("name", "A"),
        Part::Text("institution", "B"),
        Part::Text("email", "c@d.com"),
        Part::File("x.ab1", b"trace-data"),
        Part::File("y.txt", b"notes"),
    ])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/gwup");
    let pair = flash_pair(&resp);

    assert_eq!(env.pool.count_orders().await.unwrap(), 1);
    let dirs = env.order_dirs();
    assert_eq!(dirs.len(), 1);
    assert_eq!(std::fs::read(dirs[0].join("x.ab1")).unwrap(), b"trace-data");

    // Notices are shown once on the following page load.
    let req = test::TestRequest::get()
        .uri("/gwup")
        .insert_header((header::COOKIE, pair))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(flash_pair(&resp), "flash=");

    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("» skipping file: y.txt. Invalid extension .txt"));
    assert!(html.contains("» Added 1 files to order "));
}

#[actix_rt::test]
async fn test_notices_escape_markup_in_filenames() {
    let env = TestEnv::new().await;
    let app = init_app!(env, 1024 * 1024);

    let req = submission(&[
        Part::Text("name", "A"),
        Part::Text("institution", "B"),
        Part::Text("email", "c@d.com"),
        Part::File("<i>notes.txt", b"notes"),
    ])
    .to_request();
    let resp = test::call_service(&app, req).await;
    let pair = flash_pair(&resp);

    let req = test::TestRequest::get()
        .uri("/gwup")
        .insert_header((header::COOKIE, pair))
        .to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();

    assert!(html.contains("» skipping file: &lt;i&gt;notes.txt. Invalid extension .txt"));
    assert!(!html.contains("<i>"));
}

#[actix_rt::test]
async fn test_forged_notices_not_rendered() {
    let env = TestEnv::new().await;
    let app = init_app!(env, 1024 * 1024);

    let req = test::TestRequest::get()
        .uri("/gwup")
        .insert_header((header::COOKIE, "flash=Added%2099%20files%20to%20order%201"))
        .to_request();
    let html = String::from_utf8(test::call_and_read_body(&app, req).await.to_vec()).unwrap();

    assert!(!html.contains("Added 99 files"));
    assert!(!html.contains("<pre>"));
}

#[actix_rt::test]
async fn test_client_directories_stripped_from_filenames() {
    let env = TestEnv::new().await;
    let app = init_app!(env, 1024 * 1024);

    let req = submission(&[
        Part::Text("name", "A"),
        Part::Text("institution", "B"),
        Part::Text("email", "c@d.com"),
        Part::File("C:\\runs\\plate1\\x.ab1", b"trace-data"),
    ])
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let dirs = env.order_dirs();
    assert_eq!(dirs.len(), 1);
    assert!(dirs[0].join("x.ab1").exists());
}

#[actix_rt::test]
async fn test_missing_info_stores_nothing() {
    let env = TestEnv::new().await;
    let app = init_app!(env, 1024 * 1024);

    let req = submission(&[
        Part::Text("name", "A"),
        Part::Text("email", "c@d.com"),
        Part::File("x.ab1", b"trace-data"),
    ])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(notices(&env, &flash_pair(&resp)), vec!["Missing info"]);
    assert_eq!(env.pool.count_orders().await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_no_files_notice() {
    let env = TestEnv::new().await;
    let app = init_app!(env, 1024 * 1024);

    let req = submission(&[
        Part::Text("name", "A"),
        Part::Text("institution", "B"),
        Part::Text("email", "c@d.com"),
    ])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        notices(&env, &flash_pair(&resp)),
        vec!["No files were uploaded!"]
    );
    assert!(env.order_dirs().is_empty());
}

#[actix_rt::test]
async fn test_oversized_submission_rejected() {
    let env = TestEnv::new().await;
    let app = init_app!(env, 16);

    let req = submission(&[
        Part::Text("name", "A"),
        Part::Text("institution", "B"),
        Part::Text("email", "c@d.com"),
        Part::File("x.ab1", &[0u8; 64]),
    ])
    .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    let shown = notices(&env, &flash_pair(&resp));
    assert_eq!(shown.len(), 1);
    assert!(shown[0].starts_with("Upload exceeds the maximum size"));
    assert!(env.order_dirs().is_empty());
    assert_eq!(env.pool.count_orders().await.unwrap(), 0);
}

#[actix_rt::test]
async fn test_non_multipart_request_is_bad_request() {
    let env = TestEnv::new().await;
    let app = init_app!(env, 1024 * 1024);

    let req = test::TestRequest::post()
        .uri("/gwup/process")
        .insert_header((header::CONTENT_TYPE, "text/plain"))
        .set_payload("hello")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_truncated_unknown_field_is_bad_request() {
    let env = TestEnv::new().await;
    let app = init_app!(env, 1024 * 1024);

    // Body ends inside an unrecognized field, with no closing boundary.
    let mut body = multipart_body(&[Part::Text("name", "A")]);
    body.truncate(body.len() - format!("--{}--\r\n", BOUNDARY).len());
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"comment\"\r\n\r\npartial",
            BOUNDARY
        )
        .as_bytes(),
    );

    let req = test::TestRequest::post()
        .uri("/gwup/process")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
}

#[actix_rt::test]
async fn test_health_and_ready() {
    let env = TestEnv::new().await;
    let app = init_app!(env, 1024 * 1024);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}
