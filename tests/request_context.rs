//! End-to-end tests of `RequestContext` as an axum extractor.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{any, post};
use axum::{Extension, Router};
use serde::{Deserialize, Serialize};

use request_context::config::ContextConfig;
use request_context::{attach_binding, Error, RequestContext};

mod common;

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
struct ItemPath {
    org: String,
    id: u64,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
struct Signup {
    name: String,
    age: u32,
    #[serde(default)]
    tags: Vec<String>,
}

#[tokio::test]
async fn test_route_params_from_router() {
    async fn handler(ctx: RequestContext) -> String {
        let mut path = ItemPath::default();
        match ctx.read_params(&mut path) {
            Ok(()) => format!("{}:{}:{}", path.org, path.id, ctx.route_param("org")),
            Err(e) => format!("error: {e}"),
        }
    }
    let app = Router::new().route("/orgs/{org}/items/{id}", any(handler));

    let req = Request::builder().uri("/orgs/acme/items/42").body(Body::empty()).unwrap();
    let (status, body) = common::send(app.clone(), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "acme:42:acme");

    let req = Request::builder().uri("/orgs/acme/items/x").body(Body::empty()).unwrap();
    let (_, body) = common::send(app, req).await;
    assert!(body.starts_with("error: field `id`"), "{body}");
}

#[tokio::test]
async fn test_route_without_params() {
    async fn handler(ctx: RequestContext) -> String {
        format!("{}|{}", ctx.route_params().len(), ctx.route_param("id"))
    }
    let app = Router::new().route("/plain", any(handler));

    let req = Request::builder().uri("/plain").body(Body::empty()).unwrap();
    let (_, body) = common::send(app, req).await;
    assert_eq!(body, "0|");
}

#[tokio::test]
async fn test_client_ip_priority() {
    async fn handler(ctx: RequestContext) -> String {
        ctx.client_ip()
    }
    let app = Router::new().route("/", any(handler));

    let req = Request::builder()
        .uri("/")
        .header("X-Real-IP", " 10.1.1.1 ")
        .header("X-Forwarded-For", "1.2.3.4, 5.6.6.6")
        .body(Body::empty())
        .unwrap();
    let (_, body) = common::send(app.clone(), common::with_peer(req, "9.9.9.9:4321")).await;
    assert_eq!(body, "10.1.1.1");

    let req = Request::builder()
        .uri("/")
        .header("X-Forwarded-For", "1.2.3.4, 5.6.6.6")
        .body(Body::empty())
        .unwrap();
    let (_, body) = common::send(app.clone(), common::with_peer(req, "9.9.9.9:4321")).await;
    assert_eq!(body, "1.2.3.4");

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (_, body) = common::send(app.clone(), common::with_peer(req, "9.9.9.9:4321")).await;
    assert_eq!(body, "9.9.9.9");

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (_, body) = common::send(app, req).await;
    assert_eq!(body, "");
}

#[tokio::test]
async fn test_config_extension_changes_ip_header() {
    async fn handler(ctx: RequestContext) -> String {
        ctx.client_ip()
    }
    let mut config = ContextConfig::default();
    config.client_ip.real_ip_header = "CF-Connecting-IP".into();
    let app = Router::new()
        .route("/", any(handler))
        .layer(Extension(Arc::new(config)));

    let req = Request::builder()
        .uri("/")
        .header("X-Real-IP", "10.1.1.1")
        .header("CF-Connecting-IP", "8.8.4.4")
        .body(Body::empty())
        .unwrap();
    let (_, body) = common::send(app, req).await;
    assert_eq!(body, "8.8.4.4");
}

#[tokio::test]
async fn test_body_replay() {
    async fn handler(mut ctx: RequestContext) -> String {
        let first = ctx.read_raw().await.unwrap();
        let second = ctx.read_raw().await.unwrap();
        assert_eq!(first, second);

        let request = ctx.into_request();
        let replayed = to_bytes(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(replayed, first);
        String::from_utf8(replayed.to_vec()).unwrap()
    }
    let app = Router::new().route("/", post(handler));

    let req = Request::builder()
        .method(Method::POST)
        .uri("/")
        .body(Body::from("original payload"))
        .unwrap();
    let (status, body) = common::send(app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "original payload");
}

#[tokio::test]
async fn test_read_json() {
    async fn handler(mut ctx: RequestContext) -> (StatusCode, String) {
        let mut signup = Signup::default();
        match ctx.read_json(&mut signup).await {
            Ok(()) => (StatusCode::OK, format!("{}:{}", signup.name, signup.age)),
            Err(Error::BodyAbsent) => (StatusCode::BAD_REQUEST, "absent".into()),
            Err(Error::Json(_)) => (StatusCode::UNPROCESSABLE_ENTITY, "json".into()),
            Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        }
    }
    let app = Router::new().route("/", post(handler));

    let json = |body: &'static str| {
        Request::builder()
            .method(Method::POST)
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    };

    let (status, body) = common::send(app.clone(), json(r#"{"name":"ann","age":31}"#)).await;
    assert_eq!((status, body.as_str()), (StatusCode::OK, "ann:31"));

    let (status, _) = common::send(app.clone(), json(r#"{"name":"ann","age":"x"}"#)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = common::send(app.clone(), json("not json")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // A framed zero-length body is present, just not valid JSON.
    let req = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_LENGTH, "0")
        .body(Body::from(""))
        .unwrap();
    let (status, body) = common::send(app.clone(), req).await;
    assert_eq!((status, body.as_str()), (StatusCode::UNPROCESSABLE_ENTITY, "json"));

    let req = Request::builder()
        .method(Method::POST)
        .uri("/")
        .body(Body::empty())
        .unwrap();
    let (status, body) = common::send(app, req).await;
    assert_eq!((status, body.as_str()), (StatusCode::BAD_REQUEST, "absent"));
}

#[tokio::test]
async fn test_form_body_then_query_and_body_still_readable() {
    async fn handler(mut ctx: RequestContext) -> String {
        let values = ctx.form_values().await;
        let mut signup = Signup::default();
        ctx.read_form(&mut signup).await.unwrap();
        let raw = ctx.read_raw().await.unwrap();
        format!(
            "{:?}|{}:{}:{:?}|{}",
            values.get_all("tags"),
            signup.name,
            signup.age,
            signup.tags,
            String::from_utf8_lossy(&raw)
        )
    }
    let app = Router::new().route("/", post(handler));

    let req = Request::builder()
        .method(Method::POST)
        .uri("/?tags=fromquery")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=x&age=5&tags=frombody"))
        .unwrap();
    let (_, body) = common::send(app, req).await;
    assert_eq!(
        body,
        r#"["frombody", "fromquery"]|x:5:["frombody", "fromquery"]|name=x&age=5&tags=frombody"#
    );
}

#[tokio::test]
async fn test_form_on_get_uses_query_only() {
    async fn handler(mut ctx: RequestContext) -> String {
        let values = ctx.form_values().await;
        format!("{}:{}", values.len(), values.get("q").unwrap_or_default())
    }
    let app = Router::new().route("/", any(handler));

    let req = Request::builder()
        .uri("/?q=rust")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("ignored=1"))
        .unwrap();
    let (_, body) = common::send(app, req).await;
    assert_eq!(body, "1:rust");
}

#[tokio::test]
async fn test_form_parse_failure() {
    async fn handler(mut ctx: RequestContext) -> String {
        let lenient = ctx.form_values().await;
        let strict = ctx.try_form_values().await.map(|v| v.len());
        let mut signup = Signup::default();
        let read = ctx.read_form(&mut signup).await;
        format!(
            "{}|{}|{}",
            lenient.is_empty(),
            strict.is_err(),
            matches!(read, Err(Error::Form(_)))
        )
    }
    let app = Router::new().route("/", post(handler));

    let req = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=%zz"))
        .unwrap();
    let (_, body) = common::send(app, req).await;
    assert_eq!(body, "true|true|true");
}

#[tokio::test]
async fn test_form_decode_error() {
    async fn handler(mut ctx: RequestContext) -> String {
        let mut signup = Signup { name: "kept".into(), age: 1, tags: vec![] };
        match ctx.read_form(&mut signup).await {
            Err(Error::Decode(e)) => format!("{}|{}:{}", e.field().unwrap_or_default(), signup.name, signup.age),
            other => format!("unexpected: {other:?}"),
        }
    }
    let app = Router::new().route("/", post(handler));

    let req = Request::builder()
        .method(Method::POST)
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("age=notanumber"))
        .unwrap();
    let (_, body) = common::send(app, req).await;
    assert_eq!(body, "age|kept:1");
}

#[derive(Debug, Clone, PartialEq)]
struct Tenant(&'static str);

async fn attach_tenant(mut req: Request<Body>, next: Next) -> Response {
    attach_binding(&mut req, Tenant("acme"));
    next.run(req).await
}

#[tokio::test]
async fn test_middleware_bindings() {
    async fn handler(ctx: RequestContext) -> String {
        let tenant = ctx.binding::<Tenant>().map(|t| t.0).unwrap_or("none");
        format!("{}:{}", tenant, ctx.bindings().len())
    }
    let app = Router::new()
        .route("/", any(handler))
        .layer(middleware::from_fn(attach_tenant));

    let req = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (_, body) = common::send(app, req).await;
    assert_eq!(body, "acme:1");
}

#[tokio::test]
async fn test_introspection_headers() {
    async fn handler(ctx: RequestContext) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            ctx.is_ajax(),
            ctx.wants_json(),
            ctx.wants_html(),
            ctx.wants_plain_text(),
            ctx.cookie_value("session"),
            ctx.has_cookie("missing"),
        )
    }
    let app = Router::new().route("/", any(handler));

    let req = Request::builder()
        .uri("/")
        .header("X-Requested-With", "XMLHttpRequest")
        .header(header::ACCEPT, "text/html, application/json;q=0.9")
        .header(header::COOKIE, "session=s1; other=2")
        .body(Body::empty())
        .unwrap();
    let (_, body) = common::send(app, req).await;
    assert_eq!(body, "true|true|true|false|s1|false");
}
