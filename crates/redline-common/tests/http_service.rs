// Wire-level tests for HttpMapService against an in-process axum server.

use axum::{Router, extract::Query, http::StatusCode, routing::get};
use redline_common::{
    BoundingBox, ClientConfig, FetchError, HttpMapService, MapService, UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

type Params = HashMap<String, String>;

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<(&'static str, Params)>>>);

impl Recorder {
    fn push(&self, endpoint: &'static str, params: Params) {
        self.0.lock().unwrap().push((endpoint, params));
    }

    fn calls(&self) -> Vec<(&'static str, Params)> {
        self.0.lock().unwrap().clone()
    }
}

/// Route that records its query and answers with a fixed status and body.
fn canned(
    router: Router,
    path: &'static str,
    recorder: &Recorder,
    status: StatusCode,
    body: &'static str,
) -> Router {
    let recorder = recorder.clone();
    let name = path.trim_start_matches('/').rsplit('/').next().unwrap_or(path);
    router.route(
        path,
        get(move |Query(params): Query<Params>| {
            let recorder = recorder.clone();
            async move {
                recorder.push(name, params);
                (status, body)
            }
        }),
    )
}

async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

fn service(base: Url) -> HttpMapService {
    HttpMapService::new(ClientConfig::new(base)).unwrap()
}

#[tokio::test]
async fn test_get_data_sends_bounding_box() {
    let recorder = Recorder::default();
    let router = canned(
        Router::new(),
        "/getData",
        &recorder,
        StatusCode::OK,
        r#"{"type":"FeatureCollection","features":[]}"#,
    );
    let service = service(serve(router).await);

    let response = service.get_data(&BoundingBox::WORLD).await.unwrap();
    assert_eq!(response.status, 200);
    assert!(response.body.contains("FeatureCollection"));

    let calls = recorder.calls();
    assert_eq!(calls.len(), 1);
    let (endpoint, params) = &calls[0];
    assert_eq!(*endpoint, "getData");
    assert_eq!(params["minLat"], "-90");
    assert_eq!(params["maxLat"], "90");
    assert_eq!(params["minLong"], "-180");
    assert_eq!(params["maxLong"], "180");
}

#[tokio::test]
async fn test_not_found_is_passed_through() {
    let recorder = Recorder::default();
    let router = canned(
        Router::new(),
        "/getData",
        &recorder,
        StatusCode::NOT_FOUND,
        r#"{"message":"X"}"#,
    );
    let service = service(serve(router).await);

    let response = service.get_data(&BoundingBox::WORLD).await.unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.error_message(), "X");
}

#[tokio::test]
async fn test_keyword_is_encoded() {
    let recorder = Recorder::default();
    let router = canned(
        Router::new(),
        "/getArea",
        &recorder,
        StatusCode::OK,
        r#"{"type":"FeatureCollection","features":[]}"#,
    );
    let service = service(serve(router).await);

    service.get_area("hills & river #3").await.unwrap();
    let calls = recorder.calls();
    assert_eq!(calls[0].1["key"], "hills & river #3");
}

#[tokio::test]
async fn test_add_pin_forwards_coordinates_verbatim() {
    let recorder = Recorder::default();
    let router = canned(
        Router::new(),
        "/addPin",
        &recorder,
        StatusCode::OK,
        r#"{"response_type":"success"}"#,
    );
    let service = service(serve(router).await);

    service
        .add_pin(&UserId::new("user_2abc"), "41.82400000000001", "-71.41280")
        .await
        .unwrap();

    let calls = recorder.calls();
    let params = &calls[0].1;
    assert_eq!(params["uid"], "user_2abc");
    assert_eq!(params["ltd"], "41.82400000000001");
    assert_eq!(params["lng"], "-71.41280");
}

#[tokio::test]
async fn test_get_pins_scoping() {
    let recorder = Recorder::default();
    let router = canned(
        Router::new(),
        "/getPins",
        &recorder,
        StatusCode::OK,
        r#"{"pins":[]}"#,
    );
    let service = service(serve(router).await);

    service.get_pins(None).await.unwrap();
    service.get_pins(Some(&UserId::new("alice"))).await.unwrap();

    let calls = recorder.calls();
    assert!(calls[0].1.is_empty());
    assert_eq!(calls[1].1["uid"], "alice");
}

#[tokio::test]
async fn test_clear_pins_uses_configured_path_under_prefix() {
    let recorder = Recorder::default();
    let router = canned(
        Router::new(),
        "/api/getClearPins",
        &recorder,
        StatusCode::OK,
        r#"{"response_type":"success"}"#,
    );
    let base = serve(router).await.join("api").unwrap();
    let mut config = ClientConfig::new(base);
    config.clear_pins_path = "getClearPins".to_string();
    let service = HttpMapService::new(config).unwrap();

    let response = service.clear_pins(&UserId::new("alice")).await.unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(recorder.calls()[0].1["uid"], "alice");
}

#[tokio::test]
async fn test_connection_refused_is_fetch_failed() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let service = service(Url::parse(&format!("http://{addr}")).unwrap());
    let err = service.get_pins(None).await.unwrap_err();
    assert!(matches!(err, FetchError::FetchFailed { .. }));
}
