use axum::{
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use serde_json::Value;
use tower::ServiceExt;

async fn send(request: Request<Body>) -> Response {
    lumpsum::api::router()
        .oneshot(request)
        .await
        .expect("router is infallible")
}

async fn get(uri: &str) -> Response {
    send(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("valid request"),
    )
    .await
}

async fn post_json(uri: &str, json: &str) -> Response {
    send(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("valid request"),
    )
    .await
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be json")
}

#[tokio::test]
async fn index_page_is_served_without_caching() {
    let response = get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).expect("header"),
        "no-store"
    );

    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    let html = String::from_utf8(bytes.to_vec()).expect("utf-8");
    assert!(html.contains("Calculate the lump-sum amount"));
}

#[tokio::test]
async fn static_assets_have_content_types() {
    let css = get("/styles.css").await;
    assert_eq!(css.status(), StatusCode::OK);
    assert_eq!(
        css.headers().get(header::CONTENT_TYPE).expect("header"),
        "text/css; charset=utf-8"
    );

    let js = get("/app.js").await;
    assert_eq!(js.status(), StatusCode::OK);
    assert_eq!(
        js.headers().get(header::CONTENT_TYPE).expect("header"),
        "application/javascript; charset=utf-8"
    );
}

#[tokio::test]
async fn calculate_get_uses_defaults() {
    let response = get("/api/calculate").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["variant"], "detailed");
    assert_eq!(body["formatted"]["presentValue"], "$142,597");
    assert_eq!(body["formatted"]["lumpSum"], "$37,304");
    assert_eq!(body["formatted"]["totalInvested"], "$157,304");
    assert_eq!(body["totalRecurringContributions"], 120_000.0);
    assert_eq!(
        body["projectionYears"].as_array().expect("array").len(),
        5
    );
}

#[tokio::test]
async fn calculate_get_reads_query_overrides() {
    let response =
        get("/api/calculate?variant=basic&years=10&annualContribution=0&futureValue=100000").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["variant"], "basic");
    assert!(body["presentValue"].is_null());
    assert!(body["totalInvested"].is_null());
    let expected = 100_000.0 / 1.07f64.powi(10);
    let lump_sum = body["lumpSum"].as_f64().expect("number");
    assert!((lump_sum - expected).abs() < 1e-6);
    assert_eq!(body["messages"].as_array().expect("array").len(), 1);
}

#[tokio::test]
async fn calculate_post_solves_equal_rates() {
    let response = post_json(
        "/api/calculate",
        r#"{"contributionGrowthRate": 0.05, "annualReturnRate": 0.05, "years": 10, "annualContribution": 1000, "futureValue": 50000}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let contributions_fv = body["contributionsFutureValue"].as_f64().expect("number");
    assert!((contributions_fv - 1_000.0 * 10.0 * 1.05f64.powi(10)).abs() < 1e-6);
}

#[tokio::test]
async fn calculate_reports_unsolvable_inputs() {
    let response = post_json(
        "/api/calculate",
        r#"{"annualReturnRate": 10.0, "years": 1000}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    assert_eq!(
        body["error"],
        "Could not calculate the lump-sum investment. Please check the inputs."
    );
}

#[tokio::test]
async fn calculate_rejects_invalid_fields() {
    let response = post_json("/api/calculate", r#"{"contributionGrowthRate": -2}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(
        body["error"]
            .as_str()
            .expect("string")
            .contains("contributionGrowthRate")
    );

    let response = post_json("/api/calculate", r#"{"years": "five"}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());

    let response = get("/api/calculate?years=-3").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn calculate_rejects_null_fields_instead_of_defaulting() {
    let response = post_json(
        "/api/calculate",
        r#"{"futureValue": null, "annualContribution": 0}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().expect("string").contains("futureValue"));

    let response = post_json("/api/present-value", r#"{"annualReturnRate": null}"#).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get("/api/calculate?futureValue=").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn calculate_formats_projection_cells_like_messages() {
    let response = post_json(
        "/api/calculate",
        r#"{"futureValue": 10000, "annualContribution": 24000, "years": 3}"#,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let rows = body["formatted"]["projectionYears"].as_array().expect("array");
    assert_eq!(rows.len(), 3);
    assert!(
        rows[0]["lumpSumBalance"]
            .as_str()
            .expect("string")
            .starts_with("$-")
    );
    assert_eq!(rows[2]["totalBalance"], "$10,000");
}

#[tokio::test]
async fn present_value_endpoint_reports_metric() {
    let response = get("/api/present-value?futureValue=200000&annualReturnRate=0.07&years=5").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["formatted"], "$142,597");
    assert_eq!(body["years"], 5);
}

#[tokio::test]
async fn defaults_endpoint_differs_per_variant() {
    let detailed = json_body(get("/api/defaults").await).await;
    assert_eq!(detailed["variant"], "detailed");
    assert_eq!(detailed["contributionGrowthRate"], 0.0);
    assert_eq!(detailed["showsPresentValue"], true);
    assert_eq!(detailed["steps"]["years"], 1);

    let basic = json_body(get("/api/defaults?variant=basic").await).await;
    assert_eq!(basic["variant"], "basic");
    assert_eq!(basic["contributionGrowthRate"], 0.02);
    assert_eq!(basic["showsPresentValue"], false);

    let response = get("/api/defaults?variant=premium").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let health = json_body(get("/health").await).await;
    assert_eq!(health["status"], "ok");

    let response = get("/does-not-exist").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Not found");
}
