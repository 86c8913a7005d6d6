mod error;
mod format;

use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Write as _;
use std::net::{IpAddr, SocketAddr};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::{
    CalcError, CalculationInput, ProjectionYear, Variant, calculate, present_value,
    project_balances, validate_input,
};

pub use error::ApiError;
pub use format::format_currency;

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliVariant {
    Detailed,
    Basic,
}

impl From<CliVariant> for Variant {
    fn from(value: CliVariant) -> Self {
        match value {
            CliVariant::Detailed => Variant::Detailed,
            CliVariant::Basic => Variant::Basic,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiVariant {
    #[serde(alias = "full", alias = "one")]
    Detailed,
    #[serde(alias = "lump-sum-only", alias = "lumpSumOnly", alias = "two")]
    Basic,
}

impl From<ApiVariant> for Variant {
    fn from(value: ApiVariant) -> Self {
        match value {
            ApiVariant::Detailed => Variant::Detailed,
            ApiVariant::Basic => Variant::Basic,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "lumpsum",
    about = "Lump-sum calculator: the principal needed today to reach a future value alongside growing annual contributions"
)]
pub struct Cli {
    #[arg(long, short, global = true, help = "Enable debug logging")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the calculator page and its JSON API
    Serve(ServeArgs),
    /// Run one calculation and print the result
    Solve(SolveArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "0.0.0.0")]
    pub host: IpAddr,
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}

#[derive(Args, Debug, Clone)]
pub struct SolveArgs {
    #[arg(
        long,
        value_enum,
        default_value_t = CliVariant::Detailed,
        help = "detailed shows present value and totals; basic shows the lump sum only"
    )]
    pub variant: CliVariant,
    #[arg(long, help = "Desired future value (FV), defaults to 200000")]
    pub future_value: Option<f64>,
    #[arg(long, help = "Time horizon in whole years (T), defaults to 5")]
    pub years: Option<u32>,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Annual contribution (C), defaults to 24000"
    )]
    pub annual_contribution: Option<f64>,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Expected annual increase in contributions as a decimal, defaults to 0 (detailed) or 0.02 (basic)"
    )]
    pub contribution_growth_rate: Option<f64>,
    #[arg(
        long,
        allow_hyphen_values = true,
        help = "Expected annual return rate as a decimal, defaults to 0.07"
    )]
    pub annual_return_rate: Option<f64>,
    #[arg(long, help = "Print the year-by-year balance projection")]
    pub projection: bool,
    #[arg(long, help = "Print the JSON response body instead of text")]
    pub json: bool,
}

// Absent keys fall back to the variant defaults; an explicit `null` is rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CalculatePayload {
    #[serde(deserialize_with = "present")]
    variant: Option<ApiVariant>,
    #[serde(deserialize_with = "present")]
    future_value: Option<f64>,
    #[serde(deserialize_with = "present")]
    years: Option<u32>,
    #[serde(deserialize_with = "present")]
    annual_contribution: Option<f64>,
    #[serde(deserialize_with = "present")]
    contribution_growth_rate: Option<f64>,
    #[serde(deserialize_with = "present")]
    annual_return_rate: Option<f64>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DefaultsQuery {
    variant: Option<ApiVariant>,
}

#[derive(Debug, Clone, Copy)]
struct CalculationRequest {
    variant: Variant,
    inputs: CalculationInput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldSteps {
    future_value: f64,
    years: u32,
    annual_contribution: f64,
    contribution_growth_rate: f64,
    annual_return_rate: f64,
}

const FIELD_STEPS: FieldSteps = FieldSteps {
    future_value: 1_000.0,
    years: 1,
    annual_contribution: 1_000.0,
    contribution_growth_rate: 0.01,
    annual_return_rate: 0.01,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefaultsResponse {
    variant: Variant,
    shows_present_value: bool,
    future_value: f64,
    years: u32,
    annual_contribution: f64,
    contribution_growth_rate: f64,
    annual_return_rate: f64,
    steps: FieldSteps,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PresentValueResponse {
    future_value: f64,
    annual_return_rate: f64,
    years: u32,
    present_value: f64,
    formatted: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormattedAmounts {
    present_value: Option<String>,
    lump_sum: String,
    total_invested: Option<String>,
    projection_years: Vec<FormattedProjectionYear>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FormattedProjectionYear {
    year: u32,
    contribution: String,
    lump_sum_balance: String,
    contributions_balance: String,
    total_balance: String,
}

impl From<&ProjectionYear> for FormattedProjectionYear {
    fn from(row: &ProjectionYear) -> Self {
        Self {
            year: row.year,
            contribution: format_currency(row.contribution),
            lump_sum_balance: format_currency(row.lump_sum_balance),
            contributions_balance: format_currency(row.contributions_balance),
            total_balance: format_currency(row.total_balance),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalculateResponse {
    variant: Variant,
    input: CalculationInput,
    present_value: Option<f64>,
    lump_sum: f64,
    contributions_future_value: f64,
    total_recurring_contributions: f64,
    total_invested: Option<f64>,
    contributions_exceed_target: bool,
    formatted: FormattedAmounts,
    messages: Vec<String>,
    projection_years: Vec<ProjectionYear>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn request_from_payload(payload: CalculatePayload) -> CalculationRequest {
    let variant = payload.variant.map(Variant::from).unwrap_or_default();
    build_request(variant, payload)
}

fn request_from_solve_args(args: &SolveArgs) -> CalculationRequest {
    build_request(
        args.variant.into(),
        CalculatePayload {
            variant: None,
            future_value: args.future_value,
            years: args.years,
            annual_contribution: args.annual_contribution,
            contribution_growth_rate: args.contribution_growth_rate,
            annual_return_rate: args.annual_return_rate,
        },
    )
}

fn build_request(variant: Variant, payload: CalculatePayload) -> CalculationRequest {
    let mut inputs = CalculationInput::defaults(variant);

    if let Some(v) = payload.future_value {
        inputs.future_value_target = v;
    }
    if let Some(v) = payload.years {
        inputs.years = v;
    }
    if let Some(v) = payload.annual_contribution {
        inputs.annual_contribution = v;
    }
    if let Some(v) = payload.contribution_growth_rate {
        inputs.contribution_growth_rate = v;
    }
    if let Some(v) = payload.annual_return_rate {
        inputs.annual_return_rate = v;
    }

    CalculationRequest { variant, inputs }
}

fn build_defaults_response(variant: Variant) -> DefaultsResponse {
    let inputs = CalculationInput::defaults(variant);
    DefaultsResponse {
        variant,
        shows_present_value: variant == Variant::Detailed,
        future_value: inputs.future_value_target,
        years: inputs.years,
        annual_contribution: inputs.annual_contribution,
        contribution_growth_rate: inputs.contribution_growth_rate,
        annual_return_rate: inputs.annual_return_rate,
        steps: FIELD_STEPS,
    }
}

fn build_present_value_response(
    request: &CalculationRequest,
) -> Result<PresentValueResponse, ApiError> {
    let inputs = &request.inputs;
    validate_input(inputs)?;
    let value = present_value(
        inputs.future_value_target,
        inputs.annual_return_rate,
        inputs.years,
    )?;
    Ok(PresentValueResponse {
        future_value: inputs.future_value_target,
        annual_return_rate: inputs.annual_return_rate,
        years: inputs.years,
        present_value: value,
        formatted: format_currency(value),
    })
}

fn build_calculate_response(request: &CalculationRequest) -> Result<CalculateResponse, ApiError> {
    let inputs = &request.inputs;
    let result = calculate(inputs)?;
    let (Some(lump_sum), Some(contributions_future_value)) =
        (result.lump_sum, result.contributions_future_value)
    else {
        return Err(CalcError::Unsolvable.into());
    };

    let detailed = request.variant == Variant::Detailed;
    let present_value = detailed.then_some(result.present_value);
    let total_invested = result.total_invested.filter(|_| detailed);

    let mut messages = vec![format!(
        "The required lump-sum investment is: {}",
        format_currency(lump_sum)
    )];
    if let Some(total) = total_invested {
        messages.push(format!(
            "Sum(lump-sum, recurring contributions) over {} years: {}",
            inputs.years,
            format_currency(total)
        ));
    }

    let projection_years = project_balances(inputs, lump_sum);
    let formatted_projection = projection_years
        .iter()
        .map(FormattedProjectionYear::from)
        .collect();

    Ok(CalculateResponse {
        variant: request.variant,
        input: *inputs,
        present_value,
        lump_sum,
        contributions_future_value,
        total_recurring_contributions: result.total_recurring_contributions,
        total_invested,
        contributions_exceed_target: result.contributions_exceed_target,
        formatted: FormattedAmounts {
            present_value: present_value.map(format_currency),
            lump_sum: format_currency(lump_sum),
            total_invested: total_invested.map(format_currency),
            projection_years: formatted_projection,
        },
        messages,
        projection_years,
    })
}

fn render_text(response: &CalculateResponse, with_projection: bool) -> String {
    let mut out = String::new();
    if let Some(pv) = &response.formatted.present_value {
        let _ = writeln!(out, "Present Value: {pv}");
    }
    for message in &response.messages {
        let _ = writeln!(out, "{message}");
    }

    let rows = &response.formatted.projection_years;
    if with_projection && !rows.is_empty() {
        let _ = writeln!(
            out,
            "\n{:>4}  {:>14}  {:>16}  {:>21}  {:>14}",
            "Year", "Contribution", "Lump-sum balance", "Contributions balance", "Total balance"
        );
        for row in rows {
            let _ = writeln!(
                out,
                "{:>4}  {:>14}  {:>16}  {:>21}  {:>14}",
                row.year,
                row.contribution,
                row.lump_sum_balance,
                row.contributions_balance,
                row.total_balance,
            );
        }
    }

    out.trim_end().to_string()
}

/// Runs the `solve` subcommand and returns what should be printed.
pub fn run_solve(args: &SolveArgs) -> Result<String, ApiError> {
    let request = request_from_solve_args(args);
    let response = build_calculate_response(&request)?;
    tracing::debug!(
        variant = ?response.variant,
        lump_sum = response.lump_sum,
        "solved lump sum"
    );

    if args.json {
        Ok(serde_json::to_string_pretty(&response)?)
    } else {
        Ok(render_text(&response, args.projection))
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route("/health", get(health_handler))
        .route("/api/defaults", get(defaults_handler))
        .route(
            "/api/present-value",
            get(present_value_get_handler).post(present_value_post_handler),
        )
        .route(
            "/api/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_http_server(host: IpAddr, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::new(host, port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Lump-sum calculator listening on http://{addr}");
    tracing::info!("Local access: http://127.0.0.1:{port}/");

    axum::serve(listener, router()).await
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn defaults_handler(query: Result<Query<DefaultsQuery>, QueryRejection>) -> Response {
    match query {
        Ok(Query(query)) => {
            let variant = query.variant.map(Variant::from).unwrap_or_default();
            json_response(StatusCode::OK, build_defaults_response(variant))
        }
        Err(rejection) => reject(ApiError::BadRequest(rejection.body_text())),
    }
}

async fn present_value_get_handler(
    payload: Result<Query<CalculatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => present_value_handler_impl(payload),
        Err(rejection) => reject(ApiError::BadRequest(rejection.body_text())),
    }
}

async fn present_value_post_handler(
    payload: Result<Json<CalculatePayload>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => present_value_handler_impl(payload),
        Err(rejection) => reject(ApiError::BadRequest(rejection.body_text())),
    }
}

async fn calculate_get_handler(
    payload: Result<Query<CalculatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => calculate_handler_impl(payload),
        Err(rejection) => reject(ApiError::BadRequest(rejection.body_text())),
    }
}

async fn calculate_post_handler(payload: Result<Json<CalculatePayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => calculate_handler_impl(payload),
        Err(rejection) => reject(ApiError::BadRequest(rejection.body_text())),
    }
}

fn present_value_handler_impl(payload: CalculatePayload) -> Response {
    let request = request_from_payload(payload);
    match build_present_value_response(&request) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(e) => reject(e),
    }
}

fn calculate_handler_impl(payload: CalculatePayload) -> Response {
    let request = request_from_payload(payload);
    match build_calculate_response(&request) {
        Ok(response) => {
            tracing::debug!(
                variant = ?response.variant,
                lump_sum = response.lump_sum,
                years = response.input.years,
                "calculated lump sum"
            );
            json_response(StatusCode::OK, response)
        }
        Err(e) => reject(e),
    }
}

fn reject(e: ApiError) -> Response {
    tracing::warn!(status = %e.status(), error = %e, "rejected request");
    e.into_response()
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn request_from_json(json: &str) -> Result<CalculationRequest, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(request_from_payload(payload))
}
