use axum::{
    Router,
    extract::{Json, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    Account, BudgetGoalConfig, BudgetGoalResult, DEFAULT_HORIZON_MONTHS, DEFAULT_WHAT_IF_DELTAS,
    Insight, MAX_HORIZON_MONTHS, PayoffReport, Plan, PortfolioMetrics, SolveError, Strategy, WhatIfOutcome,
    compute_plan, insights, portfolio_metrics, run_simulation, simulate_payoff_on, solve_budget,
    what_if,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliStrategy {
    Avalanche,
    Snowball,
    Manual,
}

impl From<CliStrategy> for Strategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Avalanche => Strategy::Avalanche,
            CliStrategy::Snowball => Strategy::Snowball,
            CliStrategy::Manual => Strategy::Manual,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ApiStrategy {
    #[serde(alias = "Avalanche", alias = "AVALANCHE", alias = "highest-apr")]
    Avalanche,
    #[serde(alias = "Snowball", alias = "SNOWBALL", alias = "smallest-balance")]
    Snowball,
    #[serde(alias = "Manual", alias = "MANUAL", alias = "custom")]
    Manual,
}

impl From<CliStrategy> for ApiStrategy {
    fn from(value: CliStrategy) -> Self {
        match value {
            CliStrategy::Avalanche => ApiStrategy::Avalanche,
            CliStrategy::Snowball => ApiStrategy::Snowball,
            CliStrategy::Manual => ApiStrategy::Manual,
        }
    }
}

impl From<ApiStrategy> for Strategy {
    fn from(value: ApiStrategy) -> Self {
        match value {
            ApiStrategy::Avalanche => Strategy::Avalanche,
            ApiStrategy::Snowball => Strategy::Snowball,
            ApiStrategy::Manual => Strategy::Manual,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct AccountPayload {
    #[serde(deserialize_with = "lenient_text")]
    id: String,
    #[serde(deserialize_with = "lenient_text")]
    bank: String,
    #[serde(deserialize_with = "lenient_text")]
    nickname: String,
    #[serde(deserialize_with = "lenient_number")]
    balance: f64,
    #[serde(deserialize_with = "lenient_number")]
    apr: f64,
    #[serde(deserialize_with = "lenient_number")]
    min_payment: f64,
    #[serde(deserialize_with = "lenient_text")]
    due_date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PayoffPayload {
    accounts: Vec<AccountPayload>,
    #[serde(deserialize_with = "lenient_number")]
    budget: f64,
    strategy: Option<ApiStrategy>,
    horizon_months: Option<u32>,
    deltas: Option<Vec<f64>>,

    target_months: Option<u32>,
    search_min: Option<f64>,
    search_max: Option<f64>,
    tolerance: Option<f64>,
    max_iterations: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AccountsFile {
    List(Vec<AccountPayload>),
    Wrapped { accounts: Vec<AccountPayload> },
}

#[derive(Debug, Error, PartialEq)]
pub enum RequestError {
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(String),
    #[error("horizonMonths must be between 1 and 1200")]
    InvalidHorizon,
    #[error("targetMonths is required to solve for a budget")]
    MissingTarget,
    #[error(transparent)]
    Solve(#[from] SolveError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Request(#[from] RequestError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "payoff",
    about = "Multi-account debt payoff planner (avalanche, snowball or manual ordering)"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the JSON HTTP API
    Serve {
        #[arg(long, env = "PAYOFF_PORT", default_value_t = 8080)]
        port: u16,
    },
    /// This month's allocation across accounts
    Plan(RunArgs),
    /// Month-by-month payoff simulation with baseline comparison
    Simulate(RunArgs),
    /// Payoff impact of raising or lowering the budget
    WhatIf(RunArgs),
    /// Portfolio metrics and derived insights
    Insights(RunArgs),
    /// Smallest budget that pays everything off within a target
    Solve(SolveArgs),
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    #[arg(long, help = "JSON file with an account list or {\"accounts\": [...]}")]
    accounts: PathBuf,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    budget: f64,
    #[arg(long, value_enum, default_value_t = CliStrategy::Avalanche)]
    strategy: CliStrategy,
    #[arg(long, default_value_t = DEFAULT_HORIZON_MONTHS)]
    horizon_months: u32,
    #[arg(
        long = "delta",
        allow_negative_numbers = true,
        help = "Budget change to test; repeatable (default +100, +50, -50)"
    )]
    deltas: Vec<f64>,
}

#[derive(Args, Debug, Clone)]
struct SolveArgs {
    #[arg(long)]
    accounts: PathBuf,
    #[arg(long)]
    target_months: u32,
    #[arg(long, value_enum, default_value_t = CliStrategy::Avalanche)]
    strategy: CliStrategy,
    #[arg(long, help = "Lower budget bound; defaults to total minimum payments")]
    search_min: Option<f64>,
    #[arg(long, help = "Upper budget bound; defaults to total debt plus minimums")]
    search_max: Option<f64>,
    #[arg(long, default_value_t = 0.5)]
    tolerance: f64,
    #[arg(long, default_value_t = 40)]
    max_iterations: u32,
}

#[derive(Debug)]
struct ApiRequest {
    accounts: Vec<Account>,
    budget: f64,
    strategy: Strategy,
    horizon_months: u32,
    deltas: Vec<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WhatIfResponse {
    budget: f64,
    strategy: Strategy,
    months: u32,
    total_interest: f64,
    scenarios: Vec<WhatIfOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsightsResponse {
    metrics: PortfolioMetrics,
    insights: Vec<Insight>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Serve { port } => run_http_server(port).await?,
        Command::Plan(args) => {
            let request = request_from_run_args(&args)?;
            print_json(&build_plan_response(&request))?;
        }
        Command::Simulate(args) => {
            let request = request_from_run_args(&args)?;
            print_json(&build_simulate_response(&request, today()))?;
        }
        Command::WhatIf(args) => {
            let request = request_from_run_args(&args)?;
            print_json(&build_what_if_response(&request))?;
        }
        Command::Insights(args) => {
            let request = request_from_run_args(&args)?;
            print_json(&build_insights_response(&request, today()))?;
        }
        Command::Solve(args) => {
            let mut payload = read_accounts_payload(&args.accounts)?;
            payload.strategy = Some(args.strategy.into());
            payload.target_months = Some(args.target_months);
            payload.search_min = args.search_min;
            payload.search_max = args.search_max;
            payload.tolerance = Some(args.tolerance);
            payload.max_iterations = Some(args.max_iterations);
            print_json(&build_solve_response(payload)?)?;
        }
    }
    Ok(())
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "payoff HTTP API listening");
    tracing::info!("Local access: http://127.0.0.1:{port}/api/health");

    axum::serve(listener, router()).await
}

fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/plan", post(plan_handler))
        .route("/api/simulate", post(simulate_handler))
        .route("/api/what-if", post(what_if_handler))
        .route("/api/insights", post(insights_handler))
        .route("/api/solve", post(solve_handler))
        .fallback(not_found_handler)
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_handler(payload: Result<Json<PayoffPayload>, JsonRejection>) -> Response {
    with_request(payload, "plan", |request| {
        json_response(StatusCode::OK, build_plan_response(&request))
    })
}

async fn simulate_handler(payload: Result<Json<PayoffPayload>, JsonRejection>) -> Response {
    with_request(payload, "simulate", |request| {
        json_response(StatusCode::OK, build_simulate_response(&request, today()))
    })
}

async fn what_if_handler(payload: Result<Json<PayoffPayload>, JsonRejection>) -> Response {
    with_request(payload, "what-if", |request| {
        json_response(StatusCode::OK, build_what_if_response(&request))
    })
}

async fn insights_handler(payload: Result<Json<PayoffPayload>, JsonRejection>) -> Response {
    with_request(payload, "insights", |request| {
        json_response(StatusCode::OK, build_insights_response(&request, today()))
    })
}

async fn solve_handler(payload: Result<Json<PayoffPayload>, JsonRejection>) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    match build_solve_response(payload) {
        Ok(result) => json_response(StatusCode::OK, result),
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

fn with_request(
    payload: Result<Json<PayoffPayload>, JsonRejection>,
    endpoint: &'static str,
    respond: impl FnOnce(ApiRequest) -> Response,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    match api_request_from_payload(payload) {
        Ok(request) => {
            tracing::debug!(
                endpoint,
                accounts = request.accounts.len(),
                budget = request.budget,
                strategy = request.strategy.name(),
                "handling request"
            );
            respond(request)
        }
        Err(err) => error_response(StatusCode::BAD_REQUEST, &err.to_string()),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_accounts_payload(path: &Path) -> Result<PayoffPayload, AppError> {
    let raw = std::fs::read_to_string(path)?;
    let accounts = match serde_json::from_str::<AccountsFile>(&raw)
        .map_err(|e| RequestError::InvalidJson(e.to_string()))?
    {
        AccountsFile::List(accounts) | AccountsFile::Wrapped { accounts } => accounts,
    };
    Ok(PayoffPayload {
        accounts,
        ..PayoffPayload::default()
    })
}

fn request_from_run_args(args: &RunArgs) -> Result<ApiRequest, AppError> {
    let mut payload = read_accounts_payload(&args.accounts)?;
    payload.budget = args.budget;
    payload.strategy = Some(args.strategy.into());
    payload.horizon_months = Some(args.horizon_months);
    if !args.deltas.is_empty() {
        payload.deltas = Some(args.deltas.clone());
    }
    Ok(api_request_from_payload(payload)?)
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, RequestError> {
    let payload = serde_json::from_str::<PayoffPayload>(json)
        .map_err(|e| RequestError::InvalidJson(e.to_string()))?;
    api_request_from_payload(payload)
}

fn api_request_from_payload(payload: PayoffPayload) -> Result<ApiRequest, RequestError> {
    let horizon_months = payload.horizon_months.unwrap_or(DEFAULT_HORIZON_MONTHS);
    if horizon_months == 0 || horizon_months > MAX_HORIZON_MONTHS {
        return Err(RequestError::InvalidHorizon);
    }

    let strategy = resolve_strategy(payload.strategy);

    Ok(ApiRequest {
        accounts: accounts_from_payload(payload.accounts),
        budget: payload.budget,
        strategy,
        horizon_months,
        deltas: payload
            .deltas
            .unwrap_or_else(|| DEFAULT_WHAT_IF_DELTAS.to_vec()),
    })
}

fn resolve_strategy(strategy: Option<ApiStrategy>) -> Strategy {
    strategy.unwrap_or(ApiStrategy::Avalanche).into()
}

fn accounts_from_payload(accounts: Vec<AccountPayload>) -> Vec<Account> {
    accounts
        .into_iter()
        .enumerate()
        .map(|(idx, a)| {
            // Records without an id still need a distinct one for row matching.
            let id = if a.id.trim().is_empty() {
                format!("account-{}", idx + 1)
            } else {
                a.id
            };
            Account::new(id, a.balance, a.apr, a.min_payment)
                .with_names(a.bank, a.nickname)
                .with_due_date(a.due_date)
                .sanitized()
        })
        .collect()
}

fn build_plan_response(request: &ApiRequest) -> Plan {
    compute_plan(&request.accounts, request.budget, request.strategy)
}

fn build_simulate_response(request: &ApiRequest, today: NaiveDate) -> PayoffReport {
    simulate_payoff_on(
        &request.accounts,
        request.budget,
        request.strategy,
        request.horizon_months,
        today,
    )
}

fn build_what_if_response(request: &ApiRequest) -> WhatIfResponse {
    let base = run_simulation(
        &request.accounts,
        request.budget,
        request.strategy,
        request.horizon_months,
        false,
    );
    WhatIfResponse {
        budget: request.budget.max(0.0),
        strategy: request.strategy,
        months: base.months,
        total_interest: base.total_interest,
        scenarios: what_if(
            &request.accounts,
            request.budget,
            request.strategy,
            &request.deltas,
            request.horizon_months,
        ),
    }
}

fn build_insights_response(request: &ApiRequest, today: NaiveDate) -> InsightsResponse {
    InsightsResponse {
        metrics: portfolio_metrics(&request.accounts),
        insights: insights(
            &request.accounts,
            request.budget,
            request.strategy,
            request.horizon_months,
            today,
        ),
    }
}

fn build_solve_response(payload: PayoffPayload) -> Result<BudgetGoalResult, RequestError> {
    let target_months = payload.target_months.ok_or(RequestError::MissingTarget)?;
    let strategy = resolve_strategy(payload.strategy);

    let mut config = BudgetGoalConfig::new(target_months, strategy);
    config.search_min = payload.search_min;
    config.search_max = payload.search_max;
    if let Some(v) = payload.tolerance {
        config.tolerance = v;
    }
    if let Some(v) = payload.max_iterations {
        config.max_iterations = v;
    }

    let accounts = accounts_from_payload(payload.accounts);
    Ok(solve_budget(&accounts, config)?)
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_number(&value))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    })
}

/// Numbers pass through; strings keep only digits, `.` and `-` (so
/// "$1,200.50" reads as 1200.5); anything unparseable becomes zero.
fn coerce_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let cleaned = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect::<String>();
            cleaned.parse::<f64>().unwrap_or(0.0)
        }
        _ => 0.0,
    };
    if parsed.is_finite() { parsed } else { 0.0 }
}
