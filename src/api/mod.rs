use axum::{
    Router,
    extract::{Json, Query},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Parser, ValueEnum};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{InputParameters, OwnershipYear, Projection, RentalYear, Summary, project};

mod report;

pub use report::{format_currency, render_summary, render_table};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Summary,
    Json,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
struct ProjectPayload {
    apartment_price: Option<f64>,
    down_payment_percent: Option<f64>,
    mortgage_years: Option<u32>,
    interest_rate: Option<f64>,
    monthly_avgift: Option<f64>,
    amortization_rate: Option<f64>,
    property_appreciation: Option<f64>,
    monthly_rent: Option<f64>,
    investment_return: Option<f64>,
    avgift_growth: Option<f64>,
    rent_growth: Option<f64>,
    horizon_years: Option<u32>,
}

#[derive(Parser, Debug)]
#[command(
    name = "bostad",
    about = "Swedish housing: buy a bostadsrätt with a mortgage or rent and invest the difference",
    after_help = "Run `bostad serve [port]` to start the HTTP API instead."
)]
struct Cli {
    #[arg(long, default_value_t = 6_000_000.0, help = "Apartment price in SEK")]
    apartment_price: f64,
    #[arg(
        long,
        default_value_t = 15.0,
        help = "Down payment in percent of the price, 5 to 50"
    )]
    down_payment_percent: f64,
    #[arg(long, default_value_t = 50, help = "Mortgage length in years, 10 to 50")]
    mortgage_years: u32,
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Annual mortgage interest rate in percent"
    )]
    interest_rate: f64,
    #[arg(
        long,
        default_value_t = 5_000.0,
        help = "Monthly housing association fee (avgift) in SEK"
    )]
    monthly_avgift: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Annual amortization (amortering) in percent of the purchase price, 1 to 5"
    )]
    amortization_rate: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        allow_negative_numbers = true,
        help = "Expected annual property appreciation in percent"
    )]
    property_appreciation: f64,
    #[arg(long, default_value_t = 18_000.0, help = "Monthly rent in SEK")]
    monthly_rent: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        allow_negative_numbers = true,
        help = "Expected annual investment return in percent"
    )]
    investment_return: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        allow_negative_numbers = true,
        help = "Annual avgift increase in percent; 0 keeps it flat"
    )]
    avgift_growth: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        allow_negative_numbers = true,
        help = "Annual rent increase in percent; 0 keeps it flat"
    )]
    rent_growth: f64,
    #[arg(
        long,
        help = "Years to project, at least --mortgage-years; defaults to the mortgage term"
    )]
    horizon_years: Option<u32>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

// Request keys and units, so the echo can be posted back unchanged.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EchoedInputs {
    apartment_price: f64,
    down_payment_percent: f64,
    mortgage_years: u32,
    interest_rate: f64,
    monthly_avgift: f64,
    amortization_rate: f64,
    property_appreciation: f64,
    monthly_rent: f64,
    investment_return: f64,
    avgift_growth: f64,
    rent_growth: f64,
    horizon_years: Option<u32>,
}

impl From<&InputParameters> for EchoedInputs {
    fn from(inputs: &InputParameters) -> Self {
        Self {
            apartment_price: inputs.apartment_price,
            down_payment_percent: inputs.down_payment_pct * 100.0,
            mortgage_years: inputs.mortgage_years,
            interest_rate: inputs.interest_rate * 100.0,
            monthly_avgift: inputs.monthly_avgift,
            amortization_rate: inputs.annual_amortization_rate * 100.0,
            property_appreciation: inputs.property_appreciation_rate * 100.0,
            monthly_rent: inputs.monthly_rent,
            investment_return: inputs.investment_return_rate * 100.0,
            avgift_growth: inputs.avgift_growth_rate * 100.0,
            rent_growth: inputs.rent_growth_rate * 100.0,
            horizon_years: inputs.horizon_years,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProjectResponse<'a> {
    inputs: EchoedInputs,
    ownership: &'a [OwnershipYear],
    rental: &'a [RentalYear],
    summary: &'a Summary,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn build_inputs(cli: &Cli) -> InputParameters {
    InputParameters {
        apartment_price: cli.apartment_price,
        down_payment_pct: cli.down_payment_percent / 100.0,
        mortgage_years: cli.mortgage_years,
        interest_rate: cli.interest_rate / 100.0,
        monthly_avgift: cli.monthly_avgift,
        annual_amortization_rate: cli.amortization_rate / 100.0,
        property_appreciation_rate: cli.property_appreciation / 100.0,
        monthly_rent: cli.monthly_rent,
        investment_return_rate: cli.investment_return / 100.0,
        avgift_growth_rate: cli.avgift_growth / 100.0,
        rent_growth_rate: cli.rent_growth / 100.0,
        horizon_years: cli.horizon_years,
    }
}

/// Parses command-line flags, runs one projection and returns the rendered output.
pub fn run_cli<I, T>(args: I) -> Result<String, String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let inputs = build_inputs(&cli);
    let projection = project(&inputs).map_err(|e| format!("invalid input: {e}"))?;

    let rendered = match cli.output {
        OutputFormat::Table => format!(
            "{}\n{}",
            render_table(&projection),
            render_summary(&projection)
        ),
        OutputFormat::Summary => render_summary(&projection),
        OutputFormat::Json => {
            let response = build_project_response(&inputs, &projection);
            serde_json::to_string_pretty(&response)
                .map_err(|e| format!("failed to serialize projection: {e}"))?
        }
    };
    Ok(rendered)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("Buy-vs-rent HTTP API listening on http://{addr}");
    info!("Local access: http://127.0.0.1:{port}/api/project");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn project_get_handler(Query(payload): Query<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_post_handler(Json(payload): Json<ProjectPayload>) -> Response {
    project_handler_impl(payload).await
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    let inputs = inputs_from_payload(payload);
    match project(&inputs) {
        Ok(projection) => {
            debug!(
                "served projection over {} years",
                projection.ownership.len()
            );
            json_response(
                StatusCode::OK,
                build_project_response(&inputs, &projection),
            )
        }
        Err(e) => {
            warn!("rejected projection request: {e}");
            error_response(StatusCode::BAD_REQUEST, &format!("invalid input: {e}"))
        }
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

#[cfg(test)]
fn inputs_from_json(json: &str) -> Result<InputParameters, String> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    Ok(inputs_from_payload(payload))
}

fn inputs_from_payload(payload: ProjectPayload) -> InputParameters {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.apartment_price {
        cli.apartment_price = v;
    }
    if let Some(v) = payload.down_payment_percent {
        cli.down_payment_percent = v;
    }
    if let Some(v) = payload.mortgage_years {
        cli.mortgage_years = v;
    }
    if let Some(v) = payload.interest_rate {
        cli.interest_rate = v;
    }
    if let Some(v) = payload.monthly_avgift {
        cli.monthly_avgift = v;
    }
    if let Some(v) = payload.amortization_rate {
        cli.amortization_rate = v;
    }
    if let Some(v) = payload.property_appreciation {
        cli.property_appreciation = v;
    }
    if let Some(v) = payload.monthly_rent {
        cli.monthly_rent = v;
    }
    if let Some(v) = payload.investment_return {
        cli.investment_return = v;
    }
    if let Some(v) = payload.avgift_growth {
        cli.avgift_growth = v;
    }
    if let Some(v) = payload.rent_growth {
        cli.rent_growth = v;
    }
    if let Some(v) = payload.horizon_years {
        cli.horizon_years = Some(v);
    }

    build_inputs(&cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        apartment_price: 6_000_000.0,
        down_payment_percent: 15.0,
        mortgage_years: 50,
        interest_rate: 3.0,
        monthly_avgift: 5_000.0,
        amortization_rate: 2.0,
        property_appreciation: 2.0,
        monthly_rent: 18_000.0,
        investment_return: 5.0,
        avgift_growth: 0.0,
        rent_growth: 0.0,
        horizon_years: None,
        output: OutputFormat::Json,
    }
}

fn build_project_response<'a>(
    inputs: &'a InputParameters,
    projection: &'a Projection,
) -> ProjectResponse<'a> {
    ProjectResponse {
        inputs: inputs.into(),
        ownership: &projection.ownership,
        rental: &projection.rental,
        summary: &projection.summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be json")
    }

    fn assert_no_store(response: &Response) {
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );
    }

    #[test]
    fn cli_defaults_match_api_defaults() {
        let parsed = Cli::parse_from(["bostad"]);

        assert_eq!(build_inputs(&parsed), build_inputs(&sample_cli()));
        assert_eq!(parsed.output, OutputFormat::Table);
    }

    #[test]
    fn build_inputs_converts_percentages_to_fractions() {
        let inputs = build_inputs(&sample_cli());

        assert_approx(inputs.apartment_price, 6_000_000.0);
        assert_approx(inputs.down_payment_pct, 0.15);
        assert_eq!(inputs.mortgage_years, 50);
        assert_approx(inputs.interest_rate, 0.03);
        assert_approx(inputs.monthly_avgift, 5_000.0);
        assert_approx(inputs.annual_amortization_rate, 0.02);
        assert_approx(inputs.property_appreciation_rate, 0.02);
        assert_approx(inputs.monthly_rent, 18_000.0);
        assert_approx(inputs.investment_return_rate, 0.05);
        assert_approx(inputs.avgift_growth_rate, 0.0);
        assert_approx(inputs.rent_growth_rate, 0.0);
        assert_eq!(inputs.horizon_years, None);
    }

    #[test]
    fn projection_rejects_large_down_payment() {
        let mut cli = sample_cli();
        cli.down_payment_percent = 60.0;

        let err = project(&build_inputs(&cli)).expect_err("must reject 60% down payment");
        assert!(err.to_string().contains("down_payment_pct"));
    }

    #[test]
    fn projection_rejects_short_mortgage() {
        let mut cli = sample_cli();
        cli.mortgage_years = 5;

        let err = project(&build_inputs(&cli)).expect_err("must reject 5 year mortgage");
        assert!(err.to_string().contains("mortgage_years"));
    }

    #[test]
    fn cli_parses_negative_rates_and_output_mode() {
        let cli = Cli::parse_from([
            "bostad",
            "--property-appreciation",
            "-1.5",
            "--horizon-years",
            "60",
            "--output",
            "summary",
        ]);
        let inputs = build_inputs(&cli);

        assert_approx(inputs.property_appreciation_rate, -0.015);
        assert_eq!(inputs.horizon_years, Some(60));
        assert_eq!(cli.output, OutputFormat::Summary);
    }

    #[test]
    fn run_cli_reports_validation_failure() {
        let err = run_cli(["bostad", "--down-payment-percent", "60"])
            .expect_err("validation failure must surface");
        assert!(err.starts_with("invalid input:"));
        assert!(err.contains("down_payment_pct"));
    }

    #[test]
    fn run_cli_summary_output_omits_yearly_rows() {
        let output = run_cli(["bostad", "--output", "summary"]).expect("valid run");

        assert!(output.contains("Loan amount"));
        assert!(output.contains("5,100,000 SEK"));
        assert!(!output.contains("Principal"));
    }

    #[test]
    fn run_cli_json_output_is_parseable() {
        let output = run_cli(["bostad", "--output", "json", "--mortgage-years", "10"])
            .expect("valid run");
        let value: serde_json::Value = serde_json::from_str(&output).expect("valid json");

        assert_eq!(value["ownership"].as_array().map(Vec::len), Some(10));
        assert_eq!(value["rental"].as_array().map(Vec::len), Some(10));
        assert_eq!(value["inputs"]["mortgageYears"], 10);
    }

    #[test]
    fn inputs_from_json_parses_web_keys() {
        let json = r#"{
          "apartmentPrice": 4500000,
          "downPaymentPercent": 20,
          "mortgageYears": 30,
          "interestRate": 4.1,
          "monthlyAvgift": 3500,
          "amortizationRate": 3,
          "propertyAppreciation": -1,
          "monthlyRent": 14000,
          "investmentReturn": 7,
          "avgiftGrowth": 2,
          "rentGrowth": 1.5,
          "horizonYears": 40
        }"#;
        let inputs = inputs_from_json(json).expect("json should parse");

        assert_approx(inputs.apartment_price, 4_500_000.0);
        assert_approx(inputs.down_payment_pct, 0.20);
        assert_eq!(inputs.mortgage_years, 30);
        assert_approx(inputs.interest_rate, 0.041);
        assert_approx(inputs.monthly_avgift, 3_500.0);
        assert_approx(inputs.annual_amortization_rate, 0.03);
        assert_approx(inputs.property_appreciation_rate, -0.01);
        assert_approx(inputs.monthly_rent, 14_000.0);
        assert_approx(inputs.investment_return_rate, 0.07);
        assert_approx(inputs.avgift_growth_rate, 0.02);
        assert_approx(inputs.rent_growth_rate, 0.015);
        assert_eq!(inputs.horizon_years, Some(40));
    }

    #[test]
    fn inputs_from_json_fills_missing_keys_with_defaults() {
        let inputs = inputs_from_json(r#"{ "monthlyRent": 20000 }"#).expect("json should parse");
        let defaults = build_inputs(&sample_cli());

        assert_approx(inputs.monthly_rent, 20_000.0);
        assert_approx(inputs.apartment_price, defaults.apartment_price);
        assert_eq!(inputs.mortgage_years, defaults.mortgage_years);
    }

    #[test]
    fn inputs_from_json_rejects_unknown_keys() {
        let err = inputs_from_json(r#"{ "downPaymentPct": 0.6 }"#)
            .expect_err("engine field names are not request keys");
        assert!(err.contains("downPaymentPct"));

        let err = inputs_from_json(r#"{ "annualAmortizationRate": 0.05 }"#)
            .expect_err("engine field names are not request keys");
        assert!(err.contains("annualAmortizationRate"));
    }

    #[test]
    fn echoed_inputs_post_back_to_the_same_scenario() {
        let mut cli = sample_cli();
        cli.down_payment_percent = 30.0;
        cli.amortization_rate = 4.0;
        cli.horizon_years = Some(55);
        let inputs = build_inputs(&cli);
        let projection = project(&inputs).expect("valid inputs");

        let json = serde_json::to_string(&build_project_response(&inputs, &projection))
            .expect("response should serialize");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        let echoed = serde_json::to_string(&value["inputs"]).expect("inputs should serialize");
        let reparsed = inputs_from_json(&echoed).expect("echo should be a valid request");

        assert_approx(reparsed.down_payment_pct, 0.30);
        assert_approx(reparsed.annual_amortization_rate, 0.04);
        assert_eq!(reparsed.horizon_years, Some(55));
        assert_eq!(reparsed.mortgage_years, inputs.mortgage_years);
        assert_approx(reparsed.interest_rate, inputs.interest_rate);
        assert_approx(reparsed.monthly_rent, inputs.monthly_rent);
    }

    #[test]
    fn project_response_serialization_contains_expected_fields() {
        let inputs = build_inputs(&sample_cli());
        let projection = project(&inputs).expect("valid inputs");
        let response = build_project_response(&inputs, &projection);
        let json = serde_json::to_string(&response).expect("response should serialize");

        assert!(json.contains("\"inputs\""));
        assert!(json.contains("\"downPaymentPercent\""));
        assert!(json.contains("\"ownership\""));
        assert!(json.contains("\"rental\""));
        assert!(json.contains("\"summary\""));
        assert!(json.contains("\"outstandingPrincipal\""));
        assert!(json.contains("\"investedCapital\""));
        assert!(json.contains("\"finalNetWorthDelta\""));
        assert!(json.contains("\"breakEven\""));
        assert!(json.contains("\"loanToValue\""));
    }

    #[tokio::test]
    async fn project_handler_returns_projection_for_valid_payload() {
        let payload = ProjectPayload {
            mortgage_years: Some(10),
            ..ProjectPayload::default()
        };
        let response = project_handler_impl(payload).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_no_store(&response);
        let body = response_json(response).await;
        assert_eq!(body["ownership"].as_array().map(Vec::len), Some(10));
        let echoed_down_payment = body["inputs"]["downPaymentPercent"]
            .as_f64()
            .expect("echoed down payment");
        assert_approx(echoed_down_payment, 15.0);
    }

    #[tokio::test]
    async fn project_handler_rejects_out_of_range_input_with_error_body() {
        let payload = ProjectPayload {
            down_payment_percent: Some(60.0),
            ..ProjectPayload::default()
        };
        let response = project_handler_impl(payload).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_no_store(&response);
        let body = response_json(response).await;
        let error = body["error"].as_str().expect("error message");
        assert!(error.contains("down_payment_pct"));
        assert!(body.get("ownership").is_none());
    }

    #[tokio::test]
    async fn unknown_routes_return_json_not_found() {
        let response = not_found_handler().await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_no_store(&response);
        let body = response_json(response).await;
        assert_eq!(body["error"], "Not found");
    }
}
