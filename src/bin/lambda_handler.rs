//! AWS Lambda handler for deal analysis
//!
//! Accepts an API Gateway proxy request whose body is a JSON `DealInput` and
//! returns the full `DealAnalysis`. A body of the form `{"deals": [...]}`
//! returns a `ComparisonReport` instead.

use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use aws_lambda_events::encodings::Body;
use aws_lambda_events::http::{HeaderMap, HeaderValue, Method};
use canadian_realty::{DealInput, ScenarioRunner};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnalysisRequest {
    Compare { deals: Vec<DealInput> },
    Single(Box<DealInput>),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

fn headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Content-Type", HeaderValue::from_static("application/json"));
    headers.insert("Access-Control-Allow-Origin", HeaderValue::from_static("*"));
    headers.insert("Access-Control-Allow-Methods", HeaderValue::from_static("POST, OPTIONS"));
    headers.insert("Access-Control-Allow-Headers", HeaderValue::from_static("Content-Type"));
    headers
}

fn respond(status: i64, body: String) -> ApiGatewayProxyResponse {
    ApiGatewayProxyResponse {
        status_code: status,
        headers: headers(),
        body: Some(Body::Text(body)),
        ..Default::default()
    }
}

fn error_response(status: i64, message: &str) -> ApiGatewayProxyResponse {
    let body = serde_json::to_string(&ErrorBody { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{}\"}}", status));
    respond(status, body)
}

fn json_response<T: Serialize>(value: &T) -> ApiGatewayProxyResponse {
    match serde_json::to_string(value) {
        Ok(body) => respond(200, body),
        Err(e) => error_response(500, &format!("failed to serialize response: {}", e)),
    }
}

/// Pure request handling, separated from the runtime for testing
fn handle(runner: &ScenarioRunner, request: &ApiGatewayProxyRequest) -> ApiGatewayProxyResponse {
    if request.http_method == Method::OPTIONS {
        return respond(200, String::new());
    }
    if request.is_base64_encoded {
        return error_response(400, "base64-encoded bodies are not supported");
    }
    let Some(body) = request.body.as_deref().filter(|b| !b.trim().is_empty()) else {
        return error_response(400, "request body is empty");
    };

    let parsed: AnalysisRequest = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) => return error_response(400, &format!("invalid request: {}", e)),
    };

    match parsed {
        AnalysisRequest::Single(deal) => match runner.analyze(&deal) {
            Ok(analysis) => json_response(&analysis),
            Err(e) => error_response(400, &e.to_string()),
        },
        AnalysisRequest::Compare { deals } => match runner.compare(&deals) {
            Ok(report) => json_response(&report),
            Err(e) => error_response(400, &e.to_string()),
        },
    }
}

async fn handler(event: LambdaEvent<ApiGatewayProxyRequest>) -> Result<ApiGatewayProxyResponse, Error> {
    let start = Instant::now();
    let runner = ScenarioRunner::new();
    let response = handle(&runner, &event.payload);
    log::info!(
        "request {} answered {} in {:?}",
        event.context.request_id,
        response.status_code,
        start.elapsed()
    );
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(body: &str) -> ApiGatewayProxyRequest {
        ApiGatewayProxyRequest {
            http_method: Method::POST,
            body: Some(body.to_string()),
            ..Default::default()
        }
    }

    fn text(response: &ApiGatewayProxyResponse) -> &str {
        match &response.body {
            Some(Body::Text(text)) => text,
            _ => "",
        }
    }

    #[test]
    fn test_single_deal() {
        let body = r#"{
            "name": "lambda duplex",
            "purchase_price": 600000,
            "province": "ON",
            "interest_rate": 0.05,
            "monthly_rent": 4200,
            "units": 2
        }"#;
        let response = handle(&ScenarioRunner::new(), &post(body));
        assert_eq!(response.status_code, 200);
        let value: serde_json::Value = serde_json::from_str(text(&response)).unwrap();
        assert_eq!(value["name"], "lambda duplex");
        assert!(value["ratios"]["cap_rate"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn test_compare_deals() {
        let body = r#"{"deals": [
            {"name": "a", "purchase_price": 500000, "province": "NS", "interest_rate": 0.05, "monthly_rent": 3500},
            {"name": "b", "purchase_price": 700000, "province": "BC", "interest_rate": 0.05, "monthly_rent": 2900}
        ]}"#;
        let response = handle(&ScenarioRunner::new(), &post(body));
        assert_eq!(response.status_code, 200);
        let value: serde_json::Value = serde_json::from_str(text(&response)).unwrap();
        assert_eq!(value["entries"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_deal_is_bad_request() {
        let body = r#"{"purchase_price": 500000, "province": "ON", "interest_rate": 0.05, "monthly_rent": 3000, "units": 0}"#;
        let response = handle(&ScenarioRunner::new(), &post(body));
        assert_eq!(response.status_code, 400);
        assert!(text(&response).contains("units"));
    }

    #[test]
    fn test_empty_body() {
        let response = handle(&ScenarioRunner::new(), &post("  "));
        assert_eq!(response.status_code, 400);
    }

    #[test]
    fn test_preflight() {
        let request = ApiGatewayProxyRequest {
            http_method: Method::OPTIONS,
            ..Default::default()
        };
        let response = handle(&ScenarioRunner::new(), &request);
        assert_eq!(response.status_code, 200);
        assert!(response.headers.contains_key("Access-Control-Allow-Origin"));
    }
}
