//! Webhook delivery against a `wiremock` endpoint.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use champtrend_core::{build_app_config, AppConfig, RunResult, RunStage};
use champtrend_pipeline::{
    notifier_from_config, render_message, NoopNotifier, Notifier, NotifyError, WebhookNotifier,
};

fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
}

fn config_with(vars: &[(&str, &str)]) -> AppConfig {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    build_app_config(|key| map.get(key).cloned().ok_or(std::env::VarError::NotPresent))
        .expect("config should build")
}

#[tokio::test]
async fn webhook_posts_content_and_username() {
    let server = MockServer::start().await;
    let result = RunResult::started(run_date());

    Mock::given(method("POST"))
        .and(path("/hooks/run"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "content": render_message(&result),
            "username": "champtrend-bot",
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(
        reqwest::Client::new(),
        &format!("{}/hooks/run", server.uri()),
        "champtrend-bot",
    );
    notifier
        .notify(&result)
        .await
        .expect("204 is a successful delivery");
}

#[tokio::test]
async fn webhook_non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad payload"))
        .mount(&server)
        .await;

    let notifier = WebhookNotifier::new(reqwest::Client::new(), &server.uri(), "champtrend");
    let failed = RunResult::started(run_date()).into_failure(RunStage::FetchMetric, "x".to_owned());
    let err = notifier.notify(&failed).await.unwrap_err();

    assert!(
        matches!(err, NotifyError::UnexpectedStatus { status: 400, ref body } if body == "bad payload"),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn noop_notifier_always_succeeds() {
    NoopNotifier
        .notify(&RunResult::started(run_date()))
        .await
        .expect("noop never fails");
}

#[tokio::test]
async fn config_without_webhook_selects_noop() {
    let notifier = notifier_from_config(&config_with(&[]), reqwest::Client::new());
    assert_eq!(notifier.channel_name(), "noop");
}

#[tokio::test]
async fn config_with_webhook_posts_to_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/hook", server.uri());
    let config = config_with(&[("CHAMPTREND_WEBHOOK_URL", url.as_str())]);
    let notifier = notifier_from_config(&config, reqwest::Client::new());

    assert_eq!(notifier.channel_name(), "webhook");
    notifier
        .notify(&RunResult::started(run_date()))
        .await
        .expect("200 counts as delivered");
}
