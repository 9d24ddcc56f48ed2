//! Integration tests for the fallback orchestrator and bundle fetcher
//! against a mocked upstream.

use std::time::Duration;

use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use huno::canonical::{canonicalize, Availability};
use huno::client::{ClientConfig, SessionToken, VendorClient};
use huno::fetch::{default_candidates, BundleFetcher, FetchTelemetry, Metric, Orchestrator, UserIds};
use huno::HunoError;

fn test_token() -> SessionToken {
    SessionToken {
        token_type: "Bearer".to_string(),
        access_token: "test_token".to_string(),
        expires_at: chrono::Utc::now().timestamp() + 3600,
        display_name: Some("abc-guid".to_string()),
    }
}

fn test_ids() -> UserIds {
    UserIds {
        display_name: Some("abc-guid".to_string()),
        profile_id: Some(4242),
    }
}

fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 4).unwrap()
}

fn client_for(server: &MockServer) -> VendorClient {
    VendorClient::new(&ClientConfig::for_base_url(&server.uri())).unwrap()
}

#[tokio::test]
async fn first_populated_candidate_short_circuits() {
    let server = MockServer::start().await;

    // First candidate answers with data; the fallback must never be called
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailySleepData/abc-guid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dailySleepDTO": {"sleepTimeSeconds": 27000}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailySleepData/4242"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"x": 1})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = test_token();
    let telemetry = FetchTelemetry::new();
    let orchestrator =
        Orchestrator::new(&client, &token, &telemetry).with_backoff(2, Duration::from_millis(1));

    let fetch = orchestrator
        .fetch_metric(
            Metric::Sleep,
            &default_candidates(Metric::Sleep),
            &test_ids(),
            &[test_date()],
        )
        .await
        .unwrap();

    assert!(fetch.is_available());
    let summary = telemetry.summary();
    assert_eq!(summary["sleep"].success_count, 1);
}

#[tokio::test]
async fn empty_payload_falls_through_to_next_candidate() {
    let server = MockServer::start().await;

    // 200 with an empty object is a logical failure, not a success
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailySleepData/abc-guid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailySleepData/4242"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sleepingSeconds": 25200
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = test_token();
    let telemetry = FetchTelemetry::new();
    let orchestrator =
        Orchestrator::new(&client, &token, &telemetry).with_backoff(2, Duration::from_millis(1));

    let fetch = orchestrator
        .fetch_metric(
            Metric::Sleep,
            &default_candidates(Metric::Sleep),
            &test_ids(),
            &[test_date()],
        )
        .await
        .unwrap();

    assert!(fetch.is_available());
    assert_eq!(fetch.data.unwrap()["sleepingSeconds"], 25200);
}

#[tokio::test]
async fn html_challenge_page_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailyStress/2025-12-04"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<!DOCTYPE html><html><body>checking your browser</body></html>")
                .insert_header("content-type", "text/html"),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailyStress/abc-guid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "avgStressLevel": 31
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = test_token();
    let telemetry = FetchTelemetry::new();
    let orchestrator =
        Orchestrator::new(&client, &token, &telemetry).with_backoff(2, Duration::from_millis(1));

    let fetch = orchestrator
        .fetch_metric(
            Metric::Stress,
            &default_candidates(Metric::Stress),
            &test_ids(),
            &[test_date()],
        )
        .await
        .unwrap();

    assert!(fetch.is_available());
}

#[tokio::test]
async fn earlier_dates_are_tried_before_the_next_candidate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailyStress/2025-12-04"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailyStress/2025-12-03"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "avgStressLevel": 27
        })))
        .expect(1)
        .mount(&server)
        .await;
    // The fallback candidate must not be reached
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailyStress/abc-guid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"avgStressLevel": 1})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = test_token();
    let telemetry = FetchTelemetry::new();
    let orchestrator =
        Orchestrator::new(&client, &token, &telemetry).with_backoff(2, Duration::from_millis(1));

    let dates = [test_date(), test_date() - chrono::Duration::days(1)];
    let fetch = orchestrator
        .fetch_metric(
            Metric::Stress,
            &default_candidates(Metric::Stress),
            &test_ids(),
            &dates,
        )
        .await
        .unwrap();

    assert!(fetch.is_available());
    assert_eq!(fetch.data.unwrap()["avgStressLevel"], 27);
}

#[tokio::test]
async fn transient_errors_retry_up_to_the_ceiling() {
    let server = MockServer::start().await;

    // One initial attempt plus two retries per candidate
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailyHeartRate/abc-guid"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailyHeartRate/4242"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = test_token();
    let telemetry = FetchTelemetry::new();
    let orchestrator =
        Orchestrator::new(&client, &token, &telemetry).with_backoff(2, Duration::from_millis(1));

    let fetch = orchestrator
        .fetch_metric(
            Metric::HeartRate,
            &default_candidates(Metric::HeartRate),
            &test_ids(),
            &[test_date()],
        )
        .await
        .unwrap();

    assert_eq!(fetch.availability, Availability::Unavailable);
    assert!(fetch.data.is_none());
    assert_eq!(telemetry.summary()["heart_rate"].error_count, 6);
}

#[tokio::test]
async fn expired_session_aborts_the_whole_metric() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailySleepData/abc-guid"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    // A dead session must not be retried against the fallback
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailySleepData/4242"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sleepingSeconds": 1})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = test_token();
    let telemetry = FetchTelemetry::new();
    let orchestrator =
        Orchestrator::new(&client, &token, &telemetry).with_backoff(2, Duration::from_millis(1));

    let result = orchestrator
        .fetch_metric(
            Metric::Sleep,
            &default_candidates(Metric::Sleep),
            &test_ids(),
            &[test_date()],
        )
        .await;

    assert!(matches!(result, Err(HunoError::AuthExpired)));
}

#[tokio::test]
async fn rate_limit_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/hrv-service/hrv/2025-12-04"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/hrv-service/hrv/2025-12-04"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hrvSummary": {"lastNightAvg": 44, "weeklyAvg": 46}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = test_token();
    let telemetry = FetchTelemetry::new();
    let orchestrator =
        Orchestrator::new(&client, &token, &telemetry).with_backoff(2, Duration::from_millis(1));

    let fetch = orchestrator
        .fetch_metric(
            Metric::Hrv,
            &default_candidates(Metric::Hrv),
            &test_ids(),
            &[test_date()],
        )
        .await
        .unwrap();

    assert!(fetch.is_available());
    let summary = telemetry.summary();
    assert_eq!(summary["hrv"].success_count, 1);
    assert_eq!(summary["hrv"].error_count, 1);
}

#[tokio::test]
async fn exhausted_budget_marks_metrics_and_history_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/userprofile-service/socialProfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "displayName": "abc-guid"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/userprofile-service/userprofile/user-settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"userData": {}})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/activitylist-service/activities/search/activities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    // No wellness endpoint may be hit once the budget is gone
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"x": 1})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = test_token();
    let telemetry = FetchTelemetry::new();
    let fetcher = BundleFetcher::new(&client, &token, &telemetry).with_budget(Duration::ZERO);

    let bundle = fetcher.fetch_daily_bundle(test_date(), 3).await.unwrap();
    assert_eq!(bundle.sleep.availability, Availability::Unavailable);
    assert_eq!(bundle.daily_summary.availability, Availability::Unavailable);
    assert_eq!(bundle.history.len(), 3);
    assert!(bundle
        .history
        .iter()
        .all(|day| !day.stats.is_available() && !day.hrv.is_available()));
}

#[tokio::test]
async fn body_battery_scalar_fallback_resolves_end_to_end() {
    let server = MockServer::start().await;

    // The reports endpoint answers with an empty array; the fallback serves
    // the older scalar shape
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/bodyBattery/reports/daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/wellness-service/wellness/dailyBodyBattery/2025-12-04/2025-12-04",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "bodyBatteryMostRecentValue": 58
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = test_token();
    let telemetry = FetchTelemetry::new();
    let orchestrator =
        Orchestrator::new(&client, &token, &telemetry).with_backoff(2, Duration::from_millis(1));

    let fetch = orchestrator
        .fetch_metric(
            Metric::BodyBattery,
            &default_candidates(Metric::BodyBattery),
            &test_ids(),
            &[test_date()],
        )
        .await
        .unwrap();
    assert!(fetch.is_available());

    let bundle = huno::fetch::RawBundle {
        date: test_date(),
        profile: json!({"displayName": "abc-guid"}),
        settings: json!({}),
        activities: None,
        sleep: huno::fetch::MetricFetch::unavailable(),
        stress: huno::fetch::MetricFetch::unavailable(),
        body_battery: fetch,
        heart_rate: huno::fetch::MetricFetch::unavailable(),
        hrv: huno::fetch::MetricFetch::unavailable(),
        daily_summary: huno::fetch::MetricFetch::unavailable(),
        history: Vec::new(),
    };
    let profile = canonicalize(&bundle);
    let points = profile.wellness.body_battery.data.unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].value, 58.0);
}

#[tokio::test]
async fn bundle_fetch_degrades_per_metric() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/userprofile-service/socialProfile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "displayName": "abc-guid",
            "profileId": 4242,
            "fullName": "Test User"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/userprofile-service/userprofile/user-settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "userData": {"weight": 82500.0, "height": 180.0, "age": 34, "gender": "MALE"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/activitylist-service/activities/search/activities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    // Sleep resolves on the first candidate; everything else stays dark
    Mock::given(method("GET"))
        .and(path("/wellness-service/wellness/dailySleepData/abc-guid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dailySleepDTO": {"sleepTimeSeconds": 27000, "deepSleepSeconds": 5400}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let token = test_token();
    let telemetry = FetchTelemetry::new();
    let fetcher = BundleFetcher::new(&client, &token, &telemetry)
        .with_budget(Duration::from_secs(30));

    let bundle = fetcher.fetch_daily_bundle(test_date(), 2).await.unwrap();
    assert!(bundle.sleep.is_available());
    assert_eq!(bundle.stress.availability, Availability::Unavailable);
    assert_eq!(bundle.history.len(), 2);

    let profile = canonicalize(&bundle);
    assert_eq!(profile.identity.weight_kg, Some(82.5));
    assert_eq!(profile.identity.age, Some(34));
    assert!(profile.wellness.sleep.is_available());
    assert_eq!(profile.wellness.stress.status, Availability::Unavailable);
    assert_eq!(profile.wellness.history.hrv.len(), 2);
    // Oldest first after canonicalization
    assert!(profile.wellness.history.hrv[0].date < profile.wellness.history.hrv[1].date);
}
