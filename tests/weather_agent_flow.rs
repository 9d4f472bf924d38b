//! End-to-end tests for the weather agent.
//!
//! Fake OpenWeatherMap and Twilio endpoints are served by Axum on random
//! ports, so the real HTTP clients run against them without leaving the
//! machine. The model is always a counting stub.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Form, Query};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::net::TcpListener;

use weather_agent::config::AppConfig;
use weather_agent::error::{ConfigError, LlmError, PipelineError, WeatherError};
use weather_agent::llm::{CompletionRequest, CompletionResponse, LlmProvider};
use weather_agent::notify::{EmailSender, MessageSender, TwilioConfig, TwilioSender};
use weather_agent::pipeline::{Pipeline, Record, weather_agent_pipeline};
use weather_agent::server::{WeatherResponse, api_routes};
use weather_agent::weather::{OpenWeatherClient, WeatherConfig, WeatherLookup, WeatherReport};

/// Model stub that counts calls and keeps every prompt it saw.
#[derive(Default)]
struct CountingLlm {
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl CountingLlm {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for CountingLlm {
    fn model_name(&self) -> &str {
        "counting"
    }

    fn cost_per_token(&self) -> (Decimal, Decimal) {
        (Decimal::ZERO, Decimal::ZERO)
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);
        Ok(CompletionResponse {
            content: " No umbrella needed, enjoy the sunshine. ".to_string(),
            input_tokens: 60,
            output_tokens: 9,
        })
    }
}

#[derive(Default)]
struct CountingSenders {
    emails: AtomicUsize,
    messages: AtomicUsize,
}

#[async_trait]
impl EmailSender for CountingSenders {
    async fn send(&self, _body: &str, _subject: &str) -> bool {
        self.emails.fetch_add(1, Ordering::SeqCst);
        true
    }
}

#[async_trait]
impl MessageSender for CountingSenders {
    async fn send(&self, _body: &str) -> bool {
        self.messages.fetch_add(1, Ordering::SeqCst);
        true
    }
}

/// Serve `app` on a random local port.
async fn spawn(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

/// Fake OpenWeatherMap: London is sunny, everything else is unknown.
async fn fake_openweather(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    assert_eq!(params.get("units").map(String::as_str), Some("metric"));
    assert_eq!(
        params.get("appid").map(String::as_str),
        Some("owm-test-key")
    );

    match params.get("q").map(|q| q.to_lowercase()).as_deref() {
        Some("london") => Json(json!({
            "cod": 200,
            "dt": 1_700_000_000,
            "name": "London",
            "weather": [{ "main": "Clear", "description": "clear sky" }],
            "main": { "temp": 21, "humidity": 40 }
        })),
        _ => Json(json!({ "cod": "404", "message": "city not found" })),
    }
}

fn weather_config(base_url: String) -> WeatherConfig {
    WeatherConfig {
        api_key: "owm-test-key".to_string().into(),
        base_url,
        timeout: Duration::from_secs(5),
    }
}

async fn openweather() -> Arc<OpenWeatherClient> {
    let app = Router::new().route("/data/2.5/weather", get(fake_openweather));
    let addr = spawn(app).await;
    let config = weather_config(format!("http://{addr}"));
    Arc::new(OpenWeatherClient::new(config).unwrap())
}

/// The production step order over `weather`, with the counting model and senders.
fn agent(
    weather: Arc<dyn WeatherLookup>,
    llm: &Arc<CountingLlm>,
    senders: &Arc<CountingSenders>,
) -> Pipeline {
    weather_agent_pipeline(weather, llm.clone(), senders.clone(), senders.clone()).unwrap()
}

#[tokio::test]
async fn london_run_produces_summary_and_answer() {
    let llm = Arc::new(CountingLlm::default());
    let senders = Arc::new(CountingSenders::default());
    let pipeline = agent(openweather().await, &llm, &senders);

    let record = pipeline
        .run(Record::request("london", "Do I need an umbrella?", false, false))
        .await
        .unwrap();

    assert_eq!(
        record.weather_text.as_deref(),
        Some("The weather in London is clear sky. Temperature: 21°C. Humidity: 40%.")
    );
    assert_eq!(
        record.answer.as_deref(),
        Some("No umbrella needed, enjoy the sunshine.")
    );
    assert_eq!(llm.calls(), 1);
    let prompts = llm.prompts.lock().unwrap();
    assert!(prompts[0].contains("User question: Do I need an umbrella?"));

    let observed = record.weather.as_ref().and_then(WeatherReport::observed);
    assert!(observed.unwrap().observed_at.is_some());

    assert_eq!(senders.emails.load(Ordering::SeqCst), 0);
    assert_eq!(senders.messages.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unknown_city_reasons_over_fallback_text() {
    let llm = Arc::new(CountingLlm::default());
    let senders = Arc::new(CountingSenders::default());
    let pipeline = agent(openweather().await, &llm, &senders);

    let record = pipeline
        .run(Record::request("Atlantis", "Rain?", true, false))
        .await
        .unwrap();

    assert_eq!(record.weather, Some(WeatherReport::NoData));
    assert_eq!(record.weather_text.as_deref(), Some("No weather data."));
    let prompts = llm.prompts.lock().unwrap();
    assert!(prompts[0].contains("Weather info: No weather data."));
    assert_eq!(senders.emails.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_weather_service_aborts_before_the_model() {
    let llm = Arc::new(CountingLlm::default());
    let senders = Arc::new(CountingSenders::default());
    let config = weather_config("http://127.0.0.1:9".into());
    let weather = Arc::new(OpenWeatherClient::new(config).unwrap());
    let pipeline = agent(weather, &llm, &senders);

    let err = pipeline
        .run(Record::request("London", "Umbrella?", true, true))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Step { ref step, .. } if step == "fetch_weather"));
    assert!(!err.is_configuration());
    assert_eq!(llm.calls(), 0);
    assert_eq!(senders.emails.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_weather_key_fails_before_any_run() {
    let vars: HashMap<&str, &str> = [("OPENAI_API_KEY", "sk-test")].into_iter().collect();
    let llm = Arc::new(CountingLlm::default());

    let result = AppConfig::from_vars(|k| vars.get(k).map(|v| v.to_string()))
        .map(|config| config.build_pipeline_with(llm.clone()));

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        ConfigError::MissingRequired { ref key, .. } if key == "WEATHER_API_KEY"
    ));
    assert_eq!(llm.calls(), 0);
    assert_eq!(Arc::strong_count(&llm), 1);
}

/// Lookup that reports a configuration problem at call time.
struct MisconfiguredLookup;

#[async_trait]
impl WeatherLookup for MisconfiguredLookup {
    fn name(&self) -> &str {
        "misconfigured"
    }

    async fn lookup(&self, _city: &str) -> Result<WeatherReport, WeatherError> {
        Err(WeatherError::Config(ConfigError::MissingRequired {
            key: "WEATHER_API_KEY".into(),
            hint: "set it".into(),
        }))
    }
}

#[tokio::test]
async fn configuration_failure_mid_run_is_classified() {
    let llm = Arc::new(CountingLlm::default());
    let senders = Arc::new(CountingSenders::default());
    let pipeline = agent(Arc::new(MisconfiguredLookup), &llm, &senders);

    let err = pipeline
        .run(Record::request("London", "Umbrella?", false, false))
        .await
        .unwrap_err();

    assert!(err.is_configuration());
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn api_over_tcp() {
    let llm = Arc::new(CountingLlm::default());
    let senders = Arc::new(CountingSenders::default());
    let pipeline = agent(openweather().await, &llm, &senders);
    let addr = spawn(api_routes(Arc::new(pipeline))).await;

    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://{addr}/weather"))
        .json(&json!({
            "city": "London",
            "question": "Do I need an umbrella?",
            "send_whatsapp_flag": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: WeatherResponse = response.json().await.unwrap();
    assert!(body.success);
    assert_eq!(body.city, "London");
    assert_eq!(
        body.answer.as_deref(),
        Some("No umbrella needed, enjoy the sunshine.")
    );
    assert!(!body.email_sent);
    assert!(body.whatsapp_sent);
    assert_eq!(senders.messages.load(Ordering::SeqCst), 1);

    // Concurrent runs share one pipeline.
    let requests = (0..4).map(|_| {
        client
            .post(format!("http://{addr}/weather"))
            .json(&json!({ "city": "London", "question": "Hat?" }))
            .send()
    });
    for response in join_spawned(requests).await {
        assert_eq!(response.unwrap().status(), 200);
    }
    assert_eq!(llm.calls(), 5);
}

async fn join_spawned<F, T>(futures: impl Iterator<Item = F>) -> Vec<T>
where
    F: std::future::Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let handles: Vec<_> = futures.map(tokio::spawn).collect();
    let mut out = Vec::with_capacity(handles.len());
    for handle in handles {
        out.push(handle.await.unwrap());
    }
    out
}

#[tokio::test]
async fn twilio_sender_posts_form() {
    let received: Arc<Mutex<Vec<HashMap<String, String>>>> = Arc::default();
    let sink = Arc::clone(&received);
    let app = Router::new().route(
        "/Accounts/{sid}/Messages.json",
        post(move |Form(form): Form<HashMap<String, String>>| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(form);
                (axum::http::StatusCode::CREATED, Json(json!({ "sid": "SM1" })))
            }
        }),
    );
    let addr = spawn(app).await;

    let vars: HashMap<&str, String> = [
        ("TWILIO_SID", "AC1".to_string()),
        ("TWILIO_AUTH", "token".to_string()),
        ("TWILIO_FROM", "whatsapp:+14155238886".to_string()),
        ("TWILIO_TO", "whatsapp:+15550001111".to_string()),
        ("TWILIO_API_BASE", format!("http://{addr}")),
    ]
    .into_iter()
    .collect();
    let config = TwilioConfig::from_vars(|k| vars.get(k).cloned()).unwrap();

    let sender = TwilioSender::new(Some(config));
    assert!(sender.send("Sunny, no umbrella.").await);

    let forms = received.lock().unwrap();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0]["Body"], "Sunny, no umbrella.");
    assert_eq!(forms[0]["To"], "whatsapp:+15550001111");
}
