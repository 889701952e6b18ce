//! Shared helpers for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::connect_info::MockConnectInfo,
    http::{Request, Response},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use shortly::analytics::{GeoLocation, GeoLookupError, GeoResolver};
use shortly::app::{create_app, AppState};
use shortly::clock::ManualClock;
use shortly::config::RedirectMode;
use shortly::logging::RemoteLogger;
use shortly::registry::Registry;
use shortly::service::{ServiceSettings, ShortenerService};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Socket address every test request appears to come from
pub const PEER: ([u8; 4], u16) = ([203, 0, 113, 50], 40000);

/// Geo resolver stub that can be switched into failure mode
pub struct StubGeo {
    pub fail: AtomicBool,
    pub seen: Mutex<Vec<String>>,
}

impl StubGeo {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(false),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        let geo = Self::new();
        geo.fail.store(true, Ordering::SeqCst);
        geo
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeoResolver for StubGeo {
    async fn resolve(&self, ip: &str) -> Result<GeoLocation, GeoLookupError> {
        self.seen.lock().unwrap().push(ip.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(GeoLookupError::Empty(ip.to_string()));
        }
        Ok(GeoLocation {
            city: Some("Bengaluru".to_string()),
            region: Some("Karnataka".to_string()),
            country: Some("India".to_string()),
        })
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub struct TestApp {
    pub router: Router,
    pub service: Arc<ShortenerService>,
    pub clock: Arc<ManualClock>,
    pub geo: Arc<StubGeo>,
}

pub fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn test_app(geo: Arc<StubGeo>) -> TestApp {
    test_app_with_mode(geo, RedirectMode::Found)
}

pub fn test_app_with_mode(geo: Arc<StubGeo>, mode: RedirectMode) -> TestApp {
    let clock = Arc::new(ManualClock::new(t0()));
    let service = Arc::new(ShortenerService::new(
        Arc::new(Registry::new()),
        geo.clone(),
        clock.clone(),
        RemoteLogger::disabled(),
        ServiceSettings::default(),
    ));

    let router = create_app(AppState::new(Arc::clone(&service), mode))
        .layer(MockConnectInfo(SocketAddr::from(PEER)));

    TestApp {
        router,
        service,
        clock,
        geo,
    }
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Spawn `router` on an ephemeral local port
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}
