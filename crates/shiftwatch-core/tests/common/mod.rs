//! Fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta};
use shiftwatch_maps::{DirectionsRequest, Leg, Maps, MapsError, Route, TimeValue, TravelTime};
use shiftwatch_marketplace::{
    Address, Credentials, GeoPoint, Job, JobLocation, Marketplace, MarketplaceError, PayRate, Role,
    Shift, TokenPair,
};

pub fn credentials() -> Credentials {
    Credentials {
        email: "worker@example.com".to_string(),
        password: "hunter2".to_string(),
    }
}

pub fn tokens(access: &str, refresh: &str) -> TokenPair {
    TokenPair {
        access_token: access.to_string(),
        refresh_token: refresh.to_string(),
    }
}

pub fn shift(id: &str, start: DateTime<chrono::FixedOffset>, hours: i64, status: &str) -> Shift {
    Shift {
        id: id.to_string(),
        start_time: start,
        end_time: start + TimeDelta::hours(hours),
        status: status.to_string(),
    }
}

pub fn job(venue: &str, shifts: Vec<Shift>) -> Job {
    Job {
        id: format!("job-{}", venue),
        venue_name: venue.to_string(),
        role: Role {
            title: "Runner".to_string(),
        },
        location: JobLocation {
            geo_location: GeoPoint {
                latitude: serde_json::Number::from_f64(51.5).unwrap(),
                longitude: serde_json::Number::from_f64(-0.12).unwrap(),
            },
            address: Address {
                city: "London".to_string(),
            },
        },
        pay_rate: PayRate { amount: 12.0 },
        shifts,
    }
}

/// Marketplace answering from per-endpoint queues; errors are status codes.
#[derive(Default)]
pub struct ScriptedMarketplace {
    pub logins: Mutex<VecDeque<Result<TokenPair, u16>>>,
    pub refreshes: Mutex<VecDeque<Result<TokenPair, u16>>>,
    pub revokes: Mutex<VecDeque<Result<(), u16>>>,
    pub offers: Mutex<VecDeque<Result<Vec<Job>, u16>>>,
}

impl ScriptedMarketplace {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next<T>(
    queue: &Mutex<VecDeque<Result<T, u16>>>,
    endpoint: &'static str,
) -> Result<T, MarketplaceError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or(Err(500))
        .map_err(|status| MarketplaceError::Status {
            endpoint,
            status,
            body: String::new(),
        })
}

#[async_trait]
impl Marketplace for ScriptedMarketplace {
    async fn login(&self, _credentials: &Credentials) -> Result<TokenPair, MarketplaceError> {
        next(&self.logins, "login")
    }

    async fn refresh(&self, _tokens: &TokenPair) -> Result<TokenPair, MarketplaceError> {
        next(&self.refreshes, "refresh")
    }

    async fn revoke(&self, _access_token: &str) -> Result<(), MarketplaceError> {
        next(&self.revokes, "revoke")
    }

    async fn offered_jobs(&self, _access_token: &str) -> Result<Vec<Job>, MarketplaceError> {
        next(&self.offers, "offered jobs")
    }
}

/// Maps service where every journey takes `commute_hours`.
pub struct FixedMaps {
    pub commute_hours: f64,
    directions_calls: AtomicUsize,
}

impl FixedMaps {
    pub fn new(commute_hours: f64) -> Self {
        Self {
            commute_hours,
            directions_calls: AtomicUsize::new(0),
        }
    }

    pub fn directions_calls(&self) -> usize {
        self.directions_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Maps for FixedMaps {
    async fn reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Vec<String>, MapsError> {
        Ok(vec!["venue-place".to_string()])
    }

    async fn directions(&self, request: &DirectionsRequest) -> Result<Vec<Route>, MapsError> {
        self.directions_calls.fetch_add(1, Ordering::SeqCst);
        let span = TimeDelta::seconds((self.commute_hours * 3600.0) as i64);
        let (depart, arrive) = match request.time {
            TravelTime::ArriveBy(at) => (at - span, at),
            TravelTime::DepartAt(at) => (at, at + span),
        };
        let value = |timestamp: i64| TimeValue {
            value: timestamp,
            time_zone: "Europe/London".to_string(),
        };
        Ok(vec![Route {
            legs: vec![Leg {
                departure_time: Some(value(depart.timestamp())),
                arrival_time: Some(value(arrive.timestamp())),
            }],
        }])
    }
}
