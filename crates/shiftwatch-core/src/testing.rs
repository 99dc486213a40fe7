//! Fakes and fixtures shared by the unit tests.

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
use shiftwatch_notify::{DeliveryReport, Notification, Notifier, NotifyError};

use crate::ShiftSummary;

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

pub fn geo(latitude: &str, longitude: &str) -> GeoPoint {
    GeoPoint {
        latitude: latitude.parse().unwrap(),
        longitude: longitude.parse().unwrap(),
    }
}

pub fn shift(id: &str, start: &str, end: &str, status: &str) -> Shift {
    Shift {
        id: id.to_string(),
        start_time: DateTime::parse_from_rfc3339(start).unwrap(),
        end_time: DateTime::parse_from_rfc3339(end).unwrap(),
        status: status.to_string(),
    }
}

pub fn job(venue: &str, pay: f64, shifts: Vec<Shift>) -> Job {
    Job {
        id: format!("job-{}", venue),
        venue_name: venue.to_string(),
        role: Role {
            title: "Barista".to_string(),
        },
        location: JobLocation {
            geo_location: geo("51.5", "-0.12"),
            address: Address {
                city: "London".to_string(),
            },
        },
        pay_rate: PayRate { amount: pay },
        shifts,
    }
}

pub fn job_with_shifts(ids: &[&str]) -> Job {
    job(
        "Venue A",
        10.0,
        ids.iter()
            .map(|id| {
                shift(
                    id,
                    "2024-03-02T09:00:00+00:00",
                    "2024-03-02T17:00:00+00:00",
                    "offered",
                )
            })
            .collect(),
    )
}

pub fn summary() -> ShiftSummary {
    ShiftSummary {
        duration: 4.0,
        total_pay: 40.0,
        date: "Fri 01 Mar".to_string(),
        start_time: "09:00AM".to_string(),
        end_time: "01:00PM".to_string(),
        role: "Barista@Venue A, London".to_string(),
        outbound_departure_time: "08:00AM".to_string(),
        return_arrival_time: "02:30PM".to_string(),
        total_commute_time: 2.5,
    }
}

/// Scripted status that stands for a response body that could not be read.
pub const GARBLED: u16 = 0;

fn status_error(endpoint: &'static str, status: u16) -> MarketplaceError {
    if status == GARBLED {
        return MarketplaceError::InvalidResponse(format!("{} answer unreadable", endpoint));
    }
    MarketplaceError::Status {
        endpoint,
        status,
        body: "scripted".to_string(),
    }
}

/// Marketplace that answers each endpoint from a queue of scripted responses.
///
/// Errors are given as HTTP status codes, or [`GARBLED`]. An exhausted queue
/// answers 500.
#[derive(Default)]
pub struct ScriptedMarketplace {
    logins: Mutex<VecDeque<Result<TokenPair, u16>>>,
    refreshes: Mutex<VecDeque<Result<TokenPair, u16>>>,
    revokes: Mutex<VecDeque<Result<(), u16>>>,
    offers: Mutex<VecDeque<Result<Vec<Job>, u16>>>,
    login_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    offered_tokens: Mutex<Vec<String>>,
    revoked_tokens: Mutex<Vec<String>>,
}

impl ScriptedMarketplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn login(self, response: Result<TokenPair, u16>) -> Self {
        self.logins.lock().unwrap().push_back(response);
        self
    }

    pub fn refresh(self, response: Result<TokenPair, u16>) -> Self {
        self.refreshes.lock().unwrap().push_back(response);
        self
    }

    pub fn revoke(self, response: Result<(), u16>) -> Self {
        self.revokes.lock().unwrap().push_back(response);
        self
    }

    pub fn offered(self, response: Result<Vec<Job>, u16>) -> Self {
        self.offers.lock().unwrap().push_back(response);
        self
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn offered_calls(&self) -> usize {
        self.offered_tokens.lock().unwrap().len()
    }

    /// Access tokens the offer listing was requested with, in order.
    pub fn offered_tokens(&self) -> Vec<String> {
        self.offered_tokens.lock().unwrap().clone()
    }

    pub fn revoked_tokens(&self) -> Vec<String> {
        self.revoked_tokens.lock().unwrap().clone()
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
        .map_err(|status| status_error(endpoint, status))
}

#[async_trait]
impl Marketplace for ScriptedMarketplace {
    async fn login(&self, _credentials: &Credentials) -> Result<TokenPair, MarketplaceError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.logins, "login")
    }

    async fn refresh(&self, _tokens: &TokenPair) -> Result<TokenPair, MarketplaceError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        next(&self.refreshes, "refresh")
    }

    async fn revoke(&self, access_token: &str) -> Result<(), MarketplaceError> {
        self.revoked_tokens
            .lock()
            .unwrap()
            .push(access_token.to_string());
        next(&self.revokes, "revoke")
    }

    async fn offered_jobs(&self, access_token: &str) -> Result<Vec<Job>, MarketplaceError> {
        self.offered_tokens
            .lock()
            .unwrap()
            .push(access_token.to_string());
        next(&self.offers, "offered jobs")
    }
}

/// Maps service whose routes take fixed journey times.
///
/// Outbound routes arrive exactly at the requested time and leave the given
/// number of hours earlier. Return routes leave at the requested time.
pub struct FakeMaps {
    places: Vec<String>,
    outbound_hours: Vec<f64>,
    return_hours: Vec<f64>,
    fail_directions: bool,
    geocode_calls: AtomicUsize,
    directions_calls: AtomicUsize,
}

impl FakeMaps {
    pub fn new() -> Self {
        Self {
            places: vec!["venue-place".to_string()],
            outbound_hours: vec![1.0],
            return_hours: vec![1.0],
            fail_directions: false,
            geocode_calls: AtomicUsize::new(0),
            directions_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_places(mut self, places: Vec<String>) -> Self {
        self.places = places;
        self
    }

    pub fn with_commutes(mut self, outbound_hours: Vec<f64>, return_hours: Vec<f64>) -> Self {
        self.outbound_hours = outbound_hours;
        self.return_hours = return_hours;
        self
    }

    pub fn failing_directions(mut self) -> Self {
        self.fail_directions = true;
        self
    }

    pub fn geocode_calls(&self) -> usize {
        self.geocode_calls.load(Ordering::SeqCst)
    }

    pub fn directions_calls(&self) -> usize {
        self.directions_calls.load(Ordering::SeqCst)
    }
}

fn time_value(timestamp: i64) -> TimeValue {
    TimeValue {
        value: timestamp,
        time_zone: "Europe/London".to_string(),
    }
}

#[async_trait]
impl Maps for FakeMaps {
    async fn reverse_geocode(
        &self,
        _latitude: f64,
        _longitude: f64,
    ) -> Result<Vec<String>, MapsError> {
        self.geocode_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.places.clone())
    }

    async fn directions(&self, request: &DirectionsRequest) -> Result<Vec<Route>, MapsError> {
        self.directions_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_directions {
            return Err(MapsError::Api {
                status: "OVER_QUERY_LIMIT".to_string(),
                message: None,
            });
        }

        let span = |hours: f64| TimeDelta::seconds((hours * 3600.0) as i64);
        let routes = match request.time {
            TravelTime::ArriveBy(at) => self
                .outbound_hours
                .iter()
                .map(|h| (at - span(*h), at))
                .collect::<Vec<_>>(),
            TravelTime::DepartAt(at) => self
                .return_hours
                .iter()
                .map(|h| (at, at + span(*h)))
                .collect(),
        };

        Ok(routes
            .into_iter()
            .map(|(depart, arrive)| Route {
                legs: vec![Leg {
                    departure_time: Some(time_value(depart.timestamp())),
                    arrival_time: Some(time_value(arrive.timestamp())),
                }],
            })
            .collect())
    }
}

/// Notifier that keeps every notification it is given.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<DeliveryReport, NotifyError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(DeliveryReport {
            delivered: 1,
            ..Default::default()
        })
    }
}
