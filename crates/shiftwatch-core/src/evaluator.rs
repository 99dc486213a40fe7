//! Filtering and enrichment of offered shifts.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use shiftwatch_maps::{DirectionsRequest, Maps, Route, TimeValue, TravelTime};
use shiftwatch_marketplace::{Job, Shift};
use tracing::{debug, info};

use crate::places::Location;
use crate::{CoreError, FilterConfig, Session};

const DATE_FORMAT: &str = "%a %d %b";
const TIME_FORMAT: &str = "%I:%M%p";
const SECONDS_PER_DAY: i64 = 86_400;

/// A workable shift as reported to subscribers and kept in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftSummary {
    /// Length of the shift in hours.
    pub duration: f64,
    pub total_pay: f64,
    pub date: String,
    #[serde(rename = "starttime")]
    pub start_time: String,
    #[serde(rename = "endtime")]
    pub end_time: String,
    /// `"{role}@{venue}, {city}"`.
    pub role: String,
    pub outbound_departure_time: String,
    pub return_arrival_time: String,
    /// Shortest outbound plus shortest return journey, in hours.
    pub total_commute_time: f64,
}

/// Hours from `from` to `to`.
fn hours_between<A: chrono::TimeZone, B: chrono::TimeZone>(
    from: &DateTime<A>,
    to: &DateTime<B>,
) -> f64 {
    to.clone().signed_duration_since(from.clone()).num_seconds() as f64 / 3600.0
}

/// Whole days from `now` until `start`, rounded down.
fn days_until(start: &DateTime<FixedOffset>, now: DateTime<Utc>) -> i64 {
    start
        .signed_duration_since(now)
        .num_seconds()
        .div_euclid(SECONDS_PER_DAY)
}

/// The smallest value, keeping the earliest on ties.
fn first_min<T>(items: impl IntoIterator<Item = (f64, T)>) -> Option<(f64, T)> {
    let mut best: Option<(f64, T)> = None;
    for (hours, item) in items {
        if best.as_ref().is_none_or(|(b, _)| hours < *b) {
            best = Some((hours, item));
        }
    }
    best
}

/// Time of day of a directions timestamp, local to the zone it was reported in.
fn format_time_value(value: &TimeValue, fallback: Tz) -> Result<String, CoreError> {
    let tz = value.time_zone.parse::<Tz>().unwrap_or(fallback);
    Ok(value
        .instant()?
        .with_timezone(&tz)
        .format(TIME_FORMAT)
        .to_string())
}

/// Shortest outbound journey: hours between each route's departure and `start`.
fn shortest_outbound(
    routes: &[Route],
    start: &DateTime<FixedOffset>,
) -> Result<Option<(f64, TimeValue)>, CoreError> {
    let mut commutes = Vec::with_capacity(routes.len());
    for route in routes {
        let departure = route.departure()?;
        commutes.push((hours_between(&departure.instant()?, start), departure.clone()));
    }
    Ok(first_min(commutes))
}

/// Shortest return journey: hours between `end` and each route's arrival.
fn shortest_return(
    routes: &[Route],
    end: &DateTime<FixedOffset>,
) -> Result<Option<(f64, TimeValue)>, CoreError> {
    let mut commutes = Vec::with_capacity(routes.len());
    for route in routes {
        let arrival = route.arrival()?;
        commutes.push((hours_between(end, &arrival.instant()?), arrival.clone()));
    }
    Ok(first_min(commutes))
}

/// Fields of a summary known before any directions are fetched.
struct Draft {
    duration: f64,
    total_pay: f64,
    date: String,
    start_time: String,
    end_time: String,
    role: String,
}

impl Draft {
    fn new(job: &Job, shift: &Shift) -> Self {
        let duration = hours_between(&shift.start_time, &shift.end_time);
        Self {
            duration,
            total_pay: duration * job.pay_rate.amount,
            date: shift.start_time.format(DATE_FORMAT).to_string(),
            start_time: shift.start_time.format(TIME_FORMAT).to_string(),
            end_time: shift.end_time.format(TIME_FORMAT).to_string(),
            role: job.label(),
        }
    }

    fn rejection(&self, stamp: &str, code: &str, shift_id: &str, departure: &str) -> String {
        format!(
            "{}: R {} {} {}, {} {}>{}-{}>",
            stamp, code, shift_id, self.role, self.date, departure, self.start_time, self.end_time
        )
    }
}

impl Session {
    /// Evaluate `listing` and return the shifts that became workable in this call.
    ///
    /// Every shift id is evaluated at most once over the life of the session.
    /// Rejections on commute time are appended to the session log. A
    /// directions or geocoding failure aborts the evaluation.
    pub async fn evaluate(
        &mut self,
        listing: &[Job],
        filter: &FilterConfig,
        maps: &dyn Maps,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<String, ShiftSummary>, CoreError> {
        let stamp = now.with_timezone(&filter.timezone).to_rfc3339();
        let mut accepted = BTreeMap::new();
        let mut parsed = 0usize;

        for job in listing {
            for shift in &job.shifts {
                if !self.ledger.mark_seen(&shift.id) {
                    continue;
                }
                if !shift.is_offered() {
                    debug!(shift = %shift.id, status = %shift.status, "skipping shift not offered");
                    continue;
                }
                if days_until(&shift.start_time, now) > filter.max_days_from_now {
                    debug!(shift = %shift.id, "skipping shift beyond horizon");
                    continue;
                }
                if filter.is_blacklisted(&job.venue_name) {
                    debug!(shift = %shift.id, venue = %job.venue_name, "skipping blacklisted venue");
                    continue;
                }
                parsed += 1;

                if let Some(summary) = self.commute(job, shift, filter, maps, &stamp).await? {
                    self.ledger.accept(&shift.id, summary.clone());
                    accepted.insert(shift.id.clone(), summary);
                }
            }
        }

        info!(
            parsed,
            workable = accepted.len(),
            "parsed shifts"
        );
        Ok(accepted)
    }

    /// Query both journeys for one shift. `None` when either is too long.
    async fn commute(
        &mut self,
        job: &Job,
        shift: &Shift,
        filter: &FilterConfig,
        maps: &dyn Maps,
        stamp: &str,
    ) -> Result<Option<ShiftSummary>, CoreError> {
        let draft = Draft::new(job, shift);
        let home = self.places.resolve(Location::Home, maps).await?;
        let venue = self
            .places
            .resolve(Location::Point(&job.location.geo_location), maps)
            .await?;

        let outbound_routes = maps
            .directions(&DirectionsRequest {
                origin: home.clone(),
                destination: venue.clone(),
                time: TravelTime::ArriveBy(shift.start_time.with_timezone(&Utc)),
            })
            .await?;
        let outbound = shortest_outbound(&outbound_routes, &shift.start_time)?;
        let departure = match &outbound {
            Some((_, value)) => format_time_value(value, filter.timezone)?,
            None => "--".to_string(),
        };

        let outbound_hours = match outbound {
            Some((hours, _)) if hours <= filter.max_outbound_hours => hours,
            _ => {
                debug!(shift = %shift.id, "outbound commute too long");
                self.log
                    .push(draft.rejection(stamp, "OTL", &shift.id, &departure));
                return Ok(None);
            }
        };

        let return_routes = maps
            .directions(&DirectionsRequest {
                origin: venue,
                destination: home,
                time: TravelTime::DepartAt(shift.end_time.with_timezone(&Utc)),
            })
            .await?;
        let inbound = shortest_return(&return_routes, &shift.end_time)?;
        let arrival = match &inbound {
            Some((_, value)) => format_time_value(value, filter.timezone)?,
            None => "--".to_string(),
        };

        let return_hours = match inbound {
            Some((hours, _)) if hours <= filter.max_return_hours => hours,
            _ => {
                debug!(shift = %shift.id, "return commute too long");
                let mut record = draft.rejection(stamp, "RTL", &shift.id, &departure);
                record.push_str(&arrival);
                self.log.push(record);
                return Ok(None);
            }
        };

        Ok(Some(ShiftSummary {
            duration: draft.duration,
            total_pay: draft.total_pay,
            date: draft.date,
            start_time: draft.start_time,
            end_time: draft.end_time,
            role: draft.role,
            outbound_departure_time: departure,
            return_arrival_time: arrival,
            total_commute_time: outbound_hours + return_hours,
        }))
    }
}
