//! Month calendar bucketing for events.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate, Utc};
use serde_json::json;

use crate::error::{ApiError, validation_error};
use crate::listing::DateRange;
use crate::models::event::Model as EventModel;

/// First and last day of a month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self, ApiError> {
        if !(1..=12).contains(&month) {
            return Err(validation_error(
                "Invalid month",
                json!({ "month": "must be between 1 and 12" }),
            ));
        }

        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
            validation_error("Invalid year", json!({ "year": "out of range" }))
        })?;
        let last = first
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(|| validation_error("Invalid year", json!({ "year": "out of range" })))?;

        Ok(Self { first, last })
    }

    pub fn date_range(&self) -> Result<DateRange, ApiError> {
        DateRange::from_dates(Some(self.first), Some(self.last))
    }
}

/// Events falling on one calendar day
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub events: Vec<EventModel>,
}

/// Group events by the UTC days they cover inside `month`.
///
/// Multi-day events land in every covered day; days without events are omitted.
pub fn bucket_by_day(month: Month, events: &[EventModel]) -> Vec<DayBucket> {
    let mut days: BTreeMap<NaiveDate, Vec<EventModel>> = BTreeMap::new();

    for event in events {
        let start = event.starts_at.with_timezone(&Utc).date_naive();
        let end = event
            .ends_at
            .map(|ends_at| ends_at.with_timezone(&Utc).date_naive())
            .filter(|end| *end >= start)
            .unwrap_or(start);

        let mut day = start.max(month.first);
        let last = end.min(month.last);
        while day <= last {
            days.entry(day).or_default().push(event.clone());
            match day.checked_add_days(Days::new(1)) {
                Some(next) => day = next,
                None => break,
            }
        }
    }

    days.into_iter()
        .map(|(date, mut events)| {
            events.sort_by(|a, b| a.starts_at.cmp(&b.starts_at).then_with(|| a.title.cmp(&b.title)));
            DayBucket { date, events }
        })
        .collect()
}

/// Number of days in the month (for clients drawing an empty grid)
pub fn days_in_month(month: Month) -> u32 {
    month.last.day()
}
