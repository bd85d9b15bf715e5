//! # Listing Utilities
//!
//! Offset pagination, case-insensitive search and inclusive date ranges shared
//! by the admin worklists.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, Select,
    sea_query::{Expr, Func, LikeExpr},
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

use crate::error::{ApiError, validation_error};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

const LIKE_ESCAPE: char = '\\';

/// Validated page/limit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build from raw query values, applying defaults and bounds.
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Result<Self, ApiError> {
        let page = page.unwrap_or(DEFAULT_PAGE);
        let limit = limit.unwrap_or(DEFAULT_LIMIT);

        if page == 0 {
            return Err(validation_error(
                "Invalid pagination",
                json!({ "page": "must be at least 1" }),
            ));
        }
        if limit == 0 || limit > MAX_LIMIT {
            return Err(validation_error(
                "Invalid pagination",
                json!({ "limit": format!("must be between 1 and {MAX_LIMIT}") }),
            ));
        }

        Ok(Self { page, limit })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

/// One page of results plus totals.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// Number of records matching the filters
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    /// Total number of pages (`ceil(total / limit)`)
    pub pages: u64,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            data,
            total,
            page: request.page,
            limit: request.limit,
            pages: total.div_ceil(request.limit),
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            pages: self.pages,
        }
    }
}

/// Run `select` as one page, counting the full filtered set.
pub async fn paginate<E, C>(
    db: &C,
    select: Select<E>,
    request: PageRequest,
) -> Result<Page<E::Model>, DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync,
{
    let paginator = select.paginate(db, request.limit);
    let total = paginator.num_items().await?;
    let data = paginator.fetch_page(request.page - 1).await?;
    Ok(Page::new(data, total, request))
}

/// Half-open UTC interval built from calendar dates.
///
/// `from` starts at midnight; `to` covers its whole day, so the stored upper
/// bound is the following midnight (exclusive).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end_exclusive: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn from_dates(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self, ApiError> {
        if let (Some(from), Some(to)) = (from, to)
            && from > to
        {
            return Err(validation_error(
                "Invalid date range",
                json!({ "from": "must not be after 'to'" }),
            ));
        }

        let start = from.map(start_of_day);
        let end_exclusive = match to {
            Some(to) => Some(start_of_day(to.checked_add_days(Days::new(1)).ok_or_else(
                || validation_error("Invalid date range", json!({ "to": "date is out of range" })),
            )?)),
            None => None,
        };

        Ok(Self {
            start,
            end_exclusive,
        })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end_exclusive.is_none()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| instant >= start)
            && self.end_exclusive.is_none_or(|end| instant < end)
    }

    /// Condition restricting `column` to this range.
    pub fn condition<C: ColumnTrait>(&self, column: C) -> Condition {
        let mut condition = Condition::all();
        if let Some(start) = self.start {
            condition = condition.add(column.gte(as_column_time(start)));
        }
        if let Some(end) = self.end_exclusive {
            condition = condition.add(column.lt(as_column_time(end)));
        }
        condition
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Timestamps are stored with an explicit UTC offset; bind bounds the same way.
pub(crate) fn as_column_time(instant: DateTime<Utc>) -> DateTime<FixedOffset> {
    instant.fixed_offset()
}

/// Escape LIKE metacharacters so the term matches literally.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring match of `term` against any of `columns`.
///
/// Blank terms produce no condition.
pub fn search_condition<C>(term: Option<&str>, columns: &[C]) -> Option<Condition>
where
    C: ColumnTrait,
{
    let term = term.map(str::trim).filter(|t| !t.is_empty())?;
    let pattern = format!("%{}%", escape_like(&term.to_lowercase()));

    let condition = columns.iter().fold(Condition::any(), |condition, column| {
        condition.add(
            Expr::expr(Func::lower(Expr::col((column.entity_name(), *column))))
                .like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
        )
    });

    Some(condition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::TimeZone;

    #[test]
    fn page_request_defaults() {
        let request = PageRequest::new(None, None).unwrap();
        assert_eq!(request, PageRequest { page: 1, limit: 10 });
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn page_two_starts_after_first_page() {
        let request = PageRequest::new(Some(2), Some(10)).unwrap();
        assert_eq!(request.offset(), 10);
    }

    #[test]
    fn page_request_bounds() {
        assert!(PageRequest::new(Some(0), None).is_err());
        assert!(PageRequest::new(None, Some(0)).is_err());
        assert!(PageRequest::new(None, Some(101)).is_err());
        assert!(PageRequest::new(None, Some(100)).is_ok());
    }

    #[test]
    fn pages_is_ceiling_of_total_over_limit() {
        let request = PageRequest { page: 1, limit: 10 };
        assert_eq!(Page::<u8>::new(vec![], 0, request).pages, 0);
        assert_eq!(Page::<u8>::new(vec![], 10, request).pages, 1);
        assert_eq!(Page::<u8>::new(vec![], 11, request).pages, 2);
        assert_eq!(Page::<u8>::new(vec![], 25, request).pages, 3);
    }

    #[test]
    fn date_range_covers_whole_end_day() {
        let range = DateRange::from_dates(
            NaiveDate::from_ymd_opt(2025, 1, 1),
            NaiveDate::from_ymd_opt(2025, 1, 31),
        )
        .unwrap();

        assert_eq!(
            range.start,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            range.end_exclusive,
            Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap())
        );

        assert!(range.contains(Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 59).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()));
        assert!(!range.contains(Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap()));
    }

    #[test]
    fn date_range_rejects_inverted_bounds() {
        let err = DateRange::from_dates(
            NaiveDate::from_ymd_opt(2025, 2, 1),
            NaiveDate::from_ymd_opt(2025, 1, 1),
        )
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.details.unwrap()["from"], "must not be after 'to'");
    }

    #[test]
    fn date_range_past_the_calendar_end_names_the_field() {
        let err = DateRange::from_dates(None, Some(NaiveDate::MAX)).unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(&*err.code, "VALIDATION_FAILED");
        assert_eq!(err.details.unwrap()["to"], "date is out of range");
    }

    #[test]
    fn open_ended_ranges() {
        let range = DateRange::from_dates(None, None).unwrap();
        assert!(range.is_unbounded());

        let since = DateRange::from_dates(NaiveDate::from_ymd_opt(2025, 3, 1), None).unwrap();
        assert!(since.contains(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("dela cruz"), "dela cruz");
    }

    #[test]
    fn blank_search_is_ignored() {
        use crate::models::farmer::Column;
        assert!(search_condition(Some("   "), &[Column::FirstName]).is_none());
        assert!(search_condition(None, &[Column::FirstName]).is_none());
        assert!(search_condition(Some("juan"), &[Column::FirstName]).is_some());
    }
}
