//! # Event Repository

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    ModelTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::listing::{DateRange, as_column_time};
use crate::models::Event;
use crate::models::event::{self, ActiveModel as EventActiveModel, Model as EventModel};

pub const MAX_TITLE_LENGTH: usize = 200;

/// Fields of a new event
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Partial event update; `Some("")` clears description or location
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    /// `Some(None)` makes the event open-ended
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

fn validate_title(title: &str) -> Result<String, RepositoryError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(RepositoryError::validation_error("Event title is required"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(RepositoryError::validation_error(format!(
            "Event title cannot exceed {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_span(
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
) -> Result<(), RepositoryError> {
    match ends_at {
        Some(ends_at) if ends_at < starts_at => Err(RepositoryError::validation_error(
            "Event cannot end before it starts",
        )),
        _ => Ok(()),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Repository for Event database operations
pub struct EventRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> EventRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        request: NewEvent,
        created_by: Option<Uuid>,
    ) -> Result<EventModel, RepositoryError> {
        let title = validate_title(&request.title)?;
        validate_span(request.starts_at, request.ends_at)?;

        let now = Utc::now();
        EventActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title),
            description: Set(optional(request.description)),
            location: Set(optional(request.location)),
            starts_at: Set(as_column_time(request.starts_at)),
            ends_at: Set(request.ends_at.map(as_column_time)),
            created_by: Set(created_by),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(self.db)
        .await
        .map_err(RepositoryError::database_error)
    }

    pub async fn get(&self, id: Uuid) -> Result<EventModel, RepositoryError> {
        Event::find_by_id(id)
            .one(self.db)
            .await
            .map_err(RepositoryError::database_error)?
            .ok_or_else(|| RepositoryError::not_found("event"))
    }

    pub async fn update(&self, id: Uuid, update: EventUpdate) -> Result<EventModel, RepositoryError> {
        let existing = self.get(id).await?;

        let starts_at = update
            .starts_at
            .unwrap_or_else(|| existing.starts_at.with_timezone(&Utc));
        let ends_at = match update.ends_at {
            Some(ends_at) => ends_at,
            None => existing.ends_at.map(|e| e.with_timezone(&Utc)),
        };
        validate_span(starts_at, ends_at)?;

        let mut active = existing.into_active_model();
        if let Some(title) = update.title {
            active.title = Set(validate_title(&title)?);
        }
        if let Some(description) = update.description {
            active.description = Set(optional(Some(description)));
        }
        if let Some(location) = update.location {
            active.location = Set(optional(Some(location)));
        }
        active.starts_at = Set(as_column_time(starts_at));
        active.ends_at = Set(ends_at.map(as_column_time));
        active.updated_at = Set(Utc::now().into());

        active
            .update(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let event = self.get(id).await?;
        event
            .delete(self.db)
            .await
            .map_err(RepositoryError::database_error)?;
        Ok(())
    }

    /// Events overlapping `range`, ordered by start.
    ///
    /// An event without `ends_at` occupies only its start instant.
    pub async fn list_overlapping(&self, range: &DateRange) -> Result<Vec<EventModel>, RepositoryError> {
        let mut condition = Condition::all();
        if let Some(end) = range.end_exclusive {
            condition = condition.add(event::Column::StartsAt.lt(as_column_time(end)));
        }
        if let Some(start) = range.start {
            let start = as_column_time(start);
            condition = condition.add(
                Condition::any()
                    .add(event::Column::EndsAt.gte(start))
                    .add(
                        Condition::all()
                            .add(event::Column::EndsAt.is_null())
                            .add(event::Column::StartsAt.gte(start)),
                    ),
            );
        }

        Event::find()
            .filter(condition)
            .order_by_asc(event::Column::StartsAt)
            .order_by_asc(event::Column::Title)
            .all(self.db)
            .await
            .map_err(RepositoryError::database_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_db;
    use chrono::{NaiveDate, TimeZone};

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn event(title: &str, starts_at: DateTime<Utc>, ends_at: Option<DateTime<Utc>>) -> NewEvent {
        NewEvent {
            title: title.to_string(),
            description: None,
            location: Some("Municipal Hall".to_string()),
            starts_at,
            ends_at,
        }
    }

    #[tokio::test]
    async fn rejects_end_before_start_and_blank_title() {
        let db = test_db().await;
        let repo = EventRepository::new(&db);

        let err = repo
            .create(event("Seminar", at(2025, 3, 2, 9), Some(at(2025, 3, 1, 9))), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));

        let err = repo
            .create(event("  ", at(2025, 3, 2, 9), None), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn overlapping_events_in_start_order() {
        let db = test_db().await;
        let repo = EventRepository::new(&db);

        repo.create(event("Late", at(2025, 3, 20, 9), None), None)
            .await
            .unwrap();
        repo.create(
            event("Spanning", at(2025, 2, 27, 8), Some(at(2025, 3, 2, 17))),
            None,
        )
        .await
        .unwrap();
        repo.create(event("Before", at(2025, 2, 10, 9), None), None)
            .await
            .unwrap();
        repo.create(event("After", at(2025, 4, 1, 0), None), None)
            .await
            .unwrap();

        let march = DateRange::from_dates(
            NaiveDate::from_ymd_opt(2025, 3, 1),
            NaiveDate::from_ymd_opt(2025, 3, 31),
        )
        .unwrap();

        let titles: Vec<String> = repo
            .list_overlapping(&march)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.title)
            .collect();
        assert_eq!(titles, vec!["Spanning".to_string(), "Late".to_string()]);
    }

    #[tokio::test]
    async fn update_validates_combined_span() {
        let db = test_db().await;
        let repo = EventRepository::new(&db);
        let created = repo
            .create(event("Training", at(2025, 5, 5, 8), Some(at(2025, 5, 6, 17))), None)
            .await
            .unwrap();

        let err = repo
            .update(
                created.id,
                EventUpdate {
                    starts_at: Some(at(2025, 5, 7, 8)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Validation { .. }));

        let updated = repo
            .update(
                created.id,
                EventUpdate {
                    title: Some("Rice training".to_string()),
                    location: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.title, "Rice training");
        assert_eq!(updated.location, None);
        assert!(updated.ends_at.is_some());

        let open_ended = repo
            .update(
                created.id,
                EventUpdate {
                    ends_at: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(open_ended.ends_at, None);

        repo.delete(created.id).await.unwrap();
        assert!(matches!(
            repo.get(created.id).await,
            Err(RepositoryError::NotFound { entity: "event" })
        ));
    }
}
