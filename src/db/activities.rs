//! Database queries for activities and their attendees.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, SqlErr,
};

use crate::entity::activity::{self as activity, ActiveModel, Entity as ActivityEntity};
use crate::entity::activity_attendee::{self as attendee, Entity as AttendeeEntity};
use crate::entity::category::Entity as CategoryEntity;
use crate::entity::user::{self as user, Entity as UserEntity};
use crate::error::{AppError, AppResult};
use crate::models::{
    ActivityEntry, ActivityFilter, ActivityScope, Category, NewActivity, PAGE_SIZE,
    ReservationOutcome, User,
};

use super::DbPool;

impl DbPool {
    /// Insert a new activity proposed by `proposer_id`.
    ///
    /// Rejects an end time that does not follow the start time with
    /// `AppError::InvalidInput`. Past start times are accepted here.
    pub async fn insert_activity(
        &self,
        proposer_id: i32,
        new_activity: &NewActivity,
    ) -> AppResult<activity::Model> {
        let errors = new_activity.check_window();
        if !errors.is_empty() {
            return Err(AppError::InvalidInput(errors.to_string()));
        }

        let model = ActiveModel {
            title: Set(new_activity.title.clone()),
            description: Set(new_activity.description.clone()),
            location_city: Set(new_activity.location_city.clone()),
            start_time: Set(new_activity.start_time),
            end_time: Set(new_activity.end_time),
            proposer_id: Set(proposer_id),
            category_id: Set(new_activity.category_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let result = model
            .insert(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to insert activity: {}", e)))?;

        Ok(result)
    }

    /// Get an activity with its proposer, category and attendance count.
    pub async fn get_activity(&self, id: i32) -> AppResult<Option<ActivityEntry>> {
        let model = ActivityEntity::find_by_id(id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get activity: {}", e)))?;

        let Some(model) = model else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![model]).await?.pop())
    }

    /// List activities matching `filter`, one page at a time.
    ///
    /// Returns the page and the total number of matches.
    pub async fn list_activities(
        &self,
        filter: &ActivityFilter,
    ) -> AppResult<(Vec<ActivityEntry>, u64)> {
        let select = apply_filter(ActivityEntity::find(), filter);

        // Count total before pagination
        let total = select
            .clone()
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count activities: {}", e)))?;

        let models = select
            .order_by_asc(activity::Column::StartTime)
            .order_by_asc(activity::Column::Id)
            .offset(filter.offset())
            .limit(PAGE_SIZE)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list activities: {}", e)))?;

        Ok((self.hydrate(models).await?, total))
    }

    /// The next `limit` activities starting after `now`.
    pub async fn upcoming_activities(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> AppResult<Vec<ActivityEntry>> {
        let models = ActivityEntity::find()
            .filter(activity::Column::StartTime.gte(now))
            .order_by_asc(activity::Column::StartTime)
            .order_by_asc(activity::Column::Id)
            .limit(limit)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list activities: {}", e)))?;

        self.hydrate(models).await
    }

    /// Reserve a place for `user_id`. Reserving twice is a no-op.
    pub async fn reserve_activity(
        &self,
        activity_id: i32,
        user_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<ReservationOutcome> {
        let activity = ActivityEntity::find_by_id(activity_id)
            .one(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to get activity: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Activity {}", activity_id)))?;

        if activity.start_time <= now {
            return Ok(ReservationOutcome::Closed);
        }
        if self.is_attending(activity_id, user_id).await? {
            return Ok(ReservationOutcome::AlreadyReserved);
        }

        let model = attendee::ActiveModel {
            activity_id: Set(activity_id),
            user_id: Set(user_id),
            joined_at: Set(now),
        };

        match AttendeeEntity::insert(model).exec(self.connection()).await {
            Ok(_) => Ok(ReservationOutcome::Reserved),
            // A concurrent request inserted the same row first
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(ReservationOutcome::AlreadyReserved)
            }
            Err(e) => Err(AppError::Database(format!(
                "Failed to reserve activity: {}",
                e
            ))),
        }
    }

    /// Cancel a reservation. Returns `false` when there was none.
    pub async fn unreserve_activity(&self, activity_id: i32, user_id: i32) -> AppResult<bool> {
        let result = AttendeeEntity::delete_many()
            .filter(attendee::Column::ActivityId.eq(activity_id))
            .filter(attendee::Column::UserId.eq(user_id))
            .exec(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to cancel reservation: {}", e)))?;

        Ok(result.rows_affected > 0)
    }

    /// Whether `user_id` holds a reservation for the activity.
    pub async fn is_attending(&self, activity_id: i32, user_id: i32) -> AppResult<bool> {
        let count = AttendeeEntity::find()
            .filter(attendee::Column::ActivityId.eq(activity_id))
            .filter(attendee::Column::UserId.eq(user_id))
            .count(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to check reservation: {}", e)))?;

        Ok(count > 0)
    }

    /// Attendees in reservation order.
    pub async fn list_attendees(&self, activity_id: i32) -> AppResult<Vec<User>> {
        let rows = AttendeeEntity::find()
            .filter(attendee::Column::ActivityId.eq(activity_id))
            .order_by_asc(attendee::Column::JoinedAt)
            .find_also_related(UserEntity)
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to list attendees: {}", e)))?;

        Ok(rows
            .into_iter()
            .filter_map(|(_, user)| user.map(User::from))
            .collect())
    }

    /// Join proposers, categories and attendance counts onto activity rows,
    /// keeping the input order.
    async fn hydrate(&self, models: Vec<activity::Model>) -> AppResult<Vec<ActivityEntry>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }

        let activity_ids: Vec<i32> = models.iter().map(|m| m.id).collect();
        let proposer_ids: Vec<i32> = models.iter().map(|m| m.proposer_id).collect();
        let category_ids: Vec<i32> = models.iter().filter_map(|m| m.category_id).collect();

        let proposers: HashMap<i32, User> = UserEntity::find()
            .filter(user::Column::Id.is_in(proposer_ids))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to load proposers: {}", e)))?
            .into_iter()
            .map(|m| (m.id, User::from(m)))
            .collect();

        let categories: HashMap<i32, Category> = if category_ids.is_empty() {
            HashMap::new()
        } else {
            CategoryEntity::find()
                .filter(crate::entity::category::Column::Id.is_in(category_ids))
                .all(self.connection())
                .await
                .map_err(|e| AppError::Database(format!("Failed to load categories: {}", e)))?
                .into_iter()
                .map(|m| (m.id, Category::from(m)))
                .collect()
        };

        let mut counts: HashMap<i32, usize> = HashMap::new();
        let attendances = AttendeeEntity::find()
            .filter(attendee::Column::ActivityId.is_in(activity_ids))
            .all(self.connection())
            .await
            .map_err(|e| AppError::Database(format!("Failed to count attendees: {}", e)))?;
        for row in attendances {
            *counts.entry(row.activity_id).or_default() += 1;
        }

        models
            .into_iter()
            .map(|m| {
                let proposer = proposers.get(&m.proposer_id).cloned().ok_or_else(|| {
                    AppError::Database(format!("Activity {} has no proposer", m.id))
                })?;
                let category = m.category_id.and_then(|id| categories.get(&id).cloned());
                let count = counts.get(&m.id).copied().unwrap_or(0);
                Ok(ActivityEntry::new(m, proposer, category, count))
            })
            .collect()
    }
}

/// Apply catalog filters to an activity query.
fn apply_filter(mut select: Select<ActivityEntity>, filter: &ActivityFilter) -> Select<ActivityEntity> {
    if let Some(ref city) = filter.city {
        select = select.filter(activity::Column::LocationCity.contains(city));
    }

    if let Some(category_id) = filter.category_id {
        select = select.filter(activity::Column::CategoryId.eq(category_id));
    }

    if let Some(ref search) = filter.search {
        select = select.filter(
            Condition::any()
                .add(activity::Column::Title.contains(search))
                .add(activity::Column::Description.contains(search)),
        );
    }

    if let Some(starts_after) = filter.starts_after {
        select = select.filter(activity::Column::StartTime.gte(starts_after));
    }

    match filter.scope {
        Some((ActivityScope::Proposed, user_id)) => {
            select = select.filter(activity::Column::ProposerId.eq(user_id));
        }
        Some((ActivityScope::Attending, user_id)) => {
            select = select.filter(
                activity::Column::Id.in_subquery(
                    Query::select()
                        .column(attendee::Column::ActivityId)
                        .from(AttendeeEntity)
                        .and_where(attendee::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            );
        }
        None => {}
    }

    select
}
