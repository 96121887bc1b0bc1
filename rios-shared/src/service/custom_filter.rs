/// Saved filters

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::entity::EntityService;
use super::ServiceError;
use crate::db::{Repository, StoreError};
use crate::models::custom_filter::{CreateCustomFilter, CustomFilter, FilterEntity};
use crate::models::entity::Entity;

pub type CustomFilterService = EntityService<CustomFilter>;

impl EntityService<CustomFilter> {
    /// Filters, newest first, optionally for one screen
    pub async fn list_for(
        &self,
        entity: Option<FilterEntity>,
    ) -> Result<Vec<CustomFilter>, ServiceError> {
        Ok(self.store().list_filters(entity).await?)
    }

    /// Saves a filter, or returns the one already saved under the same
    /// `(name, entity)`
    ///
    /// The flag is true when a new row was written.
    pub async fn create_or_get(
        &self,
        input: CreateCustomFilter,
    ) -> Result<(CustomFilter, bool), ServiceError> {
        let row = CustomFilter::build(input, Uuid::new_v4(), Utc::now())?;
        let entity: FilterEntity = row.entity.parse()?;

        if let Some(existing) = self.store().find_filter(&row.name, entity).await? {
            debug!(filter_id = %existing.id, "Filter already saved");
            return Ok((existing, false));
        }

        match Repository::<CustomFilter>::insert(self.store(), &row).await {
            Ok(created) => {
                info!(filter_id = %created.id, entity = %entity, "Filter saved");
                Ok((created, true))
            }
            // Saved concurrently between the lookup and the insert
            Err(StoreError::UniqueViolation { .. }) => self
                .store()
                .find_filter(&row.name, entity)
                .await?
                .map(|existing| (existing, false))
                .ok_or_else(|| ServiceError::Internal("Error interno del servidor".to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
