//! Seat and category edits.
//!
//! Every operation works on a borrowed snapshot and returns a new one with
//! the cached `seat_count` of each category already recomputed, so callers
//! never observe a half-applied edit.

use std::collections::HashMap;
use tracing::debug;

use super::model::{ActorData, HemicicloCategory, HemicicloData, HemicicloSeat};
use crate::errors::{MappingError, MappingResult};

/// Partial update for a category. `None` leaves the field untouched; an empty
/// `short_name` clears it.
#[derive(Clone, Debug, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub color: Option<String>,
    pub order: Option<u32>,
}

impl HemicicloData {
    /// Puts `seat_id` in `category_id`. Assigning the category a seat already
    /// has clears it instead. Actor data is left alone.
    pub fn assign_seat(&self, seat_id: &str, category_id: &str) -> MappingResult<HemicicloData> {
        if self.get_category(category_id).is_none() {
            return Err(MappingError::CategoryNotFound(category_id.to_string()));
        }

        let mut next = self.clone();
        let seat = seat_mut(&mut next, seat_id)?;
        if seat.category_id.as_deref() == Some(category_id) {
            debug!("Seat {} toggled off {}", seat_id, category_id);
            seat.category_id = None;
        } else {
            debug!(
                "Seat {} moved from {:?} to {}",
                seat_id, seat.category_id, category_id
            );
            seat.category_id = Some(category_id.to_string());
        }

        recompute_seat_counts(&mut next);
        Ok(next)
    }

    /// Removes both the category and the actor from a seat.
    pub fn clear_seat(&self, seat_id: &str) -> MappingResult<HemicicloData> {
        let mut next = self.clone();
        let seat = seat_mut(&mut next, seat_id)?;
        seat.category_id = None;
        seat.actor_data = None;

        recompute_seat_counts(&mut next);
        Ok(next)
    }

    /// Sets the actor shown on a seat without touching its category.
    pub fn assign_actor(&self, seat_id: &str, actor: ActorData) -> MappingResult<HemicicloData> {
        if actor.name.trim().is_empty() {
            return Err(MappingError::Validation(
                "actor name cannot be empty".to_string(),
            ));
        }

        let mut next = self.clone();
        seat_mut(&mut next, seat_id)?.actor_data = Some(actor);
        recompute_seat_counts(&mut next);
        Ok(next)
    }

    /// Appends a category. An `order` of 0 means "after the last one".
    pub fn add_category(&self, category: HemicicloCategory) -> MappingResult<HemicicloData> {
        if category.id.trim().is_empty() {
            return Err(MappingError::Validation(
                "category id cannot be empty".to_string(),
            ));
        }
        if category.name.trim().is_empty() {
            return Err(MappingError::Validation(
                "category name cannot be empty".to_string(),
            ));
        }
        if self.get_category(&category.id).is_some() {
            return Err(MappingError::DuplicateCategory(category.id));
        }

        let mut next = self.clone();
        let mut category = category;
        if category.order == 0 {
            category.order = next.categories.iter().map(|c| c.order).max().unwrap_or(0) + 1;
        }
        next.categories.push(category);

        recompute_seat_counts(&mut next);
        Ok(next)
    }

    pub fn update_category(
        &self,
        category_id: &str,
        patch: CategoryPatch,
    ) -> MappingResult<HemicicloData> {
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(MappingError::Validation(
                    "category name cannot be empty".to_string(),
                ));
            }
        }

        let mut next = self.clone();
        let category = next
            .categories
            .iter_mut()
            .find(|c| c.id == category_id)
            .ok_or_else(|| MappingError::CategoryNotFound(category_id.to_string()))?;

        if let Some(name) = patch.name {
            category.name = name;
        }
        if let Some(short_name) = patch.short_name {
            category.short_name = if short_name.trim().is_empty() {
                None
            } else {
                Some(short_name)
            };
        }
        if let Some(color) = patch.color {
            category.color = color;
        }
        if let Some(order) = patch.order {
            category.order = order;
        }

        recompute_seat_counts(&mut next);
        Ok(next)
    }

    /// Deletes a category, clearing it from every seat that referenced it, and
    /// renumbers the remaining categories `1..=n` following their order.
    pub fn remove_category(&self, category_id: &str) -> MappingResult<HemicicloData> {
        if self.get_category(category_id).is_none() {
            return Err(MappingError::CategoryNotFound(category_id.to_string()));
        }

        let mut next = self.clone();
        next.categories.retain(|c| c.id != category_id);

        let mut cleared = 0;
        for seat in next
            .seats
            .iter_mut()
            .filter(|s| s.category_id.as_deref() == Some(category_id))
        {
            seat.category_id = None;
            cleared += 1;
        }
        debug!(
            "Removed category {} and cleared {} seats",
            category_id, cleared
        );

        let mut ranked: Vec<usize> = (0..next.categories.len()).collect();
        ranked.sort_by_key(|&i| next.categories[i].order);
        for (rank, index) in ranked.into_iter().enumerate() {
            next.categories[index].order = rank as u32 + 1;
        }

        recompute_seat_counts(&mut next);
        Ok(next)
    }
}

/// Refreshes every category's cached `seat_count` from the seats.
pub fn recompute_seat_counts(data: &mut HemicicloData) {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for category_id in data.seats.iter().filter_map(|s| s.category_id.as_ref()) {
        *counts.entry(category_id.clone()).or_insert(0) += 1;
    }

    for category in &mut data.categories {
        category.seat_count = Some(counts.get(&category.id).copied().unwrap_or(0));
    }
}

fn seat_mut<'a>(
    data: &'a mut HemicicloData,
    seat_id: &str,
) -> MappingResult<&'a mut HemicicloSeat> {
    data.seats
        .iter_mut()
        .find(|s| s.id == seat_id)
        .ok_or_else(|| MappingError::SeatNotFound(seat_id.to_string()))
}
