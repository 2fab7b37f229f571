//! Interaction state for a rendered hemicycle.
//!
//! The view owns its snapshot and the transient hover/selection state; clicks
//! are turned into assignment operations here so a renderer stays stateless.

use tracing::debug;

use super::geometry::{position_for, SeatPosition};
use super::model::{HemicicloCategory, HemicicloData, HemicicloLayout, HemicicloSeat};
use crate::errors::{MappingError, MappingResult};

#[derive(Clone, Debug, PartialEq)]
pub enum ClickEffect {
    /// The active category was applied to (or toggled off) the seat.
    Assigned { seat_id: String },
    Selected { seat_id: String },
    Deselected,
}

/// Details shown while a seat is hovered.
#[derive(Clone, Debug, PartialEq)]
pub struct SeatTooltip<'a> {
    pub seat: &'a HemicicloSeat,
    pub category: Option<&'a HemicicloCategory>,
    pub position: SeatPosition,
}

#[derive(Clone, Debug)]
pub struct HemicicloView {
    layout: HemicicloLayout,
    data: HemicicloData,
    hovered_seat: Option<String>,
    selected_seat: Option<String>,
    active_category: Option<String>,
}

impl HemicicloView {
    pub fn new(layout: HemicicloLayout, data: HemicicloData) -> Self {
        Self {
            layout,
            data,
            hovered_seat: None,
            selected_seat: None,
            active_category: None,
        }
    }

    pub fn layout(&self) -> &HemicicloLayout {
        &self.layout
    }

    pub fn data(&self) -> &HemicicloData {
        &self.data
    }

    pub fn into_data(self) -> HemicicloData {
        self.data
    }

    pub fn selected_seat(&self) -> Option<&HemicicloSeat> {
        self.selected_seat
            .as_deref()
            .and_then(|id| self.data.get_seat(id))
    }

    pub fn active_category(&self) -> Option<&HemicicloCategory> {
        self.active_category
            .as_deref()
            .and_then(|id| self.data.get_category(id))
    }

    /// Chooses the category clicks paint with; `None` switches to selecting.
    pub fn set_active_category(&mut self, category_id: Option<&str>) -> MappingResult<()> {
        if let Some(id) = category_id {
            if self.data.get_category(id).is_none() {
                return Err(MappingError::CategoryNotFound(id.to_string()));
            }
        }
        self.active_category = category_id.map(str::to_string);
        Ok(())
    }

    pub fn hover(&mut self, seat_id: Option<&str>) {
        self.hovered_seat = seat_id
            .filter(|id| self.data.get_seat(id).is_some())
            .map(str::to_string);
    }

    pub fn tooltip(&self) -> Option<SeatTooltip<'_>> {
        let id = self.hovered_seat.as_deref()?;
        let index = self.data.seats.iter().position(|s| s.id == id)?;
        let seat = &self.data.seats[index];
        Some(SeatTooltip {
            seat,
            category: seat
                .category_id
                .as_deref()
                .and_then(|c| self.data.get_category(c)),
            position: position_for(index as u32, &self.layout)?,
        })
    }

    pub fn click_seat(&mut self, seat_id: &str) -> MappingResult<ClickEffect> {
        if self.data.get_seat(seat_id).is_none() {
            return Err(MappingError::SeatNotFound(seat_id.to_string()));
        }

        if let Some(category_id) = self.active_category.as_deref() {
            self.data = self.data.assign_seat(seat_id, category_id)?;
            debug!("Click assigned {} on {}", category_id, seat_id);
            return Ok(ClickEffect::Assigned {
                seat_id: seat_id.to_string(),
            });
        }

        if self.selected_seat.as_deref() == Some(seat_id) {
            self.selected_seat = None;
            Ok(ClickEffect::Deselected)
        } else {
            self.selected_seat = Some(seat_id.to_string());
            Ok(ClickEffect::Selected {
                seat_id: seat_id.to_string(),
            })
        }
    }

    /// Clears the selected seat, if any.
    pub fn clear_selected(&mut self) -> MappingResult<()> {
        if let Some(id) = self.selected_seat.clone() {
            self.data = self.data.clear_seat(&id)?;
        }
        Ok(())
    }

    /// Swaps in a snapshot produced elsewhere (an auto-assign, a reload),
    /// dropping state that points at seats or categories that no longer exist.
    pub fn replace_data(&mut self, data: HemicicloData) {
        self.data = data;
        if self
            .hovered_seat
            .as_deref()
            .is_some_and(|id| self.data.get_seat(id).is_none())
        {
            self.hovered_seat = None;
        }
        if self
            .selected_seat
            .as_deref()
            .is_some_and(|id| self.data.get_seat(id).is_none())
        {
            self.selected_seat = None;
        }
        if self
            .active_category
            .as_deref()
            .is_some_and(|id| self.data.get_category(id).is_none())
        {
            self.active_category = None;
        }
    }
}
