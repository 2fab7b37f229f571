//! Seat placement on the hemicycle fan.
//!
//! Positions are percentages of a container that is twice as wide as it is
//! tall. Rows are concentric arcs around a podium near the bottom centre; the
//! innermost row has the smallest radius.

use serde::Serialize;

use super::model::HemicicloLayout;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SeatPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometryConfig {
    /// Angular span of every row in degrees, centred on the vertical axis.
    pub span_degrees: f64,
    pub min_radius: f64,
    pub max_radius: f64,
    pub center_x: f64,
    pub center_y: f64,
    /// Stretch applied to the vertical component for the 2:1 container.
    pub aspect_correction: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            span_degrees: 170.0,
            min_radius: 20.0,
            max_radius: 45.0,
            center_x: 50.0,
            center_y: 95.0,
            aspect_correction: 2.0,
        }
    }
}

/// Position of the seat at `seat_index` (global, row-major order) using the
/// default geometry. `None` when the index is past the last seat.
pub fn position_for(seat_index: u32, layout: &HemicicloLayout) -> Option<SeatPosition> {
    position_with(&GeometryConfig::default(), seat_index, layout)
}

pub fn position_with(
    config: &GeometryConfig,
    seat_index: u32,
    layout: &HemicicloLayout,
) -> Option<SeatPosition> {
    let (row_index, position_in_row) = layout.locate(seat_index)?;
    let seats_in_row = layout.seats_per_row[row_index as usize];

    let radius = if layout.rows <= 1 {
        config.min_radius
    } else {
        config.min_radius
            + row_index as f64 * (config.max_radius - config.min_radius)
                / (layout.rows - 1) as f64
    };

    let angle_degrees = if seats_in_row <= 1 {
        90.0
    } else {
        let angle_per_seat = config.span_degrees / (seats_in_row - 1) as f64;
        90.0 + config.span_degrees / 2.0 - position_in_row as f64 * angle_per_seat
    };
    let angle = angle_degrees.to_radians();

    let x = config.center_x + radius * angle.cos();
    let y = config.center_y - radius * angle.sin() * config.aspect_correction;

    Some(SeatPosition {
        x: x.clamp(0.0, 100.0),
        y: y.clamp(0.0, 100.0),
    })
}

/// Positions for every seat of the layout in global order.
pub fn positions_for_layout(layout: &HemicicloLayout) -> Vec<SeatPosition> {
    (0..layout.total_seats)
        .filter_map(|index| position_for(index, layout))
        .collect()
}
