use std::collections::HashMap;
use tracing::debug;

use super::geometry::GeometryConfig;
use super::model::{HemicicloData, HemicicloLayout, HemicicloSeat};
use crate::errors::{MappingError, MappingResult};

const SEATS_PER_ROW_FACTOR: f64 = 4.0;
const MAX_ROWS: u32 = 12;

impl HemicicloLayout {
    /// Default layout for `total_seats` seats.
    ///
    /// Outer rows are longer arcs, so seats are shared out in proportion to
    /// each row's radius with largest-remainder rounding. Every row gets at
    /// least one seat.
    pub fn for_seat_count(total_seats: u32) -> MappingResult<Self> {
        if total_seats < 1 {
            return Err(MappingError::Validation(
                "seat count must be at least 1".to_string(),
            ));
        }

        let rows = ((total_seats as f64 / SEATS_PER_ROW_FACTOR).sqrt().ceil() as u32)
            .clamp(1, MAX_ROWS)
            .min(total_seats);

        let geometry = GeometryConfig::default();
        let weights: Vec<f64> = (0..rows)
            .map(|row| {
                if rows == 1 {
                    geometry.min_radius
                } else {
                    geometry.min_radius
                        + row as f64 * (geometry.max_radius - geometry.min_radius)
                            / (rows - 1) as f64
                }
            })
            .collect();
        let weight_sum: f64 = weights.iter().sum();

        let distributable = total_seats - rows;
        let shares: Vec<f64> = weights
            .iter()
            .map(|w| distributable as f64 * w / weight_sum)
            .collect();
        let mut seats_per_row: Vec<u32> = shares.iter().map(|s| 1 + s.floor() as u32).collect();

        let mut remaining = total_seats - seats_per_row.iter().sum::<u32>();
        let mut by_remainder: Vec<usize> = (0..rows as usize).collect();
        by_remainder.sort_by(|&a, &b| {
            let ra = shares[a] - shares[a].floor();
            let rb = shares[b] - shares[b].floor();
            rb.total_cmp(&ra).then(b.cmp(&a))
        });
        for row in by_remainder.into_iter().cycle() {
            if remaining == 0 {
                break;
            }
            seats_per_row[row] += 1;
            remaining -= 1;
        }

        debug!("Default layout for {} seats: {:?}", total_seats, seats_per_row);
        Self::from_rows(seats_per_row)
    }
}

/// Empty seats for every `(row, position)` of the layout, row by row.
pub fn build_seats(layout: &HemicicloLayout) -> Vec<HemicicloSeat> {
    layout
        .seats_per_row
        .iter()
        .enumerate()
        .flat_map(|(row, &seats)| (0..seats).map(move |position| HemicicloSeat::empty(row as u32, position)))
        .collect()
}

/// Fresh data for a new mapping: no categories, all seats empty.
pub fn initial_data(layout: &HemicicloLayout) -> HemicicloData {
    HemicicloData {
        categories: Vec::new(),
        seats: build_seats(layout),
    }
}

/// Rebuilds the seats for `layout`, keeping the assignment of any seat whose
/// `(row, position)` exists in both layouts. Categories are kept as they are.
pub fn regenerate_layout(
    data: &HemicicloData,
    layout: &HemicicloLayout,
) -> MappingResult<HemicicloData> {
    layout.validate()?;

    let previous: HashMap<(u32, u32), &HemicicloSeat> = data
        .seats
        .iter()
        .map(|seat| ((seat.row, seat.position), seat))
        .collect();

    let seats = build_seats(layout)
        .into_iter()
        .map(|mut seat| {
            if let Some(old) = previous.get(&(seat.row, seat.position)) {
                seat.category_id = old.category_id.clone();
                seat.actor_data = old.actor_data.clone();
            }
            seat
        })
        .collect();

    let mut next = HemicicloData {
        categories: data.categories.clone(),
        seats,
    };
    super::assignment::recompute_seat_counts(&mut next);
    Ok(next)
}
