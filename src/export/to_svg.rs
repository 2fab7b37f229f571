use serde::Serialize;
use serde_json::json;
use std::error::Error;

use crate::mapping::palette::UNASSIGNED_COLOR;
use crate::mapping::{position_for, GeometryConfig, HemicicloData, HemicicloLayout};

const LEGEND_ROWS_PER_COLUMN: usize = 6;
const LEGEND_LINE_HEIGHT: f64 = 4.0;

#[derive(Clone, Debug)]
pub struct SvgRenderConfig {
    pub show_legend: bool,
    pub title: Option<String>,
    pub width: u32,
}

impl Default for SvgRenderConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            title: None,
            width: 800,
        }
    }
}

#[derive(Serialize)]
struct SvgSeat {
    id: String,
    cx: f64,
    cy: f64,
    r: f64,
    fill: String,
    tooltip: String,
}

#[derive(Serialize)]
struct LegendEntry {
    x: f64,
    text_x: f64,
    y: f64,
    swatch_y: f64,
    color: String,
    label: String,
    seats: u32,
}

/// Renders the hemicycle as a standalone SVG. Seat coordinates come from
/// `position_for`, scaled onto a 200x100 view box.
pub fn render(
    layout: &HemicicloLayout,
    data: &HemicicloData,
    config: &SvgRenderConfig,
) -> Result<String, Box<dyn Error>> {
    let radius = seat_radius(layout);

    let mut seats = Vec::with_capacity(data.seats.len());
    for (index, seat) in data.seats.iter().enumerate() {
        let Some(position) = position_for(index as u32, layout) else {
            continue;
        };
        let category = seat
            .category_id
            .as_deref()
            .and_then(|id| data.get_category(id));

        let who = seat
            .actor_data
            .as_ref()
            .map(|actor| actor.name.as_str())
            .unwrap_or(seat.id.as_str());
        let tooltip = match category {
            Some(category) => format!("{} ({})", who, category.name),
            None => who.to_string(),
        };

        seats.push(SvgSeat {
            id: seat.id.clone(),
            cx: position.x * 2.0,
            cy: position.y,
            r: radius,
            fill: category
                .map(|c| c.color.clone())
                .unwrap_or_else(|| UNASSIGNED_COLOR.to_string()),
            tooltip,
        });
    }

    let legend: Vec<LegendEntry> = data
        .ordered_categories()
        .into_iter()
        .enumerate()
        .map(|(i, category)| {
            let column = i / LEGEND_ROWS_PER_COLUMN;
            let line = i % LEGEND_ROWS_PER_COLUMN;
            // First column hugs the left edge, the rest stack from the right.
            let x = if column == 0 {
                2.0
            } else {
                200.0 - 40.0 * column as f64
            };
            let y = 5.0 + line as f64 * LEGEND_LINE_HEIGHT;
            LegendEntry {
                x,
                text_x: x + 3.2,
                y,
                swatch_y: y - 2.2,
                color: category.color.clone(),
                label: category.display_name().to_string(),
                seats: category.seat_count.unwrap_or(0),
            }
        })
        .collect();

    let handlebars = crate::common::get_handlebars();
    let res = handlebars.render_template(
        &get_template(),
        &json!({
            "width": config.width,
            "height": config.width / 2,
            "title": config.title,
            "show_legend": config.show_legend && !legend.is_empty(),
            "seats": seats,
            "legend": legend,
        }),
    )?;
    Ok(res)
}

pub fn get_template() -> String {
    include_str!("to_svg.hbs").to_string()
}

/// Radius that keeps neighbouring seats from overlapping, in view box units.
fn seat_radius(layout: &HemicicloLayout) -> f64 {
    let geometry = GeometryConfig::default();
    // x is doubled onto the view box, which makes the fan circular.
    let scale = 2.0;

    let row_gap = if layout.rows > 1 {
        (geometry.max_radius - geometry.min_radius) * scale / (layout.rows - 1) as f64
    } else {
        f64::MAX
    };

    let seat_gap = layout
        .seats_per_row
        .iter()
        .enumerate()
        .filter(|(_, seats)| **seats > 1)
        .map(|(row, seats)| {
            let radius = if layout.rows > 1 {
                geometry.min_radius
                    + row as f64 * (geometry.max_radius - geometry.min_radius)
                        / (layout.rows - 1) as f64
            } else {
                geometry.min_radius
            };
            radius * scale * geometry.span_degrees.to_radians() / (*seats - 1) as f64
        })
        .fold(f64::MAX, f64::min);

    let gap = row_gap.min(seat_gap);
    if gap == f64::MAX {
        return 4.0;
    }
    (gap * 0.42).clamp(0.3, 4.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{initial_data, ActorData, HemicicloCategory};

    fn sample() -> (HemicicloLayout, HemicicloData) {
        let layout = HemicicloLayout::from_rows(vec![4, 6]).unwrap();
        let mut data = initial_data(&layout)
            .add_category(HemicicloCategory::new("a", "Party A", "#E63946"))
            .unwrap()
            .assign_seat("seat-0-0", "a")
            .unwrap();
        data = data
            .assign_actor("seat-0-0", ActorData::named("Ana <Ruiz>"))
            .unwrap();
        (layout, data)
    }

    #[test]
    fn renders_one_circle_per_seat() {
        let (layout, data) = sample();
        let svg = render(&layout, &data, &SvgRenderConfig::default()).unwrap();
        assert_eq!(svg.matches("<circle").count(), 10);
        assert!(svg.contains(r#"viewBox="0 0 200 100""#));
    }

    #[test]
    fn fills_by_category_and_escapes_tooltips() {
        let (layout, data) = sample();
        let svg = render(&layout, &data, &SvgRenderConfig::default()).unwrap();
        assert!(svg.contains(r##"fill="#E63946""##));
        assert_eq!(svg.matches(UNASSIGNED_COLOR).count(), 9);
        assert!(svg.contains("Ana &lt;Ruiz&gt; (Party A)"));
    }

    #[test]
    fn legend_is_optional() {
        let (layout, data) = sample();
        let with = render(&layout, &data, &SvgRenderConfig::default()).unwrap();
        assert!(with.contains("Party A (1 seat)"));

        let config = SvgRenderConfig {
            show_legend: false,
            ..Default::default()
        };
        let without = render(&layout, &data, &config).unwrap();
        assert!(!without.contains("class=\"legend\""));
    }

    #[test]
    fn single_seat_gets_default_radius() {
        let layout = HemicicloLayout::from_rows(vec![1]).unwrap();
        assert_eq!(seat_radius(&layout), 4.0);
    }
}
