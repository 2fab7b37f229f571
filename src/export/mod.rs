pub mod to_csv_seats;
pub mod to_json;
pub mod to_svg;

pub use to_svg::SvgRenderConfig;

use crate::config::ExportFormat;
use crate::mapping::Mapping;
use std::error::Error;

/// Renders a stored mapping in the requested format.
pub fn render_mapping(
    mapping: &Mapping,
    format: ExportFormat,
    svg_config: &SvgRenderConfig,
) -> Result<String, Box<dyn Error>> {
    match format {
        ExportFormat::Svg => to_svg::render(&mapping.config.layout, &mapping.data, svg_config),
        ExportFormat::Json => to_json::render(mapping),
        ExportFormat::Csv => {
            to_csv_seats::render(&mapping.data, mapping.config.data_source.as_ref())
        }
    }
}
