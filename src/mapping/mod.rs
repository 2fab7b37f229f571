//! Hemicycle mapping core: data model, layout, seat assignment and
//! dataset driven auto-assignment.

pub mod assignment;
pub mod auto_assign;
pub mod custom_fields;
pub mod entity;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod palette;
pub mod view;

pub use assignment::{recompute_seat_counts, CategoryPatch};
pub use auto_assign::{AutoAssignOutcome, AutoAssigner, UNCATEGORIZED_LABEL};
pub use custom_fields::{FieldResolution, JoinIndex};
pub use entity::{Mapping, MappingConfig, MappingFilter, MappingPatch, MappingType, NewMapping};
pub use geometry::{position_for, positions_for_layout, GeometryConfig, SeatPosition};
pub use layout::{build_seats, initial_data, regenerate_layout};
pub use model::{
    ActorData, ColumnMappings, CustomField, CustomFieldSource, DisplayType, HemicicloCategory,
    HemicicloData, HemicicloDataSource, HemicicloLayout, HemicicloSeat,
};
pub use view::{ClickEffect, HemicicloView};
