//! Core river width extraction modules

pub mod angle;
pub mod channel;
pub mod cleanup;
pub mod costmap;
pub mod distance;
pub mod gradient;
pub mod mask;
pub mod pipeline;
pub mod quality;
pub mod skeleton;
pub mod water;
pub mod width;

// Re-export main types
pub use angle::orthogonal_angles;
pub use channel::{extract_river, RiverScene};
pub use cleanup::{clean_centerline, CleanupParams};
pub use distance::distance_field;
pub use gradient::{gradient_magnitude, GradientMethod};
pub use pipeline::{extract_widths, RiverWidthConfig};
pub use quality::{hill_shadow, QaFlags};
pub use skeleton::{thin, ThinningMethod};
pub use water::{classify_scene, classify_water, WaterMethod, WaterScene};
pub use width::measure_widths;
