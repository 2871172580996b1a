//! Streaming decay: annual anchors expanded into weekly multipliers, and
//! views of that curve shifted to a track's current age.

pub mod shifted;
pub mod weekly;

pub use shifted::ShiftedDecayCurve;
pub use weekly::{validate_anchors, CurveValidation, WeeklyDecayCurve, YearFidelity};
