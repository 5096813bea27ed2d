//! Fastest-lap track maps and the historical speed model.

pub mod service;
pub mod speed_model;
pub mod track_map;

pub use service::{NOT_ENOUGH_HISTORY, RacingLineReport, RacingLineService};
pub use speed_model::{PredictedLine, PredictedPoint, predict_racing_line};
pub use track_map::{MapColouring, MapValue, TrackMap, TrackMapPoint, track_map, track_maps};
