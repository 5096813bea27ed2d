use crate::domain::telemetry::{DrsStatus, LapTelemetry};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapColouring {
    Speed,
    Gear,
    Drs,
}

impl MapColouring {
    pub const ALL: [MapColouring; 3] = [MapColouring::Speed, MapColouring::Gear, MapColouring::Drs];

    pub fn title(&self) -> &'static str {
        match self {
            MapColouring::Speed => "Speed (km/h)",
            MapColouring::Gear => "Gear",
            MapColouring::Drs => "DRS",
        }
    }
}

impl fmt::Display for MapColouring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Colour value of a point: continuous for speed, categorical otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MapValue {
    Speed(f64),
    Gear(u8),
    Drs(DrsStatus),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackMapPoint {
    pub x: f64,
    pub y: f64,
    pub value: MapValue,
}

/// Scatter-ready series of one lap coloured by one channel.
#[derive(Debug, Clone, Serialize)]
pub struct TrackMap {
    pub year: i32,
    pub colouring: MapColouring,
    pub title: String,
    pub points: Vec<TrackMapPoint>,
}

pub fn track_map(lap: &LapTelemetry, colouring: MapColouring) -> TrackMap {
    let points = lap
        .samples
        .iter()
        .map(|s| TrackMapPoint {
            x: s.x,
            y: s.y,
            value: match colouring {
                MapColouring::Speed => MapValue::Speed(s.speed),
                MapColouring::Gear => MapValue::Gear(s.gear),
                MapColouring::Drs => MapValue::Drs(s.drs_status()),
            },
        })
        .collect();

    TrackMap {
        year: lap.year,
        colouring,
        title: format!("{} {}", lap.year, colouring.title()),
        points,
    }
}

/// Speed, gear and DRS maps of one lap.
pub fn track_maps(lap: &LapTelemetry) -> Vec<TrackMap> {
    MapColouring::ALL
        .iter()
        .map(|&colouring| track_map(lap, colouring))
        .collect()
}
