//! Cyclical weekday/month encoding of a timestamp.

use chrono::{Datelike, NaiveDateTime};
use std::f64::consts::TAU;

pub const SEASONAL_DIM: usize = 4;

/// `[dow_sin, dow_cos, month_sin, month_cos]`; Monday is weekday 0, months run 1..=12.
pub type Seasonal = [f32; SEASONAL_DIM];

/// Zero vector when the timestamp is unknown
pub fn seasonal_features(ts: Option<NaiveDateTime>) -> Seasonal {
    let Some(ts) = ts else {
        return [0.0; SEASONAL_DIM];
    };
    let dow = f64::from(ts.weekday().num_days_from_monday());
    let month = f64::from(ts.month());
    let dow_phase = TAU * dow / 7.0;
    let month_phase = TAU * month / 12.0;
    [
        dow_phase.sin() as f32,
        dow_phase.cos() as f32,
        month_phase.sin() as f32,
        month_phase.cos() as f32,
    ]
}
