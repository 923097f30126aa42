//! Views over a 3-hour-interval forecast series.

use chrono::{DateTime, Local, TimeZone, Timelike, Utc};

use crate::model::{ForecastItem, ForecastSeries};

/// Spacing of upstream forecast samples, in hours.
pub const SAMPLE_INTERVAL_HOURS: usize = 3;

const DAILY_SAMPLE_HOUR: u32 = 12;
const TREND_STRIDE: usize = 3;
const TREND_POINTS: usize = 8;

/// The samples covering roughly the next `hours` hours, in original order.
///
/// No interpolation: `hours` is rounded up to whole samples.
pub fn hourly_view(series: &ForecastSeries, hours: usize) -> &[ForecastItem] {
    let count = hours.div_ceil(SAMPLE_INTERVAL_HOURS);
    &series.items[..count.min(series.items.len())]
}

/// One sample per day, taken at noon on the viewer's clock, for at most `days` days.
///
/// Days without an exact noon sample are skipped rather than synthesised.
pub fn daily_view(series: &ForecastSeries, days: usize) -> Vec<&ForecastItem> {
    daily_view_in(series, days, &Local)
}

/// [`daily_view`] with noon resolved in `tz` instead of the system timezone.
pub fn daily_view_in<'a, Tz: TimeZone>(
    series: &'a ForecastSeries,
    days: usize,
    tz: &Tz,
) -> Vec<&'a ForecastItem> {
    series
        .items
        .iter()
        .filter(|item| item.at.with_timezone(tz).hour() == DAILY_SAMPLE_HOUR)
        .take(days)
        .collect()
}

/// Temperature points for a trend chart: every third sample, at most eight.
pub fn temperature_trend(series: &ForecastSeries) -> Vec<(DateTime<Utc>, f64)> {
    series
        .items
        .iter()
        .step_by(TREND_STRIDE)
        .take(TREND_POINTS)
        .map(|item| (item.at, item.measurements.temperature))
        .collect()
}
