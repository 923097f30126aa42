use std::fmt::Write;

use chrono::{DateTime, FixedOffset, Utc};
use dashboard_core::{
    AirQuality, DashboardView, Units, WeatherData,
    forecast::{daily_view, hourly_view, temperature_trend},
};

/// Human-readable rendering of everything the dashboard shows.
pub fn view(view: &DashboardView, hours: usize, days: usize) -> String {
    let mut out = String::new();

    if let Some(err) = &view.error {
        let _ = writeln!(out, "Error: {err}");
    }
    if let Some(weather) = &view.weather {
        out.push_str(&weather_report(weather, view.units, hours, days));
    }
    if let Some(air) = &view.air_quality {
        out.push_str(&air_quality(air));
    }
    out
}

fn local(at: DateTime<Utc>, offset: FixedOffset) -> DateTime<FixedOffset> {
    at.with_timezone(&offset)
}

pub fn weather_report(data: &WeatherData, units: Units, hours: usize, days: usize) -> String {
    let mut out = String::new();
    let current = &data.current;
    let m = &current.measurements;
    let t = units.temperature_symbol();
    let offset = data.forecast.utc_offset();

    let _ = writeln!(out, "{}, {}", current.location.name, current.location.country);
    let _ = writeln!(
        out,
        "  {:.0}{t}  {} ({})  feels like {:.0}{t}",
        m.temperature,
        current.condition.description,
        if current.is_night() { "night" } else { "day" },
        m.feels_like,
    );
    let _ = writeln!(out, "  high {:.0}{t} / low {:.0}{t}", m.temp_max, m.temp_min);
    let _ = writeln!(
        out,
        "  wind {:.1} {} at {:.0}°  humidity {}%  pressure {:.0} hPa  clouds {}%",
        current.wind.speed,
        units.wind_speed_label(),
        current.wind.direction_deg,
        m.humidity_pct,
        m.pressure,
        current.cloud_cover_pct,
    );
    if let Some(visibility) = current.visibility_m {
        let _ = writeln!(out, "  visibility {:.1} km", f64::from(visibility) / 1000.0);
    }
    if let (Some(rise), Some(set)) = (
        DateTime::from_timestamp(current.sunrise, 0),
        DateTime::from_timestamp(current.sunset, 0),
    ) {
        let _ = writeln!(
            out,
            "  sunrise {}  sunset {}",
            local(rise, offset).format("%H:%M"),
            local(set, offset).format("%H:%M"),
        );
    }

    let _ = writeln!(out, "\nNext {hours} hours");
    for item in hourly_view(&data.forecast, hours) {
        let _ = write!(
            out,
            "  {}  {:>4.0}{t}  {}",
            local(item.at, offset).format("%a %H:%M"),
            item.measurements.temperature,
            item.condition.description,
        );
        if item.precipitation_probability > 0.0 {
            let _ = write!(out, "  {:.0}% rain", item.precipitation_probability * 100.0);
        }
        out.push('\n');
    }

    let daily = daily_view(&data.forecast, days);
    let _ = writeln!(out, "\n{}-day forecast", daily.len());
    for item in daily {
        let _ = writeln!(
            out,
            "  {}  {:>4.0}{t}  {:.0}{t} / {:.0}{t}  {}",
            local(item.at, offset).format("%a %d %b"),
            item.measurements.temperature,
            item.measurements.temp_max,
            item.measurements.temp_min,
            item.condition.description,
        );
    }

    let trend = temperature_trend(&data.forecast);
    if !trend.is_empty() {
        let temps: Vec<String> = trend.iter().map(|(_, temp)| format!("{temp:.0}")).collect();
        let _ = writeln!(out, "\nTrend ({t}): {}", temps.join(" → "));
    }

    out
}

pub fn air_quality(air: &AirQuality) -> String {
    match air {
        AirQuality::Available(snapshot) => {
            let level = snapshot.level();
            let c = &snapshot.components;
            format!(
                "\nAir quality: {} ({})\n  {}\n  \
                 PM2.5 {:.1}  PM10 {:.1}  O3 {:.1}  NO2 {:.1} μg/m³\n",
                snapshot.aqi,
                level.label(),
                level.advice(),
                c.pm2_5,
                c.pm10,
                c.o3,
                c.no2,
            )
        }
        AirQuality::Unavailable { reason } => {
            tracing::debug!(%reason, "air quality not shown");
            String::new()
        }
    }
}
