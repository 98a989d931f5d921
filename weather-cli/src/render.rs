use chrono::{DateTime, TimeZone};
use std::fmt::{Display, Write};

use weather_core::{DashboardState, ForecastEntry};

const TITLE: &str = "WEATHER Monitoring Dashboard";

/// Render the dashboard as plain text, stamped with `now`.
pub fn render<Tz>(state: &DashboardState, now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    let _ = write_dashboard(&mut out, state, now);
    out
}

fn write_dashboard<Tz>(out: &mut String, state: &DashboardState, now: DateTime<Tz>) -> std::fmt::Result
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    writeln!(out, "{TITLE}")?;
    writeln!(out, "{}", "=".repeat(TITLE.len()))?;
    writeln!(out, "{}", state.location_label())?;

    if let Some(current) = &state.current {
        writeln!(out, "  {} °C  {}", current.temperature_celsius, current.description)?;
        writeln!(out, "  icon: {}", current.icon_url)?;
    }
    if state.is_loading {
        writeln!(out, "  Loading...")?;
    }
    if let Some(error) = &state.error_message {
        writeln!(out, "  ! {error}")?;
    }

    write_section(out, "Upcoming forecast", &state.hourly)?;
    write_section(out, "Next 4 days forecast", &state.daily)?;

    writeln!(out)?;
    writeln!(out, "as of {}", now.format("%H:%M"))
}

fn write_section(out: &mut String, header: &str, entries: &[ForecastEntry]) -> std::fmt::Result {
    if entries.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "{header}")?;

    let width = entries.iter().map(|e| e.label.len()).max().unwrap_or(0);
    for entry in entries {
        writeln!(
            out,
            "  {:<width$}  {} °C / {} °C  {}",
            entry.label, entry.temperature_max, entry.temperature_min, entry.description,
        )?;
    }

    Ok(())
}
