use chrono::Local;
use orutego_core::{CalculationResult, Route, Suggestion};
use std::fmt;

pub fn summary(result: &CalculationResult) -> String {
    Summary(result).to_string()
}

/// Human-readable block for one calculation, ending with the payload line.
struct Summary<'a>(&'a CalculationResult);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.0;
        writeln!(out, "Origin       {}", result.origin.formatted_address)?;
        writeln!(out, "Destination  {}", result.destination.formatted_address)?;
        writeln!(out, "Mode         {}", result.mode)?;
        writeln!(
            out,
            "Distance     {:.2} km ({})",
            result.distance_km(),
            result.distance.distance_text
        )?;
        writeln!(
            out,
            "Time (H:M)   {} ({})",
            result.hours_minutes(),
            result.distance.duration_text
        )?;
        writeln!(out, "Time (dec)   {}h", result.decimal_hours())?;
        writeln!(
            out,
            "Calculated   {}",
            result
                .calculated_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
        )?;

        if result.routes.is_empty() {
            writeln!(out, "Routes       none (map shows origin and destination only)")?;
        }
        for (i, route) in result.routes.iter().enumerate() {
            writeln!(out, "Route {:<6} {}", i + 1, route_line(route))?;
        }

        writeln!(out)?;
        writeln!(out, "{}", result.payload())
    }
}

fn route_line(route: &Route) -> String {
    let kind = if route.is_primary { "primary" } else { "alternative" };
    let bbox = route.bounding_box;
    format!(
        "{kind}, {} points, bounds {} .. {}",
        route.points.len(),
        bbox.southwest,
        bbox.northeast
    )
}

pub fn suggestions(items: &[Suggestion]) -> String {
    if items.is_empty() {
        return "No suggestions\n".to_string();
    }

    items
        .iter()
        .map(|s| format!("{}  ({})\n", s.main_text, s.description))
        .collect()
}
