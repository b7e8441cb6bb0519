use crate::error::AppError;

/// Parse a duration in seconds with an optional unit (s, m, h)
pub fn parse_time(time_str: &str) -> Result<f64, AppError> {
    let time_str = time_str.trim();
    if time_str.is_empty() {
        return Err(AppError::ParseError("Invalid format: empty string".to_string()));
    }

    if let Ok(seconds) = time_str.parse::<f64>() {
        return Ok(seconds);
    }

    let split_index = time_str
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(time_str.len());
    let value = time_str[..split_index]
        .parse::<f64>()
        .map_err(|_| AppError::ParseError(format!("Invalid number in '{time_str}'")))?;

    match time_str[split_index..].trim().to_lowercase().as_str() {
        "s" => Ok(value),
        "m" => Ok(value * 60.0),
        "h" => Ok(value * 3600.0),
        unit => Err(AppError::ParseError(format!("Invalid unit '{unit}'"))),
    }
}

/// Convert seconds to a human-readable format
pub fn format_duration(seconds: f64) -> String {
    if seconds.is_infinite() {
        "unbounded".to_string()
    } else if seconds >= 3600.0 {
        format!("{:.2}h", seconds / 3600.0)
    } else if seconds >= 60.0 {
        format!("{:.2}m", seconds / 60.0)
    } else {
        format!("{seconds:.2}s")
    }
}
