// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use crate::model::Value;

/// Formats a duration in seconds into a human-readable `MM:SS` string.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_time(65), "01:05");
/// assert_eq!(format_time(3600), "60:00");
/// ```
pub(crate) fn format_time(total_seconds: u64) -> String {
    let mins = total_seconds / 60;
    let secs = total_seconds % 60;
    format!("{:02}:{:02}", mins, secs)
}

/// Formats a similarity score as a percentage with one decimal.
pub(crate) fn format_score(score: f64) -> String {
    format!("{:5.1}%", score * 100.0)
}

/// Formats a normalized field value for display.
///
/// Values are shown in their normalized form; the raw tag text is not kept.
pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::Unset => "-".to_string(),
        Value::Text(s) => s.clone(),
        Value::Number(n) if n.fract() == 0.0 => format!("{n:.0}"),
        Value::Number(n) => format!("{n:.1}"),
        Value::Collection(items) => items.iter().map(format_value).collect::<Vec<_>>().join(", "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_is_minutes_and_seconds() {
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(3600), "60:00");
    }

    #[test]
    fn score_is_a_padded_percentage() {
        assert_eq!(format_score(0.9512), " 95.1%");
        assert_eq!(format_score(1.0), "100.0%");
    }

    #[test]
    fn values_render_compactly() {
        assert_eq!(format_value(&Value::Unset), "-");
        assert_eq!(format_value(&Value::Number(3.0)), "3");
        assert_eq!(format_value(&Value::Number(125.5)), "125.5");
        assert_eq!(
            format_value(&Value::Collection(vec![Value::Text("a".into()), Value::Text("b".into())])),
            "a, b"
        );
    }
}
