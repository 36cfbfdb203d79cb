// Chart kinds supported by the assistant

use serde::{Deserialize, Serialize};

/// Chart kind. Everything the model says that we don't recognize maps to
/// `Column` — a wrong chart beats no chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    #[default]
    Column,
    Line,
}

impl ChartKind {
    /// Parse a model- or user-supplied kind string, defaulting to column.
    pub fn parse(s: &str) -> ChartKind {
        match s.trim().to_ascii_lowercase().as_str() {
            "pie" => ChartKind::Pie,
            "line" => ChartKind::Line,
            "column" | "bar" => ChartKind::Column,
            _ => ChartKind::Column,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Pie => "pie",
            ChartKind::Column => "column",
            ChartKind::Line => "line",
        }
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(ChartKind::parse("pie"), ChartKind::Pie);
        assert_eq!(ChartKind::parse("Line"), ChartKind::Line);
        assert_eq!(ChartKind::parse("column"), ChartKind::Column);
        assert_eq!(ChartKind::parse("bar"), ChartKind::Column);
        assert_eq!(ChartKind::parse("donut"), ChartKind::Column);
        assert_eq!(ChartKind::parse(""), ChartKind::Column);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ChartKind::Pie).unwrap();
        assert_eq!(json, "\"pie\"");
        let back: ChartKind = serde_json::from_str("\"line\"").unwrap();
        assert_eq!(back, ChartKind::Line);
    }
}
