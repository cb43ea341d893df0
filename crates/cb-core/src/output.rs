//! Output formats and renderers for CLI payloads.
//!
//! Payloads go to stdout; logs go to stderr.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::inference::{CredibleInterval, QuantileRow, TestDecision, TestEvidence};

/// Supported output formats for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned plain-text tables
    #[default]
    Text,

    /// Pretty-printed JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "table" | "human" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

/// Plain-text report built up section by section.
#[derive(Debug, Default)]
pub struct TextReport {
    lines: Vec<String>,
}

impl TextReport {
    pub fn new(title: &str) -> Self {
        let mut report = Self::default();
        report.lines.push(title.to_string());
        report.lines.push("=".repeat(title.chars().count()));
        report
    }

    pub fn field(&mut self, name: &str, value: impl std::fmt::Display) -> &mut Self {
        self.lines.push(format!("{:<23} {}", format!("{name}:"), value));
        self
    }

    pub fn number(&mut self, name: &str, value: f64) -> &mut Self {
        self.field(name, format_number(value))
    }

    pub fn interval(&mut self, name: &str, alpha: f64, ci: &CredibleInterval) -> &mut Self {
        let label = format!("{name} ({}%)", format_number(100.0 * (1.0 - alpha)));
        self.field(
            &label,
            format!("[{}, {}]", format_number(ci.low), format_number(ci.high)),
        )
    }

    pub fn test(&mut self, name: &str, decision: &TestDecision) -> &mut Self {
        let verdict = if decision.reject { "reject H0" } else { "do not reject H0" };
        let detail = match decision.evidence {
            TestEvidence::OneSided {
                null_probability,
                odds,
            } => format!(
                "P(H0) = {}, odds = {}",
                format_number(null_probability),
                format_number(odds)
            ),
            TestEvidence::TwoSided { interval } => format!(
                "interval [{}, {}]",
                format_number(interval.low),
                format_number(interval.high)
            ),
        };
        self.field(name, format!("{verdict} ({detail})"))
    }

    pub fn quantiles(&mut self, rows: &[QuantileRow]) -> &mut Self {
        self.lines.push(String::new());
        self.lines.push(format!("{:<12}{}", "Prob.", "Quantile"));
        for row in rows {
            self.lines.push(format!(
                "{:<12}{}",
                format_number(row.probability),
                format_number(row.quantile)
            ));
        }
        self
    }

    pub fn masses(&mut self, rows: impl Iterator<Item = (f64, f64)>) -> &mut Self {
        self.lines.push(String::new());
        self.lines.push(format!("{:<12}{}", "Value", "Posterior"));
        for (value, mass) in rows {
            self.lines
                .push(format!("{:<12}{}", format_number(value), format_number(mass)));
        }
        self
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }
}

/// Six significant digits, trailing zeros trimmed.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    if !(-4..6).contains(&magnitude) {
        return format!("{value:.5e}");
    }
    let decimals = (5 - magnitude).max(0) as usize;
    let text = format!("{value:.decimals$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

/// Serialize a payload as pretty JSON.
pub fn to_json<T: Serialize>(payload: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(payload)
}
