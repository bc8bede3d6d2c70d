use crate::scan::{ScanResult, Statistics};
use crate::types::{FileKind, Severity};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Output format selected for a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Multi-line report for people
    Human,
    /// Field-stable JSON for automation
    Structured,
}

/// Structured report consumed by downstream automation. Field names are part
/// of the output contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructuredReport {
    pub file: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    pub violations: Vec<StructuredViolation>,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructuredViolation {
    pub id: String,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub line: usize,
    /// WCAG success criteria
    pub wcag: Vec<String>,
    /// Remediation
    pub fix: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_violations: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
    /// Minutes
    pub estimated_fix_time: usize,
}

impl From<&Statistics> for Summary {
    fn from(stats: &Statistics) -> Self {
        Self {
            total_violations: stats.total_violations,
            errors: stats.errors,
            warnings: stats.warnings,
            info: stats.info,
            estimated_fix_time: stats.estimated_fix_time,
        }
    }
}

pub fn structured(result: &ScanResult) -> StructuredReport {
    StructuredReport {
        file: result.file_path.clone(),
        kind: result.file_kind,
        violations: result
            .violations
            .iter()
            .map(|v| StructuredViolation {
                id: v.id.clone(),
                severity: v.severity,
                title: v.title.clone(),
                description: v.description.clone(),
                line: v.line,
                wcag: v.wcag_criteria.clone(),
                fix: v.help.clone(),
            })
            .collect(),
        summary: Summary::from(&result.statistics),
    }
}

pub fn structured_json(result: &ScanResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&structured(result))
}

/// Render a report in the requested format
pub fn render(result: &ScanResult, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Human => Ok(human(result)),
        ReportFormat::Structured => structured_json(result),
    }
}

/// JSON schema of [`StructuredReport`]
pub fn structured_schema() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schemars::schema_for!(StructuredReport))
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// Human-readable multi-line report
pub fn human(result: &ScanResult) -> String {
    let mut output = format!(
        "Accessibility report for {} ({})\n\n",
        result.file_path, result.file_kind
    );

    if result.violations.is_empty() {
        output.push_str("No accessibility violations found.\n");
    }

    for (i, v) in result.violations.iter().enumerate() {
        output.push_str(&format!("{}. [{}] {} ({})\n", i + 1, v.severity, v.title, v.id));
        output.push_str(&format!("   Location: line {}, column {}\n", v.line, v.column));
        output.push_str(&format!("   {}\n", v.description));
        output.push_str(&format!("   Fix: {}\n", v.help));
        output.push_str(&format!("   WCAG: {}\n", v.wcag_criteria.join(", ")));
        if !v.code.is_empty() {
            output.push_str(&format!("   Code: {}\n", v.code));
        }
        output.push_str("   Suggestions:\n");
        for suggestion in &v.fix_suggestions {
            output.push_str(&format!("     - {}\n", suggestion));
        }
        output.push('\n');
    }

    let stats = &result.statistics;
    output.push_str(&format!(
        "Summary: {} ({} errors, {} warnings, {} info)\n",
        plural(stats.total_violations, "violation"),
        stats.errors,
        stats.warnings,
        stats.info
    ));
    output.push_str(&format!(
        "Estimated fix time: {}\n",
        plural(stats.estimated_fix_time, "minute")
    ));
    output.push_str(&format!(
        "Lines analyzed: {}, at {}\n",
        result.metadata.line_count,
        result.metadata.analyzed_at.to_rfc3339()
    ));
    output
}
