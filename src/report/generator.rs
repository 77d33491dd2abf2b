//! Terminal summaries and conversation export.
//!
//! Renders a query context, a render spec or an assistant turn as short
//! readable text, and serializes the conversation log for download.

use crate::mapping::{HeatmapSpec, ProfileSpec, RenderSpec, ScatterSpec, TimeSeriesSpec};
use crate::models::{ConversationTurn, QueryContext, Role};
use crate::stats::{describe_correlation, ValueRange};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Serialized conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationExport {
    pub session_id: String,
    pub export_date: DateTime<Utc>,
    pub messages: Vec<ExportedMessage>,
}

/// One exported turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<f64>,
}

impl From<&ConversationTurn> for ExportedMessage {
    fn from(turn: &ConversationTurn) -> Self {
        Self {
            role: turn.role,
            content: turn.text.clone(),
            timestamp: turn.created_at,
            confidence_score: turn.confidence_score,
        }
    }
}

/// Builds the export of `turns`, stamped with the current time.
pub fn export_conversation(session_id: &str, turns: &[ConversationTurn]) -> ConversationExport {
    ConversationExport {
        session_id: session_id.to_string(),
        export_date: Utc::now(),
        messages: turns.iter().map(ExportedMessage::from).collect(),
    }
}

/// Default file name for an export made on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("floatscope-conversation-{}.json", date.format("%Y-%m-%d"))
}

/// Generate the JSON form of an export.
pub fn generate_json_export(export: &ConversationExport) -> Result<String> {
    serde_json::to_string_pretty(export).map_err(Into::into)
}

/// Write an export to a file.
pub fn write_export(export: &ConversationExport, path: &Path) -> Result<()> {
    let content = generate_json_export(export)?;

    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())?;

    Ok(())
}

/// Exports `turns` to `path`, or to the dated default name in the working
/// directory. Returns the path written.
pub fn save_conversation(
    session_id: &str,
    turns: &[ConversationTurn],
    path: Option<&Path>,
) -> Result<PathBuf> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(export_file_name(Utc::now().date_naive())));

    write_export(&export_conversation(session_id, turns), &path)?;
    Ok(path)
}

/// Multi-line summary of what the conversation is currently about.
pub fn context_summary(context: &QueryContext) -> String {
    if context.is_empty() {
        return "No active context.\n".to_string();
    }

    let mut section = String::new();

    if !context.preferred_parameters.is_empty() {
        let names: Vec<&str> = context
            .preferred_parameters
            .iter()
            .map(|p| p.as_str())
            .collect();
        section.push_str(&format!("Parameters: {}\n", names.join(", ")));
    }

    if !context.recent_entity_ids.is_empty() {
        section.push_str(&format!(
            "Floats: {}\n",
            context.recent_entity_ids.join(", ")
        ));
    }

    if let Some(location) = context.location() {
        section.push_str(&format!("Location: {}\n", location));
    }

    for (name, value) in context
        .active_filters
        .iter()
        .filter(|(name, _)| name.as_str() != "location")
    {
        section.push_str(&format!("Filter {}: {}\n", name, value));
    }

    if let Some(point) = context.spatial_focus {
        section.push_str(&format!(
            "Focus: {:.2}°, {:.2}°\n",
            point.latitude, point.longitude
        ));
    }

    if let Some(period) = context.temporal_focus {
        section.push_str(&format!("Period: {} to {}\n", period.start, period.end));
    }

    section
}

/// Assistant reply as printed in the chat loop.
pub fn turn_summary(turn: &ConversationTurn) -> String {
    let mut output = format!("{}\n", turn.text);

    if let (Some(score), Some(level)) = (turn.confidence_score, turn.confidence_level()) {
        output.push_str(&format!(
            "{} {:.0}% · {}\n",
            level.emoji(),
            score * 100.0,
            level.message()
        ));
    }

    if let Some(ref metadata) = turn.query_metadata {
        output.push_str(&format!("{}\n", metadata.summary()));
    }

    if let Some(ref visualization) = turn.visualization {
        output.push_str(&format!("Suggested chart: {}\n", visualization.kind()));
    }

    output
}

/// Short description of a mapped chart.
pub fn render_summary(spec: &RenderSpec) -> String {
    let mut output = format!("{} chart\n", spec.kind());

    output.push_str(&match spec {
        RenderSpec::Profile(profile) => profile_section(profile),
        RenderSpec::TimeSeries(series) => time_series_section(series),
        RenderSpec::Scatter(scatter) => scatter_section(scatter),
        RenderSpec::Heatmap(heatmap) => heatmap_section(heatmap),
    });

    if spec.dropped_rows() > 0 {
        output.push_str(&format!("Dropped rows: {}\n", spec.dropped_rows()));
    }

    output
}

fn profile_section(spec: &ProfileSpec) -> String {
    let mut section = format!("Parameter: {} ({})\n", spec.parameter, spec.unit);

    if spec.series.is_empty() {
        section.push_str("No profiles\n");
        return section;
    }

    section.push_str(&format!(
        "Depth: {:.0}-{:.0} m, values {}\n",
        spec.depth_range.min,
        spec.depth_range.max,
        format_range(&spec.value_range)
    ));

    for series in &spec.series {
        let top = series.points.first().map(|p| p.depth).unwrap_or(0.0);
        let bottom = series.points.last().map(|p| p.depth).unwrap_or(0.0);
        section.push_str(&format!(
            "  {}: {} levels, {:.0}-{:.0} m\n",
            series.key,
            series.points.len(),
            top,
            bottom
        ));
    }

    section
}

fn time_series_section(spec: &TimeSeriesSpec) -> String {
    let mut section = format!("Observations: {}\n", spec.points.len());

    if let (Some(first), Some(last)) = (spec.points.first(), spec.points.last()) {
        section.push_str(&format!("Dates: {} to {}\n", first.date, last.date));
    }

    for metric in &spec.metrics {
        match spec.ranges.get(metric) {
            Some(range) => {
                let average = spec.averages.get(metric).copied().unwrap_or_default();
                section.push_str(&format!(
                    "  {}: {}, avg {:.2} {}\n",
                    metric,
                    format_range(range),
                    average,
                    metric.unit()
                ))
            }
            None => section.push_str(&format!("  {}: no data\n", metric)),
        }
    }

    section
}

fn scatter_section(spec: &ScatterSpec) -> String {
    let mut section = format!(
        "{} vs {} ({} points), colored by {}\n",
        spec.x_axis,
        spec.y_axis,
        spec.points.len(),
        spec.color_by
    );

    section.push_str(&format!(
        "{} range: {}\n{} range: {}\n",
        spec.x_axis,
        format_range(&spec.x_range),
        spec.y_axis,
        format_range(&spec.y_range)
    ));

    match spec.correlation {
        Some(r) => section.push_str(&format!(
            "Correlation: {:.3} ({})\n",
            r,
            describe_correlation(Some(r))
        )),
        None => section.push_str("Correlation: undefined\n"),
    }

    section.push_str(&format!(
        "Color range: {} ({})\n",
        format_range(&spec.color_range),
        spec.palette
    ));

    section
}

fn heatmap_section(spec: &HeatmapSpec) -> String {
    let mut section = format!("Parameter: {} ({})\n", spec.parameter, spec.unit);

    section.push_str(&format!(
        "Grid: {} latitudes x {} longitudes, {:.1}% covered\n",
        spec.grid.rows(),
        spec.grid.cols(),
        spec.coverage * 100.0
    ));
    section.push_str(&format!(
        "Range: {} ({})\n",
        format_range(&spec.range),
        spec.palette
    ));

    section
}

fn format_range(range: &ValueRange) -> String {
    format!("{:.2} to {:.2}", range.min, range.max)
}
