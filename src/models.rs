//! Data models shared across the pipeline.
//!
//! Conversation turns, the extracted query context, measurement rows and
//! the visualization selectors all live here. Everything is a plain
//! serializable structure so it can cross the session boundary as JSON.

use crate::stats::ColorPalette;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::warn;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::System => write!(f, "system"),
        }
    }
}

/// Confidence band of an assistant answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    /// Classify a score in `[0, 1]`.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ConfidenceLevel::High
        } else if score >= 0.6 {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Returns an emoji representation of the level.
    pub fn emoji(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "🟢",
            ConfidenceLevel::Medium => "🟡",
            ConfidenceLevel::Low => "🔴",
        }
    }

    /// Human readable explanation shown next to the score.
    pub fn message(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "High confidence - Strong data support",
            ConfidenceLevel::Medium => "Medium confidence - Adequate data support",
            ConfidenceLevel::Low => {
                "Low confidence - Limited data or uncertain interpretation"
            }
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceLevel::Low => write!(f, "Low"),
            ConfidenceLevel::Medium => write!(f, "Medium"),
            ConfidenceLevel::High => write!(f, "High"),
        }
    }
}

/// Ocean parameters recognised in conversation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Temperature,
    Salinity,
    Pressure,
    Oxygen,
    Chlorophyll,
    Nitrate,
}

impl Parameter {
    /// All parameters, in keyword-table order.
    pub const ALL: [Parameter; 6] = [
        Parameter::Temperature,
        Parameter::Salinity,
        Parameter::Pressure,
        Parameter::Oxygen,
        Parameter::Chlorophyll,
        Parameter::Nitrate,
    ];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Parameter::Temperature => "temperature",
            Parameter::Salinity => "salinity",
            Parameter::Pressure => "pressure",
            Parameter::Oxygen => "oxygen",
            Parameter::Chlorophyll => "chlorophyll",
            Parameter::Nitrate => "nitrate",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Numeric field of a [`Measurement`].
///
/// Used wherever a caller picks an axis, a grid key or a color source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Temperature,
    Salinity,
    Pressure,
    Oxygen,
    Chlorophyll,
    Nitrate,
    Depth,
    Latitude,
    Longitude,
    FloatCount,
}

impl Field {
    /// Canonical snake_case name, matching the row's JSON key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Temperature => "temperature",
            Field::Salinity => "salinity",
            Field::Pressure => "pressure",
            Field::Oxygen => "oxygen",
            Field::Chlorophyll => "chlorophyll",
            Field::Nitrate => "nitrate",
            Field::Depth => "depth",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::FloatCount => "float_count",
        }
    }

    /// Display unit for axis labels.
    pub fn unit(&self) -> &'static str {
        match self {
            Field::Temperature => "°C",
            Field::Salinity => "PSU",
            Field::Pressure => "dbar",
            Field::Oxygen => "μmol/kg",
            Field::Chlorophyll => "mg/m³",
            Field::Nitrate => "μmol/kg",
            Field::Depth => "m",
            Field::Latitude | Field::Longitude => "°",
            Field::FloatCount => "count",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Parameter> for Field {
    fn from(parameter: Parameter) -> Self {
        match parameter {
            Parameter::Temperature => Field::Temperature,
            Parameter::Salinity => Field::Salinity,
            Parameter::Pressure => Field::Pressure,
            Parameter::Oxygen => Field::Oxygen,
            Parameter::Chlorophyll => Field::Chlorophyll,
            Parameter::Nitrate => Field::Nitrate,
        }
    }
}

impl std::str::FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "temperature" | "temp" => Ok(Field::Temperature),
            "salinity" => Ok(Field::Salinity),
            "pressure" => Ok(Field::Pressure),
            "oxygen" => Ok(Field::Oxygen),
            "chlorophyll" => Ok(Field::Chlorophyll),
            "nitrate" => Ok(Field::Nitrate),
            "depth" => Ok(Field::Depth),
            "latitude" | "lat" => Ok(Field::Latitude),
            "longitude" | "lon" => Ok(Field::Longitude),
            "float_count" | "floatcount" => Ok(Field::FloatCount),
            other => Err(format!("Unknown measurement field: {}", other)),
        }
    }
}

/// One turn of the conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Unique turn identifier.
    #[serde(default = "new_turn_id")]
    pub id: String,
    /// Who wrote the turn.
    pub role: Role,
    /// Message text.
    #[serde(alias = "content")]
    pub text: String,
    /// Creation time.
    #[serde(default = "Utc::now", alias = "timestamp", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
    /// Backend confidence in `[0, 1]`, assistant turns only.
    #[serde(
        default,
        alias = "confidenceScore",
        skip_serializing_if = "Option::is_none"
    )]
    pub confidence_score: Option<f64>,
    /// Chart the backend suggests for this answer.
    #[serde(
        default,
        alias = "visualization_spec",
        skip_serializing_if = "Option::is_none"
    )]
    pub visualization: Option<VisualizationRequest>,
    /// Retrieval details for the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_metadata: Option<QueryMetadata>,
}

fn new_turn_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl ConversationTurn {
    /// Creates a new turn stamped with the current time.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: new_turn_id(),
            role,
            text: text.into(),
            created_at: Utc::now(),
            confidence_score: None,
            visualization: None,
            query_metadata: None,
        }
    }

    /// Creates a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Creates an assistant turn with a confidence score.
    pub fn assistant(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            confidence_score: Some(confidence.clamp(0.0, 1.0)),
            ..Self::new(Role::Assistant, text)
        }
    }

    /// Confidence band, when a score is present.
    pub fn confidence_level(&self) -> Option<ConfidenceLevel> {
        self.confidence_score.map(ConfidenceLevel::from_score)
    }
}

/// A geographic point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialFocus {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon")]
    pub longitude: f64,
}

/// An inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalFocus {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Short-memory summary of recent user intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    /// Parameters mentioned, without duplicates, in first-detection order.
    #[serde(default)]
    pub preferred_parameters: Vec<Parameter>,
    /// Float identifiers mentioned, most recent last.
    #[serde(default, alias = "recent_floats")]
    pub recent_entity_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_focus: Option<SpatialFocus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_focus: Option<TemporalFocus>,
    /// Named filters, e.g. `location`.
    #[serde(default)]
    pub active_filters: BTreeMap<String, String>,
}

impl QueryContext {
    /// Whether nothing has been extracted.
    pub fn is_empty(&self) -> bool {
        self.preferred_parameters.is_empty()
            && self.recent_entity_ids.is_empty()
            && self.spatial_focus.is_none()
            && self.temporal_focus.is_none()
            && self.active_filters.is_empty()
    }

    /// The `location` filter, if any.
    pub fn location(&self) -> Option<&str> {
        self.active_filters.get("location").map(String::as_str)
    }
}

/// One measurement row returned by the dataset backend.
///
/// Unknown extra fields in the source JSON are ignored. Every numeric
/// field is optional; callers decide how a missing value is handled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(
        default,
        alias = "float_id",
        alias = "entityId",
        deserialize_with = "deserialize_entity_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub entity_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<NaiveDate>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub depth: Option<f64>,
    #[serde(
        default,
        alias = "lat",
        deserialize_with = "deserialize_lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub latitude: Option<f64>,
    #[serde(
        default,
        alias = "lon",
        deserialize_with = "deserialize_lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub longitude: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub temperature: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub salinity: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub pressure: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub oxygen: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub chlorophyll: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub nitrate: Option<f64>,
    #[serde(
        default,
        alias = "floatCount",
        deserialize_with = "deserialize_lenient_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub float_count: Option<f64>,
}

impl Measurement {
    /// Reads a numeric field. Non-finite values count as missing.
    pub fn get(&self, field: Field) -> Option<f64> {
        let value = match field {
            Field::Temperature => self.temperature,
            Field::Salinity => self.salinity,
            Field::Pressure => self.pressure,
            Field::Oxygen => self.oxygen,
            Field::Chlorophyll => self.chlorophyll,
            Field::Nitrate => self.nitrate,
            Field::Depth => self.depth,
            Field::Latitude => self.latitude,
            Field::Longitude => self.longitude,
            Field::FloatCount => self.float_count,
        };
        value.filter(|v| v.is_finite())
    }
}

/// Accepts `"2903334"` as well as `2903334`. Any other shape is missing.
fn deserialize_entity_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp. Anything else becomes
/// `None` so a single bad date drops one row, not the whole payload.
fn deserialize_lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => parse_date(&s),
        _ => None,
    })
}

/// Accepts a number or a numeric string. Anything else becomes `None`.
fn deserialize_lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// Parses a JSON array of rows, skipping entries that are not objects.
///
/// Field-level problems never fail a row; they only leave that field
/// empty. The error case is reserved for input that is not a JSON array.
pub fn parse_measurements(json: &str) -> serde_json::Result<Vec<Measurement>> {
    let raw: Vec<Value> = serde_json::from_str(json)?;
    let total = raw.len();

    let rows: Vec<Measurement> = raw
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|value| serde_json::from_value(value).ok())
        .collect();

    if rows.len() < total {
        warn!("Skipped {} rows that are not JSON objects", total - rows.len());
    }

    Ok(rows)
}

/// Parses a calendar date from a row or a CLI flag.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
}

/// The closed set of chart kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VisualizationKind {
    Profile,
    #[serde(alias = "timeseries", alias = "time_series")]
    TimeSeries,
    Scatter,
    Heatmap,
}

impl fmt::Display for VisualizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualizationKind::Profile => write!(f, "Profile"),
            VisualizationKind::TimeSeries => write!(f, "Time Series"),
            VisualizationKind::Scatter => write!(f, "Scatter"),
            VisualizationKind::Heatmap => write!(f, "Heatmap"),
        }
    }
}

/// A chart kind together with the selectors that kind needs.
///
/// Each variant only carries what its mapper reads, so a profile can never
/// be asked for with scatter axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum VisualizationRequest {
    Profile {
        #[serde(default = "default_primary_field")]
        parameter: Field,
    },
    #[serde(alias = "timeseries")]
    TimeSeries {
        #[serde(default = "default_metrics")]
        metrics: Vec<Field>,
    },
    Scatter {
        #[serde(default = "default_primary_field")]
        x_axis: Field,
        #[serde(default = "default_y_axis")]
        y_axis: Field,
        #[serde(default = "default_color_by")]
        color_by: Field,
        #[serde(default)]
        palette: ColorPalette,
    },
    Heatmap {
        #[serde(default = "default_primary_field")]
        parameter: Field,
        #[serde(default)]
        palette: ColorPalette,
    },
}

fn default_primary_field() -> Field {
    Field::Temperature
}

fn default_y_axis() -> Field {
    Field::Salinity
}

fn default_color_by() -> Field {
    Field::Depth
}

fn default_metrics() -> Vec<Field> {
    vec![Field::Temperature, Field::Salinity]
}

impl VisualizationRequest {
    /// The default selectors for a kind.
    pub fn default_for(kind: VisualizationKind) -> Self {
        match kind {
            VisualizationKind::Profile => VisualizationRequest::Profile {
                parameter: default_primary_field(),
            },
            VisualizationKind::TimeSeries => VisualizationRequest::TimeSeries {
                metrics: default_metrics(),
            },
            VisualizationKind::Scatter => VisualizationRequest::Scatter {
                x_axis: default_primary_field(),
                y_axis: default_y_axis(),
                color_by: default_color_by(),
                palette: ColorPalette::default(),
            },
            VisualizationKind::Heatmap => VisualizationRequest::Heatmap {
                parameter: default_primary_field(),
                palette: ColorPalette::default(),
            },
        }
    }

    pub fn kind(&self) -> VisualizationKind {
        match self {
            VisualizationRequest::Profile { .. } => VisualizationKind::Profile,
            VisualizationRequest::TimeSeries { .. } => VisualizationKind::TimeSeries,
            VisualizationRequest::Scatter { .. } => VisualizationKind::Scatter,
            VisualizationRequest::Heatmap { .. } => VisualizationKind::Heatmap,
        }
    }
}

/// Geographic bounds of a backend query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// Retrieval details attached to an assistant answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_query: Option<String>,
    #[serde(default)]
    pub data_points_returned: usize,
    /// Backend execution time in milliseconds.
    #[serde(default, alias = "execution_time")]
    pub execution_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_bounds: Option<SpatialBounds>,
}

impl QueryMetadata {
    /// One-line summary for the chat transcript.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} data points", self.data_points_returned),
            format!("{}ms", self.execution_time_ms),
        ];
        if self.spatial_bounds.is_some() {
            parts.push("geospatial".to_string());
        }
        parts.join(" · ")
    }
}

/// Where a message originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSource {
    #[default]
    Text,
    MapInteraction,
    VoiceInput,
}

/// Extra context sent along with a single message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_focus: Option<SpatialFocus>,
    #[serde(default)]
    pub source: MessageSource,
}

impl MessageContext {
    /// Context for a question asked about a dropped map pin.
    pub fn map_pin(latitude: f64, longitude: f64) -> Self {
        Self {
            spatial_focus: Some(SpatialFocus {
                latitude,
                longitude,
            }),
            source: MessageSource::MapInteraction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_level_thresholds() {
        assert_eq!(ConfidenceLevel::from_score(0.95), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.8), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(0.6), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(0.59), ConfidenceLevel::Low);
        assert!(ConfidenceLevel::Low < ConfidenceLevel::High);
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("Temperature".parse::<Field>(), Ok(Field::Temperature));
        assert_eq!("float_count".parse::<Field>(), Ok(Field::FloatCount));
        assert!("bogus".parse::<Field>().is_err());
    }

    #[test]
    fn test_measurement_ignores_unknown_fields() {
        let row: Measurement = serde_json::from_str(
            r#"{"float_id": 2903334, "depth": 50, "temperature": 27.5,
                "date": "2023-03-01T12:00:00Z", "qc_flag": "A"}"#,
        )
        .unwrap();

        assert_eq!(row.entity_id.as_deref(), Some("2903334"));
        assert_eq!(row.get(Field::Depth), Some(50.0));
        assert_eq!(row.get(Field::Salinity), None);
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2023, 3, 1));
    }

    #[test]
    fn test_measurement_bad_date_is_missing() {
        let row: Measurement = serde_json::from_str(r#"{"date": "last tuesday"}"#).unwrap();
        assert_eq!(row.date, None);
    }

    #[test]
    fn test_measurement_fields_are_lenient() {
        let row: Measurement = serde_json::from_str(
            r#"{"float_id": {"wmo": 1}, "date": 20230102, "depth": "50",
                "temperature": "warm", "salinity": null, "oxygen": [1, 2],
                "latitude": " 12.5 "}"#,
        )
        .unwrap();

        assert_eq!(row.entity_id, None);
        assert_eq!(row.date, None);
        assert_eq!(row.get(Field::Depth), Some(50.0));
        assert_eq!(row.get(Field::Temperature), None);
        assert_eq!(row.get(Field::Salinity), None);
        assert_eq!(row.get(Field::Oxygen), None);
        assert_eq!(row.get(Field::Latitude), Some(12.5));
    }

    #[test]
    fn test_parse_measurements_keeps_good_rows() {
        let rows = parse_measurements(
            r#"[
                {"float_id": "A", "date": "2023-01-01", "depth": 0, "temperature": 28.0},
                {"float_id": "A", "date": 20230102, "depth": 50, "temperature": 27.0},
                "not a row",
                {"float_id": "B", "depth": "10", "temperature": 29.0}
            ]"#,
        )
        .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].date, None);
        assert_eq!(rows[1].get(Field::Temperature), Some(27.0));
        assert_eq!(rows[2].get(Field::Depth), Some(10.0));

        let spec = crate::mapping::map_kind(VisualizationKind::TimeSeries, &rows);
        assert_eq!(spec.point_count(), 1);
        assert_eq!(spec.dropped_rows(), 2);

        let spec = crate::mapping::map_kind(VisualizationKind::Profile, &rows);
        assert_eq!(spec.point_count(), 3);

        assert!(parse_measurements(r#"{"rows": []}"#).is_err());
    }

    #[test]
    fn test_measurement_non_finite_is_missing() {
        let row = Measurement {
            temperature: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(row.get(Field::Temperature), None);
    }

    #[test]
    fn test_turn_accepts_backend_field_names() {
        let turn: ConversationTurn = serde_json::from_str(
            r#"{"id": "1", "role": "assistant", "content": "Here you go",
                "timestamp": "2024-01-01T00:00:00Z", "confidence_score": 0.7,
                "visualization_spec": {"kind": "heatmap", "parameter": "salinity"}}"#,
        )
        .unwrap();

        assert_eq!(turn.text, "Here you go");
        assert_eq!(turn.confidence_level(), Some(ConfidenceLevel::Medium));
        assert_eq!(
            turn.visualization.map(|v| v.kind()),
            Some(VisualizationKind::Heatmap)
        );
    }

    #[test]
    fn test_turn_minimal_json() {
        let turns: Vec<ConversationTurn> =
            serde_json::from_str(r#"[{"role": "user", "text": "salinity near 2903334"}]"#)
                .unwrap();
        assert_eq!(turns[0].role, Role::User);
        assert!(!turns[0].id.is_empty());
        assert_eq!(turns[0].confidence_score, None);
    }

    #[test]
    fn test_visualization_request_defaults() {
        let request: VisualizationRequest =
            serde_json::from_str(r#"{"kind": "scatter"}"#).unwrap();
        assert_eq!(
            request,
            VisualizationRequest::default_for(VisualizationKind::Scatter)
        );
    }

    #[test]
    fn test_query_metadata_summary() {
        let metadata = QueryMetadata {
            data_points_returned: 120,
            execution_time_ms: 45,
            spatial_bounds: Some(SpatialBounds {
                north: 25.0,
                south: 5.0,
                east: 75.0,
                west: 50.0,
            }),
            ..Default::default()
        };
        assert_eq!(metadata.summary(), "120 data points · 45ms · geospatial");
    }

    #[test]
    fn test_query_context_location() {
        let mut context = QueryContext::default();
        assert!(context.is_empty());
        context
            .active_filters
            .insert("location".to_string(), "pacific".to_string());
        assert_eq!(context.location(), Some("pacific"));
        assert!(!context.is_empty());
    }
}
