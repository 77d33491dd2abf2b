//! Derives a [`QueryContext`] from recent user turns.

use super::keywords::{location_in, parameters_in};
use crate::models::{ConversationTurn, QueryContext, Role, SpatialFocus, TemporalFocus};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Number of user turns considered when no window is configured.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

static ENTITY_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-9]{7}\b").expect("entity id pattern is valid"));

static MONTH_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+((?:19|20)[0-9]{2})\b",
    )
    .expect("month/year pattern is valid")
});

static BARE_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(?:in|during|for|of)\s+((?:19|20)[0-9]{2})\b").expect("year pattern is valid")
});

static COORDINATES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b([0-9]{1,2}(?:\.[0-9]+)?)\s*°?\s*([ns])\b[\s,/]*([0-9]{1,3}(?:\.[0-9]+)?)\s*°?\s*([ew])\b",
    )
    .expect("coordinate pattern is valid")
});

/// Extracts query context with a fixed window size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextExtractor {
    window_size: usize,
}

impl Default for ContextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl ContextExtractor {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn extract(&self, turns: &[ConversationTurn]) -> QueryContext {
        extract(turns, self.window_size)
    }
}

/// Builds a fresh [`QueryContext`] from the last `window_size` user turns.
///
/// Parameters keep the order they were first seen in. Location, time and
/// coordinates are last-write-wins across the window.
pub fn extract(turns: &[ConversationTurn], window_size: usize) -> QueryContext {
    let user_turns: Vec<&ConversationTurn> =
        turns.iter().filter(|t| t.role == Role::User).collect();
    let window = &user_turns[user_turns.len().saturating_sub(window_size)..];

    let mut context = QueryContext::default();

    for turn in window {
        let text = turn.text.to_lowercase();

        for parameter in parameters_in(&text) {
            if !context.preferred_parameters.contains(&parameter) {
                context.preferred_parameters.push(parameter);
            }
        }

        context
            .recent_entity_ids
            .extend(ENTITY_ID.find_iter(&text).map(|m| m.as_str().to_string()));

        if let Some(location) = location_in(&text) {
            context
                .active_filters
                .insert("location".to_string(), location.to_string());
        }

        if let Some(period) = temporal_focus_in(&text) {
            context.temporal_focus = Some(period);
        }

        if let Some(point) = spatial_focus_in(&text) {
            context.spatial_focus = Some(point);
        }
    }

    debug!(
        "Extracted context from {} of {} user turns: {} parameters, {} entity ids",
        window.len(),
        user_turns.len(),
        context.preferred_parameters.len(),
        context.recent_entity_ids.len()
    );

    context
}

/// A named month with a year wins over a bare year in the same turn.
fn temporal_focus_in(text: &str) -> Option<TemporalFocus> {
    let month_match = MONTH_YEAR.captures_iter(text).filter_map(|caps| {
        let month = month_number(&caps[1])?;
        let year = caps[2].parse::<i32>().ok()?;
        month_window(year, month)
    });
    if let Some(period) = month_match.last() {
        return Some(period);
    }

    BARE_YEAR
        .captures_iter(text)
        .filter_map(|caps| {
            let year = caps[1].parse::<i32>().ok()?;
            Some(TemporalFocus {
                start: NaiveDate::from_ymd_opt(year, 1, 1)?,
                end: NaiveDate::from_ymd_opt(year, 12, 31)?,
            })
        })
        .last()
}

fn month_number(name: &str) -> Option<u32> {
    let month = match &name[..3] {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn month_window(year: i32, month: u32) -> Option<TemporalFocus> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some(TemporalFocus {
        start,
        end: next.pred_opt()?,
    })
}

fn spatial_focus_in(text: &str) -> Option<SpatialFocus> {
    COORDINATES
        .captures_iter(text)
        .filter_map(|caps| {
            let lat = caps[1].parse::<f64>().ok()?;
            let lon = caps[3].parse::<f64>().ok()?;
            if lat > 90.0 || lon > 180.0 {
                return None;
            }
            Some(SpatialFocus {
                latitude: if &caps[2] == "s" { -lat } else { lat },
                longitude: if &caps[4] == "w" { -lon } else { lon },
            })
        })
        .last()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Parameter;
    use proptest::prelude::*;

    fn user_turns(texts: &[&str]) -> Vec<ConversationTurn> {
        texts.iter().map(|t| ConversationTurn::user(*t)).collect()
    }

    #[test]
    fn test_extracts_parameters_and_location() {
        let turns = user_turns(&["Show me temperature near the equator", "and salinity too"]);
        let context = extract(&turns, DEFAULT_WINDOW_SIZE);

        assert_eq!(
            context.preferred_parameters,
            vec![Parameter::Temperature, Parameter::Salinity]
        );
        assert_eq!(context.location(), Some("equator"));
    }

    #[test]
    fn test_fixture_conversation() {
        let turns: Vec<ConversationTurn> =
            serde_json::from_str(include_str!("../../fixtures/turns.json")).unwrap();
        let context = extract(&turns, DEFAULT_WINDOW_SIZE);

        assert_eq!(
            context.preferred_parameters,
            vec![Parameter::Temperature, Parameter::Salinity, Parameter::Oxygen]
        );
        assert_eq!(context.recent_entity_ids, vec!["2903334"]);
        assert_eq!(context.location(), Some("arabian sea"));
        assert_eq!(
            context.spatial_focus,
            Some(SpatialFocus {
                latitude: 12.5,
                longitude: 65.0
            })
        );
        assert_eq!(
            context.temporal_focus.map(|t| (t.start, t.end)),
            Some((
                NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 3, 31).unwrap()
            ))
        );
    }

    #[test]
    fn test_parameters_are_not_duplicated() {
        let turns = user_turns(&["TEMP profiles", "thermal structure and temperature"]);
        let context = extract(&turns, DEFAULT_WINDOW_SIZE);
        assert_eq!(context.preferred_parameters, vec![Parameter::Temperature]);
    }

    #[test]
    fn test_entity_ids_keep_order_and_duplicates() {
        let turns = user_turns(&[
            "compare 2903334 with 2903335",
            "back to 2903334 please, not 12345678 or 123456",
        ]);
        let context = extract(&turns, DEFAULT_WINDOW_SIZE);
        assert_eq!(
            context.recent_entity_ids,
            vec!["2903334", "2903335", "2903334"]
        );
    }

    #[test]
    fn test_entity_ids_are_ascii_digits() {
        let turns = user_turns(&["float ٢٩٠٣٣٣٤ please", "float ２９０３３３４ too"]);
        let context = extract(&turns, DEFAULT_WINDOW_SIZE);
        assert!(context.recent_entity_ids.is_empty());

        let turns = user_turns(&["float ٢٩٠٣٣٣٤ or 2903334"]);
        let context = extract(&turns, DEFAULT_WINDOW_SIZE);
        assert_eq!(context.recent_entity_ids, vec!["2903334"]);

        assert_eq!(temporal_focus_in("anomalies during ٢٠٢١"), None);
        assert_eq!(spatial_focus_in("١٠n ٢٠e"), None);
    }

    #[test]
    fn test_location_last_write_wins() {
        let turns = user_turns(&["anything in the arabian sea?", "now the atlantic"]);
        let context = extract(&turns, DEFAULT_WINDOW_SIZE);
        assert_eq!(context.location(), Some("atlantic"));
    }

    #[test]
    fn test_only_user_turns_count() {
        let turns = vec![
            ConversationTurn::user("oxygen levels"),
            ConversationTurn::assistant("Here is temperature data for the pacific", 0.9),
        ];
        let context = extract(&turns, DEFAULT_WINDOW_SIZE);
        assert_eq!(context.preferred_parameters, vec![Parameter::Oxygen]);
        assert_eq!(context.location(), None);
    }

    #[test]
    fn test_window_forgets_old_turns() {
        let turns = user_turns(&["nitrate", "temp", "salt"]);
        let context = extract(&turns, 2);
        assert_eq!(
            context.preferred_parameters,
            vec![Parameter::Temperature, Parameter::Salinity]
        );
        assert!(extract(&turns, 0).is_empty());
    }

    #[test]
    fn test_month_and_year() {
        let turns = user_turns(&["salinity profiles near the equator in March 2023"]);
        let context = extract(&turns, DEFAULT_WINDOW_SIZE);
        assert_eq!(
            context.temporal_focus,
            Some(TemporalFocus {
                start: NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2023, 3, 31).unwrap(),
            })
        );
    }

    #[test]
    fn test_december_and_bare_year() {
        assert_eq!(
            temporal_focus_in("floats deployed dec 2022").map(|p| p.end),
            NaiveDate::from_ymd_opt(2022, 12, 31)
        );
        assert_eq!(
            temporal_focus_in("anomalies during 2021").map(|p| (p.start, p.end)),
            Some((
                NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 12, 31).unwrap()
            ))
        );
        assert_eq!(temporal_focus_in("float 2903334"), None);
    }

    #[test]
    fn test_coordinates() {
        let turns = user_turns(&["what is at 12.5N 65E", "or rather 10s, 30.25w"]);
        let context = extract(&turns, DEFAULT_WINDOW_SIZE);
        assert_eq!(
            context.spatial_focus,
            Some(SpatialFocus {
                latitude: -10.0,
                longitude: -30.25
            })
        );
        assert_eq!(spatial_focus_in("95n 10e"), None);
    }

    #[test]
    fn test_extractor_uses_configured_window() {
        let extractor = ContextExtractor::new(1);
        let turns = user_turns(&["temperature", "salinity"]);
        assert_eq!(
            extractor.extract(&turns).preferred_parameters,
            vec![Parameter::Salinity]
        );
        assert_eq!(ContextExtractor::default().window_size(), DEFAULT_WINDOW_SIZE);
    }

    const PHRASES: &[&str] = &[
        "temperature",
        "salt",
        "depth",
        "o2 near the equator",
        "float 2903334",
        "chl in the pacific",
        "nutrients during 2020",
        "hello",
        "12n 70e",
        "subtropical nitrate",
    ];

    fn turn_texts() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            prop::collection::vec(prop::sample::select(PHRASES), 1..3).prop_map(|p| p.join(" ")),
            0..12,
        )
    }

    proptest! {
        #[test]
        fn prop_extract_is_idempotent(texts in turn_texts(), window in 0usize..8) {
            let turns: Vec<ConversationTurn> =
                texts.iter().map(|t| ConversationTurn::user(t.as_str())).collect();
            prop_assert_eq!(extract(&turns, window), extract(&turns, window));
        }

        #[test]
        fn prop_turns_outside_window_are_ignored(
            texts in turn_texts(),
            older in "[a-z0-9 ]{0,30}",
            window in 1usize..6,
        ) {
            let turns: Vec<ConversationTurn> =
                texts.iter().map(|t| ConversationTurn::user(t.as_str())).collect();
            prop_assume!(turns.len() >= window);

            let mut with_older = vec![ConversationTurn::user(older)];
            with_older.extend(turns.iter().cloned());

            prop_assert_eq!(
                extract(&with_older, window).preferred_parameters,
                extract(&turns, window).preferred_parameters
            );
        }
    }
}
