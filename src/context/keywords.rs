//! Keyword tables used by the extractor.
//!
//! All entries are lowercase; matching is substring containment on
//! case-folded text.

use crate::models::Parameter;

/// Canonical parameter ← surface synonyms, in detection order.
pub const PARAMETER_SYNONYMS: &[(Parameter, &[&str])] = &[
    (Parameter::Temperature, &["temperature", "temp", "thermal"]),
    (Parameter::Salinity, &["salinity", "salt", "psu"]),
    (Parameter::Pressure, &["pressure", "depth"]),
    (Parameter::Oxygen, &["oxygen", "o2", "dissolved oxygen"]),
    (Parameter::Chlorophyll, &["chlorophyll", "chl", "phyto"]),
    (Parameter::Nitrate, &["nitrate", "no3", "nutrients"]),
];

/// Known region phrases. Within one turn a later entry overrides an
/// earlier one, so `subtropical` beats the `tropical` it contains.
pub const LOCATION_GAZETTEER: &[&str] = &[
    "arabian sea",
    "indian ocean",
    "pacific",
    "atlantic",
    "equator",
    "tropical",
    "subtropical",
];

/// Parameters whose synonyms occur in `text` (already lowercased).
pub fn parameters_in(text: &str) -> impl Iterator<Item = Parameter> + '_ {
    PARAMETER_SYNONYMS
        .iter()
        .filter(move |(_, synonyms)| synonyms.iter().any(|s| text.contains(s)))
        .map(|(parameter, _)| *parameter)
}

/// The winning gazetteer phrase for `text` (already lowercased).
pub fn location_in(text: &str) -> Option<&'static str> {
    LOCATION_GAZETTEER
        .iter()
        .rev()
        .copied()
        .find(|phrase| text.contains(phrase))
}
