//! Entity extraction
//!
//! Each entity type has its own rule; all rules run over the full utterance
//! regardless of intent. A final deduplication pass keeps one entity per
//! type, so no rule can suppress another type's output.

use crate::core::types::{kinds, Entity, EntitySet, EntityValue, Span};
use crate::nlu::rules::{APP_ALIASES, APP_VERBS, LOCATION_ALIASES, LOCATION_PREPOSITIONS};
use ahash::AHashMap;
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

const ALIAS_CONFIDENCE: f32 = 0.9;
const HEURISTIC_CONFIDENCE: f32 = 0.7;
const DURATION_CONFIDENCE: f32 = 0.95;
const NUMBER_CONFIDENCE: f32 = 0.95;
const DATE_CONFIDENCE: f32 = 0.8;
const UNIT_CONFIDENCE: f32 = 0.95;
const CONDITION_CONFIDENCE: f32 = 0.85;

static DURATION_PART: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d+)?|an?|one)\s*(hours?|hrs?|minutes?|mins?|seconds?|secs?)\b")
        .expect("duration pattern is valid")
});

static NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d+(?:\.\d+)?\b").expect("number pattern is valid"));

static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(day\s+after\s+tomorrow|today|tonight|tomorrow|yesterday|next\s+week|this\s+weekend|(?:next|on)\s+(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .expect("date pattern is valid")
});

static TEMPERATURE_UNIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(celsius|centigrade|fahrenheit)\b|°\s?([cf])\b|\bdegrees\s+([cf])\b")
        .expect("temperature unit pattern is valid")
});

static WEATHER_CONDITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(rain|rainy|raining|snow|snowy|snowing|sunny|sunshine|cloudy|clouds|storm|stormy|storms|fog|foggy|wind|windy)\b",
    )
    .expect("weather condition pattern is valid")
});

static LOCATION_HEURISTIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?i:{})\s+([A-Z][a-zA-Z]+(?:\s+[A-Z][a-zA-Z]+)*)",
        alternation(LOCATION_PREPOSITIONS)
    ))
    .expect("location pattern is valid")
});

static APP_HEURISTIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?i:{})\s+([A-Z][a-zA-Z0-9]*(?:\s+[A-Z][a-zA-Z0-9]*)*)",
        alternation(APP_VERBS)
    ))
    .expect("app pattern is valid")
});

/// Regex alternation over trigger phrases; inner spaces match any whitespace
fn alternation(phrases: &[&str]) -> String {
    phrases
        .iter()
        .map(|phrase| {
            phrase
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Capitalized words that look like places but are time words
const NOT_LOCATIONS: &[&str] = &[
    "today", "tonight", "tomorrow", "monday", "tuesday", "wednesday", "thursday", "friday",
    "saturday", "sunday",
];

/// Extracts typed entities from raw utterances
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    /// (lower-case alias, canonical) pairs, longest alias first
    app_aliases: Vec<(String, String)>,
    location_aliases: Vec<(String, String)>,
}

impl EntityExtractor {
    pub fn new() -> Self {
        let mut extractor = Self {
            app_aliases: Vec::new(),
            location_aliases: LOCATION_ALIASES
                .iter()
                .map(|(alias, canonical)| (alias.to_string(), canonical.to_string()))
                .collect(),
        };
        for (alias, canonical) in APP_ALIASES {
            extractor.add_alias(alias, canonical);
        }
        sort_longest_first(&mut extractor.location_aliases);
        extractor
    }

    /// Build an extractor with extra application aliases
    pub fn with_aliases(custom: &AHashMap<String, String>) -> Self {
        let mut extractor = Self::new();
        // Sorted so the resulting table does not depend on hash order
        let mut custom: Vec<_> = custom.iter().collect();
        custom.sort();
        for (alias, canonical) in custom {
            extractor.add_alias(alias, canonical);
        }
        extractor
    }

    /// Add or replace an application alias
    pub fn add_alias(&mut self, alias: &str, canonical: &str) {
        let alias = alias.trim().to_ascii_lowercase();
        if alias.is_empty() {
            return;
        }
        self.app_aliases.retain(|(existing, _)| *existing != alias);
        self.app_aliases.push((alias, canonical.to_string()));
        sort_longest_first(&mut self.app_aliases);
        tracing::debug!("Registered app alias table of {} entries", self.app_aliases.len());
    }

    pub fn app_aliases(&self) -> &[(String, String)] {
        &self.app_aliases
    }

    /// Extract entities, resolving relative dates against the local date
    pub fn extract(&self, text: &str) -> EntitySet {
        self.extract_at(text, Local::now().date_naive())
    }

    /// Extract entities, resolving relative dates against `today`
    pub fn extract_at(&self, text: &str, today: NaiveDate) -> EntitySet {
        let mut raw = Vec::new();
        raw.extend(self.extract_locations(text));
        raw.extend(extract_dates(text, today));
        let durations = extract_durations(text);
        let duration_spans: Vec<Span> = durations.iter().filter_map(|e| e.span).collect();
        raw.extend(durations);
        raw.extend(self.extract_app_names(text));
        raw.extend(extract_numbers(text, &duration_spans));
        raw.extend(extract_temperature_units(text));
        raw.extend(extract_weather_conditions(text));

        let entities = deduplicate(raw);
        tracing::debug!(
            "Extracted {} entities: {:?}",
            entities.len(),
            entities.iter().map(|e| e.entity_type.as_str()).collect::<Vec<_>>()
        );
        EntitySet::from(entities)
    }

    fn extract_locations(&self, text: &str) -> Vec<Entity> {
        let mut entities = alias_matches(text, &self.location_aliases, kinds::LOCATION);
        let alias_spans: Vec<Span> = entities.iter().filter_map(|e| e.span).collect();

        for caps in LOCATION_HEURISTIC.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let span = Span::new(m.start(), m.end());
            if alias_spans.iter().any(|s| s.overlaps(&span)) {
                continue;
            }
            if NOT_LOCATIONS.contains(&m.as_str().to_ascii_lowercase().as_str()) {
                continue;
            }
            entities.push(
                Entity::new(kinds::LOCATION, m.as_str(), m.as_str(), HEURISTIC_CONFIDENCE)
                    .with_span(span.start, span.end),
            );
        }
        entities
    }

    fn extract_app_names(&self, text: &str) -> Vec<Entity> {
        let mut entities = alias_matches(text, &self.app_aliases, kinds::APP_NAME);
        let alias_spans: Vec<Span> = entities.iter().filter_map(|e| e.span).collect();

        for caps in APP_HEURISTIC.captures_iter(text) {
            let Some(m) = caps.get(1) else { continue };
            let span = Span::new(m.start(), m.end());
            if m.as_str().len() < 2 || alias_spans.iter().any(|s| s.overlaps(&span)) {
                continue;
            }
            entities.push(
                Entity::new(kinds::APP_NAME, m.as_str(), m.as_str(), HEURISTIC_CONFIDENCE)
                    .with_span(span.start, span.end),
            );
        }
        entities
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep the highest-confidence entity per type; ties keep the first found
///
/// Output keeps the order in which each type first appeared.
pub fn deduplicate(entities: Vec<Entity>) -> Vec<Entity> {
    let mut kept: Vec<Entity> = Vec::with_capacity(entities.len());
    let mut by_type: AHashMap<String, usize> = AHashMap::new();

    for entity in entities {
        match by_type.get(&entity.entity_type) {
            Some(&idx) => {
                if entity.confidence > kept[idx].confidence {
                    kept[idx] = entity;
                }
            }
            None => {
                by_type.insert(entity.entity_type.clone(), kept.len());
                kept.push(entity);
            }
        }
    }
    kept
}

fn sort_longest_first(aliases: &mut [(String, String)]) {
    aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
}

/// Case-insensitive whole-word alias search; longer aliases claim spans first
fn alias_matches(text: &str, aliases: &[(String, String)], entity_type: &str) -> Vec<Entity> {
    // ASCII lower-casing keeps byte offsets aligned with `text`
    let haystack = text.to_ascii_lowercase();
    let mut found: Vec<Entity> = Vec::new();

    for (alias, canonical) in aliases {
        let mut from = 0;
        while let Some(pos) = haystack[from..].find(alias.as_str()) {
            let start = from + pos;
            let end = start + alias.len();
            from = end;

            if !is_word_boundary(&haystack, start, end) {
                continue;
            }
            let span = Span::new(start, end);
            if found.iter().filter_map(|e| e.span).any(|s| s.overlaps(&span)) {
                continue;
            }
            found.push(
                Entity::new(entity_type, canonical.as_str(), &text[start..end], ALIAS_CONFIDENCE)
                    .with_span(start, end),
            );
        }
    }

    found.sort_by_key(|e| e.span.map(|s| s.start));
    found
}

fn is_word_boundary(haystack: &str, start: usize, end: usize) -> bool {
    let before = haystack[..start].chars().next_back();
    let after = haystack[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// Adjacent unit phrases ("1 hour 30 minutes") merge into one duration
fn extract_durations(text: &str) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut group: Option<(usize, usize, u64)> = None;

    for caps in DURATION_PART.captures_iter(text) {
        let (Some(whole), Some(amount), Some(unit)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if follows_digit_separator(text, whole.start()) {
            continue;
        }
        let Some(seconds) = part_seconds(amount.as_str(), unit.as_str()) else {
            continue;
        };

        group = match group {
            Some((start, end, total)) if joins(&text[end..whole.start()]) => {
                match total.checked_add(seconds) {
                    Some(sum) => Some((start, whole.end(), sum)),
                    None => Some((start, end, total)),
                }
            }
            Some(finished) => {
                entities.extend(duration_entity(text, finished));
                Some((whole.start(), whole.end(), seconds))
            }
            None => Some((whole.start(), whole.end(), seconds)),
        };
    }
    if let Some(finished) = group {
        entities.extend(duration_entity(text, finished));
    }
    entities
}

fn joins(gap: &str) -> bool {
    let gap = gap.trim().trim_matches(',').trim();
    gap.is_empty() || gap.eq_ignore_ascii_case("and")
}

fn part_seconds(amount: &str, unit: &str) -> Option<u64> {
    let unit = unit.to_ascii_lowercase();
    let multiplier: u64 = if unit.starts_with('h') {
        3600
    } else if unit.starts_with('m') {
        60
    } else {
        1
    };
    match amount.to_ascii_lowercase().as_str() {
        "a" | "an" | "one" => Some(multiplier),
        fraction if fraction.contains('.') => {
            let seconds = (fraction.parse::<f64>().ok()? * multiplier as f64).round();
            (seconds.is_finite() && seconds < u64::MAX as f64).then_some(seconds as u64)
        }
        digits => digits.parse::<u64>().ok()?.checked_mul(multiplier),
    }
}

/// "1,5 hours" or "v2.5 hours": the amount is the tail of a larger token
fn follows_digit_separator(text: &str, start: usize) -> bool {
    let mut before = text[..start].chars().rev();
    matches!(before.next(), Some('.' | ','))
        && before.next().is_some_and(|c| c.is_ascii_digit())
}

fn duration_entity(text: &str, (start, end, seconds): (usize, usize, u64)) -> Option<Entity> {
    if seconds == 0 {
        return None;
    }
    let seconds = i64::try_from(seconds).ok()?;
    Some(
        Entity::new(kinds::DURATION, seconds, &text[start..end], DURATION_CONFIDENCE)
            .with_span(start, end),
    )
}

/// Bare numbers outside any duration phrase
fn extract_numbers(text: &str, duration_spans: &[Span]) -> Vec<Entity> {
    NUMBER
        .find_iter(text)
        .filter(|m| {
            let span = Span::new(m.start(), m.end());
            !duration_spans.iter().any(|s| s.overlaps(&span))
        })
        .filter_map(|m| {
            let raw = m.as_str();
            let value = if raw.contains('.') {
                EntityValue::Float(raw.parse().ok()?)
            } else {
                match raw.parse::<i64>() {
                    Ok(n) => EntityValue::Integer(n),
                    Err(_) => EntityValue::Float(raw.parse().ok()?),
                }
            };
            Some(
                Entity::new(kinds::NUMBER, value, raw, NUMBER_CONFIDENCE)
                    .with_span(m.start(), m.end()),
            )
        })
        .collect()
}

fn extract_dates(text: &str, today: NaiveDate) -> Vec<Entity> {
    DATE.find_iter(text)
        .filter_map(|m| {
            let date = resolve_date(m.as_str(), today)?;
            Some(
                Entity::new(kinds::DATE, EntityValue::Date(date), m.as_str(), DATE_CONFIDENCE)
                    .with_span(m.start(), m.end()),
            )
        })
        .collect()
}

/// Resolve a relative date expression to a calendar date
fn resolve_date(expression: &str, today: NaiveDate) -> Option<NaiveDate> {
    let expr = expression.to_ascii_lowercase();
    let words: Vec<&str> = expr.split_whitespace().collect();
    let offset = match words.as_slice() {
        ["today"] | ["tonight"] => 0,
        ["tomorrow"] => 1,
        ["day", "after", "tomorrow"] => 2,
        ["yesterday"] => -1,
        ["next", "week"] => 7,
        ["this", "weekend"] => days_until(today, Weekday::Sat, false),
        ["next", day] => days_until(today, parse_weekday(day)?, true),
        ["on", day] | [day] => days_until(today, parse_weekday(day)?, false),
        _ => return None,
    };
    today.checked_add_signed(Duration::days(offset))
}

fn days_until(today: NaiveDate, target: Weekday, strictly_after: bool) -> i64 {
    let from = i64::from(today.weekday().num_days_from_monday());
    let to = i64::from(target.num_days_from_monday());
    let diff = (to - from).rem_euclid(7);
    if diff == 0 && strictly_after {
        7
    } else {
        diff
    }
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    Some(match name {
        "monday" => Weekday::Mon,
        "tuesday" => Weekday::Tue,
        "wednesday" => Weekday::Wed,
        "thursday" => Weekday::Thu,
        "friday" => Weekday::Fri,
        "saturday" => Weekday::Sat,
        "sunday" => Weekday::Sun,
        _ => return None,
    })
}

fn extract_temperature_units(text: &str) -> Vec<Entity> {
    TEMPERATURE_UNIT
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let unit = (1..=3).find_map(|i| caps.get(i))?.as_str().to_ascii_lowercase();
            let system = match unit.as_str() {
                "celsius" | "centigrade" | "c" => "metric",
                "fahrenheit" | "f" => "imperial",
                _ => return None,
            };
            Some(
                Entity::new(kinds::TEMPERATURE_UNIT, system, whole.as_str(), UNIT_CONFIDENCE)
                    .with_span(whole.start(), whole.end()),
            )
        })
        .collect()
}

fn extract_weather_conditions(text: &str) -> Vec<Entity> {
    WEATHER_CONDITION
        .find_iter(text)
        .filter_map(|m| {
            let word = m.as_str().to_ascii_lowercase();
            let condition = ["rain", "snow", "sun", "cloud", "storm", "fog", "wind"]
                .into_iter()
                .find(|stem| word.starts_with(stem))?;
            let condition = match condition {
                "sun" => "sunny",
                "cloud" => "cloudy",
                other => other,
            };
            Some(
                Entity::new(kinds::WEATHER_CONDITION, condition, m.as_str(), CONDITION_CONFIDENCE)
                    .with_span(m.start(), m.end()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-10-18 is a Sunday
    fn extract(text: &str) -> EntitySet {
        EntityExtractor::new().extract_at(text, day(2026, 10, 18))
    }

    #[test]
    fn test_combined_duration_sums_to_seconds() {
        let entities = extract("set a timer for 1 hour 30 minutes");
        let durations: Vec<_> = entities
            .iter()
            .filter(|e| e.entity_type == kinds::DURATION)
            .collect();
        assert_eq!(durations.len(), 1);
        assert_eq!(durations[0].value, EntityValue::Integer(5400));
        assert_eq!(durations[0].text, "1 hour 30 minutes");
    }

    #[test]
    fn test_duration_with_and() {
        let entities = extract("remind me in 2 minutes and 15 seconds");
        assert_eq!(entities.value(kinds::DURATION), Some(&EntityValue::Integer(135)));
    }

    #[test]
    fn test_simple_duration_is_not_a_number() {
        let entities = extract("set a timer for 5 minutes");
        assert_eq!(entities.value(kinds::DURATION), Some(&EntityValue::Integer(300)));
        assert!(!entities.has(kinds::NUMBER));
    }

    #[test]
    fn test_fractional_duration_converts_to_whole_seconds() {
        let entities = extract("set a timer for 1.5 hours");
        assert_eq!(entities.value(kinds::DURATION), Some(&EntityValue::Integer(5400)));
        assert!(!entities.has(kinds::NUMBER));

        let entities = extract("set a timer for 2.5 minutes");
        assert_eq!(entities.value(kinds::DURATION), Some(&EntityValue::Integer(150)));
    }

    #[test]
    fn test_duration_tail_of_larger_number_is_ignored() {
        let entities = extract("set a timer for 1,5 hours");
        assert!(!entities.has(kinds::DURATION));
    }

    #[test]
    fn test_an_hour() {
        let entities = extract("wake me in an hour");
        assert_eq!(entities.value(kinds::DURATION), Some(&EntityValue::Integer(3600)));
    }

    #[test]
    fn test_bare_number_is_number_not_duration() {
        let entities = extract("set the volume to 7");
        assert_eq!(entities.value(kinds::NUMBER), Some(&EntityValue::Integer(7)));
        assert!(!entities.has(kinds::DURATION));
    }

    #[test]
    fn test_float_number() {
        let entities = extract("convert 2.5 please");
        assert_eq!(entities.value(kinds::NUMBER), Some(&EntityValue::Float(2.5)));
    }

    #[test]
    fn test_location_heuristic() {
        let entities = extract("What's the weather in New York tomorrow");
        let location = entities.get(kinds::LOCATION).unwrap();
        assert_eq!(location.value, EntityValue::from("New York"));
        assert!((location.confidence - HEURISTIC_CONFIDENCE).abs() < 1e-6);
        assert_eq!(location.span, Some(Span::new(22, 30)));
    }

    #[test]
    fn test_location_alias_beats_heuristic() {
        let entities = extract("weather in NYC please");
        let location = entities.get(kinds::LOCATION).unwrap();
        assert_eq!(location.value, EntityValue::from("New York"));
        assert!((location.confidence - ALIAS_CONFIDENCE).abs() < 1e-6);
    }

    #[test]
    fn test_time_words_are_not_locations() {
        let entities = extract("weather for Tomorrow");
        assert!(!entities.has(kinds::LOCATION));
        assert!(entities.has(kinds::DATE));
    }

    #[test]
    fn test_app_alias_lookup() {
        let entities = extract("open chrome");
        assert_eq!(entities.text_value(kinds::APP_NAME), Some("Google Chrome"));
    }

    #[test]
    fn test_app_alias_short_circuits_heuristic() {
        let entities = extract("Open Slack");
        let app = entities.get(kinds::APP_NAME).unwrap();
        assert_eq!(app.value, EntityValue::from("Slack"));
        assert!((app.confidence - ALIAS_CONFIDENCE).abs() < 1e-6);
    }

    #[test]
    fn test_app_heuristic_for_unknown_app() {
        let entities = extract("launch Blender");
        assert_eq!(entities.text_value(kinds::APP_NAME), Some("Blender"));
    }

    #[test]
    fn test_every_trigger_phrase_is_recognised() {
        for verb in APP_VERBS {
            let entities = extract(&format!("please {} Blender", verb));
            assert_eq!(entities.text_value(kinds::APP_NAME), Some("Blender"), "verb {:?}", verb);
        }
        for preposition in LOCATION_PREPOSITIONS {
            let entities = extract(&format!("weather {} Springfield", preposition));
            assert_eq!(
                entities.text_value(kinds::LOCATION),
                Some("Springfield"),
                "preposition {:?}",
                preposition
            );
        }
        let entities = extract("switch   to Blender");
        assert_eq!(entities.text_value(kinds::APP_NAME), Some("Blender"));
    }

    #[test]
    fn test_alias_requires_word_boundary() {
        let entities = extract("decode this message");
        assert!(!entities.has(kinds::APP_NAME));
    }

    #[test]
    fn test_custom_alias() {
        let mut custom = AHashMap::new();
        custom.insert("ide".to_string(), "IntelliJ IDEA".to_string());
        let extractor = EntityExtractor::with_aliases(&custom);
        let entities = extractor.extract_at("open my IDE", day(2026, 10, 18));
        assert_eq!(entities.text_value(kinds::APP_NAME), Some("IntelliJ IDEA"));
    }

    #[test]
    fn test_relative_dates() {
        let today = day(2026, 10, 18);
        assert_eq!(resolve_date("tomorrow", today), Some(day(2026, 10, 19)));
        assert_eq!(resolve_date("yesterday", today), Some(day(2026, 10, 17)));
        assert_eq!(resolve_date("day after  tomorrow", today), Some(day(2026, 10, 20)));
        assert_eq!(resolve_date("this weekend", today), Some(day(2026, 10, 24)));
        assert_eq!(resolve_date("on Friday", today), Some(day(2026, 10, 23)));
        assert_eq!(resolve_date("next sunday", today), Some(day(2026, 10, 25)));
        assert_eq!(resolve_date("sunday", today), Some(today));
    }

    #[test]
    fn test_date_entity_value() {
        let entities = extract("what about tomorrow");
        assert_eq!(entities.value(kinds::DATE), Some(&EntityValue::Date(day(2026, 10, 19))));
    }

    #[test]
    fn test_temperature_units() {
        assert_eq!(extract("in fahrenheit").text_value(kinds::TEMPERATURE_UNIT), Some("imperial"));
        assert_eq!(
            extract("show it in Celsius").text_value(kinds::TEMPERATURE_UNIT),
            Some("metric")
        );
        assert_eq!(extract("is it 20 °C").text_value(kinds::TEMPERATURE_UNIT), Some("metric"));
    }

    #[test]
    fn test_weather_condition_stems() {
        assert_eq!(extract("is it raining").text_value(kinds::WEATHER_CONDITION), Some("rain"));
        assert_eq!(extract("will it be sunny").text_value(kinds::WEATHER_CONDITION), Some("sunny"));
        assert_eq!(extract("so windy today").text_value(kinds::WEATHER_CONDITION), Some("wind"));
    }

    #[test]
    fn test_deduplicate_keeps_highest_confidence() {
        let entities = vec![
            Entity::new(kinds::LOCATION, "Lyon", "Lyon", 0.6),
            Entity::new(kinds::NUMBER, 3i64, "3", 0.95),
            Entity::new(kinds::LOCATION, "Paris", "Paris", 0.9),
        ];
        let kept = deduplicate(entities);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].value, EntityValue::from("Paris"));
        assert_eq!(kept[1].entity_type, kinds::NUMBER);
    }

    #[test]
    fn test_deduplicate_tie_keeps_first() {
        let entities = vec![
            Entity::new(kinds::APP_NAME, "Slack", "slack", 0.9),
            Entity::new(kinds::APP_NAME, "Zoom", "zoom", 0.9),
        ];
        let kept = deduplicate(entities);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].value, EntityValue::from("Slack"));
    }

    #[test]
    fn test_malformed_input_never_panics() {
        for text in [
            "",
            "   ",
            "99999999999999999999999 hours",
            "°",
            "in ",
            "ÉÉÉ in Ärger",
            "1 hour 99999999999999999999 minutes",
        ] {
            let _ = extract(text);
        }
    }
}
