use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::{self, Deserializer, IgnoredAny, Visitor};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

use super::types::{Category, Listing, TriState};

/// Any shape an extractor might put into a numeric field.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

/// Parse a human-formatted number such as "1.200 €", "85,5 m²" or "3".
///
/// Takes the first run of digits and separators. A separator followed by
/// groups of exactly three digits is a thousands separator; otherwise the last
/// separator is the decimal point.
pub fn parse_loose_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let run: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    let run = run.trim_end_matches(['.', ',']);

    let last_sep = run.rfind(['.', ',']);
    let normalized = match last_sep {
        None => run.to_string(),
        Some(pos) => {
            let groups: Vec<&str> = run.split(['.', ',']).collect();
            let mixed = run.contains('.') && run.contains(',');
            let all_thousands = groups.iter().skip(1).all(|g| g.len() == 3);
            if !mixed && all_thousands {
                groups.concat()
            } else {
                let (int_part, frac_part) = run.split_at(pos);
                let int_digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
                format!("{}.{}", int_digits, &frac_part[1..])
            }
        }
    };

    let value: f64 = normalized.parse().ok()?;
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

fn sanitize(value: f64) -> Option<f64> {
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Deserialize an optional amount; malformed input becomes `None`.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Loose>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Loose::Number(n)) => sanitize(n),
        Some(Loose::Text(s)) => parse_loose_number(&s).and_then(sanitize),
        Some(Loose::Other(_)) | None => None,
    })
}

/// Deserialize an optional count (rooms, bathrooms, roommates).
pub fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_number(deserializer)?;
    Ok(value
        .filter(|v| *v <= u32::MAX as f64)
        .map(|v| v.round() as u32))
}

fn sanitize_score(value: Option<f64>) -> u8 {
    value.map_or(0, |v| v.round().min(100.0) as u8)
}

/// Deserialize a stored score, clamped to 0–100.
pub fn lenient_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(sanitize_score(lenient_number(deserializer)?))
}

/// Strings or numbers, as extractors emit them for text and labels.
#[derive(Deserialize)]
#[serde(untagged)]
enum LooseText {
    Text(String),
    Integer(i64),
    Number(f64),
    Other(IgnoredAny),
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Deserialize free text (title, url, orientation, ...); anything that is not
/// a non-empty string becomes `None`.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseText>::deserialize(deserializer)? {
        Some(LooseText::Text(s)) => non_empty(&s),
        _ => None,
    })
}

/// Deserialize a short label that may arrive as a number, e.g. a floor of
/// `3` or `"3º"`. Numbers are kept as their text.
pub fn lenient_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseText>::deserialize(deserializer)? {
        Some(LooseText::Text(s)) => non_empty(&s),
        Some(LooseText::Integer(n)) => Some(n.to_string()),
        Some(LooseText::Number(n)) if n.is_finite() => Some(n.to_string()),
        _ => None,
    })
}

/// Deserialize the listing id. The only field that must be present; an
/// integer id is accepted as its text.
pub fn listing_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match LooseText::deserialize(deserializer)? {
        LooseText::Text(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        LooseText::Integer(n) => Ok(n.to_string()),
        _ => Err(de::Error::custom("listing id must be a non-empty string or integer")),
    }
}

fn category_from_str(text: &str) -> Option<Category> {
    match text.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
        "dwelling" | "flat" | "apartment" | "house" | "piso" | "vivienda" => {
            Some(Category::Dwelling)
        }
        "room-share" | "roomshare" | "room" | "habitacion" | "habitación" => {
            Some(Category::RoomShare)
        }
        _ => None,
    }
}

/// Deserialize a category; anything unrecognized is a dwelling.
pub fn lenient_category<'de, D>(deserializer: D) -> Result<Category, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseText>::deserialize(deserializer)? {
        Some(LooseText::Text(s)) => category_from_str(&s).unwrap_or_else(|| {
            tracing::warn!(value = %s, "unknown listing category, treating as dwelling");
            Category::default()
        }),
        _ => Category::default(),
    })
}

/// Parse a timestamp: RFC 3339, a naive date-time (taken as UTC), or a bare
/// date (`2024-03-09` or `09/03/2024`) at midnight UTC.
pub fn parse_loose_datetime(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    ["%Y-%m-%d", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Deserialize an optional timestamp; unparseable text becomes `None`.
/// Integers are Unix seconds.
pub fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseText>::deserialize(deserializer)? {
        Some(LooseText::Text(s)) => parse_loose_datetime(&s),
        Some(LooseText::Integer(secs)) => DateTime::from_timestamp(secs, 0),
        _ => None,
    })
}

/// Like [`lenient_datetime`], falling back to now.
pub fn lenient_created_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_datetime(deserializer)?.unwrap_or_else(Utc::now))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseAmenities {
    Flags(BTreeMap<String, TriState>),
    Names(Vec<LooseText>),
    Other(IgnoredAny),
}

/// `"Air conditioning"` -> `air_conditioning`
fn amenity_key(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

/// Deserialize amenities from a map of flags or a plain list of names (each
/// listed name is present). Anything else is treated as no information.
pub fn lenient_amenities<'de, D>(deserializer: D) -> Result<BTreeMap<String, TriState>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<LooseAmenities>::deserialize(deserializer)? {
        Some(LooseAmenities::Flags(flags)) => flags
            .into_iter()
            .map(|(name, state)| (amenity_key(&name), state))
            .collect(),
        Some(LooseAmenities::Names(names)) => names
            .into_iter()
            .filter_map(|name| match name {
                LooseText::Text(s) if !s.trim().is_empty() => {
                    Some((amenity_key(&s), TriState::Present))
                }
                _ => None,
            })
            .collect(),
        Some(LooseAmenities::Other(_)) | None => BTreeMap::new(),
    })
}

/// Parse extractor output: a single listing object or an array of them.
///
/// Within an array, an item that still cannot be read (no id, not an object)
/// is skipped with a warning so the rest of the batch is kept. A single
/// object that cannot be read is an error.
pub fn parse_listings(json: &str) -> Result<Vec<Listing>, serde_json::Error> {
    match serde_json::from_str::<serde_json::Value>(json)? {
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(listing) => Some(listing),
                Err(err) => {
                    tracing::warn!(index, error = %err, "skipping unreadable listing");
                    None
                }
            })
            .collect()),
        single => Ok(vec![serde_json::from_value(single)?]),
    }
}

fn tristate_from_str(s: &str) -> TriState {
    match s.trim().to_lowercase().as_str() {
        "present" | "yes" | "y" | "si" | "sí" | "true" | "1" => TriState::Present,
        "absent" | "no" | "n" | "false" | "0" => TriState::Absent,
        _ => TriState::Unspecified,
    }
}

struct TriStateVisitor;

impl<'de> Visitor<'de> for TriStateVisitor {
    type Value = TriState;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an amenity flag (present, absent, unspecified)")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<TriState, E> {
        Ok(tristate_from_str(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<TriState, E> {
        Ok(if v { TriState::Present } else { TriState::Absent })
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<TriState, E> {
        Ok(match v {
            0 => TriState::Absent,
            1 => TriState::Present,
            _ => TriState::Unspecified,
        })
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<TriState, E> {
        Ok(match v {
            0 => TriState::Absent,
            1 => TriState::Present,
            _ => TriState::Unspecified,
        })
    }

    fn visit_f64<E: de::Error>(self, _v: f64) -> Result<TriState, E> {
        Ok(TriState::Unspecified)
    }

    fn visit_unit<E: de::Error>(self) -> Result<TriState, E> {
        Ok(TriState::Unspecified)
    }

    fn visit_none<E: de::Error>(self) -> Result<TriState, E> {
        Ok(TriState::Unspecified)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<TriState, D::Error> {
        deserializer.deserialize_any(TriStateVisitor)
    }

    fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<TriState, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(TriState::Unspecified)
    }

    fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<TriState, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(TriState::Unspecified)
    }
}

impl<'de> Deserialize<'de> for TriState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TriStateVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_integer() {
        assert_eq!(parse_loose_number("3"), Some(3.0));
    }

    #[test]
    fn test_parse_thousands_dot() {
        assert_eq!(parse_loose_number("1.200 €"), Some(1200.0));
        assert_eq!(parse_loose_number("1.250.000"), Some(1_250_000.0));
    }

    #[test]
    fn test_parse_thousands_comma() {
        assert_eq!(parse_loose_number("$1,200/month"), Some(1200.0));
    }

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(parse_loose_number("85,5 m²"), Some(85.5));
    }

    #[test]
    fn test_parse_decimal_dot() {
        assert_eq!(parse_loose_number("85.5"), Some(85.5));
    }

    #[test]
    fn test_parse_mixed_separators() {
        assert_eq!(parse_loose_number("1.234,56 €"), Some(1234.56));
        assert_eq!(parse_loose_number("1,234.56"), Some(1234.56));
    }

    #[test]
    fn test_parse_unit_suffix_ignored() {
        assert_eq!(parse_loose_number("85 m²"), Some(85.0));
    }

    #[test]
    fn test_parse_no_digits() {
        assert_eq!(parse_loose_number("a consultar"), None);
        assert_eq!(parse_loose_number(""), None);
    }

    #[test]
    fn test_parse_listings_single_and_array() {
        let one = parse_listings(r#"{"id": "a", "price": "900"}"#).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].price, Some(900.0));

        let many = parse_listings(r#"[{"id": "a"}, {"id": "b", "category": "room-share"}]"#).unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].id, "b");
    }

    #[test]
    fn test_parse_listings_requires_id() {
        assert!(parse_listings(r#"{"price": 900}"#).is_err());
    }

    #[test]
    fn test_numeric_floor_keeps_whole_batch() {
        let listings =
            parse_listings(r#"[{"id": "ok", "price": 700}, {"id": "f", "price": 800, "floor": 3}]"#)
                .unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].floor, None);
        assert_eq!(listings[1].floor.as_deref(), Some("3"));
        assert_eq!(listings[1].price, Some(800.0));
    }

    #[test]
    fn test_unreadable_date_becomes_unset() {
        let listings =
            parse_listings(r#"[{"id": "ok"}, {"id": "d", "published_at": "hace 3 dias"}]"#).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[1].id, "d");
        assert_eq!(listings[1].published_at, None);
    }

    #[test]
    fn test_wrongly_typed_text_fields_become_unset() {
        let listings = parse_listings(
            r#"[{"id": "t", "title": 12, "orientation": ["sur"], "energy_rating": false,
                 "condition": {"es": "bueno"}, "url": null}]"#,
        )
        .unwrap();
        let listing = &listings[0];
        assert_eq!(listing.title, None);
        assert_eq!(listing.orientation, None);
        assert_eq!(listing.energy_rating, None);
        assert_eq!(listing.condition, None);
        assert_eq!(listing.url, None);
    }

    #[test]
    fn test_category_fallback_and_aliases() {
        let listings = parse_listings(
            r#"[{"id": "a", "category": "castle"}, {"id": "b", "category": "Habitación"},
                {"id": "c", "category": "room_share"}, {"id": "d", "category": 7}]"#,
        )
        .unwrap();
        let categories: Vec<Category> = listings.iter().map(|l| l.category).collect();
        assert_eq!(
            categories,
            vec![
                Category::Dwelling,
                Category::RoomShare,
                Category::RoomShare,
                Category::Dwelling
            ]
        );
    }

    #[test]
    fn test_unreadable_item_is_skipped() {
        let listings =
            parse_listings(r#"[{"id": "a"}, {"price": 900}, "junk", {"id": 42}]"#).unwrap();
        let ids: Vec<&str> = listings.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "42"]);
    }

    #[test]
    fn test_amenities_as_name_list() {
        let listings =
            parse_listings(r#"{"id": "a", "amenities": ["Elevator", "air conditioning", 3]}"#)
                .unwrap();
        let amenities = &listings[0].amenities;
        assert_eq!(amenities.len(), 2);
        assert_eq!(amenities.get("elevator"), Some(&TriState::Present));
        assert_eq!(amenities.get("air_conditioning"), Some(&TriState::Present));
    }

    #[test]
    fn test_amenities_of_wrong_shape_are_empty() {
        let listings = parse_listings(r#"{"id": "a", "amenities": "lots"}"#).unwrap();
        assert!(listings[0].amenities.is_empty());
    }

    #[test]
    fn test_parse_loose_datetime_formats() {
        let midnight = |y, m, d| {
            NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        };
        assert_eq!(parse_loose_datetime("2024-03-09"), midnight(2024, 3, 9));
        assert_eq!(parse_loose_datetime("09/03/2024"), midnight(2024, 3, 9));
        assert_eq!(
            parse_loose_datetime("2024-03-09T00:00:00+00:00"),
            midnight(2024, 3, 9)
        );
        assert_eq!(parse_loose_datetime("2024-03-09 00:00:00"), midnight(2024, 3, 9));
        assert_eq!(parse_loose_datetime("ayer"), None);
    }

    #[test]
    fn test_stored_listing_reads_back_unchanged() {
        let mut listing = Listing::new("x", Category::RoomShare);
        listing.floor = Some("3º".to_string());
        listing.published_at = parse_loose_datetime("2024-03-01T08:30:00Z");
        listing.score = 71;
        let json = serde_json::to_string(&listing).unwrap();
        assert_eq!(parse_listings(&json).unwrap(), vec![listing]);
    }

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_number")]
        price: Option<f64>,
        #[serde(default, deserialize_with = "lenient_count")]
        rooms: Option<u32>,
    }

    #[test]
    fn test_lenient_number_accepts_number_and_text() {
        let probe: Probe = serde_json::from_str(r#"{"price": 700, "rooms": "2"}"#).unwrap();
        assert_eq!(probe.price, Some(700.0));
        assert_eq!(probe.rooms, Some(2));
    }

    #[test]
    fn test_lenient_number_rejects_garbage_softly() {
        let probe: Probe =
            serde_json::from_str(r#"{"price": {"amount": 1}, "rooms": true}"#).unwrap();
        assert_eq!(probe.price, None);
        assert_eq!(probe.rooms, None);
    }

    #[test]
    fn test_lenient_number_negative_is_unset() {
        let probe: Probe = serde_json::from_str(r#"{"price": -5, "rooms": null}"#).unwrap();
        assert_eq!(probe.price, None);
        assert_eq!(probe.rooms, None);
    }
}
