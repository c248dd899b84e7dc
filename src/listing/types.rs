use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::parse::{
    lenient_amenities, lenient_category, lenient_count, lenient_created_at, lenient_datetime,
    lenient_label, lenient_number, lenient_score, lenient_text, listing_id,
};

/// Kind of listing. Each category carries its own scoring configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Dwelling,
    RoomShare,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Dwelling, Category::RoomShare];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Dwelling => "dwelling",
            Category::RoomShare => "room-share",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presence of an amenity as reported by the listing page.
///
/// Deserialization is lenient (see `parse.rs`): anything that is not a
/// recognizable yes/no becomes `Unspecified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    Present,
    Absent,
    #[default]
    Unspecified,
}

impl TriState {
    /// Short yes/no flag for tabular output; empty when unknown.
    pub fn as_flag(&self) -> &'static str {
        match self {
            TriState::Present => "yes",
            TriState::Absent => "no",
            TriState::Unspecified => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitKind {
    #[default]
    Visit,
    Contact,
    Note,
}

impl fmt::Display for VisitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitKind::Visit => f.write_str("visit"),
            VisitKind::Contact => f.write_str("contact"),
            VisitKind::Note => f.write_str("note"),
        }
    }
}

/// One entry in a listing's visit/contact history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub kind: VisitKind,
    #[serde(default)]
    pub note: Option<String>,
}

/// A saved real-estate offer.
///
/// Every field except `id` tolerates loosely formatted extractor output
/// ("1.200 €", "85 m²", a floor of `3`, a date it cannot read); anything
/// unusable is stored as unset and scored as neutral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(deserialize_with = "listing_id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_category")]
    pub category: Category,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub size_m2: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub rooms: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub bathrooms: Option<u32>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub floor: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub roommates: Option<u32>,

    #[serde(default, deserialize_with = "lenient_amenities")]
    pub amenities: BTreeMap<String, TriState>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub orientation: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub energy_rating: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub condition: Option<String>,

    #[serde(default, deserialize_with = "lenient_number")]
    pub deposit: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub maintenance_fee: Option<f64>,

    #[serde(default, deserialize_with = "lenient_datetime")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default = "Utc::now", deserialize_with = "lenient_created_at")]
    pub created_at: DateTime<Utc>,

    #[serde(default, deserialize_with = "lenient_score")]
    pub score: u8,
    #[serde(default)]
    pub history: Vec<VisitRecord>,
}

impl Listing {
    /// Create an empty listing of the given category, timestamped now.
    pub fn new(id: impl Into<String>, category: Category) -> Self {
        Self {
            id: id.into(),
            category,
            title: None,
            url: None,
            price: None,
            size_m2: None,
            rooms: None,
            bathrooms: None,
            floor: None,
            roommates: None,
            amenities: BTreeMap::new(),
            orientation: None,
            energy_rating: None,
            condition: None,
            deposit: None,
            maintenance_fee: None,
            published_at: None,
            created_at: Utc::now(),
            score: 0,
            history: Vec::new(),
        }
    }

    /// Amenity state by key; amenities the page never mentioned are unspecified.
    pub fn amenity(&self, key: &str) -> TriState {
        self.amenities.get(key).copied().unwrap_or_default()
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serde_names() {
        let json = serde_json::to_string(&Category::RoomShare).unwrap();
        assert_eq!(json, "\"room-share\"");
        let parsed: Category = serde_json::from_str("\"dwelling\"").unwrap();
        assert_eq!(parsed, Category::Dwelling);
    }

    #[test]
    fn test_tristate_aliases() {
        let flags: Vec<TriState> =
            serde_json::from_str(r#"["present", "yes", "no", "absent", "unspecified", "maybe", true]"#)
                .unwrap();
        assert_eq!(
            flags,
            vec![
                TriState::Present,
                TriState::Present,
                TriState::Absent,
                TriState::Absent,
                TriState::Unspecified,
                TriState::Unspecified,
                TriState::Present,
            ]
        );
    }

    #[test]
    fn test_missing_amenity_is_unspecified() {
        let listing = Listing::new("a", Category::Dwelling);
        assert_eq!(listing.amenity("elevator"), TriState::Unspecified);
    }

    #[test]
    fn test_minimal_listing_parse() {
        let listing: Listing = serde_json::from_str(r#"{"id": "abc"}"#).unwrap();
        assert_eq!(listing.id, "abc");
        assert_eq!(listing.category, Category::Dwelling);
        assert!(listing.price.is_none());
        assert!(listing.history.is_empty());
    }

    #[test]
    fn test_listing_parse_with_loose_values() {
        let json = r#"{
            "id": "x1",
            "category": "room-share",
            "price": "1.200 €",
            "size_m2": "85 m²",
            "rooms": "3",
            "bathrooms": "two",
            "amenities": { "elevator": "yes", "heating": "absent" }
        }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.category, Category::RoomShare);
        assert_eq!(listing.price, Some(1200.0));
        assert_eq!(listing.size_m2, Some(85.0));
        assert_eq!(listing.rooms, Some(3));
        assert_eq!(listing.bathrooms, None);
        assert_eq!(listing.amenity("elevator"), TriState::Present);
        assert_eq!(listing.amenity("heating"), TriState::Absent);
    }

    #[test]
    fn test_display_title_falls_back_to_id() {
        let mut listing = Listing::new("id-7", Category::Dwelling);
        assert_eq!(listing.display_title(), "id-7");
        listing.title = Some("Piso en Chamberí".to_string());
        assert_eq!(listing.display_title(), "Piso en Chamberí");
    }
}
