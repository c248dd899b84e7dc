use chrono::{Duration, Utc};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::listing::Listing;
use crate::scoring::{Feature, ScoreResult, ScoringConfig};

/// Amenity columns in the TSV export, in order.
pub const EXPORT_AMENITIES: [&str; 7] = [
    "elevator",
    "parking",
    "heating",
    "air_conditioning",
    "terrace",
    "exterior",
    "furnished",
];

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate title to fit available width, accounting for Unicode
fn truncate_title(title: &str, max_width: usize) -> String {
    let chars: Vec<char> = title.chars().collect();
    if chars.len() <= max_width {
        title.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

fn format_amount(value: Option<f64>) -> String {
    value.map_or_else(String::new, |v| format!("{:.0}", v))
}

fn format_count(value: Option<u32>) -> String {
    value.map_or_else(String::new, |v| v.to_string())
}

/// Compact "850€ 80m² 3r" summary of the numeric attributes.
fn format_summary(listing: &Listing) -> String {
    let mut parts = Vec::new();
    if let Some(price) = listing.price {
        parts.push(format!("{:.0}€", price));
    }
    if let Some(size) = listing.size_m2 {
        parts.push(format!("{:.0}m²", size));
    }
    if let Some(rooms) = listing.rooms {
        parts.push(format!("{}r", rooms));
    }
    parts.join(" ")
}

fn colored_score(score: u8, text: &str) -> String {
    if score >= 70 {
        text.green().bold().to_string()
    } else if score >= 40 {
        text.yellow().bold().to_string()
    } else {
        text.red().bold().to_string()
    }
}

/// Format listings as a ranked table with columns: Index, Score, Title, Summary
/// Index column: 3 chars (fits "99."), right-aligned
/// Score column: 3 chars, right-aligned
pub fn format_scored_table(listings: &[Listing], use_colors: bool) -> String {
    if listings.is_empty() {
        return "No listings saved.".to_string();
    }

    let term_width = get_terminal_width();
    let index_width = 3;
    let score_width = 3;
    let separator = "  ";

    listings
        .iter()
        .enumerate()
        .map(|(idx, listing)| {
            let index_str = format!("{:>2}.", idx + 1);
            let score_str = format!("{:>width$}", listing.score, width = score_width);
            let summary = format_summary(listing);

            let fixed_width =
                index_width + 1 + score_width + separator.len() * 2 + summary.chars().count();
            let title = match term_width {
                Some(width) if width > fixed_width + 10 => {
                    truncate_title(listing.display_title(), width - fixed_width)
                }
                Some(_) => truncate_title(listing.display_title(), 20),
                None => listing.display_title().to_string(),
            };

            if use_colors {
                format!(
                    "{} {}{}{}{}{}",
                    index_str.dimmed(),
                    colored_score(listing.score, &score_str),
                    separator,
                    title,
                    separator,
                    summary.cyan()
                )
            } else {
                format!(
                    "{} {}{}{}{}{}",
                    index_str, score_str, separator, title, separator, summary
                )
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Multi-line listing detail with an optional per-feature breakdown (verbose mode)
pub fn format_listing_detail(
    listing: &Listing,
    result: Option<&ScoreResult>,
    use_colors: bool,
) -> String {
    let mut lines = Vec::new();
    let title = listing.display_title();
    if use_colors {
        lines.push(format!("{}  [{}]", title.bold(), listing.category.cyan()));
    } else {
        lines.push(format!("{}  [{}]", title, listing.category));
    }
    lines.push(format!("  Id: {}", listing.id));
    if let Some(url) = &listing.url {
        lines.push(format!("  URL: {}", url));
    }
    lines.push(format!("  Score: {}", listing.score));
    lines.push(format!(
        "  Saved: {} ago",
        format_age(Utc::now() - listing.created_at)
    ));
    if !listing.history.is_empty() {
        lines.push(format!("  History: {} entries", listing.history.len()));
        for record in &listing.history {
            let note = record.note.as_deref().unwrap_or("");
            lines.push(format!(
                "    {} {} {}",
                record.at.format("%Y-%m-%d"),
                record.kind,
                note
            ));
        }
    }

    if let Some(result) = result {
        for contribution in &result.breakdown {
            lines.push(format!(
                "    {:<20} x{} {:.2}",
                contribution.feature.key(),
                u8::from(contribution.importance),
                contribution.normalized
            ));
        }
    }

    lines.join("\n")
}

/// Format a scoring config for `config show`
pub fn format_config(config: &ScoringConfig) -> String {
    let mut lines = vec![format!("Category: {}", config.category)];
    lines.push("Ranges:".to_string());
    lines.push(format!("  price      {}", config.ranges.price));
    lines.push(format!("  size       {}", config.ranges.size));
    lines.push(format!("  rooms      {}", config.ranges.rooms));
    lines.push(format!("  bathrooms  {}", config.ranges.bathrooms));
    lines.push("Weights:".to_string());
    for (key, importance) in &config.weights {
        let marker = if Feature::is_known(key) { "" } else { "  (ignored)" };
        lines.push(format!(
            "  {:<20} {} {}{}",
            key,
            u8::from(*importance),
            importance,
            marker
        ));
    }
    lines.join("\n")
}

fn tsv_field(value: &str) -> String {
    value.replace(['\t', '\n', '\r'], " ")
}

/// Format listings as tab-separated values for spreadsheets.
///
/// Columns: id, title, url, category, price, size_m2, rooms, bathrooms, floor,
/// the amenity flags of [`EXPORT_AMENITIES`] (yes/no/empty), score, created_at.
/// The score column is the stored score; it is never recomputed here.
pub fn format_tsv(listings: &[Listing]) -> String {
    let mut header = vec![
        "id", "title", "url", "category", "price", "size_m2", "rooms", "bathrooms", "floor",
    ];
    header.extend(EXPORT_AMENITIES);
    header.extend(["score", "created_at"]);

    let mut rows = vec![header.join("\t")];
    for listing in listings {
        let mut fields = vec![
            tsv_field(&listing.id),
            tsv_field(listing.title.as_deref().unwrap_or("")),
            tsv_field(listing.url.as_deref().unwrap_or("")),
            listing.category.to_string(),
            format_amount(listing.price),
            format_amount(listing.size_m2),
            format_count(listing.rooms),
            format_count(listing.bathrooms),
            tsv_field(listing.floor.as_deref().unwrap_or("")),
        ];
        fields.extend(
            EXPORT_AMENITIES
                .iter()
                .map(|key| listing.amenity(key).as_flag().to_string()),
        );
        fields.push(listing.score.to_string());
        fields.push(listing.created_at.format("%Y-%m-%d").to_string());
        rows.push(fields.join("\t"));
    }
    rows.join("\n")
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::{Category, TriState};
    use crate::scoring::calculate_score;
    use chrono::TimeZone;

    fn sample_listing() -> Listing {
        let mut listing = Listing::new("flat-1", Category::Dwelling);
        listing.title = Some("Piso luminoso en Lavapiés".to_string());
        listing.url = Some("https://example.com/flat-1".to_string());
        listing.price = Some(850.0);
        listing.size_m2 = Some(72.5);
        listing.rooms = Some(2);
        listing.bathrooms = Some(1);
        listing.floor = Some("3º".to_string());
        listing.amenities.insert("elevator".to_string(), TriState::Present);
        listing.amenities.insert("parking".to_string(), TriState::Absent);
        listing.score = 67;
        listing.created_at = Utc.with_ymd_and_hms(2024, 3, 9, 10, 0, 0).unwrap();
        listing
    }

    #[test]
    fn test_format_scored_table_empty() {
        assert_eq!(format_scored_table(&[], false), "No listings saved.");
    }

    #[test]
    fn test_format_scored_table_single() {
        let result = format_scored_table(&[sample_listing()], false);
        assert!(result.starts_with(" 1."));
        assert!(result.contains(" 67"));
        assert!(result.contains("Piso luminoso"));
        assert!(result.contains("850€ 72m² 2r") || result.contains("850€ 73m² 2r"));
    }

    #[test]
    fn test_format_scored_table_multiple() {
        let first = sample_listing();
        let mut second = sample_listing();
        second.id = "flat-2".to_string();
        second.title = None;
        second.score = 12;

        let result = format_scored_table(&[first, second], false);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(" 1."));
        assert!(lines[1].contains(" 2."));
        assert!(lines[1].contains("flat-2"));
    }

    #[test]
    fn test_format_listing_detail_with_breakdown() {
        let listing = sample_listing();
        let config = ScoringConfig::default_for(Category::Dwelling);
        let result = calculate_score(&listing, &config);
        let detail = format_listing_detail(&listing, Some(&result), false);
        assert!(detail.contains("Id: flat-1"));
        assert!(detail.contains("URL: https://example.com/flat-1"));
        assert!(detail.contains("Score: 67"));
        assert!(detail.contains("price"));
    }

    #[test]
    fn test_format_config_marks_unknown_keys() {
        let mut config = ScoringConfig::default_for(Category::Dwelling);
        config.set_importance("sauna", crate::scoring::Importance::Valuable);
        let text = format_config(&config);
        assert!(text.contains("Category: dwelling"));
        assert!(text.contains("price      400-1200"));
        assert!(text.contains("sauna"));
        assert!(text.contains("(ignored)"));
    }

    #[test]
    fn test_format_tsv_header_only() {
        let result = format_tsv(&[]);
        assert_eq!(result.lines().count(), 1);
        assert!(result.starts_with("id\ttitle\turl\tcategory\tprice"));
        assert!(result.ends_with("score\tcreated_at"));
    }

    #[test]
    fn test_format_tsv_row() {
        let result = format_tsv(&[sample_listing()]);
        let lines: Vec<&str> = result.lines().collect();
        assert_eq!(lines.len(), 2);

        let header: Vec<&str> = lines[0].split('\t').collect();
        let row: Vec<&str> = lines[1].split('\t').collect();
        assert_eq!(header.len(), row.len());
        assert_eq!(row.len(), 18);

        let column = |name: &str| row[header.iter().position(|h| *h == name).unwrap()];
        assert_eq!(column("price"), "850");
        assert_eq!(column("rooms"), "2");
        assert_eq!(column("floor"), "3º");
        assert_eq!(column("elevator"), "yes");
        assert_eq!(column("parking"), "no");
        assert_eq!(column("heating"), "");
        assert_eq!(column("score"), "67");
        assert_eq!(column("created_at"), "2024-03-09");
    }

    #[test]
    fn test_format_tsv_uses_stored_score() {
        let mut listing = sample_listing();
        listing.score = 3;
        let result = format_tsv(&[listing]);
        assert!(result.lines().nth(1).unwrap().contains("\t3\t2024-03-09"));
    }

    #[test]
    fn test_format_tsv_strips_tabs() {
        let mut listing = sample_listing();
        listing.title = Some("Tab\there\nnewline".to_string());
        let result = format_tsv(&[listing]);
        assert!(result.lines().nth(1).unwrap().contains("Tab here newline"));
    }

    #[test]
    fn test_truncate_title_short() {
        assert_eq!(truncate_title("Short title", 20), "Short title");
    }

    #[test]
    fn test_truncate_title_long() {
        assert_eq!(truncate_title("This is a very long title", 15), "This is a ve...");
    }

    #[test]
    fn test_truncate_title_very_narrow() {
        assert_eq!(truncate_title("Hello world", 3), "Hel");
    }

    #[test]
    fn test_format_age_days() {
        assert_eq!(format_age(Duration::days(2)), "2d");
    }

    #[test]
    fn test_format_age_weeks() {
        assert_eq!(format_age(Duration::weeks(2)), "2w");
    }

    #[test]
    fn test_format_age_now() {
        assert_eq!(format_age(Duration::seconds(30)), "now");
    }
}
