use listing_rank::listing::{parse_listings, Category, VisitKind, VisitRecord};
use listing_rank::output::format_tsv;
use listing_rank::ranker::Ranker;
use listing_rank::scoring::{AcceptanceRange, Importance, ScoringConfig};
use listing_rank::store::{JsonFileStore, ListingStore};

const EXTRACTED: &str = r#"[
  {"id": "cheap", "title": "Piso pequeño", "url": "https://example.com/cheap",
   "price": "500 €", "size_m2": "40 m²", "rooms": 1},
  {"id": "big", "title": "Ático amplio", "url": "https://example.com/big",
   "price": "1.100 €", "size_m2": "110", "rooms": "3",
   "amenities": {"terrace": "yes", "elevator": true}}
]"#;

fn only(key: &str, range_field: &str, range: AcceptanceRange) -> ScoringConfig {
    let mut config = ScoringConfig::default_for(Category::Dwelling);
    config.weights.clear();
    config.set_importance(key, Importance::Essential);
    if let Some(slot) = config.ranges.get_mut(range_field) {
        *slot = range;
    }
    config
}

fn ids(listings: &[listing_rank::listing::Listing]) -> Vec<&str> {
    listings.iter().map(|l| l.id.as_str()).collect()
}

#[tokio::test]
async fn test_config_change_reorders_persisted_listings() {
    let dir = tempfile::tempdir().unwrap();
    let ranker = Ranker::new(JsonFileStore::new(dir.path()));

    ranker
        .add_listings(parse_listings(EXTRACTED).unwrap())
        .await
        .unwrap();

    let by_price = ranker
        .save_config(only("price", "price", AcceptanceRange::new(400.0, 1200.0)))
        .await
        .unwrap();
    assert_eq!(ids(&by_price), vec!["cheap", "big"]);
    assert!(by_price[0].score > by_price[1].score);

    let by_size = ranker
        .save_config(only("size", "size", AcceptanceRange::new(30.0, 120.0)))
        .await
        .unwrap();
    assert_eq!(ids(&by_size), vec!["big", "cheap"]);

    // A fresh store over the same directory sees the committed order and config.
    let reopened = JsonFileStore::new(dir.path());
    let stored = reopened.get_all().await.unwrap();
    assert_eq!(ids(&stored), vec!["big", "cheap"]);
    assert_eq!(stored[0].score, by_size[0].score);

    let config = reopened.get_config(Category::Dwelling).await.unwrap();
    assert_eq!(config.importance("size"), Importance::Essential);
    assert_eq!(config.importance("price"), Importance::Irrelevant);
}

#[tokio::test]
async fn test_recalculate_is_idempotent_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let ranker = Ranker::new(JsonFileStore::new(dir.path()));
    ranker
        .add_listings(parse_listings(EXTRACTED).unwrap())
        .await
        .unwrap();

    let first = ranker.recalculate_all().await.unwrap();
    let second = ranker.recalculate_all().await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_export_uses_stored_scores() {
    let dir = tempfile::tempdir().unwrap();
    let ranker = Ranker::new(JsonFileStore::new(dir.path()));
    let listings = ranker
        .add_listings(parse_listings(EXTRACTED).unwrap())
        .await
        .unwrap();

    let tsv = format_tsv(&listings);
    let lines: Vec<&str> = tsv.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("id\ttitle\turl"));

    for (line, listing) in lines[1..].iter().zip(&listings) {
        let fields: Vec<&str> = line.split('\t').collect();
        assert_eq!(fields[0], listing.id);
        assert_eq!(fields[fields.len() - 2], listing.score.to_string());
    }

    let big = lines[1..]
        .iter()
        .find(|line| line.starts_with("big\t"))
        .unwrap();
    assert!(big.contains("\t1100\t"));
}

#[tokio::test]
async fn test_visit_history_survives_reimport() {
    let dir = tempfile::tempdir().unwrap();
    let ranker = Ranker::new(JsonFileStore::new(dir.path()));
    ranker
        .add_listings(parse_listings(EXTRACTED).unwrap())
        .await
        .unwrap();

    ranker
        .record_visit(
            "big",
            VisitRecord {
                at: chrono::Utc::now(),
                kind: VisitKind::Contact,
                note: Some("llamar el lunes".to_string()),
            },
        )
        .await
        .unwrap();

    let updated = parse_listings(r#"{"id": "big", "price": 990, "size_m2": 110}"#).unwrap();
    let listings = ranker.add_listings(updated).await.unwrap();

    assert_eq!(listings.len(), 2);
    let big = listings.iter().find(|l| l.id == "big").unwrap();
    assert_eq!(big.price, Some(990.0));
    assert_eq!(big.history.len(), 1);
    assert_eq!(big.history[0].kind, VisitKind::Contact);
}

#[tokio::test]
async fn test_reset_repairs_invalid_stored_config() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("scoring.yaml"),
        "version: 1\nconfigs:\n  - category: dwelling\n    ranges:\n      size: { min: 200, max: 100 }\n",
    )
    .unwrap();
    let ranker = Ranker::new(JsonFileStore::new(dir.path()));

    assert!(ranker.config(Category::Dwelling).await.is_err());

    ranker.reset_config(Category::Dwelling).await.unwrap();
    assert_eq!(
        ranker.config(Category::Dwelling).await.unwrap(),
        ScoringConfig::default_for(Category::Dwelling)
    );
}

#[tokio::test]
async fn test_messy_batch_is_imported_whole() {
    let dir = tempfile::tempdir().unwrap();
    let ranker = Ranker::new(JsonFileStore::new(dir.path()));
    let batch = r#"[
      {"id": "a", "price": 700, "floor": 3, "published_at": "hace 3 dias"},
      {"id": "b", "price": "650 €", "category": "piso", "amenities": ["Terraza"]}
    ]"#;

    let listings = ranker.add_listings(parse_listings(batch).unwrap()).await.unwrap();
    assert_eq!(listings.len(), 2);

    let stored = JsonFileStore::new(dir.path()).get_all().await.unwrap();
    assert_eq!(stored, listings);
}
