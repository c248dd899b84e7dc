pub mod formatter;

pub use formatter::{
    format_age, format_config, format_listing_detail, format_scored_table, format_tsv,
    should_use_colors, EXPORT_AMENITIES,
};
