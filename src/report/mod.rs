/// Text and JSON rendering of query results.
mod formatter;

pub use formatter::{
    format_query_as_json, format_query_as_text, format_reference_tree, format_stats_as_text,
    reference_details, ReferenceDetails,
};
