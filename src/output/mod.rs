pub mod formatter;

pub use formatter::{
    format_number, format_overlaps, format_rule_detail, format_rule_list, format_run_result,
    should_use_colors,
};
