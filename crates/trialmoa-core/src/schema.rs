/// Arrow schema definitions for the corpus report.
pub mod report {
    use arrow::datatypes::{DataType, Field, Schema};

    /// One row per input drug.
    pub fn drug_schema() -> Schema {
        Schema::new(vec![
            Field::new("drug_id", DataType::Utf8, false),
            Field::new("trial_id", DataType::Utf8, false),
            Field::new("chosen_term", DataType::Utf8, true),
            Field::new("primary_locator", DataType::Utf8, true),
            Field::new("super_group_label", DataType::Utf8, false),
            Field::new("resolution_status", DataType::Utf8, false),
        ])
    }

    /// One row per trial; multi-drug columns are `"; "`-joined in input order.
    pub fn trial_schema() -> Schema {
        Schema::new(vec![
            Field::new("trial_id", DataType::Utf8, false),
            Field::new("drug_ids", DataType::Utf8, false),
            Field::new("chosen_terms", DataType::Utf8, false),
            Field::new("super_group_labels", DataType::Utf8, false),
        ])
    }

    /// `super_group_label → count`, including `unclassified` and `no_mechanism`.
    pub fn frequency_schema() -> Schema {
        Schema::new(vec![
            Field::new("super_group_label", DataType::Utf8, false),
            Field::new("count", DataType::UInt64, false),
        ])
    }
}
