/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Scores, weights and Likert anchors are exact decimals.
pub type Score = rust_decimal::Decimal;
