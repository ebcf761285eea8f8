//! Pure field parsers shared by extraction strategies and CSV import.
//!
//! Each parser strips decoration, parses, and range-validates. Rejection
//! always yields `None`: callers cannot tell "no match" from "out of range",
//! which lets selector candidates fall through to the next candidate.

/// Valid listing price range, whole currency units.
pub const PRICE_RANGE: (f64, f64) = (10_000.0, 50_000_000.0);
/// Valid bedroom count range.
pub const BED_RANGE: (u32, u32) = (0, 50);
/// Valid bathroom count range.
pub const BATH_RANGE: (f64, f64) = (0.5, 20.0);
/// Valid interior area range, square feet.
pub const SQFT_RANGE: (u32, u32) = (100, 50_000);

/// Keep digits and dots only.
fn strip_to_numeric(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect()
}

/// Parse a currency string ("$450,000", "CAD 1.2M" is NOT supported) into a
/// price within [`PRICE_RANGE`].
pub fn parse_currency(s: &str) -> Option<f64> {
    let cleaned = strip_to_numeric(s);
    let value: f64 = cleaned.parse().ok()?;
    in_price_range(value).then_some(value)
}

/// Range check shared with strategies that scale raw values first.
pub fn in_price_range(value: f64) -> bool {
    value >= PRICE_RANGE.0 && value <= PRICE_RANGE.1
}

/// Parse a bedroom count ("3", "3 beds", "3.0"); fractional input truncates.
pub fn parse_bed_count(s: &str) -> Option<u32> {
    let cleaned = strip_to_numeric(s);
    let value: f64 = cleaned.parse().ok()?;
    let truncated = value.trunc();
    if truncated < 0.0 || truncated > f64::from(u32::MAX) {
        return None;
    }
    let count = truncated as u32;
    (count >= BED_RANGE.0 && count <= BED_RANGE.1).then_some(count)
}

/// Parse a bathroom count ("2.5 baths") within [`BATH_RANGE`].
pub fn parse_bath_count(s: &str) -> Option<f64> {
    let cleaned = strip_to_numeric(s);
    let value: f64 = cleaned.parse().ok()?;
    (value >= BATH_RANGE.0 && value <= BATH_RANGE.1).then_some(value)
}

/// Parse an area ("1,850 sq ft") within [`SQFT_RANGE`]; fractional truncates.
pub fn parse_area(s: &str) -> Option<u32> {
    let cleaned = strip_to_numeric(s);
    let value: f64 = cleaned.parse().ok()?;
    let truncated = value.trunc();
    if truncated < 0.0 || truncated > f64::from(u32::MAX) {
        return None;
    }
    let area = truncated as u32;
    (area >= SQFT_RANGE.0 && area <= SQFT_RANGE.1).then_some(area)
}
