//! Prompt construction for the vision model.

use crate::models::PropertyFacts;

/// Build the assessment prompt for one batch. The model is instructed to
/// cross-reference the description against the images and answer in a fixed
/// JSON shape so the repair step has something predictable to work with.
pub fn property_prompt(facts: &PropertyFacts) -> String {
    let address = if facts.address.is_empty() {
        "Unknown"
    } else {
        &facts.address
    };
    let price = facts
        .price
        .map(|p| format!("${}", group_thousands(p)))
        .unwrap_or_else(|| "Price not available".to_string());
    let beds = facts
        .beds
        .map(|b| b.to_string())
        .unwrap_or_else(|| "Not specified".to_string());
    let baths = facts
        .baths
        .map(|b| b.to_string())
        .unwrap_or_else(|| "Not specified".to_string());
    let sqft = facts
        .sqft
        .map(|s| format!("{} sqft", group_thousands(f64::from(s))))
        .unwrap_or_else(|| "Not specified".to_string());
    let days = facts
        .days_on_market
        .map(|d| d.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let description = facts
        .description
        .as_deref()
        .unwrap_or("No description provided");

    format!(
        r#"Complete property assessment for: {address}

PROPERTY DETAILS:
- Address: {address}
- Price: {price}
- Bedrooms: {beds}
- Bathrooms: {baths}
- Square Feet: {sqft}
- Days on Market: {days}
- Description: {description}

ANALYSIS INSTRUCTIONS:
Analyze both the provided images AND the property description comprehensively. Cross-reference what the description claims against what you see in the images. Look across ALL images for:

RED FLAGS (assign severity: low/medium/high):
- Water damage (stains, discoloration, warping, mold signs)
- Structural issues (cracks, settling, foundation problems)
- Poor maintenance (peeling paint, damaged fixtures, worn surfaces)
- Safety concerns (exposed wiring, missing railings, trip hazards)
- Outdated systems (old electrical panels, HVAC, plumbing)
- Staging tricks hiding problems
- Quality inconsistencies between rooms
- DESCRIPTION MISMATCHES: Claims not supported by images (e.g., "renovated" but photos show outdated finishes)
- Marketing red flags in description ("cozy"=small, "potential"=needs work, "as-is"=problems, "handyman special"=major repairs)

POSITIVE INDICATORS:
- Recent renovations/updates visible in images
- Quality materials and finishes confirmed by photos
- Good maintenance throughout verified visually
- Energy efficiency features (new windows, appliances)
- Ample natural light confirmed in photos
- Good storage solutions visible
- Modern appliances/fixtures matching description claims
- DESCRIPTION CONFIRMATIONS: Claims verified by images (e.g., "hardwood floors" actually visible, "updated kitchen" confirmed)

PRICING ASSESSMENT:
- Does the condition justify the asking price?
- Are there hidden costs (major repairs needed)?
- Compare quality vs. price point
- Does description accuracy affect value? (overselling or underselling)

Provide analysis in this EXACT JSON format:
{{
  "overall_grade": "A/B/C/D/F",
  "red_flags": [
    {{
      "issue": "specific problem description",
      "severity": "low/medium/high",
      "explanation": "why this matters and potential cost",
      "rooms_affected": ["kitchen", "bathroom"]
    }}
  ],
  "positive_indicators": [
    "specific positive features noted"
  ],
  "price_assessment": "fair/high/low",
  "price_assessment_explanation": "reasoning for price assessment including description accuracy",
  "buyer_recommendation": "buy/negotiate/avoid with brief reasoning",
  "confidence_score": 0.85,
  "analysis_summary": "2-3 sentence overall assessment including description vs reality"
}}"#
    )
}

/// Insert thousands separators ("1249900" -> "1,249,900").
fn group_thousands(value: f64) -> String {
    let whole = value.trunc() as i64;
    let digits = whole.abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if whole < 0 {
        format!("-{out}")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(450000.0), "450,000");
        assert_eq!(group_thousands(1249900.0), "1,249,900");
        assert_eq!(group_thousands(999.0), "999");
    }

    #[test]
    fn test_prompt_includes_facts() {
        let facts = PropertyFacts {
            address: "123 Main St".to_string(),
            price: Some(450_000.0),
            beds: Some(3),
            baths: Some(2.5),
            sqft: Some(1850),
            description: Some("Bright corner unit".to_string()),
            days_on_market: Some(12),
        };
        let prompt = property_prompt(&facts);
        assert!(prompt.contains("123 Main St"));
        assert!(prompt.contains("$450,000"));
        assert!(prompt.contains("2.5"));
        assert!(prompt.contains("1,850 sqft"));
        assert!(prompt.contains("EXACT JSON format"));
    }

    #[test]
    fn test_prompt_handles_missing_facts() {
        let prompt = property_prompt(&PropertyFacts::default());
        assert!(prompt.contains("Price not available"));
        assert!(prompt.contains("No description provided"));
    }
}
