//! Site family classification.
//!
//! Fetch limits, warmup behavior, and extraction dispatch all key off the
//! family a listing host belongs to. New families are added here and in the
//! config default table without touching existing ones.

/// Known listing site families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteFamily {
    /// zealty.ca - data embedded in an inline script variable.
    Zealty,
    /// realtor.ca - Incapsula-protected, meta-tag extraction.
    RealtorCa,
    /// redfin.com / redfin.ca.
    Redfin,
    /// realtor.com - renders listings client-side; unsupported.
    RealtorCom,
    /// Anything else.
    Generic,
}

impl SiteFamily {
    /// Classify a lowercase host.
    pub fn classify(host: &str) -> Self {
        if host == "zealty.ca" || host.ends_with(".zealty.ca") {
            SiteFamily::Zealty
        } else if host == "realtor.ca" || host.ends_with(".realtor.ca") {
            SiteFamily::RealtorCa
        } else if host == "realtor.com" || host.ends_with(".realtor.com") {
            SiteFamily::RealtorCom
        } else if host.contains("redfin.com") || host.contains("redfin.ca") {
            SiteFamily::Redfin
        } else {
            SiteFamily::Generic
        }
    }

    /// Key into the configured per-family limits table.
    pub fn key(self) -> &'static str {
        match self {
            SiteFamily::Zealty => "zealty",
            SiteFamily::RealtorCa => "realtor_ca",
            SiteFamily::Redfin => "redfin",
            SiteFamily::RealtorCom => "realtor_com",
            SiteFamily::Generic => "generic",
        }
    }

    /// Families that never return usable markup to a plain HTTP client.
    pub fn javascript_only(self) -> bool {
        matches!(self, SiteFamily::RealtorCom)
    }

    /// Whether to visit the site homepage before the listing to pick up
    /// session cookies. Only worthwhile on challenge-protected families.
    pub fn wants_warmup(self) -> bool {
        matches!(self, SiteFamily::RealtorCa | SiteFamily::Redfin)
    }

    /// Search page visited on later attempts to deepen the simulated session.
    pub fn search_path(self) -> Option<&'static str> {
        match self {
            SiteFamily::RealtorCa => Some("/map"),
            SiteFamily::Redfin => Some("/city"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_hosts() {
        assert_eq!(SiteFamily::classify("zealty.ca"), SiteFamily::Zealty);
        assert_eq!(SiteFamily::classify("www.zealty.ca"), SiteFamily::Zealty);
        assert_eq!(SiteFamily::classify("www.realtor.ca"), SiteFamily::RealtorCa);
        assert_eq!(SiteFamily::classify("www.realtor.com"), SiteFamily::RealtorCom);
        assert_eq!(SiteFamily::classify("www.redfin.com"), SiteFamily::Redfin);
        assert_eq!(SiteFamily::classify("example.org"), SiteFamily::Generic);
    }

    #[test]
    fn test_realtor_com_is_javascript_only() {
        assert!(SiteFamily::RealtorCom.javascript_only());
        assert!(!SiteFamily::RealtorCa.javascript_only());
    }

    #[test]
    fn test_warmup_families() {
        assert!(SiteFamily::RealtorCa.wants_warmup());
        assert!(!SiteFamily::Zealty.wants_warmup());
        assert!(!SiteFamily::Generic.wants_warmup());
    }
}
