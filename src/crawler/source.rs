use chrono::NaiveDate;

use crate::constants::{
    GENERIC_FALLBACK_SELECTOR, GENERIC_SELECTOR, LISTING_HOSTS, LISTING_PATH_HINTS, LISTING_SELECTOR,
    SOCIAL_HOSTS, SOCIAL_POST_SELECTOR, TICKETING_FALLBACK_SELECTOR, TICKETING_HOSTS, TICKETING_SELECTOR,
};
use crate::parser::{GenericParser, ListingParser, Parser, SocialParser};

/// Kind of site a target URL points at; decides selector, parser and deep scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFamily {
    Social,
    Ticketing,
    Listing,
    Generic,
}

impl SourceFamily {
    pub fn detect(url: &str) -> Self {
        let lowered = url.to_lowercase();
        let host = reqwest::Url::parse(&lowered)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| lowered.clone());

        if SOCIAL_HOSTS.iter().any(|h| host.ends_with(h)) {
            SourceFamily::Social
        } else if TICKETING_HOSTS.iter().any(|h| host.ends_with(h)) {
            SourceFamily::Ticketing
        } else if LISTING_HOSTS.iter().any(|h| host.ends_with(h))
            || LISTING_PATH_HINTS.iter().any(|hint| lowered.contains(hint))
        {
            SourceFamily::Listing
        } else {
            SourceFamily::Generic
        }
    }

    pub fn default_selector(&self) -> &'static str {
        match self {
            SourceFamily::Social => SOCIAL_POST_SELECTOR,
            SourceFamily::Ticketing => TICKETING_SELECTOR,
            SourceFamily::Listing => LISTING_SELECTOR,
            SourceFamily::Generic => GENERIC_SELECTOR,
        }
    }

    pub fn fallback_selector(&self) -> Option<&'static str> {
        match self {
            SourceFamily::Ticketing => Some(TICKETING_FALLBACK_SELECTOR),
            SourceFamily::Generic => Some(GENERIC_FALLBACK_SELECTOR),
            SourceFamily::Social | SourceFamily::Listing => None,
        }
    }

    /// List cards on these sites carry too little to publish from
    pub fn requires_deep_scrape(&self) -> bool {
        matches!(self, SourceFamily::Listing | SourceFamily::Generic)
    }

    pub fn parser(&self, today: NaiveDate) -> Box<dyn Parser> {
        match self {
            SourceFamily::Social => Box::new(SocialParser::new(today)),
            SourceFamily::Listing => Box::new(ListingParser::new()),
            SourceFamily::Ticketing | SourceFamily::Generic => Box::new(GenericParser::new()),
        }
    }
}
