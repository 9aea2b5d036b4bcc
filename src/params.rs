// Per-call parameter structs. `Default` impls carry the wire defaults; `None`
// fields are left off the request entirely rather than sent as null.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl Page {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

/// Filter for `list_markets`.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketFilter {
    pub page: Page,
    pub status: String,
    /// Omitted from the query when `None`.
    pub category_id: Option<String>,
}

impl Default for MarketFilter {
    fn default() -> Self {
        Self {
            page: Page::default(),
            status: "active".into(),
            category_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardQuery {
    pub page: Page,
    pub timeframe: String,
}

impl Default for LeaderboardQuery {
    fn default() -> Self {
        Self {
            page: Page::default(),
            timeframe: "all".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TradeSide {
    #[default]
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "buy",
            TradeSide::Sell => "sell",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRequest {
    pub market_id: String,
    pub option_id: String,
    pub amount: u64,
    pub side: TradeSide,
}

/// Body of `POST markets`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewMarket {
    pub title: String,
    pub options: Vec<String>,
    /// ISO-8601 timestamp.
    pub end_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_probabilities: Option<Vec<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_urls: Option<Vec<String>>,
}

impl NewMarket {
    pub fn new(
        title: impl Into<String>,
        options: Vec<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            options,
            end_time: end_time.into(),
            description: None,
            initial_probabilities: None,
            image_urls: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresignRequest {
    pub content_type: String,
    pub file_extension: String,
}

impl Default for PresignRequest {
    fn default() -> Self {
        Self {
            content_type: "image/jpeg".into(),
            file_extension: "jpg".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_market_omits_absent_fields() {
        let options = vec!["Yes".into(), "No".into()];
        let market = NewMarket::new("Rain?", options, "2026-12-01T00:00:00Z");
        assert_eq!(
            serde_json::to_value(&market).unwrap(),
            json!({
                "title": "Rain?",
                "options": ["Yes", "No"],
                "end_time": "2026-12-01T00:00:00Z",
            })
        );
    }

    #[test]
    fn new_market_keeps_present_fields() {
        let mut market = NewMarket::new("Rain?", vec!["Yes".into(), "No".into()], "2026-12-01");
        market.description = Some("Will it rain".into());
        market.initial_probabilities = Some(vec![60, 40]);
        market.image_urls = Some(vec!["https://cdn/x.jpg".into()]);
        let value = serde_json::to_value(&market).unwrap();
        assert_eq!(value["description"], "Will it rain");
        assert_eq!(value["initial_probabilities"], json!([60, 40]));
        assert_eq!(value["image_urls"], json!(["https://cdn/x.jpg"]));
    }

    #[test]
    fn defaults_match_the_gateway() {
        assert_eq!(Page::default(), Page::new(1, 20));
        assert_eq!(MarketFilter::default().status, "active");
        assert_eq!(LeaderboardQuery::default().timeframe, "all");
        assert_eq!(TradeSide::default().as_str(), "buy");
        assert_eq!(PresignRequest::default().file_extension, "jpg");
    }
}
