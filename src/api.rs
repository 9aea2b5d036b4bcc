// API client module: one method per gateway endpoint. Every call goes through
// the `Session`, which supplies the bearer token; the presigned upload PUT is
// the only request that bypasses it.

use reqwest::{Method, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::config::Settings;
use crate::error::{ClientError, Result};
use crate::params::{LeaderboardQuery, MarketFilter, NewMarket, Page, PresignRequest, QuoteRequest};
use crate::session::{ApiRequest, Session};
use crate::store::{FileTokenStore, TokenStore};
use crate::transport::{Body, HttpRequest, HttpTransport, Transport};

/// Gateway client holding the session and the deadline for direct uploads.
pub struct ApiClient {
    session: Session,
    upload_timeout: std::time::Duration,
}

/// Upload target handed out by `upload/presigned-url`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PresignedUpload {
    pub upload_url: String,
    pub file_url: String,
}

impl ApiClient {
    pub fn new(
        settings: &Settings,
        transport: Box<dyn Transport>,
        store: Box<dyn TokenStore>,
    ) -> Self {
        Self {
            session: Session::new(settings, transport, store),
            upload_timeout: settings.upload_timeout,
        }
    }

    /// Client wired to the real network and the on-disk token cache.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let transport = HttpTransport::new().map_err(|e| {
            ClientError::Configuration(format!("failed to build HTTP client: {}", e))
        })?;
        let store = FileTokenStore::new(&settings.token_cache);
        Ok(Self::new(settings, Box::new(transport), Box::new(store)))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn call(&mut self, request: ApiRequest) -> Result<Value> {
        self.session.authorized_request(&request)
    }

    fn paged(path: impl Into<String>, page: Page) -> ApiRequest {
        ApiRequest::get(path)
            .query("page", page.page)
            .query("limit", page.limit)
    }

    // ---- markets ----

    pub fn list_markets(&mut self, filter: &MarketFilter) -> Result<Value> {
        let req = Self::paged("markets", filter.page)
            .query("status", &filter.status)
            .query_opt("category_id", filter.category_id.as_ref());
        self.call(req)
    }

    pub fn get_market(&mut self, market_id: &str) -> Result<Value> {
        self.call(ApiRequest::get(format!("markets/{}", market_id)))
    }

    pub fn get_market_activity(&mut self, market_id: &str, page: Page) -> Result<Value> {
        self.call(Self::paged(format!("markets/{}/activity", market_id), page))
    }

    pub fn get_price_history(&mut self, market_id: &str) -> Result<Value> {
        self.call(ApiRequest::get(format!("markets/{}/price-history", market_id)))
    }

    pub fn get_holders(&mut self, market_id: &str, page: Page) -> Result<Value> {
        self.call(Self::paged(format!("markets/{}/holders", market_id), page))
    }

    pub fn get_traders(&mut self, market_id: &str, page: Page) -> Result<Value> {
        self.call(Self::paged(format!("markets/{}/traders", market_id), page))
    }

    /// Create a market. Fails locally when the probability count does not
    /// match the option count.
    pub fn create_market(&mut self, market: &NewMarket) -> Result<Value> {
        if let Some(probs) = &market.initial_probabilities {
            if probs.len() != market.options.len() {
                return Err(ClientError::Validation(format!(
                    "number of initial probabilities ({}) must match number of options ({})",
                    probs.len(),
                    market.options.len()
                )));
            }
        }
        self.call(ApiRequest::post("markets").json(market))
    }

    // ---- trading ----

    pub fn get_quote(&mut self, quote: &QuoteRequest) -> Result<Value> {
        let req = ApiRequest::get("trade/quote")
            .query("prediction_id", &quote.market_id)
            .query("option_id", &quote.option_id)
            .query("amount", quote.amount)
            .query("side", quote.side.as_str());
        self.call(req)
    }

    pub fn buy(&mut self, market_id: &str, option_id: &str, amount: u64) -> Result<Value> {
        let body = json!({
            "prediction_id": market_id,
            "option_id": option_id,
            "amount": amount.to_string(),
        });
        self.call(ApiRequest::post("trade/buy").json(body))
    }

    pub fn sell(&mut self, market_id: &str, option_id: &str, shares: u64) -> Result<Value> {
        let body = json!({
            "prediction_id": market_id,
            "option_id": option_id,
            "shares": shares.to_string(),
        });
        self.call(ApiRequest::post("trade/sell").json(body))
    }

    pub fn get_positions(&mut self, page: Page) -> Result<Value> {
        self.call(Self::paged("trade/positions", page))
    }

    pub fn get_trade_history(&mut self, page: Page) -> Result<Value> {
        self.call(Self::paged("trade/history", page))
    }

    // ---- wallet ----

    pub fn get_balance(&mut self) -> Result<Value> {
        self.call(ApiRequest::get("wallet/balance"))
    }

    pub fn get_transactions(&mut self, page: Page) -> Result<Value> {
        self.call(Self::paged("wallet/transactions", page))
    }

    pub fn get_credit_history(&mut self, page: Page) -> Result<Value> {
        self.call(Self::paged("wallet/credit-history", page))
    }

    pub fn get_daily_gift_status(&mut self) -> Result<Value> {
        self.call(ApiRequest::get("wallet/daily-gift"))
    }

    pub fn claim_daily_gift(&mut self) -> Result<Value> {
        self.call(ApiRequest::post("wallet/daily-gift"))
    }

    // ---- users ----

    /// `user_id` may be `me` for the logged-in agent.
    pub fn get_profile(&mut self, user_id: &str) -> Result<Value> {
        self.call(ApiRequest::get(format!("users/{}", user_id)))
    }

    pub fn get_default_avatars(&mut self) -> Result<Value> {
        self.call(ApiRequest::get("users/default-avatars"))
    }

    pub fn get_leaderboard(&mut self, query: &LeaderboardQuery) -> Result<Value> {
        let req = Self::paged("users/leaderboard", query.page).query("timeframe", &query.timeframe);
        self.call(req)
    }

    pub fn get_followers(&mut self, user_id: &str, page: Page) -> Result<Value> {
        self.call(Self::paged(format!("users/{}/followers", user_id), page))
    }

    pub fn get_following(&mut self, user_id: &str, page: Page) -> Result<Value> {
        self.call(Self::paged(format!("users/{}/following", user_id), page))
    }

    pub fn get_favorites(&mut self, user_id: &str, page: Page) -> Result<Value> {
        self.call(Self::paged(format!("users/{}/favorites", user_id), page))
    }

    pub fn follow(&mut self, user_id: &str) -> Result<Value> {
        self.call(ApiRequest::post(format!("users/{}/follow", user_id)))
    }

    pub fn unfollow(&mut self, user_id: &str) -> Result<Value> {
        self.call(ApiRequest::delete(format!("users/{}/follow", user_id)))
    }

    pub fn block(&mut self, user_id: &str) -> Result<Value> {
        self.call(ApiRequest::post(format!("users/{}/block", user_id)))
    }

    pub fn unblock(&mut self, user_id: &str) -> Result<Value> {
        self.call(ApiRequest::delete(format!("users/{}/block", user_id)))
    }

    // ---- social ----

    pub fn get_comments(&mut self, market_id: &str, page: Page) -> Result<Value> {
        self.call(Self::paged(format!("markets/{}/comments", market_id), page))
    }

    pub fn add_comment(&mut self, market_id: &str, content: &str) -> Result<Value> {
        let req = ApiRequest::post(format!("markets/{}/comments", market_id))
            .json(json!({ "content": content }));
        self.call(req)
    }

    pub fn delete_comment(&mut self, market_id: &str, comment_id: &str) -> Result<Value> {
        self.call(ApiRequest::delete(format!("markets/{}/comments/{}", market_id, comment_id)))
    }

    pub fn favorite(&mut self, market_id: &str) -> Result<Value> {
        self.call(ApiRequest::post(format!("markets/{}/favorite", market_id)))
    }

    pub fn unfavorite(&mut self, market_id: &str) -> Result<Value> {
        self.call(ApiRequest::delete(format!("markets/{}/favorite", market_id)))
    }

    // ---- challenges ----

    pub fn list_challenges(&mut self) -> Result<Value> {
        self.call(ApiRequest::get("challenges"))
    }

    pub fn claim_challenge(&mut self, challenge_id: &str) -> Result<Value> {
        self.call(ApiRequest::post(format!("challenges/{}/claim", challenge_id)))
    }

    // ---- oracle ----

    pub fn get_oracle_status(&mut self, prediction_id: &str) -> Result<Value> {
        self.call(ApiRequest::get(format!("oracle/status/{}", prediction_id)))
    }

    pub fn assert_result(&mut self, prediction_id: &str, option_id: &str) -> Result<Value> {
        self.oracle_call("oracle/assert", prediction_id, option_id)
    }

    pub fn dispute_result(&mut self, prediction_id: &str, option_id: &str) -> Result<Value> {
        self.oracle_call("oracle/dispute", prediction_id, option_id)
    }

    pub fn vote(&mut self, prediction_id: &str, option_id: &str) -> Result<Value> {
        self.oracle_call("oracle/vote", prediction_id, option_id)
    }

    pub fn settle(&mut self, prediction_id: &str) -> Result<Value> {
        self.call(ApiRequest::post("oracle/settle").json(json!({ "prediction_id": prediction_id })))
    }

    fn oracle_call(&mut self, path: &str, prediction_id: &str, option_id: &str) -> Result<Value> {
        let body = json!({ "prediction_id": prediction_id, "option_id": option_id });
        self.call(ApiRequest::post(path).json(body))
    }

    // ---- categories ----

    pub fn list_categories(&mut self) -> Result<Value> {
        self.call(ApiRequest::get("categories"))
    }

    // ---- uploads ----

    pub fn get_presigned_url(&mut self, presign: &PresignRequest) -> Result<Value> {
        let req = ApiRequest::get("upload/presigned-url")
            .query("content_type", &presign.content_type)
            .query("file_extension", &presign.file_extension);
        self.call(req)
    }

    /// PUT `bytes` straight to a presigned target. No bearer token is sent.
    pub fn upload_file(&self, upload_url: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let target = redact_query(upload_url);
        let mut req = HttpRequest::new(Method::PUT, upload_url, self.upload_timeout);
        req.headers
            .push(("Content-Type".to_string(), content_type.to_string()));
        req.body = Body::Bytes(bytes);

        debug!(target = %target, "uploading file");
        let res = self
            .session
            .transport()
            .send(&req)
            .map_err(|e| ClientError::request(&target, None, e.to_string()))?;
        if !res.status.is_success() {
            return Err(ClientError::request(
                &target,
                Some(res.status),
                format!("upload rejected with {}", res.status),
            ));
        }
        Ok(())
    }

    /// Presign, upload, and return the public URL of the stored file.
    pub fn upload(&mut self, bytes: Vec<u8>, presign: &PresignRequest) -> Result<String> {
        let value = self.get_presigned_url(presign)?;
        let target: PresignedUpload = serde_json::from_value(value).map_err(|e| {
            let reason = format!("unexpected presign response: {}", e);
            ClientError::request("upload/presigned-url", None, reason)
        })?;
        self.upload_file(&target.upload_url, bytes, &presign.content_type)?;
        Ok(target.file_url)
    }
}

// Presigned URLs carry their signature in the query string.
fn redact_query(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.to_string()
        }
        Err(_) => "presigned upload".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::params::TradeSide;
    use crate::store::MemoryTokenStore;
    use crate::testkit::ScriptedTransport;

    fn client() -> (ApiClient, ScriptedTransport) {
        let settings = Settings {
            base_url: "http://api.test/v1".into(),
            credentials: Credentials::new("k", "s"),
            ..Settings::default()
        };
        let transport = ScriptedTransport::new();
        let client = ApiClient::new(
            &settings,
            Box::new(transport.clone()),
            Box::new(MemoryTokenStore::with_token("tok")),
        );
        (client, transport)
    }

    fn query(req: &HttpRequest) -> Vec<(&str, &str)> {
        req.query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn paginated_endpoints_pass_page_and_limit() {
        let (mut client, transport) = client();
        for _ in 0..4 {
            transport.reply_json(200, json!({ "items": [] }));
        }
        let page = Page::new(3, 5);
        client.get_holders("m1", page).unwrap();
        client.get_followers("u1", page).unwrap();
        client.get_transactions(page).unwrap();
        client.get_comments("m1", Page::default()).unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].url, "http://api.test/v1/markets/m1/holders");
        assert_eq!(sent[1].url, "http://api.test/v1/users/u1/followers");
        assert_eq!(sent[2].url, "http://api.test/v1/wallet/transactions");
        for req in &sent[..3] {
            assert_eq!(query(req), vec![("page", "3"), ("limit", "5")]);
        }
        assert_eq!(query(&sent[3]), vec![("page", "1"), ("limit", "20")]);
    }

    #[test]
    fn list_markets_includes_category_only_when_set() {
        let (mut client, transport) = client();
        transport.reply_json(200, json!([])).reply_json(200, json!([]));

        client.list_markets(&MarketFilter::default()).unwrap();
        let filter = MarketFilter {
            category_id: Some("sports".into()),
            ..MarketFilter::default()
        };
        client.list_markets(&filter).unwrap();

        let sent = transport.requests();
        assert_eq!(query(&sent[0]), vec![("page", "1"), ("limit", "20"), ("status", "active")]);
        assert_eq!(sent[1].query_param("category_id"), Some("sports"));
    }

    #[test]
    fn trade_amounts_are_sent_as_strings() {
        let (mut client, transport) = client();
        transport.reply_json(200, json!({})).reply_json(200, json!({}));

        client.buy("m1", "o1", 250).unwrap();
        client.sell("m1", "o2", 7).unwrap();

        let sent = transport.requests();
        assert_eq!(sent[0].url, "http://api.test/v1/trade/buy");
        assert_eq!(
            sent[0].body,
            Body::Json(json!({ "prediction_id": "m1", "option_id": "o1", "amount": "250" }))
        );
        assert_eq!(
            sent[1].body,
            Body::Json(json!({ "prediction_id": "m1", "option_id": "o2", "shares": "7" }))
        );
    }

    #[test]
    fn quote_uses_query_parameters() {
        let (mut client, transport) = client();
        transport.reply_json(200, json!({ "price": "0.4" }));
        let quote = QuoteRequest {
            market_id: "m1".into(),
            option_id: "o1".into(),
            amount: 100,
            side: TradeSide::Sell,
        };
        client.get_quote(&quote).unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.method, Method::GET);
        assert_eq!(
            query(sent),
            vec![("prediction_id", "m1"), ("option_id", "o1"), ("amount", "100"), ("side", "sell")]
        );
    }

    #[test]
    fn social_endpoints_use_expected_verbs() {
        let (mut client, transport) = client();
        for _ in 0..6 {
            transport.reply_json(200, json!({}));
        }
        client.follow("u1").unwrap();
        client.unfollow("u1").unwrap();
        client.unblock("u2").unwrap();
        client.add_comment("m1", "nice").unwrap();
        client.delete_comment("m1", "c9").unwrap();
        client.unfavorite("m1").unwrap();

        let calls: Vec<(Method, String)> = transport
            .requests()
            .into_iter()
            .map(|r| (r.method, r.url.replace("http://api.test/v1/", "")))
            .collect();
        assert_eq!(
            calls,
            vec![
                (Method::POST, "users/u1/follow".to_string()),
                (Method::DELETE, "users/u1/follow".to_string()),
                (Method::DELETE, "users/u2/block".to_string()),
                (Method::POST, "markets/m1/comments".to_string()),
                (Method::DELETE, "markets/m1/comments/c9".to_string()),
                (Method::DELETE, "markets/m1/favorite".to_string()),
            ]
        );
        assert_eq!(transport.requests()[3].body, Body::Json(json!({ "content": "nice" })));
    }

    #[test]
    fn oracle_endpoints_post_prediction_bodies() {
        let (mut client, transport) = client();
        for _ in 0..4 {
            transport.reply_json(200, json!({}));
        }
        client.assert_result("p1", "o1").unwrap();
        client.dispute_result("p1", "o2").unwrap();
        client.vote("p1", "o1").unwrap();
        client.settle("p1").unwrap();

        let sent = transport.requests();
        assert_eq!(sent[1].url, "http://api.test/v1/oracle/dispute");
        assert_eq!(sent[1].body, Body::Json(json!({ "prediction_id": "p1", "option_id": "o2" })));
        assert_eq!(sent[3].url, "http://api.test/v1/oracle/settle");
        assert_eq!(sent[3].body, Body::Json(json!({ "prediction_id": "p1" })));
    }

    #[test]
    fn create_market_rejects_mismatched_probabilities_locally() {
        let (mut client, transport) = client();
        let cases: [(usize, usize); 4] = [(2, 3), (3, 2), (0, 1), (2, 0)];
        for (options, probs) in cases {
            let names = (0..options).map(|i| format!("opt{i}")).collect();
            let mut market = NewMarket::new("t", names, "2026-12-01");
            market.initial_probabilities = Some(vec![50; probs]);
            let err = client.create_market(&market).unwrap_err();
            assert!(matches!(err, ClientError::Validation(_)), "{options} vs {probs}");
        }
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn create_market_posts_body() {
        let (mut client, transport) = client();
        transport.reply_json(201, json!({ "id": "m42" }));
        let mut market = NewMarket::new("t", vec!["Yes".into(), "No".into()], "2026-12-01");
        market.initial_probabilities = Some(vec![70, 30]);

        assert_eq!(client.create_market(&market).unwrap(), json!({ "id": "m42" }));
        let sent = &transport.requests()[0];
        assert_eq!(sent.url, "http://api.test/v1/markets");
        assert_eq!(
            sent.body,
            Body::Json(json!({
                "title": "t",
                "options": ["Yes", "No"],
                "end_time": "2026-12-01",
                "initial_probabilities": [70, 30],
            }))
        );
    }

    #[test]
    fn upload_presigns_then_puts_without_bearer() {
        let (mut client, transport) = client();
        transport
            .reply_json(
                200,
                json!({
                    "upload_url": "https://bucket.test/obj?sig=abc",
                    "file_url": "https://cdn.test/obj",
                }),
            )
            .reply_raw(200, "");

        let presign = PresignRequest {
            content_type: "image/png".into(),
            file_extension: "png".into(),
        };
        let url = client.upload(vec![1, 2, 3], &presign).unwrap();
        assert_eq!(url, "https://cdn.test/obj");

        let sent = transport.requests();
        assert_eq!(query(&sent[0]), vec![("content_type", "image/png"), ("file_extension", "png")]);
        assert_eq!(sent[1].method, Method::PUT);
        assert_eq!(sent[1].url, "https://bucket.test/obj?sig=abc");
        assert_eq!(sent[1].header("Authorization"), None);
        assert_eq!(sent[1].header("Content-Type"), Some("image/png"));
        assert_eq!(sent[1].body, Body::Bytes(vec![1, 2, 3]));
    }

    #[test]
    fn upload_failure_hides_signature() {
        let (mut client, transport) = client();
        transport
            .reply_json(
                200,
                json!({ "upload_url": "https://bucket.test/obj?sig=abc", "file_url": "f" }),
            )
            .reply_raw(403, "denied");

        let err = client.upload(vec![0], &PresignRequest::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("https://bucket.test/obj"));
        assert!(!message.contains("sig=abc"));
        assert_eq!(err.status(), Some(reqwest::StatusCode::FORBIDDEN));
    }

    #[test]
    fn upload_requires_presign_fields() {
        let (mut client, transport) = client();
        transport.reply_json(200, json!({ "file_url": "f" }));
        let err = client.upload(vec![0], &PresignRequest::default()).unwrap_err();
        assert!(matches!(err, ClientError::Request { .. }));
        assert_eq!(transport.requests().len(), 1);
    }
}
