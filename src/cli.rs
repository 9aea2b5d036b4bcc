// Command-line surface: one subcommand per gateway call.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{json, Value};

use crate::api::ApiClient;
use crate::params::{
    LeaderboardQuery, MarketFilter, NewMarket, Page, PresignRequest, QuoteRequest, TradeSide,
};

/// SeeSaw prediction market CLI.
#[derive(Parser, Debug)]
#[command(name = "seesaw")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log filter when SEESAW_LOG is unset (error, warn, info, debug)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = 20)]
    pub limit: u32,
}

impl From<PageArgs> for Page {
    fn from(args: PageArgs) -> Self {
        Page::new(args.page, args.limit)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Get wallet balance
    Balance,
    /// Get transaction history
    Transactions(PageArgs),
    /// Get credit history
    CreditHistory(PageArgs),
    /// Get daily gift status
    DailyGiftStatus,
    /// Claim daily gift
    ClaimDailyGift,

    /// List prediction markets
    ListMarkets {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, default_value = "active")]
        status: String,
        #[arg(long = "category")]
        category_id: Option<String>,
    },
    /// Get market details
    GetMarket {
        /// Market ID
        id: String,
    },
    /// Get market activity
    MarketActivity {
        market_id: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Get price history
    PriceHistory { market_id: String },
    /// Get market holders
    Holders {
        market_id: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Get market traders
    Traders {
        market_id: String,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Get a quote
    Quote {
        market_id: String,
        option_id: String,
        amount: u64,
        #[arg(long, value_enum, default_value_t = TradeSide::Buy)]
        side: TradeSide,
    },
    /// Buy shares
    Buy {
        market_id: String,
        option_id: String,
        amount: u64,
    },
    /// Sell shares
    Sell {
        market_id: String,
        option_id: String,
        shares: u64,
    },
    /// Get positions
    Positions(PageArgs),
    /// Get trade history
    TradeHistory(PageArgs),

    /// Get user profile
    Profile {
        /// User ID (use 'me' for current user)
        user_id: String,
    },
    /// List default avatars
    DefaultAvatars,
    /// Get leaderboard
    Leaderboard {
        #[command(flatten)]
        page: PageArgs,
        #[arg(long, default_value = "all")]
        timeframe: String,
    },
    /// Get user followers
    Followers {
        user_id: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Get users followed by user
    Following {
        user_id: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Get user favorites
    Favorites {
        user_id: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Follow a user
    Follow { user_id: String },
    /// Unfollow a user
    Unfollow { user_id: String },
    /// Block a user
    Block { user_id: String },
    /// Unblock a user
    Unblock { user_id: String },

    /// Get market comments
    Comments {
        market_id: String,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Add a comment
    AddComment { market_id: String, content: String },
    /// Delete a comment
    DeleteComment { market_id: String, comment_id: String },
    /// Favorite a market
    Favorite { market_id: String },
    /// Unfavorite a market
    Unfavorite { market_id: String },

    /// List challenges
    Challenges,
    /// Claim challenge reward
    ClaimChallenge { challenge_id: String },

    /// Get oracle status
    OracleStatus { prediction_id: String },
    /// Assert prediction result
    Assert { prediction_id: String, option_id: String },
    /// Dispute prediction result
    Dispute { prediction_id: String, option_id: String },
    /// Vote on prediction result
    Vote { prediction_id: String, option_id: String },
    /// Settle prediction
    Settle { prediction_id: String },

    /// List categories
    Categories,

    /// Create a new market
    CreateMarket {
        #[arg(long)]
        title: String,
        #[arg(long, num_args = 1.., required = true)]
        options: Vec<String>,
        /// ISO8601 string
        #[arg(long)]
        end_time: String,
        #[arg(long)]
        description: Option<String>,
        /// Initial probabilities
        #[arg(long, num_args = 1..)]
        probs: Option<Vec<u32>>,
        /// Image URLs
        #[arg(long, num_args = 1..)]
        images: Option<Vec<String>>,
    },
    /// Upload an image
    Upload {
        /// Path to image file
        file: PathBuf,
        #[arg(long = "type", default_value = "image/jpeg")]
        content_type: String,
        #[arg(long = "ext", default_value = "jpg")]
        extension: String,
    },
}

/// Run one command against the gateway and return the JSON to print.
pub fn dispatch(api: &mut ApiClient, command: Command) -> Result<Value> {
    let value = match command {
        Command::Balance => api.get_balance()?,
        Command::Transactions(page) => api.get_transactions(page.into())?,
        Command::CreditHistory(page) => api.get_credit_history(page.into())?,
        Command::DailyGiftStatus => api.get_daily_gift_status()?,
        Command::ClaimDailyGift => api.claim_daily_gift()?,

        Command::ListMarkets {
            page,
            status,
            category_id,
        } => api.list_markets(&MarketFilter {
            page: page.into(),
            status,
            category_id,
        })?,
        Command::GetMarket { id } => api.get_market(&id)?,
        Command::MarketActivity { market_id, page } => {
            api.get_market_activity(&market_id, page.into())?
        }
        Command::PriceHistory { market_id } => api.get_price_history(&market_id)?,
        Command::Holders { market_id, page } => api.get_holders(&market_id, page.into())?,
        Command::Traders { market_id, page } => api.get_traders(&market_id, page.into())?,

        Command::Quote {
            market_id,
            option_id,
            amount,
            side,
        } => api.get_quote(&QuoteRequest {
            market_id,
            option_id,
            amount,
            side,
        })?,
        Command::Buy {
            market_id,
            option_id,
            amount,
        } => api.buy(&market_id, &option_id, amount)?,
        Command::Sell {
            market_id,
            option_id,
            shares,
        } => api.sell(&market_id, &option_id, shares)?,
        Command::Positions(page) => api.get_positions(page.into())?,
        Command::TradeHistory(page) => api.get_trade_history(page.into())?,

        Command::Profile { user_id } => api.get_profile(&user_id)?,
        Command::DefaultAvatars => api.get_default_avatars()?,
        Command::Leaderboard { page, timeframe } => api.get_leaderboard(&LeaderboardQuery {
            page: page.into(),
            timeframe,
        })?,
        Command::Followers { user_id, page } => api.get_followers(&user_id, page.into())?,
        Command::Following { user_id, page } => api.get_following(&user_id, page.into())?,
        Command::Favorites { user_id, page } => api.get_favorites(&user_id, page.into())?,
        Command::Follow { user_id } => api.follow(&user_id)?,
        Command::Unfollow { user_id } => api.unfollow(&user_id)?,
        Command::Block { user_id } => api.block(&user_id)?,
        Command::Unblock { user_id } => api.unblock(&user_id)?,

        Command::Comments { market_id, page } => api.get_comments(&market_id, page.into())?,
        Command::AddComment { market_id, content } => api.add_comment(&market_id, &content)?,
        Command::DeleteComment {
            market_id,
            comment_id,
        } => api.delete_comment(&market_id, &comment_id)?,
        Command::Favorite { market_id } => api.favorite(&market_id)?,
        Command::Unfavorite { market_id } => api.unfavorite(&market_id)?,

        Command::Challenges => api.list_challenges()?,
        Command::ClaimChallenge { challenge_id } => api.claim_challenge(&challenge_id)?,

        Command::OracleStatus { prediction_id } => api.get_oracle_status(&prediction_id)?,
        Command::Assert {
            prediction_id,
            option_id,
        } => api.assert_result(&prediction_id, &option_id)?,
        Command::Dispute {
            prediction_id,
            option_id,
        } => api.dispute_result(&prediction_id, &option_id)?,
        Command::Vote {
            prediction_id,
            option_id,
        } => api.vote(&prediction_id, &option_id)?,
        Command::Settle { prediction_id } => api.settle(&prediction_id)?,

        Command::Categories => api.list_categories()?,

        Command::CreateMarket {
            title,
            options,
            end_time,
            description,
            probs,
            images,
        } => {
            let market = NewMarket {
                description,
                initial_probabilities: probs,
                image_urls: images,
                ..NewMarket::new(title, options, end_time)
            };
            api.create_market(&market)?
        }
        Command::Upload {
            file,
            content_type,
            extension,
        } => {
            let bytes =
                fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
            let presign = PresignRequest {
                content_type,
                file_extension: extension,
            };
            let spinner = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                spinner.set_style(style);
            }
            spinner.set_message("Uploading...");
            let uploaded = api.upload(bytes, &presign);
            spinner.finish_and_clear();
            json!({ "file_url": uploaded? })
        }
    };
    Ok(value)
}

/// Indented JSON as printed on stdout.
pub fn render(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
