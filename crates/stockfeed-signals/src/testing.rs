//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stockfeed_core::{AuthorRank, AuthorStanding, Sentiment, SignalPost};
use stockfeed_market::{MarketError, MarketQuote};

use crate::collaborators::{AuthorProfile, ExpertStore, PostStore, QuoteProvider, TextGenerator};
use crate::error::SignalError;
use crate::experts::ExpertPost;

pub(crate) fn post(
    sentiment: Option<Sentiment>,
    reputation: i32,
    rank: AuthorRank,
    quality: Option<i32>,
) -> SignalPost {
    SignalPost {
        id: 1,
        content: "fixture".to_string(),
        sentiment,
        created_at: Utc::now(),
        author: AuthorStanding {
            reputation_score: reputation,
            rank,
        },
        insight_quality: quality,
    }
}

pub(crate) struct FakePosts {
    posts: Vec<SignalPost>,
    fail: bool,
    pub calls: AtomicUsize,
    pub last_query: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl FakePosts {
    pub fn new(posts: Vec<SignalPost>) -> Self {
        Self {
            posts,
            fail: false,
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }
}

#[async_trait]
impl PostStore for FakePosts {
    async fn find_posts(
        &self,
        ticker: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<SignalPost>, SignalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().expect("lock") = Some((ticker.to_string(), since));
        if self.fail {
            return Err(SignalError::Store(stockfeed_db::DbError::NotFound));
        }
        Ok(self.posts.clone())
    }
}

/// Quotes keyed by symbol; unknown symbols fail with `NotFound`.
#[derive(Default)]
pub(crate) struct FakeQuotes {
    quotes: HashMap<String, MarketQuote>,
    pub calls: AtomicUsize,
}

impl FakeQuotes {
    pub fn with(mut self, quote: MarketQuote) -> Self {
        self.quotes.insert(quote.symbol.clone(), quote);
        self
    }
}

#[async_trait]
impl QuoteProvider for FakeQuotes {
    async fn quote(&self, symbol: &str) -> Result<MarketQuote, SignalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| SignalError::Quote(MarketError::NotFound(symbol.to_string())))
    }
}

pub(crate) enum Reply {
    Text(String),
    Fail,
    Hang,
}

pub(crate) struct FakeGenerator {
    reply: Reply,
    pub calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().expect("lock").last().cloned()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str, _timeout: Duration) -> Result<String, SignalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().expect("lock").push(prompt.to_string());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(SignalError::Generator("connection refused".to_string())),
            Reply::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(String::new())
            }
        }
    }
}

/// Records authors and published posts; `recent` tickers count as covered.
#[derive(Default)]
pub(crate) struct FakeExperts {
    recent: HashSet<String>,
    fail_publish: bool,
    pub authors: Mutex<Vec<(String, i32, AuthorRank)>>,
    pub published: Mutex<Vec<ExpertPost>>,
}

impl FakeExperts {
    pub fn with_recent(mut self, ticker: &str) -> Self {
        self.recent.insert(ticker.to_string());
        self
    }

    pub fn failing_publish() -> Self {
        Self {
            fail_publish: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl ExpertStore for FakeExperts {
    async fn ensure_author(&self, profile: &AuthorProfile<'_>) -> Result<i64, SignalError> {
        self.authors.lock().expect("lock").push((
            profile.username.to_string(),
            profile.reputation_score,
            profile.rank,
        ));
        Ok(42)
    }

    async fn has_recent_post(
        &self,
        author_id: i64,
        ticker: &str,
        _since: DateTime<Utc>,
    ) -> Result<bool, SignalError> {
        assert_eq!(author_id, 42);
        Ok(self.recent.contains(ticker))
    }

    async fn publish(&self, author_id: i64, post: &ExpertPost) -> Result<i64, SignalError> {
        assert_eq!(author_id, 42);
        if self.fail_publish {
            return Err(SignalError::Store(stockfeed_db::DbError::NotFound));
        }
        let mut published = self.published.lock().expect("lock");
        published.push(post.clone());
        Ok(i64::try_from(published.len()).expect("small count"))
    }
}
