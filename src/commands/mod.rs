//! Backend API
//!
//! The REST collaborator behind the board, organized by resource.

mod status;
mod task;


use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::BoardConfig;
use crate::error::{BoardError, BoardResult};
use crate::models::{Card, Column};
use crate::store::BoardSnapshot;

pub use task::UpdateCardColumnArgs;

/// Endpoints the board core depends on
///
/// Implementations can talk HTTP or stay in memory (tests).
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
pub trait BoardApi {
    /// Status catalog, sorted by `order`
    async fn list_columns(&self) -> BoardResult<Vec<Column>>;

    /// Board cards, optionally only those of one user
    async fn list_cards(&self, user_id: Option<&str>) -> BoardResult<Vec<Card>>;

    /// Persist a card's new column
    async fn update_card_column(&self, card_id: &str, column: &str) -> BoardResult<()>;
}

/// Fetch everything a board load needs: the status catalog and the cards
pub async fn fetch_snapshot<A>(api: &A, user_id: Option<&str>) -> BoardResult<BoardSnapshot>
where
    A: BoardApi + ?Sized,
{
    let columns = api.list_columns().await?;
    let cards = api.list_cards(user_id).await?;
    Ok(BoardSnapshot { columns, cards })
}

/// reqwest-backed client
#[derive(Clone, Debug)]
pub struct HttpBoardApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBoardApi {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
        }
    }

    pub fn from_config(config: &BoardConfig) -> Self {
        Self::new(config.api_base_url.clone(), config.api_token.clone())
    }

    /// Base URL plus percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> BoardResult<reqwest::Url> {
        let invalid = |reason: String| BoardError::InvalidInput(format!("api_base_url {}", reason));
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| invalid(format!("{} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: reqwest::Url) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl BoardApi for HttpBoardApi {
    async fn list_columns(&self) -> BoardResult<Vec<Column>> {
        self.get_statuses().await
    }

    async fn list_cards(&self, user_id: Option<&str>) -> BoardResult<Vec<Card>> {
        self.get_tasks(user_id).await
    }

    async fn update_card_column(&self, card_id: &str, column: &str) -> BoardResult<()> {
        self.put_card_column(card_id, column).await
    }
}

/// List endpoints answer either with a bare array or wrapped in an object
#[derive(Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Bare(Vec<T>),
    Wrapped {
        #[serde(alias = "statuses", alias = "tasks")]
        data: Vec<T>,
    },
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Bare(items) => items,
            Listing::Wrapped { data } => data,
        }
    }
}

/// Turn a non-2xx response into `BoardError::Api`
async fn check_status(response: reqwest::Response) -> BoardResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(BoardError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn decode_listing<T: DeserializeOwned>(response: reqwest::Response) -> BoardResult<Vec<T>> {
    let body = check_status(response).await?.text().await?;
    let listing: Listing<T> = serde_json::from_str(&body)?;
    Ok(listing.into_vec())
}
