//! Task Endpoints
//!
//! Loading board cards and persisting column changes.

use serde::Serialize;

use crate::error::BoardResult;
use crate::models::Card;

use super::{check_status, decode_listing, HttpBoardApi};

// ========================
// Argument Structs
// ========================

/// Body of `PUT /tasks/updateCardColumn/{id}`
#[derive(Debug, Serialize, PartialEq)]
pub struct UpdateCardColumnArgs<'a> {
    pub column: &'a str,
}

// ========================
// Commands
// ========================

impl HttpBoardApi {
    /// `GET /getTasks[?userId=]`
    pub async fn get_tasks(&self, user_id: Option<&str>) -> BoardResult<Vec<Card>> {
        let mut url = self.endpoint(&["getTasks"])?;
        if let Some(user) = user_id {
            url.query_pairs_mut().append_pair("userId", user);
        }
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let cards: Vec<Card> = decode_listing(response).await?;
        log::debug!("[API] Loaded {} tasks (user={:?})", cards.len(), user_id);
        Ok(cards)
    }

    /// `PUT /tasks/updateCardColumn/{id}`; the response body is ignored
    pub async fn put_card_column(&self, card_id: &str, column: &str) -> BoardResult<()> {
        let url = self.endpoint(&["tasks", "updateCardColumn", card_id])?;
        let response = self
            .request(reqwest::Method::PUT, url)
            .json(&UpdateCardColumnArgs { column })
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}
