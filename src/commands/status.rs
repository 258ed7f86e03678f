//! Status Endpoints
//!
//! The column catalog shown as the board's lanes.

use crate::error::BoardResult;
use crate::models::Column;

use super::{decode_listing, HttpBoardApi};

impl HttpBoardApi {
    /// `GET /statuses`, sorted by `order`
    pub async fn get_statuses(&self) -> BoardResult<Vec<Column>> {
        let url = self.endpoint(&["statuses"])?;
        let response = self.request(reqwest::Method::GET, url).send().await?;
        let mut columns: Vec<Column> = decode_listing(response).await?;
        columns.sort_by_key(|c| c.order);
        log::debug!("[API] Loaded {} statuses", columns.len());
        Ok(columns)
    }
}
