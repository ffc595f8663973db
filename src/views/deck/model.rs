use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::{Direction, Document, DocumentStore, Query, paths, to_fields};
use crate::error::{AppError, AppResult, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub user_id: String,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewDeck<'a> {
    name: &'a str,
    user_id: &'a str,
    #[serde(with = "ts_milliseconds")]
    created_at: DateTime<Utc>,
}

impl Deck {
    /// 当前用户的卡组，按创建时间倒序
    pub fn query_for(user_id: &str) -> Query {
        Query::new(paths::decks())
            .where_eq("userId", user_id)
            .order_by("createdAt", Direction::Descending)
    }

    pub fn from_document(doc: &Document) -> AppResult<Self> {
        let mut deck: Deck = doc.decode()?;
        deck.id = doc.id().to_string();
        Ok(deck)
    }

    pub async fn create(store: &dyn DocumentStore, name: &str, user_id: &str) -> AppResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Please enter a deck name.".to_string()));
        }

        let fields = to_fields(&NewDeck {
            name,
            user_id,
            created_at: Utc::now(),
        })
        .map_err(|e| StoreError::Unavailable(format!("Failed to encode deck: {}", e)))?;

        let deck_id = store.add(&paths::decks(), fields).await?;
        tracing::info!("Created deck {} for user {}", deck_id, user_id);
        Ok(deck_id)
    }

    /// 只删除卡组文档本身，卡片、日志与图片不会级联删除
    pub async fn delete(store: &dyn DocumentStore, deck_id: &str) -> AppResult<()> {
        store.delete(&paths::deck(deck_id)).await?;
        tracing::info!("Deleted deck {}", deck_id);
        Ok(())
    }
}
