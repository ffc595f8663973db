use chrono::serde::ts_milliseconds;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::{Direction, Document, DocumentStore, ObjectStore, Query, paths, to_fields};
use crate::error::{AppError, AppResult, StorageError, StoreError};
use crate::ui::ImageFile;
use crate::utils::card_image_path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub deck_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub front_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_image_url: Option<String>,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// 新建卡片表单的内容
#[derive(Debug, Clone, Default)]
pub struct CardDraft {
    pub front_text: String,
    pub back_text: String,
    pub front_image: Option<ImageFile>,
    pub back_image: Option<ImageFile>,
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// 正面必须至少有文字或图片之一
pub fn has_front(front_text: Option<&str>, has_front_image: bool) -> bool {
    has_front_image || front_text.is_some_and(|t| !t.trim().is_empty())
}

impl CardDraft {
    pub fn validate(&self) -> AppResult<()> {
        if has_front(Some(&self.front_text), self.front_image.is_some()) {
            Ok(())
        } else {
            Err(AppError::Validation(
                "Please enter text or choose an image for the front.".to_string(),
            ))
        }
    }
}

impl Card {
    pub fn query_for(deck_id: &str) -> Query {
        Query::new(paths::cards(deck_id)).order_by("createdAt", Direction::Descending)
    }

    pub fn from_document(deck_id: &str, doc: &Document) -> AppResult<Self> {
        let mut card: Card = doc.decode()?;
        card.id = doc.id().to_string();
        card.deck_id = deck_id.to_string();
        Ok(card)
    }

    /// 搜索词（已转小写）是否出现在正面或背面文字中
    pub fn matches(&self, needle: &str) -> bool {
        [&self.front_text, &self.back_text]
            .into_iter()
            .flatten()
            .any(|text| text.to_lowercase().contains(needle))
    }

    pub fn image_urls(&self) -> impl Iterator<Item = &str> {
        [&self.front_image_url, &self.back_image_url]
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    /// 先上传图片再写文档，文档不会引用尚不存在的对象；任一步失败都不写文档
    pub async fn create(
        documents: &dyn DocumentStore,
        objects: &dyn ObjectStore,
        deck_id: &str,
        draft: CardDraft,
    ) -> AppResult<String> {
        draft.validate()?;

        let uploaded_at = Utc::now();
        let front_image_url = match &draft.front_image {
            Some(file) => Some(upload_image(objects, deck_id, "front", file, uploaded_at).await?),
            None => None,
        };
        let back_image_url = match &draft.back_image {
            Some(file) => Some(upload_image(objects, deck_id, "back", file, uploaded_at).await?),
            None => None,
        };

        let card = Card {
            id: String::new(),
            deck_id: deck_id.to_string(),
            front_text: non_empty(&draft.front_text),
            front_image_url,
            back_text: non_empty(&draft.back_text),
            back_image_url,
            created_at: Utc::now(),
        };
        let fields = to_fields(&card)
            .map_err(|e| StoreError::Unavailable(format!("Failed to encode card: {}", e)))?;

        let card_id = documents.add(&paths::cards(deck_id), fields).await?;
        tracing::info!("Created card {} in deck {}", card_id, deck_id);
        Ok(card_id)
    }

    /// 先删除关联图片（对象不存在视为已删除），再删除卡片文档。两步不是原子操作。
    ///
    /// 某张图片删除失败时立即返回错误，卡片文档保留。此前已删除的图片不会恢复，
    /// 文档中对应的地址随之失效。
    pub async fn delete(
        documents: &dyn DocumentStore,
        objects: &dyn ObjectStore,
        deck_id: &str,
        card_id: &str,
    ) -> AppResult<()> {
        let path = paths::card(deck_id, card_id);
        let card = Card::from_document(deck_id, &documents.get(&path).await?)?;

        for url in card.image_urls() {
            let object = match objects.ref_from_url(url) {
                Ok(object) => object,
                Err(e) => {
                    tracing::warn!("Cannot resolve image url {}: {}", url, e);
                    continue;
                }
            };
            match objects.delete(&object).await {
                Ok(()) => tracing::debug!("Deleted image {}", object.path),
                Err(StorageError::NotFound(_)) => {
                    tracing::debug!("Image {} already gone", object.path)
                }
                Err(e) => return Err(e.into()),
            }
        }

        documents.delete(&path).await?;
        tracing::info!("Deleted card {} from deck {}", card_id, deck_id);
        Ok(())
    }
}

async fn upload_image(
    objects: &dyn ObjectStore,
    deck_id: &str,
    face: &str,
    file: &ImageFile,
    at: DateTime<Utc>,
) -> AppResult<String> {
    let path = card_image_path(deck_id, face, &file.name, at);
    let object = objects.upload(&path, file.bytes.clone()).await?;
    Ok(objects.url(&object).await?)
}

/// 按搜索词过滤，保持原有顺序；空搜索词返回全部
pub fn filter_cards(cards: &[Card], term: &str) -> Vec<Card> {
    if term.is_empty() {
        return cards.to_vec();
    }
    let needle = term.to_lowercase();
    cards.iter().filter(|c| c.matches(&needle)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryDocumentStore, MemoryObjectStore};

    fn card(front: Option<&str>, back: Option<&str>) -> Card {
        Card {
            id: format!("{:?}-{:?}", front, back),
            deck_id: "d1".into(),
            front_text: front.map(str::to_string),
            front_image_url: None,
            back_text: back.map(str::to_string),
            back_image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn filter_matches_either_face_case_insensitively() {
        let cards = vec![
            card(Some("Hola"), Some("hello")),
            card(Some("perro"), Some("Dog")),
            card(None, Some("cat")),
        ];

        let hits = filter_cards(&cards, "HEL");
        assert_eq!(hits, vec![cards[0].clone()]);

        let hits = filter_cards(&cards, "o");
        assert_eq!(hits, vec![cards[0].clone(), cards[1].clone()]);

        assert_eq!(filter_cards(&cards, ""), cards);
        assert!(filter_cards(&cards, "zebra").is_empty());
    }

    #[test]
    fn front_requires_text_or_image() {
        assert!(has_front(Some("hola"), false));
        assert!(has_front(None, true));
        assert!(has_front(Some(""), true));
        assert!(!has_front(Some("   "), false));
        assert!(!has_front(None, false));
    }

    #[tokio::test]
    async fn create_uploads_images_before_document() {
        let documents = MemoryDocumentStore::new();
        let objects = MemoryObjectStore::new("test");
        let draft = CardDraft {
            front_text: String::new(),
            back_text: "dog".into(),
            front_image: Some(ImageFile {
                name: "dog.png".into(),
                bytes: vec![7; 4],
            }),
            back_image: None,
        };

        let id = Card::create(&documents, &objects, "d1", draft).await.unwrap();
        let docs = documents.list(&paths::cards("d1"));
        let stored = Card::from_document("d1", &docs[0]).unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.front_text, None);
        assert_eq!(stored.back_text.as_deref(), Some("dog"));

        let url = stored.front_image_url.unwrap();
        let object = objects.ref_from_url(&url).unwrap();
        assert!(object.path.starts_with("cards/d1/"));
        assert!(object.path.ends_with("-front-dog.png"));
        assert!(objects.contains(&object.path));
    }

    #[tokio::test]
    async fn same_file_name_on_both_faces_keeps_both_images() {
        let documents = MemoryDocumentStore::new();
        let objects = MemoryObjectStore::new("test");
        let draft = CardDraft {
            front_image: Some(ImageFile {
                name: "photo.png".into(),
                bytes: vec![1, 1, 1],
            }),
            back_image: Some(ImageFile {
                name: "photo.png".into(),
                bytes: vec![2, 2, 2],
            }),
            ..Default::default()
        };

        Card::create(&documents, &objects, "d1", draft).await.unwrap();
        let stored = Card::from_document("d1", &documents.list(&paths::cards("d1"))[0]).unwrap();
        let front = objects.ref_from_url(&stored.front_image_url.unwrap()).unwrap();
        let back = objects.ref_from_url(&stored.back_image_url.unwrap()).unwrap();

        assert_ne!(front.path, back.path);
        assert_eq!(objects.object_count(), 2);
        assert_eq!(objects.bytes(&front.path), Some(vec![1, 1, 1]));
        assert_eq!(objects.bytes(&back.path), Some(vec![2, 2, 2]));
    }

    #[tokio::test]
    async fn failed_upload_writes_no_document() {
        let documents = MemoryDocumentStore::new();
        let objects = MemoryObjectStore::new("test");
        objects.fail_uploads(Some(StorageError::Unavailable("offline".into())));
        let draft = CardDraft {
            front_text: "hola".into(),
            front_image: Some(ImageFile {
                name: "a.png".into(),
                bytes: vec![1],
            }),
            ..Default::default()
        };

        assert!(Card::create(&documents, &objects, "d1", draft).await.is_err());
        assert!(documents.list(&paths::cards("d1")).is_empty());
    }

    #[tokio::test]
    async fn delete_tolerates_missing_image() {
        let documents = MemoryDocumentStore::new();
        let objects = MemoryObjectStore::new("test");
        let draft = CardDraft {
            front_text: "hola".into(),
            back_image: Some(ImageFile {
                name: "b.png".into(),
                bytes: vec![2],
            }),
            ..Default::default()
        };
        let id = Card::create(&documents, &objects, "d1", draft).await.unwrap();

        // 图片已被其他途径删除
        for path in objects.paths() {
            objects.delete(&crate::backend::ObjectRef { path }).await.unwrap();
        }

        Card::delete(&documents, &objects, "d1", &id).await.unwrap();
        assert!(documents.list(&paths::cards("d1")).is_empty());
    }
}
