//! Walks an RPDE feed page by page and collects the slots it publishes.
use std::collections::HashMap;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Url;
use serde_json::Value;

use crate::error::{AvailabilityError, Result};
use crate::settings::Settings;

use super::shared_slot::{scalar_to_string, Slot};

/// One page of the feed. Only `items` and `next` are read.
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    pub items: Vec<Value>,
    pub next: Option<String>,
}

impl FeedPage {
    /// A page without an `items` array is read as empty, a page without
    /// `next` as the end of the feed.
    pub fn from_value(value: Value) -> Self {
        let items = value
            .get("items")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let next = value
            .get("next")
            .and_then(Value::as_str)
            .filter(|next| !next.is_empty())
            .map(|s| s.to_string());

        FeedPage { items, next }
    }
}

#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&self, url: &Url) -> Result<FeedPage>;
}

impl<T: PageSource> PageSource for &T {
    async fn fetch_page(&self, url: &Url) -> Result<FeedPage> {
        (**self).fetch_page(url).await
    }
}

pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .user_agent(settings.user_agent.clone())
            .build()
            .map_err(|source| AvailabilityError::Retrieval {
                url: settings.feed_url.clone(),
                source,
            })?;

        Ok(HttpPageSource { client })
    }
}

impl PageSource for HttpPageSource {
    async fn fetch_page(&self, url: &Url) -> Result<FeedPage> {
        let retrieval = |source| AvailabilityError::Retrieval {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(retrieval)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AvailabilityError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(retrieval)?;
        let value: Value =
            serde_json::from_slice(&body).map_err(|source| AvailabilityError::Decode {
                url: url.to_string(),
                source,
            })?;

        Ok(FeedPage::from_value(value))
    }
}

#[derive(Debug, Clone, Default)]
pub struct FeedWalk {
    pub slots: Vec<Slot>,
    pub pages: usize,
    pub skipped: usize,
    /// Stopped by the page ceiling rather than the end of the feed.
    pub truncated: bool,
}

enum FeedItem {
    Updated(Option<String>, Slot),
    Deleted(String),
    Unusable,
}

impl FeedItem {
    fn classify(item: &Value) -> FeedItem {
        let id = item.get("id").and_then(scalar_to_string);

        let deleted = item
            .get("state")
            .and_then(Value::as_str)
            .map(|state| state.eq_ignore_ascii_case("deleted"))
            .unwrap_or(false);

        if deleted {
            return match id {
                Some(id) => FeedItem::Deleted(id),
                None => FeedItem::Unusable,
            };
        }

        match item.get("data").and_then(Slot::from_feed_data) {
            Some(slot) => FeedItem::Updated(id, slot),
            None => FeedItem::Unusable,
        }
    }
}

/// Later occurrences of an item id replace earlier ones, deletions drop them.
#[derive(Default)]
struct SlotCollector {
    slots: Vec<Option<Slot>>,
    by_id: HashMap<String, usize>,
}

impl SlotCollector {
    fn upsert(&mut self, id: Option<String>, slot: Slot) {
        match id {
            Some(id) => match self.by_id.get(&id) {
                Some(&index) => self.slots[index] = Some(slot),
                None => {
                    self.by_id.insert(id, self.slots.len());
                    self.slots.push(Some(slot));
                }
            },
            None => self.slots.push(Some(slot)),
        }
    }

    fn delete(&mut self, id: &str) {
        if let Some(&index) = self.by_id.get(id) {
            self.slots[index] = None;
        }
    }

    fn finish(self) -> Vec<Slot> {
        self.slots.into_iter().flatten().collect()
    }
}

/// Follows `next` links from `feed_url` one request at a time until the feed
/// reports its last page or `max_pages` pages have been fetched.
pub async fn fetch_all_slots<S: PageSource>(
    source: &S,
    feed_url: &str,
    max_pages: usize,
) -> Result<FeedWalk> {
    let mut current = Url::parse(feed_url)
        .map_err(|e| AvailabilityError::Config(format!("invalid feed url '{}': {}", feed_url, e)))?;

    let mut collector = SlotCollector::default();
    let mut walk = FeedWalk::default();

    loop {
        let page = source.fetch_page(&current).await?;
        walk.pages += 1;

        let page_was_empty = page.items.is_empty();
        for item in &page.items {
            match FeedItem::classify(item) {
                FeedItem::Updated(id, slot) => collector.upsert(id, slot),
                FeedItem::Deleted(id) => collector.delete(&id),
                FeedItem::Unusable => {
                    walk.skipped += 1;
                    debug!("skipping unusable feed item on page {}", walk.pages);
                }
            }
        }

        let next = match page.next.as_deref() {
            Some(next) => match current.join(next) {
                Ok(url) => url,
                Err(e) => {
                    warn!("feed page {} has an invalid next link '{}': {}", current, next, e);
                    break;
                }
            },
            None => break,
        };

        if page_was_empty && next == current {
            break;
        }

        if walk.pages >= max_pages {
            warn!("stopped after {} feed pages without reaching the end of the feed", walk.pages);
            walk.truncated = true;
            break;
        }

        current = next;
    }

    walk.slots = collector.finish();
    info!(
        "fetched {} slots from {} feed pages ({} items skipped)",
        walk.slots.len(),
        walk.pages,
        walk.skipped
    );

    Ok(walk)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn page_without_items_or_next_is_empty_and_final() {
        let page = FeedPage::from_value(json!({ "license": "https://example.test" }));
        assert!(page.items.is_empty());
        assert!(page.next.is_none());

        let page = FeedPage::from_value(json!({ "items": "oops", "next": "" }));
        assert!(page.items.is_empty());
        assert!(page.next.is_none());
    }

    fn slot_item(id: &str, state: &str, remaining: u64) -> Value {
        json!({
            "id": id,
            "state": state,
            "kind": "Slot",
            "modified": 1,
            "data": {
                "identifier": id,
                "facilityUse": "https://example.test/facility-uses/041A000005",
                "startDate": "2026-02-03T10:00:00Z",
                "endDate": "2026-02-03T10:40:00Z",
                "remainingUses": remaining
            }
        })
    }

    #[test]
    fn later_item_replaces_earlier_and_deleted_drops_it() {
        let mut collector = SlotCollector::default();
        for item in [
            slot_item("a", "updated", 0),
            slot_item("b", "updated", 1),
            slot_item("a", "updated", 1),
            json!({ "id": "b", "state": "deleted", "kind": "Slot", "modified": 2 }),
        ] {
            match FeedItem::classify(&item) {
                FeedItem::Updated(id, slot) => collector.upsert(id, slot),
                FeedItem::Deleted(id) => collector.delete(&id),
                FeedItem::Unusable => panic!("unexpected unusable item"),
            }
        }

        let slots = collector.finish();
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].identifier, "a");
        assert_eq!(slots[0].remaining_uses, 1);
    }

    #[test]
    fn numeric_item_ids_match_their_deletion() {
        let mut update = slot_item("x", "updated", 1);
        update["id"] = json!(4021);
        let deletion = json!({ "id": 4021, "state": "deleted" });

        let mut collector = SlotCollector::default();
        match FeedItem::classify(&update) {
            FeedItem::Updated(id, slot) => {
                assert_eq!(id.as_deref(), Some("4021"));
                collector.upsert(id, slot);
            }
            _ => panic!("expected an updated item"),
        }
        match FeedItem::classify(&deletion) {
            FeedItem::Deleted(id) => collector.delete(&id),
            _ => panic!("expected a deleted item"),
        }

        assert!(collector.finish().is_empty());
    }

    #[test]
    fn item_without_data_is_unusable() {
        let item = json!({ "id": "c", "state": "updated" });
        assert!(matches!(FeedItem::classify(&item), FeedItem::Unusable));
    }
}
