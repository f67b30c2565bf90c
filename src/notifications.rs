//! Notifications, Coupons and Advertisement
//!
//! - Paginated server notifications
//! - Local inbox of received push messages, persisted as JSON
//! - A merged newest-first feed with an unread count
//! - Paginated coupons and the dashboard advertisement

use crate::api::{AdvertisementApi, CouponApi, NotificationApi};
use crate::error::{IcashError, IcashResult};
use crate::log_debug;
use crate::types::{Advertisement, Coupon, Notification, Page};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// Pagination
// =============================================================================

/// Position in a server-paginated list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            page: 1,
            has_next: false,
            has_previous: false,
        }
    }
}

impl PageCursor {
    fn update<T>(&mut self, page: u32, envelope: &Page<T>) {
        self.page = page;
        self.has_next = envelope.has_next();
        self.has_previous = envelope.has_previous();
    }
}

/// Server notifications, one page at a time
pub struct NotificationFeed<'a, A: NotificationApi> {
    api: &'a A,
    cursor: PageCursor,
    items: Vec<Notification>,
}

impl<'a, A: NotificationApi> NotificationFeed<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            cursor: PageCursor::default(),
            items: Vec::new(),
        }
    }

    pub fn load(&mut self, page: u32) -> IcashResult<&[Notification]> {
        let page = page.max(1);
        let envelope = self.api.notifications(page)?;
        self.cursor.update(page, &envelope);
        self.items = envelope.results;
        Ok(&self.items)
    }

    pub fn next(&mut self) -> IcashResult<&[Notification]> {
        if !self.cursor.has_next {
            return Err(IcashError::invalid_state("Pas de page suivante"));
        }
        self.load(self.cursor.page + 1)
    }

    pub fn previous(&mut self) -> IcashResult<&[Notification]> {
        if !self.cursor.has_previous {
            return Err(IcashError::invalid_state("Pas de page précédente"));
        }
        self.load(self.cursor.page.saturating_sub(1))
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    /// Mark a server notification read for this view
    pub fn mark_read(&mut self, id: u64) -> bool {
        match self.items.iter_mut().find(|n| n.id == id) {
            Some(item) => {
                item.is_read = true;
                true
            }
            None => false,
        }
    }
}

/// Coupons, one page at a time
pub struct CouponPager<'a, A: CouponApi> {
    api: &'a A,
    cursor: PageCursor,
}

impl<'a, A: CouponApi> CouponPager<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            cursor: PageCursor::default(),
        }
    }

    pub fn load(&mut self, page: u32) -> IcashResult<Vec<Coupon>> {
        let page = page.max(1);
        let envelope = self.api.coupons(page)?;
        self.cursor.update(page, &envelope);
        Ok(envelope.results)
    }

    pub fn cursor(&self) -> PageCursor {
        self.cursor
    }
}

/// Enabled dashboard advertisement, if any
pub fn advertisement<A: AdvertisementApi>(api: &A) -> IcashResult<Option<Advertisement>> {
    Ok(api.advertisement()?.filter(|ad| ad.enable))
}

// =============================================================================
// Push Inbox
// =============================================================================

static PUSH_SEQ: AtomicU64 = AtomicU64::new(0);

/// Push messages kept on disk; older ones are dropped
pub const MAX_INBOX_ITEMS: usize = 100;

/// Push message kept on this device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub url: Option<String>,
}

/// Received push messages, newest first
#[derive(Debug, Default)]
pub struct Inbox {
    path: Option<PathBuf>,
    items: Vec<InboxItem>,
}

impl Inbox {
    /// In-memory inbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Inbox backed by a JSON file; a missing file is an empty inbox
    pub fn open(path: impl Into<PathBuf>) -> IcashResult<Self> {
        let path = path.into();
        let items = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw).map_err(|e| {
                IcashError::parse_error(format!("Corrupt inbox {}: {}", path.display(), e))
            })?
        } else {
            Vec::new()
        };
        Ok(Self {
            path: Some(path),
            items,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn items(&self) -> &[InboxItem] {
        &self.items
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|i| !i.is_read).count()
    }

    /// Store a received push message at the top
    pub fn receive(&mut self, title: Option<&str>, body: Option<&str>, url: Option<&str>) -> IcashResult<&InboxItem> {
        let now = Utc::now();
        let seq = PUSH_SEQ.fetch_add(1, Ordering::Relaxed);
        let item = InboxItem {
            id: format!("push-{}-{}", now.timestamp_millis(), seq),
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or("Nouvelle notification")
                .to_string(),
            content: body
                .filter(|b| !b.trim().is_empty())
                .unwrap_or("Vous avez une nouvelle notification")
                .to_string(),
            created_at: now,
            is_read: false,
            url: url.map(String::from),
        };
        log_debug!("notifications", "Push message stored", id = item.id);
        self.items.insert(0, item);
        self.items.truncate(MAX_INBOX_ITEMS);
        self.save()?;
        Ok(&self.items[0])
    }

    pub fn mark_read(&mut self, id: &str) -> IcashResult<bool> {
        let found = match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.is_read = true;
                true
            }
            None => false,
        };
        if found {
            self.save()?;
        }
        Ok(found)
    }

    fn save(&self) -> IcashResult<()> {
        let path = match self.path {
            Some(ref path) => path,
            None => return Ok(()),
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, serde_json::to_vec_pretty(&self.items)?)?;
        Ok(())
    }
}

// =============================================================================
// Merged Feed
// =============================================================================

/// One line of the merged notification list
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEntry<'a> {
    Server(&'a Notification),
    Push(&'a InboxItem),
}

impl FeedEntry<'_> {
    pub fn title(&self) -> &str {
        match self {
            FeedEntry::Server(n) => &n.title,
            FeedEntry::Push(i) => &i.title,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            FeedEntry::Server(n) => &n.content,
            FeedEntry::Push(i) => &i.content,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            FeedEntry::Server(n) => n.created_at,
            FeedEntry::Push(i) => i.created_at,
        }
    }

    pub fn is_read(&self) -> bool {
        match self {
            FeedEntry::Server(n) => n.is_read,
            FeedEntry::Push(i) => i.is_read,
        }
    }
}

/// Server notifications and push messages, newest first
pub fn merge_feed<'a>(server: &'a [Notification], inbox: &'a Inbox) -> Vec<FeedEntry<'a>> {
    let mut entries: Vec<FeedEntry<'a>> = inbox
        .items()
        .iter()
        .map(FeedEntry::Push)
        .chain(server.iter().map(FeedEntry::Server))
        .collect();
    entries.sort_by_key(|e| std::cmp::Reverse(e.created_at()));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn notification(id: u64, hour: u32) -> Notification {
        Notification {
            id,
            title: format!("Notification {}", id),
            content: "Votre dépôt a été validé".into(),
            reference: None,
            is_read: false,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap(),
        }
    }

    struct FakeFeed;

    impl NotificationApi for FakeFeed {
        fn notifications(&self, page: u32) -> IcashResult<Page<Notification>> {
            Ok(Page {
                count: 25,
                next: (page < 3).then(|| format!("?page={}", page + 1)),
                previous: (page > 1).then(|| format!("?page={}", page - 1)),
                results: vec![notification(u64::from(page), 8)],
            })
        }
    }

    #[test]
    fn test_feed_paging() {
        let api = FakeFeed;
        let mut feed = NotificationFeed::new(&api);
        feed.load(1).unwrap();
        assert!(feed.cursor().has_next);
        assert!(!feed.cursor().has_previous);
        assert!(feed.previous().is_err());

        feed.next().unwrap();
        feed.next().unwrap();
        assert_eq!(feed.cursor().page, 3);
        assert!(feed.next().is_err());

        assert!(feed.mark_read(3));
        assert!(feed.items()[0].is_read);
    }

    #[test]
    fn test_inbox_persists_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inbox.json");

        let mut inbox = Inbox::open(&path).unwrap();
        inbox.receive(Some("Premier"), None, None).unwrap();
        let second = inbox.receive(None, Some("Bonus crédité"), None).unwrap().id.clone();
        assert_eq!(inbox.unread_count(), 2);

        assert!(inbox.mark_read(&second).unwrap());
        assert!(!inbox.mark_read("missing").unwrap());

        let reopened = Inbox::open(&path).unwrap();
        assert_eq!(reopened.items().len(), 2);
        assert_eq!(reopened.items()[0].title, "Nouvelle notification");
        assert!(reopened.items()[0].is_read);
        assert_eq!(reopened.items()[1].title, "Premier");
        assert_eq!(reopened.unread_count(), 1);
    }

    #[test]
    fn test_inbox_keeps_newest_items() {
        let mut inbox = Inbox::new();
        for i in 0..MAX_INBOX_ITEMS + 5 {
            inbox.receive(Some(&format!("Message {}", i)), None, None).unwrap();
        }
        assert_eq!(inbox.items().len(), MAX_INBOX_ITEMS);
        assert_eq!(inbox.items()[0].title, format!("Message {}", MAX_INBOX_ITEMS + 4));
        assert_eq!(inbox.items()[MAX_INBOX_ITEMS - 1].title, "Message 5");
    }

    #[test]
    fn test_merged_feed_is_sorted() {
        let server = vec![notification(1, 6), notification(2, 10)];
        let mut inbox = Inbox::new();
        inbox.receive(Some("Push"), None, None).unwrap();

        let feed = merge_feed(&server, &inbox);
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].title(), "Push");
        assert_eq!(feed[1].title(), "Notification 2");
        assert_eq!(feed[2].title(), "Notification 1");
    }
}
