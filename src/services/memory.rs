use crate::core::likes::{LikeState, ToggleOutcome};
use crate::core::listing::{listing_order, ListingQuery, PageWindow};
use crate::models::{
    Campsite, CampsiteChanges, CampsiteId, Like, ListedCampsite, NewCampsite, Product, ProductDraft,
    ProductId, UserId,
};
use crate::services::store::{CampsiteStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    campsites: BTreeMap<CampsiteId, Campsite>,
    /// Keyed by (user, campsite): the map itself is the uniqueness constraint
    likes: HashMap<(UserId, CampsiteId), Like>,
    products: BTreeMap<ProductId, Product>,
    next_campsite_id: CampsiteId,
    next_product_id: ProductId,
}

impl Tables {
    fn like_count(&self, campsite_id: CampsiteId) -> i64 {
        self.likes
            .keys()
            .filter(|(_, c)| *c == campsite_id)
            .count() as i64
    }

    fn listed(&self, campsite: &Campsite, viewer: Option<UserId>) -> ListedCampsite {
        ListedCampsite {
            campsite: campsite.clone(),
            like_count: self.like_count(campsite.id),
            user_has_liked: viewer.is_some_and(|u| self.likes.contains_key(&(u, campsite.id))),
        }
    }

    fn like_state(&self, user_id: UserId, campsite_id: CampsiteId) -> LikeState {
        LikeState {
            is_liked: self.likes.contains_key(&(user_id, campsite_id)),
            like_count: self.like_count(campsite_id),
        }
    }
}

fn newest_first(mut campsites: Vec<Campsite>) -> Vec<Campsite> {
    campsites.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
    campsites
}

/// In-process store with the same semantics as the Postgres store
///
/// Every operation runs under a single lock acquisition, so each call is
/// atomic. Used for local development (`storage.backend = "memory"`) and by
/// the test suite.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CampsiteStore for MemoryStore {
    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }

    async fn count_listing(&self, query: &ListingQuery) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables.campsites.values().filter(|c| query.admits(c)).count() as u64)
    }

    async fn fetch_listing(
        &self,
        query: &ListingQuery,
        window: Option<PageWindow>,
    ) -> StoreResult<Vec<ListedCampsite>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<ListedCampsite> = tables
            .campsites
            .values()
            .filter(|c| query.admits(c))
            .map(|c| tables.listed(c, query.viewer_id))
            .collect();
        rows.sort_by(listing_order);

        Ok(match window {
            Some(w) => rows
                .into_iter()
                .skip(w.offset() as usize)
                .take(w.page_size as usize)
                .collect(),
            None => rows,
        })
    }

    async fn get_campsite(&self, id: CampsiteId) -> StoreResult<Option<Campsite>> {
        Ok(self.tables.read().await.campsites.get(&id).cloned())
    }

    async fn get_listed(
        &self,
        id: CampsiteId,
        viewer: Option<UserId>,
    ) -> StoreResult<Option<ListedCampsite>> {
        let tables = self.tables.read().await;
        Ok(tables.campsites.get(&id).map(|c| tables.listed(c, viewer)))
    }

    async fn create_campsite(&self, new: NewCampsite) -> StoreResult<Campsite> {
        let mut tables = self.tables.write().await;
        tables.next_campsite_id += 1;
        let now = Utc::now();
        let campsite = Campsite {
            id: tables.next_campsite_id,
            name: new.name,
            town: new.town,
            description: new.description,
            location: new.location,
            country: new.country,
            website: new.website,
            phone_number: new.phone_number,
            image_url: new.image_url,
            is_approved: new.is_approved,
            is_premium: new.is_premium,
            created_by: new.created_by,
            suggested_by: new.suggested_by,
            created_at: now,
            updated_at: now,
        };
        tables.campsites.insert(campsite.id, campsite.clone());
        Ok(campsite)
    }

    async fn update_campsite(
        &self,
        id: CampsiteId,
        changes: &CampsiteChanges,
    ) -> StoreResult<Option<Campsite>> {
        let mut tables = self.tables.write().await;
        Ok(tables.campsites.get_mut(&id).map(|campsite| {
            changes.apply_to(campsite);
            campsite.updated_at = Utc::now();
            campsite.clone()
        }))
    }

    async fn delete_campsite(&self, id: CampsiteId) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let removed = tables.campsites.remove(&id).is_some();
        if removed {
            tables.likes.retain(|(_, c), _| *c != id);
        }
        Ok(removed)
    }

    async fn set_approval(&self, id: CampsiteId, approved: bool) -> StoreResult<Option<Campsite>> {
        let mut tables = self.tables.write().await;
        Ok(tables.campsites.get_mut(&id).map(|campsite| {
            campsite.is_approved = approved;
            campsite.updated_at = Utc::now();
            campsite.clone()
        }))
    }

    async fn pending_campsites(&self) -> StoreResult<Vec<Campsite>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .campsites
                .values()
                .filter(|c| !c.is_approved)
                .cloned()
                .collect(),
        ))
    }

    async fn suggestions(&self, suggested_by: Option<UserId>) -> StoreResult<Vec<Campsite>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .campsites
                .values()
                .filter(|c| match suggested_by {
                    Some(user) => c.suggested_by == Some(user),
                    None => c.suggested_by.is_some(),
                })
                .cloned()
                .collect(),
        ))
    }

    async fn count_approved_suggestions(&self, user_id: UserId) -> StoreResult<u64> {
        let tables = self.tables.read().await;
        Ok(tables
            .campsites
            .values()
            .filter(|c| c.suggested_by == Some(user_id) && c.is_approved)
            .count() as u64)
    }

    async fn toggle_like(&self, user_id: UserId, campsite_id: CampsiteId) -> StoreResult<LikeState> {
        let mut tables = self.tables.write().await;
        if !tables.campsites.contains_key(&campsite_id) {
            return Err(StoreError::NotFound(format!("campsite {}", campsite_id)));
        }

        let key = (user_id, campsite_id);
        let removed = tables.likes.remove(&key).is_some();
        let inserted = !removed
            && match tables.likes.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(Like::new(user_id, campsite_id));
                    true
                }
                Entry::Occupied(_) => false,
            };
        let outcome = ToggleOutcome::resolve(removed, inserted);

        tracing::debug!("Like toggle {} -> {}: {:?}", user_id, campsite_id, outcome);

        Ok(LikeState {
            is_liked: outcome.is_liked(),
            like_count: tables.like_count(campsite_id),
        })
    }

    async fn like_state(&self, user_id: UserId, campsite_id: CampsiteId) -> StoreResult<LikeState> {
        let tables = self.tables.read().await;
        if !tables.campsites.contains_key(&campsite_id) {
            return Err(StoreError::NotFound(format!("campsite {}", campsite_id)));
        }
        Ok(tables.like_state(user_id, campsite_id))
    }

    async fn liked_campsites(&self, user_id: UserId) -> StoreResult<Vec<Campsite>> {
        let tables = self.tables.read().await;
        let mut likes: Vec<&Like> = tables.likes.values().filter(|l| l.user_id == user_id).collect();
        likes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(likes
            .into_iter()
            .filter_map(|l| tables.campsites.get(&l.campsite_id).cloned())
            .collect())
    }

    async fn featured_products(&self) -> StoreResult<Vec<Product>> {
        let tables = self.tables.read().await;
        let mut products: Vec<Product> = tables
            .products
            .values()
            .filter(|p| p.is_featured)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(products)
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.tables.read().await.products.get(&id).cloned())
    }

    async fn create_product(
        &self,
        draft: ProductDraft,
        created_by: Option<UserId>,
    ) -> StoreResult<Product> {
        let mut tables = self.tables.write().await;
        tables.next_product_id += 1;
        let now = Utc::now();
        let product = Product {
            id: tables.next_product_id,
            name: draft.name,
            description: draft.description,
            image_url: draft.image_url,
            purchase_link: draft.purchase_link,
            is_featured: draft.is_featured,
            created_by,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> StoreResult<Option<Product>> {
        let mut tables = self.tables.write().await;
        Ok(tables.products.get_mut(&id).map(|product| {
            product.name = draft.name;
            product.description = draft.description;
            product.image_url = draft.image_url;
            product.purchase_link = draft.purchase_link;
            product.is_featured = draft.is_featured;
            product.updated_at = Utc::now();
            product.clone()
        }))
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<bool> {
        Ok(self.tables.write().await.products.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::access::{viewer, Role, Viewer};
    use std::sync::Arc;

    fn new_site(name: &str, approved: bool, suggested_by: Option<UserId>) -> NewCampsite {
        NewCampsite {
            name: name.to_string(),
            town: String::new(),
            description: "desc".to_string(),
            location: "45.0,6.0".to_string(),
            country: "FR".to_string(),
            website: String::new(),
            phone_number: String::new(),
            image_url: None,
            is_approved: approved,
            is_premium: false,
            created_by: suggested_by,
            suggested_by,
        }
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_count() {
        let store = MemoryStore::new();
        let site = store.create_campsite(new_site("A", true, None)).await.unwrap();
        store.toggle_like(2, site.id).await.unwrap();

        let before = store.like_state(1, site.id).await.unwrap();
        let liked = store.toggle_like(1, site.id).await.unwrap();
        assert_eq!(liked, LikeState { is_liked: true, like_count: before.like_count + 1 });
        let unliked = store.toggle_like(1, site.id).await.unwrap();
        assert_eq!(unliked, before);
    }

    #[tokio::test]
    async fn test_toggle_missing_campsite_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(store.toggle_like(1, 42).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_concurrent_toggles_keep_count_consistent() {
        let store = Arc::new(MemoryStore::new());
        let site_id = store.create_campsite(new_site("A", true, None)).await.unwrap().id;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.toggle_like(1, site_id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Eight one-step changes from "not liked" end at "not liked"
        let state = store.like_state(1, site_id).await.unwrap();
        assert_eq!(state, LikeState { is_liked: false, like_count: 0 });
    }

    #[tokio::test]
    async fn test_listing_annotations_and_paging() {
        let store = MemoryStore::new();
        for name in ["Bravo", "Alpha", "Charlie"] {
            store.create_campsite(new_site(name, true, None)).await.unwrap();
        }
        store.create_campsite(new_site("Hidden", false, None)).await.unwrap();
        store.toggle_like(1, 3).await.unwrap();

        let query = ListingQuery::for_viewer(&viewer(1, Role::User));
        assert_eq!(store.count_listing(&query).await.unwrap(), 3);

        let window = PageWindow::resolve(3, 2, Some("1"));
        let page = store.fetch_listing(&query, Some(window)).await.unwrap();
        let names: Vec<_> = page.iter().map(|r| r.campsite.name.as_str()).collect();
        assert_eq!(names, vec!["Charlie", "Alpha"]);
        assert!(page[0].user_has_liked);
        assert_eq!(page[0].like_count, 1);

        let anonymous = ListingQuery::for_viewer(&Viewer::Anonymous);
        let all = store.fetch_listing(&anonymous, None).await.unwrap();
        assert!(all.iter().all(|r| !r.user_has_liked));
    }

    #[tokio::test]
    async fn test_delete_cascades_likes() {
        let store = MemoryStore::new();
        let site = store.create_campsite(new_site("A", true, None)).await.unwrap();
        store.toggle_like(1, site.id).await.unwrap();
        assert!(store.delete_campsite(site.id).await.unwrap());
        assert!(store.liked_campsites(1).await.unwrap().is_empty());
        assert!(!store.delete_campsite(site.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_approved_suggestion_count() {
        let store = MemoryStore::new();
        store.create_campsite(new_site("A", true, Some(5))).await.unwrap();
        store.create_campsite(new_site("B", false, Some(5))).await.unwrap();
        store.create_campsite(new_site("C", true, Some(6))).await.unwrap();
        assert_eq!(store.count_approved_suggestions(5).await.unwrap(), 1);
        assert_eq!(store.suggestions(Some(5)).await.unwrap().len(), 2);
        assert_eq!(store.suggestions(None).await.unwrap().len(), 3);
        assert_eq!(store.pending_campsites().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_featured_products_sorted_by_name() {
        let store = MemoryStore::new();
        for (name, featured) in [("Tent", true), ("Axe", true), ("Secret", false)] {
            let draft = ProductDraft {
                name: name.to_string(),
                description: String::new(),
                image_url: None,
                purchase_link: None,
                is_featured: featured,
            };
            store.create_product(draft, Some(1)).await.unwrap();
        }
        let names: Vec<_> = store
            .featured_products()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Axe", "Tent"]);
    }
}
