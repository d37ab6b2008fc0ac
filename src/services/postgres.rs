use crate::core::likes::{LikeState, ToggleOutcome};
use crate::core::listing::{ListingQuery, PageWindow, LISTING_ORDER_SQL};
use crate::models::{
    Campsite, CampsiteChanges, CampsiteId, ListedCampsite, NewCampsite, Product, ProductDraft,
    ProductId, UserId,
};
use crate::services::store::{CampsiteStore, StoreError, StoreResult};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashSet;
use std::time::Duration;
use uuid::Uuid;

/// Campsite columns under the `c` alias, in `Campsite` field order
const CAMPSITE_COLUMNS: &str = "c.id, c.name, c.town, c.description, c.location, c.country, \
    c.website, c.phone_number, c.image_url, c.is_approved, c.is_premium, c.created_by, \
    c.suggested_by, c.created_at, c.updated_at";

const CAMPSITE_RETURNING: &str = "id, name, town, description, location, country, website, \
    phone_number, image_url, is_approved, is_premium, created_by, suggested_by, created_at, \
    updated_at";

const PRODUCT_RETURNING: &str =
    "id, name, description, image_url, purchase_link, is_featured, created_by, created_at, updated_at";

/// Build the annotated, ordered listing SELECT
fn listing_sql(query: &ListingQuery, window: Option<PageWindow>) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(CAMPSITE_COLUMNS);
    qb.push(", COUNT(DISTINCT l.id) AS like_count, ");
    match query.viewer_id {
        Some(user_id) => {
            qb.push("EXISTS (SELECT 1 FROM campsite_likes v WHERE v.campsite_id = c.id AND v.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
        None => {
            qb.push("FALSE");
        }
    }
    qb.push(" AS user_has_liked FROM campsites c LEFT JOIN campsite_likes l ON l.campsite_id = c.id");
    query.push_where(&mut qb);
    qb.push(" GROUP BY c.id ORDER BY ").push(LISTING_ORDER_SQL);
    if let Some(w) = window {
        qb.push(" LIMIT ")
            .push_bind(i64::from(w.page_size))
            .push(" OFFSET ")
            .push_bind(w.offset() as i64);
    }
    qb
}

/// PostgreSQL-backed entity store
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect and run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    async fn like_count(&self, campsite_id: CampsiteId) -> StoreResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM campsite_likes WHERE campsite_id = $1")
                .bind(campsite_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn campsite_exists(&self, campsite_id: CampsiteId) -> StoreResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM campsites WHERE id = $1)")
            .bind(campsite_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[async_trait]
impl CampsiteStore for PostgresStore {
    async fn health_check(&self) -> StoreResult<bool> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }

    async fn count_listing(&self, query: &ListingQuery) -> StoreResult<u64> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM campsites c");
        query.push_where(&mut qb);
        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }

    async fn fetch_listing(
        &self,
        query: &ListingQuery,
        window: Option<PageWindow>,
    ) -> StoreResult<Vec<ListedCampsite>> {
        let mut qb = listing_sql(query, window);
        let rows = qb
            .build_query_as::<ListedCampsite>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn get_campsite(&self, id: CampsiteId) -> StoreResult<Option<Campsite>> {
        let sql = format!("SELECT {} FROM campsites WHERE id = $1", CAMPSITE_RETURNING);
        let campsite = sqlx::query_as::<_, Campsite>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(campsite)
    }

    async fn get_listed(
        &self,
        id: CampsiteId,
        viewer: Option<UserId>,
    ) -> StoreResult<Option<ListedCampsite>> {
        let sql = format!(
            r#"
            SELECT {},
                (SELECT COUNT(*) FROM campsite_likes l WHERE l.campsite_id = c.id) AS like_count,
                EXISTS (
                    SELECT 1 FROM campsite_likes v WHERE v.campsite_id = c.id AND v.user_id = $2
                ) AS user_has_liked
            FROM campsites c
            WHERE c.id = $1
            "#,
            CAMPSITE_COLUMNS
        );
        let row = sqlx::query_as::<_, ListedCampsite>(&sql)
            .bind(id)
            .bind(viewer)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_campsite(&self, new: NewCampsite) -> StoreResult<Campsite> {
        let sql = format!(
            r#"
            INSERT INTO campsites (
                name, town, description, location, country, website, phone_number,
                image_url, is_approved, is_premium, created_by, suggested_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {}
            "#,
            CAMPSITE_RETURNING
        );
        let campsite = sqlx::query_as::<_, Campsite>(&sql)
            .bind(new.name)
            .bind(new.town)
            .bind(new.description)
            .bind(new.location)
            .bind(new.country)
            .bind(new.website)
            .bind(new.phone_number)
            .bind(new.image_url)
            .bind(new.is_approved)
            .bind(new.is_premium)
            .bind(new.created_by)
            .bind(new.suggested_by)
            .fetch_one(&self.pool)
            .await?;

        tracing::debug!("Created campsite {} (approved: {})", campsite.id, campsite.is_approved);

        Ok(campsite)
    }

    async fn update_campsite(
        &self,
        id: CampsiteId,
        changes: &CampsiteChanges,
    ) -> StoreResult<Option<Campsite>> {
        let sql = format!(
            r#"
            UPDATE campsites SET
                name = $2,
                town = $3,
                description = $4,
                location = $5,
                country = $6,
                website = $7,
                phone_number = $8,
                image_url = COALESCE($9, image_url),
                is_premium = COALESCE($10, is_premium),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CAMPSITE_RETURNING
        );
        let campsite = sqlx::query_as::<_, Campsite>(&sql)
            .bind(id)
            .bind(&changes.name)
            .bind(&changes.town)
            .bind(&changes.description)
            .bind(&changes.location)
            .bind(&changes.country)
            .bind(&changes.website)
            .bind(&changes.phone_number)
            .bind(&changes.image_url)
            .bind(changes.is_premium)
            .fetch_optional(&self.pool)
            .await?;
        Ok(campsite)
    }

    async fn delete_campsite(&self, id: CampsiteId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM campsites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_approval(&self, id: CampsiteId, approved: bool) -> StoreResult<Option<Campsite>> {
        let sql = format!(
            "UPDATE campsites SET is_approved = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            CAMPSITE_RETURNING
        );
        let campsite = sqlx::query_as::<_, Campsite>(&sql)
            .bind(id)
            .bind(approved)
            .fetch_optional(&self.pool)
            .await?;
        Ok(campsite)
    }

    async fn pending_campsites(&self) -> StoreResult<Vec<Campsite>> {
        let sql = format!(
            "SELECT {} FROM campsites WHERE NOT is_approved ORDER BY created_at DESC, id DESC",
            CAMPSITE_RETURNING
        );
        Ok(sqlx::query_as::<_, Campsite>(&sql).fetch_all(&self.pool).await?)
    }

    async fn suggestions(&self, suggested_by: Option<UserId>) -> StoreResult<Vec<Campsite>> {
        let sql = format!(
            r#"
            SELECT {} FROM campsites
            WHERE suggested_by IS NOT NULL AND ($1::BIGINT IS NULL OR suggested_by = $1)
            ORDER BY created_at DESC, id DESC
            "#,
            CAMPSITE_RETURNING
        );
        Ok(sqlx::query_as::<_, Campsite>(&sql)
            .bind(suggested_by)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_approved_suggestions(&self, user_id: UserId) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM campsites WHERE suggested_by = $1 AND is_approved",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u64)
    }

    /// Delete-else-insert in one transaction
    ///
    /// The insert uses `ON CONFLICT DO NOTHING` against the (user, campsite)
    /// unique constraint: if a concurrent toggle inserted the row after our
    /// delete found nothing, this request reports "liked" instead of failing.
    async fn toggle_like(&self, user_id: UserId, campsite_id: CampsiteId) -> StoreResult<LikeState> {
        let mut tx = self.pool.begin().await?;

        // Hold the campsite row so it cannot be deleted mid-toggle
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM campsites WHERE id = $1 FOR SHARE")
            .bind(campsite_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::NotFound(format!("campsite {}", campsite_id)));
        }

        let removed = sqlx::query("DELETE FROM campsite_likes WHERE user_id = $1 AND campsite_id = $2")
            .bind(user_id)
            .bind(campsite_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        let inserted = if removed {
            false
        } else {
            sqlx::query(
                r#"
                INSERT INTO campsite_likes (id, user_id, campsite_id, created_at)
                VALUES ($1, $2, $3, NOW())
                ON CONFLICT (user_id, campsite_id) DO NOTHING
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(campsite_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
                > 0
        };

        tx.commit().await?;

        let outcome = ToggleOutcome::resolve(removed, inserted);
        tracing::debug!("Like toggle {} -> {}: {:?}", user_id, campsite_id, outcome);

        Ok(LikeState {
            is_liked: outcome.is_liked(),
            like_count: self.like_count(campsite_id).await?,
        })
    }

    async fn like_state(&self, user_id: UserId, campsite_id: CampsiteId) -> StoreResult<LikeState> {
        if !self.campsite_exists(campsite_id).await? {
            return Err(StoreError::NotFound(format!("campsite {}", campsite_id)));
        }
        let is_liked: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM campsite_likes WHERE user_id = $1 AND campsite_id = $2)",
        )
        .bind(user_id)
        .bind(campsite_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(LikeState {
            is_liked,
            like_count: self.like_count(campsite_id).await?,
        })
    }

    async fn liked_campsites(&self, user_id: UserId) -> StoreResult<Vec<Campsite>> {
        let sql = format!(
            r#"
            SELECT {} FROM campsites c
            JOIN campsite_likes l ON l.campsite_id = c.id
            WHERE l.user_id = $1
            ORDER BY l.created_at DESC, l.id
            "#,
            CAMPSITE_COLUMNS
        );
        let campsites = sqlx::query_as::<_, Campsite>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        // Tables migrated without the unique constraint may hold duplicates
        let mut seen = HashSet::with_capacity(campsites.len());
        if let Some(dup) = campsites.iter().find(|c| !seen.insert(c.id)) {
            tracing::error!("Duplicate likes for user {} on campsite {}", user_id, dup.id);
            return Err(StoreError::Integrity(format!(
                "duplicate likes for user {} on campsite {}",
                user_id, dup.id
            )));
        }

        Ok(campsites)
    }

    async fn featured_products(&self) -> StoreResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_featured ORDER BY name, id",
            PRODUCT_RETURNING
        );
        Ok(sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?)
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_RETURNING);
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_product(
        &self,
        draft: ProductDraft,
        created_by: Option<UserId>,
    ) -> StoreResult<Product> {
        let sql = format!(
            r#"
            INSERT INTO products (name, description, image_url, purchase_link, is_featured, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PRODUCT_RETURNING
        );
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(draft.name)
            .bind(draft.description)
            .bind(draft.image_url)
            .bind(draft.purchase_link)
            .bind(draft.is_featured)
            .bind(created_by)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_product(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> StoreResult<Option<Product>> {
        let sql = format!(
            r#"
            UPDATE products SET
                name = $2,
                description = $3,
                image_url = $4,
                purchase_link = $5,
                is_featured = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            PRODUCT_RETURNING
        );
        Ok(sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(draft.name)
            .bind(draft.description)
            .bind(draft.image_url)
            .bind(draft.purchase_link)
            .bind(draft.is_featured)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::access::{viewer, Role, Viewer};

    #[test]
    fn test_anonymous_listing_sql() {
        let query = ListingQuery::for_viewer(&Viewer::Anonymous).with_country(Some("fr"));
        let window = PageWindow::resolve(100, 30, Some("2"));
        let qb = listing_sql(&query, Some(window));
        let sql = qb.sql();

        assert!(sql.contains("FALSE AS user_has_liked"));
        assert!(sql.contains("COUNT(DISTINCT l.id) AS like_count"));
        assert!(sql.contains("c.is_approved AND LOWER(c.country) = LOWER($1)"));
        assert!(sql.ends_with(
            "GROUP BY c.id ORDER BY c.is_premium DESC, like_count DESC, c.name ASC, c.id ASC LIMIT $2 OFFSET $3"
        ));
    }

    #[test]
    fn test_viewer_listing_sql_binds_viewer_first() {
        let query = ListingQuery::for_viewer(&viewer(7, Role::User)).with_search(Some("lake"));
        let qb = listing_sql(&query, None);
        let sql = qb.sql();

        assert!(sql.contains("v.user_id = $1) AS user_has_liked"));
        assert!(sql.contains("(c.name ILIKE $2 OR c.town ILIKE $3)"));
        assert!(!sql.contains("LIMIT"));
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_toggle_round_trip() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let store = PostgresStore::from_settings(&url, Some(2), Some(1), None, None)
            .await
            .expect("Failed to connect");
        let site = store
            .create_campsite(NewCampsite {
                name: "Toggle test".into(),
                town: String::new(),
                description: "desc".into(),
                location: "45,6".into(),
                country: "FR".into(),
                website: String::new(),
                phone_number: String::new(),
                image_url: None,
                is_approved: true,
                is_premium: false,
                created_by: None,
                suggested_by: None,
            })
            .await
            .unwrap();

        let liked = store.toggle_like(1, site.id).await.unwrap();
        assert!(liked.is_liked);
        let unliked = store.toggle_like(1, site.id).await.unwrap();
        assert_eq!(unliked.like_count, liked.like_count - 1);

        store.delete_campsite(site.id).await.unwrap();
    }
}
