use crate::core::access::Viewer;
use crate::models::{Campsite, ListedCampsite, UserId};
use sqlx::{Postgres, QueryBuilder};
use std::cmp::Ordering;

/// Campsites per listing page
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// SQL ordering matching [`listing_order`]; expects the `like_count` alias
pub const LISTING_ORDER_SQL: &str = "c.is_premium DESC, like_count DESC, c.name ASC, c.id ASC";

/// Filters and annotations for one campsite listing request
///
/// Built once per request from the viewer and raw query parameters. Blank
/// parameters are dropped, so `Some` always means "filter on this".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub include_unapproved: bool,
    pub viewer_id: Option<UserId>,
    pub country: Option<String>,
    pub search: Option<String>,
}

impl ListingQuery {
    pub fn for_viewer(viewer: &Viewer) -> Self {
        Self {
            include_unapproved: viewer.is_elevated(),
            viewer_id: viewer.user_id(),
            country: None,
            search: None,
        }
    }

    pub fn with_country(mut self, country: Option<&str>) -> Self {
        self.country = non_blank(country);
        self
    }

    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = non_blank(search);
        self
    }

    /// In-memory form of the WHERE clause
    pub fn admits(&self, campsite: &Campsite) -> bool {
        if !self.include_unapproved && !campsite.is_approved {
            return false;
        }
        if let Some(country) = &self.country {
            if campsite.country.to_lowercase() != country.to_lowercase() {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            if !campsite.name.to_lowercase().contains(&needle)
                && !campsite.town.to_lowercase().contains(&needle)
            {
                return false;
            }
        }
        true
    }

    /// Append ` WHERE ...` for the `campsites c` table alias
    pub fn push_where<'q>(&'q self, qb: &mut QueryBuilder<'q, Postgres>) {
        qb.push(" WHERE TRUE");
        if !self.include_unapproved {
            qb.push(" AND c.is_approved");
        }
        if let Some(country) = &self.country {
            qb.push(" AND LOWER(c.country) = LOWER(")
                .push_bind(country.as_str())
                .push(")");
        }
        if let Some(search) = &self.search {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (c.name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR c.town ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    /// Query string for a page link, e.g. `?page=2&country=FR`
    pub fn page_query(&self, page: u32) -> String {
        let mut query = format!("?page={}", page);
        if let Some(country) = &self.country {
            query.push_str("&country=");
            query.push_str(&urlencoding::encode(country));
        }
        if let Some(search) = &self.search {
            query.push_str("&search=");
            query.push_str(&urlencoding::encode(search));
        }
        query
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Escape LIKE metacharacters so user input matches literally
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Premium first, then most liked, then name, then id
pub fn listing_order(a: &ListedCampsite, b: &ListedCampsite) -> Ordering {
    b.campsite
        .is_premium
        .cmp(&a.campsite.is_premium)
        .then_with(|| b.like_count.cmp(&a.like_count))
        .then_with(|| a.campsite.name.cmp(&b.campsite.name))
        .then_with(|| a.campsite.id.cmp(&b.campsite.id))
}

/// A resolved page of a listing
///
/// Requested pages outside `1..=total_pages` (or unparseable ones) clamp to
/// the nearest valid page; an empty listing still has one (empty) page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub count: u64,
    pub number: u32,
    pub total_pages: u32,
    pub page_size: u32,
}

impl PageWindow {
    pub fn resolve(count: u64, page_size: u32, requested: Option<&str>) -> Self {
        let page_size = page_size.max(1);
        let total_pages = count.div_ceil(u64::from(page_size)).max(1);
        let total_pages = u32::try_from(total_pages).unwrap_or(u32::MAX);

        let number = match requested.map(str::trim) {
            Some("last") => total_pages,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n < 1 => 1,
                Ok(n) => u32::try_from(n).unwrap_or(u32::MAX).min(total_pages),
                Err(_) => 1,
            },
            None => 1,
        };

        Self {
            count,
            number,
            total_pages,
            page_size,
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.page_size)
    }

    pub fn next(&self) -> Option<u32> {
        (self.number < self.total_pages).then(|| self.number + 1)
    }

    pub fn previous(&self) -> Option<u32> {
        (self.number > 1).then(|| self.number - 1)
    }
}
