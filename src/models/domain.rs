use crate::core::coords::{Coordinates, Locate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = i64;
pub type CampsiteId = i64;
pub type ProductId = i64;

/// A listed campsite
///
/// `location` is kept as the submitted "lat,lng" text; geo features parse it
/// on demand and treat malformed values as "no location".
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Campsite {
    pub id: CampsiteId,
    pub name: String,
    pub town: String,
    pub description: String,
    pub location: String,
    pub country: String,
    pub website: String,
    pub phone_number: String,
    pub image_url: Option<String>,
    pub is_approved: bool,
    pub is_premium: bool,
    pub created_by: Option<UserId>,
    pub suggested_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campsite {
    /// Creator or suggester of the campsite
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.created_by == Some(user_id) || self.suggested_by == Some(user_id)
    }
}

impl Locate for Campsite {
    fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::parse(&self.location)
    }
}

/// Fields for inserting a campsite; ids and timestamps come from the store
#[derive(Debug, Clone)]
pub struct NewCampsite {
    pub name: String,
    pub town: String,
    pub description: String,
    pub location: String,
    pub country: String,
    pub website: String,
    pub phone_number: String,
    pub image_url: Option<String>,
    pub is_approved: bool,
    pub is_premium: bool,
    pub created_by: Option<UserId>,
    pub suggested_by: Option<UserId>,
}

/// In-place edit of a campsite
///
/// `image_url` and `is_premium` are only written when `Some`.
#[derive(Debug, Clone)]
pub struct CampsiteChanges {
    pub name: String,
    pub town: String,
    pub description: String,
    pub location: String,
    pub country: String,
    pub website: String,
    pub phone_number: String,
    pub image_url: Option<String>,
    pub is_premium: Option<bool>,
}

impl CampsiteChanges {
    pub fn apply_to(&self, campsite: &mut Campsite) {
        campsite.name = self.name.clone();
        campsite.town = self.town.clone();
        campsite.description = self.description.clone();
        campsite.location = self.location.clone();
        campsite.country = self.country.clone();
        campsite.website = self.website.clone();
        campsite.phone_number = self.phone_number.clone();
        if let Some(url) = &self.image_url {
            campsite.image_url = Some(url.clone());
        }
        if let Some(premium) = self.is_premium {
            campsite.is_premium = premium;
        }
    }
}

/// Campsite annotated for a particular viewer
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ListedCampsite {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub campsite: Campsite,
    pub like_count: i64,
    pub user_has_liked: bool,
}

/// One user's like of one campsite, unique per pair
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Like {
    pub id: Uuid,
    pub user_id: UserId,
    pub campsite_id: CampsiteId,
    pub created_at: DateTime<Utc>,
}

impl Like {
    pub fn new(user_id: UserId, campsite_id: CampsiteId) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            campsite_id,
            created_at: Utc::now(),
        }
    }
}

/// Catalog product managed by super admins
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub purchase_link: Option<String>,
    pub is_featured: bool,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable product fields, shared by create and update
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub image_url: Option<String>,
    pub purchase_link: Option<String>,
    pub is_featured: bool,
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn campsite(id: CampsiteId, name: &str, location: &str) -> Campsite {
        Campsite {
            id,
            name: name.to_string(),
            town: String::new(),
            description: format!("{} description", name),
            location: location.to_string(),
            country: "FR".to_string(),
            website: String::new(),
            phone_number: String::new(),
            image_url: None,
            is_approved: true,
            is_premium: false,
            created_by: None,
            suggested_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campsite_locates_from_location_string() {
        let site = fixtures::campsite(1, "Les Pins", "43.5,3.9");
        assert_eq!(site.coordinates(), Coordinates::new(43.5, 3.9));

        let lost = fixtures::campsite(2, "Nowhere", "see website");
        assert!(lost.coordinates().is_none());
    }

    #[test]
    fn test_ownership_covers_creator_and_suggester() {
        let mut site = fixtures::campsite(1, "Les Pins", "43.5,3.9");
        assert!(!site.is_owned_by(7));
        site.suggested_by = Some(7);
        assert!(site.is_owned_by(7));
        site.suggested_by = None;
        site.created_by = Some(7);
        assert!(site.is_owned_by(7));
    }

    #[test]
    fn test_changes_keep_image_and_premium_when_unset() {
        let mut site = fixtures::campsite(1, "Les Pins", "43.5,3.9");
        site.image_url = Some("https://img/1.jpg".into());
        site.is_premium = true;

        let changes = CampsiteChanges {
            name: "Les Grands Pins".into(),
            town: "Sète".into(),
            description: "Bigger".into(),
            location: "43.4,3.7".into(),
            country: "FR".into(),
            website: String::new(),
            phone_number: String::new(),
            image_url: None,
            is_premium: None,
        };
        changes.apply_to(&mut site);

        assert_eq!(site.name, "Les Grands Pins");
        assert_eq!(site.image_url.as_deref(), Some("https://img/1.jpg"));
        assert!(site.is_premium);
    }

    #[test]
    fn test_listed_campsite_serializes_flat() {
        let listed = ListedCampsite {
            campsite: fixtures::campsite(3, "Alpine", "46.0,7.0"),
            like_count: 4,
            user_has_liked: true,
        };
        let json = serde_json::to_value(&listed).unwrap();
        assert_eq!(json["name"], "Alpine");
        assert_eq!(json["like_count"], 4);
        assert_eq!(json["user_has_liked"], true);
    }
}
