use crate::models::country::normalize_country;
use crate::models::domain::{CampsiteChanges, NewCampsite, ProductDraft, UserId};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Query parameters of the campsite listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListCampsitesParams {
    pub country: Option<String>,
    pub search: Option<String>,
    /// Kept as text so bad values clamp instead of failing extraction
    pub page: Option<String>,
}

/// Query parameters of the map view
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapParams {
    /// Campsite to center a radius map on
    pub center: Option<i64>,
    pub radius_km: Option<f64>,
    pub country: Option<String>,
}

/// Image attached to a campsite payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUpload {
    pub file_name: String,
    /// Base64-encoded file content
    pub data: String,
}

/// Campsite create/suggest/edit payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CampsiteForm {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    pub town: String,
    #[validate(length(min = 1))]
    pub description: String,
    /// "lat,lng"; stored as given, unparseable values just never show on maps
    #[validate(length(min = 1, max = 500))]
    pub location: String,
    #[validate(custom(function = "validate_country"))]
    pub country: String,
    #[serde(default)]
    #[validate(url)]
    pub website: Option<String>,
    #[serde(default)]
    #[validate(length(max = 50))]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub is_premium: Option<bool>,
    #[serde(default)]
    pub image: Option<ImageUpload>,
}

fn validate_country(code: &str) -> Result<(), ValidationError> {
    match normalize_country(code) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("unknown_country")),
    }
}

impl CampsiteForm {
    fn country_code(&self) -> String {
        normalize_country(&self.country)
            .map(str::to_string)
            .unwrap_or_else(|| self.country.trim().to_string())
    }

    pub fn into_new_campsite(
        self,
        image_url: Option<String>,
        is_approved: bool,
        created_by: Option<UserId>,
        suggested_by: Option<UserId>,
    ) -> NewCampsite {
        let country = self.country_code();
        NewCampsite {
            name: self.name,
            town: self.town,
            description: self.description,
            location: self.location,
            country,
            website: self.website.unwrap_or_default(),
            phone_number: self.phone_number.unwrap_or_default(),
            image_url,
            is_approved,
            is_premium: self.is_premium.unwrap_or(false),
            created_by,
            suggested_by,
        }
    }

    /// `allow_premium` is false for non-staff editors, who cannot flip it
    pub fn into_changes(self, image_url: Option<String>, allow_premium: bool) -> CampsiteChanges {
        let country = self.country_code();
        CampsiteChanges {
            name: self.name,
            town: self.town,
            description: self.description,
            location: self.location,
            country,
            website: self.website.unwrap_or_default(),
            phone_number: self.phone_number.unwrap_or_default(),
            image_url,
            is_premium: if allow_premium { self.is_premium } else { None },
        }
    }
}

/// Product create/update payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductForm {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub purchase_link: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

impl From<ProductForm> for ProductDraft {
    fn from(form: ProductForm) -> Self {
        Self {
            name: form.name,
            description: form.description,
            image_url: form.image_url,
            purchase_link: form.purchase_link,
            is_featured: form.is_featured,
        }
    }
}
