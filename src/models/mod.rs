// Model exports
pub mod country;
pub mod domain;
pub mod requests;
pub mod responses;

pub use country::{country_name, normalize_country, EUROPEAN_COUNTRIES};
pub use domain::{
    Campsite, CampsiteChanges, CampsiteId, Like, ListedCampsite, NewCampsite, Product, ProductDraft,
    ProductId, UserId,
};
pub use requests::{CampsiteForm, ImageUpload, ListCampsitesParams, MapParams, ProductForm};
pub use responses::{
    CampsiteWriteResponse, CenterCampsite, CountryOption, ErrorResponse, HealthResponse, MapMode,
    MapResponse, MySuggestionsResponse, Page,
};
