use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;

/// Row of the `productos` table
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Product {
    pub id: i64,
    #[sqlx(rename = "nombre")]
    pub name: String,
    #[sqlx(rename = "descripcion")]
    pub description: Option<String>,
    #[sqlx(rename = "precio")]
    pub price: Decimal,
    #[sqlx(rename = "categoria")]
    pub category: Option<String>,
    #[sqlx(rename = "oferta_especial")]
    pub special_offer: bool,
    #[sqlx(rename = "imagen")]
    pub image: Option<String>,
    /// Legacy alias of `image`, kept for older storefront clients
    pub img: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Set both image columns at once
    pub fn set_image(&mut self, image: Option<String>) {
        self.img = image.clone();
        self.image = image;
    }

    /// Refresh the update timestamp; every mutation goes through here
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Column values for an insert; id and timestamps are generated
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category: Option<String>,
    pub special_offer: bool,
    pub image: Option<String>,
}

/// Optional criteria for product search; `None` means "don't filter"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    /// Exact category
    pub category: Option<String>,
    pub special_offer: Option<bool>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let name_ok = self
            .name
            .as_ref()
            .map_or(true, |n| product.name.to_lowercase().contains(&n.to_lowercase()));
        let category_ok = self
            .category
            .as_ref()
            .map_or(true, |c| product.category.as_deref() == Some(c.as_str()));
        let offer_ok = self.special_offer.map_or(true, |o| product.special_offer == o);
        name_ok && category_ok && offer_ok
    }
}
