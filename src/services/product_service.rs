use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewProduct, Product, ProductFilter};
use crate::database::repository::ProductRepository;

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("Product not found with id: {0}")]
    NotFound(i64),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ProductError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ProductError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Product as exchanged with the admin panel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDto {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(
        rename = "precio",
        default,
        serialize_with = "rust_decimal::serde::float_option::serialize"
    )]
    pub price: Option<Decimal>,
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
    #[serde(rename = "ofertaEspecial", default)]
    pub special_offer: Option<bool>,
    #[serde(rename = "imagen", default)]
    pub image: Option<String>,
    #[serde(default)]
    pub img: Option<String>,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        Self {
            id: Some(product.id),
            name: Some(product.name),
            description: product.description,
            price: Some(product.price),
            category: product.category,
            special_offer: Some(product.special_offer),
            img: product.image.clone(),
            image: product.image,
        }
    }
}

impl ProductDto {
    /// `imagen` wins over the legacy `img` when both are sent
    fn resolved_image(&self) -> Option<String> {
        self.image.clone().or_else(|| self.img.clone())
    }
}

/// Raw search parameters; blank strings mean "no filter"
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductSearch {
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "categoria")]
    pub category: Option<String>,
    #[serde(rename = "ofertaEspecial", default, deserialize_with = "optional_flag")]
    pub special_offer: Option<bool>,
}

fn optional_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl From<ProductSearch> for ProductFilter {
    fn from(search: ProductSearch) -> Self {
        fn present(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        }

        ProductFilter {
            name: present(search.name),
            category: present(search.category),
            special_offer: search.special_offer,
        }
    }
}

/// Catalog CRUD with validation at the service boundary
#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn ProductRepository>,
}

impl ProductService {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }

    pub async fn list(&self) -> Result<Vec<ProductDto>, ProductError> {
        let rows = self.products.find_all().await?;
        Ok(rows.into_iter().map(ProductDto::from).collect())
    }

    pub async fn get(&self, id: i64) -> Result<ProductDto, ProductError> {
        self.products
            .find_by_id(id)
            .await?
            .map(ProductDto::from)
            .ok_or(ProductError::NotFound(id))
    }

    pub async fn create(&self, dto: ProductDto) -> Result<ProductDto, ProductError> {
        let new_product = validate(&dto)?;
        let saved = self.products.insert(new_product).await?;
        info!(product_id = saved.id, name = %saved.name, "Product created");
        Ok(saved.into())
    }

    pub async fn update(&self, id: i64, dto: ProductDto) -> Result<ProductDto, ProductError> {
        let mut existing = self
            .products
            .find_by_id(id)
            .await?
            .ok_or(ProductError::NotFound(id))?;

        let valid = validate(&dto)?;
        existing.name = valid.name;
        existing.description = valid.description;
        existing.price = valid.price;
        existing.category = valid.category;
        existing.special_offer = valid.special_offer;
        existing.set_image(valid.image);
        existing.touch();

        let saved = self.products.update(&existing).await.map_err(|e| match e {
            DatabaseError::NotFound(_) => ProductError::NotFound(id),
            other => other.into(),
        })?;
        info!(product_id = saved.id, "Product updated");
        Ok(saved.into())
    }

    pub async fn delete(&self, id: i64) -> Result<(), ProductError> {
        if !self.products.exists(id).await? {
            return Err(ProductError::NotFound(id));
        }
        self.products.delete(id).await?;
        info!(product_id = id, "Product deleted");
        Ok(())
    }

    pub async fn search(&self, search: ProductSearch) -> Result<Vec<ProductDto>, ProductError> {
        let filter = ProductFilter::from(search);
        let rows = self.products.search(&filter).await?;
        Ok(rows.into_iter().map(ProductDto::from).collect())
    }

    pub async fn categories(&self) -> Result<Vec<String>, ProductError> {
        Ok(self.products.categories().await?)
    }
}

fn validate(dto: &ProductDto) -> Result<NewProduct, ProductError> {
    let name = match dto.name.as_deref() {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => return Err(ProductError::validation("nombre", "product name is required")),
    };

    let price = dto
        .price
        .map(|p| p.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .filter(|p| *p > Decimal::ZERO)
        .ok_or_else(|| ProductError::validation("precio", "price must be greater than 0"))?;

    // NUMERIC(10, 2) upper bound
    let max_price = Decimal::new(99_999_999_99, 2);
    if price > max_price {
        return Err(ProductError::validation("precio", format!("price cannot exceed {}", max_price)));
    }

    Ok(NewProduct {
        name,
        description: dto.description.clone(),
        price,
        category: dto.category.clone(),
        special_offer: dto.special_offer.unwrap_or(false),
        image: dto.resolved_image(),
    })
}
