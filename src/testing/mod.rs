//! In-memory repository doubles for unit and router tests.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use crate::database::manager::DatabaseError;
use crate::database::models::{Administrator, NewAdministrator, NewProduct, Product, ProductFilter};
use crate::database::repository::{AdministratorRepository, ProductRepository};

/// Lowest cost bcrypt accepts
pub const TEST_BCRYPT_COST: u32 = 4;

#[derive(Default)]
pub struct MemoryProductRepository {
    rows: Mutex<Vec<Product>>,
    next_id: AtomicI64,
}

impl MemoryProductRepository {
    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn sorted(mut rows: Vec<Product>) -> Vec<Product> {
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn find_all(&self) -> Result<Vec<Product>, DatabaseError> {
        Ok(Self::sorted(self.rows.lock().unwrap().clone()))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, DatabaseError> {
        Ok(self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        Ok(self.rows.lock().unwrap().iter().any(|p| p.id == id))
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, DatabaseError> {
        let now = Utc::now();
        let row = Product {
            id: self.next_id(),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            special_offer: product.special_offer,
            img: product.image.clone(),
            image: product.image,
            created_at: now,
            updated_at: now,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn update(&self, product: &Product) -> Result<Product, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        let slot = rows
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Product {} not found", product.id)))?;
        *slot = product.clone();
        Ok(slot.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|p| p.id != id);
        Ok(rows.len() != before)
    }

    async fn search(&self, filter: &ProductFilter) -> Result<Vec<Product>, DatabaseError> {
        let rows = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        Ok(Self::sorted(rows))
    }

    async fn categories(&self) -> Result<Vec<String>, DatabaseError> {
        let mut categories: Vec<String> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter_map(|p| p.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }
}

#[derive(Default)]
pub struct MemoryAdministratorRepository {
    rows: Mutex<Vec<Administrator>>,
    next_id: AtomicI64,
}

#[async_trait]
impl AdministratorRepository for MemoryAdministratorRepository {
    async fn find_active_by_username(&self, username: &str) -> Result<Option<Administrator>, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.username == username && a.active)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Administrator>, DatabaseError> {
        Ok(self.rows.lock().unwrap().iter().find(|a| a.username == username).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Administrator>, DatabaseError> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(rows)
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, DatabaseError> {
        Ok(self.rows.lock().unwrap().iter().any(|a| a.username == username))
    }

    async fn insert(&self, admin: NewAdministrator) -> Result<Administrator, DatabaseError> {
        let row = Administrator {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            username: admin.username,
            password_hash: admin.password_hash,
            email: admin.email,
            name: admin.name,
            active: true,
            created_at: Utc::now(),
            last_login: None,
        };
        self.rows.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn save(&self, admin: &Administrator) -> Result<Administrator, DatabaseError> {
        let mut rows = self.rows.lock().unwrap();
        let slot = rows
            .iter_mut()
            .find(|a| a.id == admin.id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Administrator {} not found", admin.username)))?;
        *slot = admin.clone();
        Ok(slot.clone())
    }
}

/// Fresh scratch directory under the system temp dir
pub fn scratch_dir(label: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("tienda-{}-{}", label, uuid::Uuid::new_v4().simple()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
