use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{Administrator, NewAdministrator, NewProduct, Product, ProductFilter};

const PRODUCT_COLUMNS: &str = "id, nombre, descripcion, precio, categoria, oferta_especial, \
     imagen, img, created_at, updated_at";

const ADMINISTRATOR_COLUMNS: &str =
    "id, username, password_hash, email, nombre, activo, created_at, last_login";

/// Storage operations for the product catalog
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products ordered by name
    async fn find_all(&self) -> Result<Vec<Product>, DatabaseError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, DatabaseError>;

    async fn exists(&self, id: i64) -> Result<bool, DatabaseError>;

    async fn insert(&self, product: NewProduct) -> Result<Product, DatabaseError>;

    /// Persist every column of an existing product
    async fn update(&self, product: &Product) -> Result<Product, DatabaseError>;

    /// Returns false when no row had that id
    async fn delete(&self, id: i64) -> Result<bool, DatabaseError>;

    /// Products matching every present criterion, ordered by name
    async fn search(&self, filter: &ProductFilter) -> Result<Vec<Product>, DatabaseError>;

    /// Distinct non-null categories in ascending order
    async fn categories(&self) -> Result<Vec<String>, DatabaseError>;
}

/// Storage operations for back-office administrators
#[async_trait]
pub trait AdministratorRepository: Send + Sync {
    async fn find_active_by_username(&self, username: &str) -> Result<Option<Administrator>, DatabaseError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Administrator>, DatabaseError>;

    async fn find_all(&self) -> Result<Vec<Administrator>, DatabaseError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, DatabaseError>;

    async fn insert(&self, admin: NewAdministrator) -> Result<Administrator, DatabaseError>;

    /// Persist the mutable columns (hash, profile, active flag, last login)
    async fn save(&self, admin: &Administrator) -> Result<Administrator, DatabaseError>;
}

#[derive(Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn find_all(&self) -> Result<Vec<Product>, DatabaseError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM productos ORDER BY nombre ASC");
        let rows = sqlx::query_as::<_, Product>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Product>, DatabaseError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM productos WHERE id = $1");
        let row = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn exists(&self, id: i64) -> Result<bool, DatabaseError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM productos WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert(&self, product: NewProduct) -> Result<Product, DatabaseError> {
        let sql = format!(
            "INSERT INTO productos (nombre, descripcion, precio, categoria, oferta_especial, imagen, img, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6, NOW(), NOW())
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Product>(&sql)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(&product.category)
            .bind(product.special_offer)
            .bind(&product.image)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(&self, product: &Product) -> Result<Product, DatabaseError> {
        let sql = format!(
            "UPDATE productos
             SET nombre = $2, descripcion = $3, precio = $4, categoria = $5,
                 oferta_especial = $6, imagen = $7, img = $8, updated_at = $9
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Product>(&sql)
            .bind(product.id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price)
            .bind(&product.category)
            .bind(product.special_offer)
            .bind(&product.image)
            .bind(&product.img)
            .bind(product.updated_at)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| DatabaseError::NotFound(format!("Product {} not found", product.id)))
    }

    async fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM productos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, filter: &ProductFilter) -> Result<Vec<Product>, DatabaseError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM productos
             WHERE ($1::text IS NULL OR LOWER(nombre) LIKE '%' || LOWER($1) || '%')
               AND ($2::text IS NULL OR categoria = $2)
               AND ($3::boolean IS NULL OR oferta_especial = $3)
             ORDER BY nombre ASC"
        );
        let rows = sqlx::query_as::<_, Product>(&sql)
            .bind(&filter.name)
            .bind(&filter.category)
            .bind(filter.special_offer)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn categories(&self) -> Result<Vec<String>, DatabaseError> {
        let rows: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT categoria FROM productos WHERE categoria IS NOT NULL ORDER BY categoria",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[derive(Clone)]
pub struct PgAdministratorRepository {
    pool: PgPool,
}

impl PgAdministratorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdministratorRepository for PgAdministratorRepository {
    async fn find_active_by_username(&self, username: &str) -> Result<Option<Administrator>, DatabaseError> {
        let sql = format!(
            "SELECT {ADMINISTRATOR_COLUMNS} FROM administradores WHERE username = $1 AND activo = TRUE"
        );
        let row = sqlx::query_as::<_, Administrator>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Administrator>, DatabaseError> {
        let sql = format!("SELECT {ADMINISTRATOR_COLUMNS} FROM administradores WHERE username = $1");
        let row = sqlx::query_as::<_, Administrator>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_all(&self) -> Result<Vec<Administrator>, DatabaseError> {
        let sql = format!("SELECT {ADMINISTRATOR_COLUMNS} FROM administradores ORDER BY username ASC");
        let rows = sqlx::query_as::<_, Administrator>(&sql).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, DatabaseError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM administradores WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn insert(&self, admin: NewAdministrator) -> Result<Administrator, DatabaseError> {
        let sql = format!(
            "INSERT INTO administradores (username, password_hash, email, nombre, activo, created_at)
             VALUES ($1, $2, $3, $4, TRUE, NOW())
             RETURNING {ADMINISTRATOR_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Administrator>(&sql)
            .bind(&admin.username)
            .bind(&admin.password_hash)
            .bind(&admin.email)
            .bind(&admin.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn save(&self, admin: &Administrator) -> Result<Administrator, DatabaseError> {
        let sql = format!(
            "UPDATE administradores
             SET password_hash = $2, email = $3, nombre = $4, activo = $5, last_login = $6
             WHERE id = $1
             RETURNING {ADMINISTRATOR_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Administrator>(&sql)
            .bind(admin.id)
            .bind(&admin.password_hash)
            .bind(&admin.email)
            .bind(&admin.name)
            .bind(admin.active)
            .bind(admin.last_login)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| DatabaseError::NotFound(format!("Administrator {} not found", admin.username)))
    }
}
