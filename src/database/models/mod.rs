pub mod administrator;
pub mod product;

pub use administrator::{Administrator, NewAdministrator};
pub use product::{NewProduct, Product, ProductFilter};
