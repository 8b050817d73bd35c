pub mod auth_service;
pub mod login_throttle;
pub mod product_service;
pub mod upload_service;

pub use auth_service::{AuthError, AuthService, LoginOutcome};
pub use login_throttle::{AttemptStart, LoginThrottle, ThrottlePolicy};
pub use product_service::{ProductDto, ProductError, ProductSearch, ProductService};
pub use upload_service::{StoredImage, UploadError, UploadService, UPLOAD_URL_PREFIX};
