pub mod jwt;
pub mod middleware;
pub mod models;


pub use jwt::*;
pub use middleware::*;
pub use models::*;
