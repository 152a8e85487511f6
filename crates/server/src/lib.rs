pub mod api;
pub mod app;
pub mod auth;
pub mod cache;
pub mod dtos;
pub mod extractors;
pub mod gateways;
pub mod middleware;
pub mod router;
pub mod services;

#[cfg(test)]
pub mod test_support;
