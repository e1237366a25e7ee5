//! Services: orchestration on top of the store, and the concrete
//! scheduled jobs registered with the scheduler.

pub mod country;
pub mod jobs;
pub mod proxy_service;

pub use proxy_service::ProxyService;
