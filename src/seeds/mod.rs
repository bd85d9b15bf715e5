//! Database seeding functionality
//!
//! Bootstraps the configured administrator account and, on request, a set of
//! demo farmers covering every kind and applicant status.

pub mod admin;
pub mod demo;

pub use admin::seed_admin;
pub use demo::seed_demo;
