//! # Repository Layer
//!
//! Repository implementations that encapsulate SeaORM operations for the
//! registry's entities.

pub mod admin;
pub mod concern;
pub mod event;
pub mod farmer;

pub use admin::AdminRepository;
pub use concern::ConcernRepository;
pub use event::EventRepository;
pub use farmer::FarmerRepository;
