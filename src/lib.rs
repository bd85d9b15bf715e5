//! # Farmer Registry Library
//!
//! Backend for a municipal farmer registry: applicant registration for
//! regular and organic farmers, admin review with email and SMS
//! notifications, QR card lookup, support concerns and an events calendar.

pub mod auth;
pub mod calendar;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod mail;
pub mod models;
pub mod repositories;
pub mod seeds;
pub mod server;
pub mod sms;
pub mod status_workflow;
pub mod telemetry;
pub use migration;

#[cfg(test)]
mod test_support;
