//! Database module
//!
//! This module provides database management functionality including:
//! - Database connection pool management
//! - The account store and its SQLite implementation
//! - Database migrations

pub mod manager;
pub mod models;
pub mod repository;
pub mod migrations;

pub use manager::DatabaseManager;
pub use models::{CompanyUpdate, NewUser, User, UserId, UserUpdate};
pub use repository::{AccountStore, UserRepository};
