//! # Roombook CLI
//!
//! Administrative tooling for Roombook: bootstrapping the first admin
//! account and filling a development database with demo data.
//!
//! ## Usage
//!
//! ```ignore
//! use roombook_cli::seeder::{seed_all, SeedConfig};
//!
//! let config = SeedConfig::new(3); // 3 buildings with defaults
//! seed_all(&pool, config).await?;
//! ```

pub mod admin;
pub mod seeder;
