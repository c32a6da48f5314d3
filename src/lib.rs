//! Polls GitHub for new repositories, releases and commits of watched users
//! and repositories, and announces what it has not announced before.
//!
//! Commits are grouped per repository over a short window and announced as
//! one batch.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
