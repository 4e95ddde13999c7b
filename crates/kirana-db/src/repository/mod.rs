//! # Repository Module
//!
//! Repository implementations for database access.
//!
//! ## Repository Pattern
//! Each repository owns the SQL for one aggregate and exposes typed async
//! methods. Repositories are cheap to construct (they clone the pool handle)
//! and are handed out by [`crate::Database`].
//!
//! Every query and mutation is scoped by the owning `user_id`: one user
//! never sees or touches another user's rows.

pub mod bill;
pub mod product;
