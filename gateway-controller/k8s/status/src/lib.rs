//! Renders route resolution outcomes as Gateway API route status.
//!
//! The [`Index`] folds the conditions produced by a resolution pass into one
//! `RouteParentStatus` per (route, parent reference). Writing the resulting
//! patches to the API server is left to the caller.

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod index;


pub use self::index::{make_patch, Index, RouteParentStatus, RouteStatus, Update};
