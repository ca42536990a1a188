//! URL handling module for linkmap
//!
//! This module provides the canonical URL form used for scheduling and
//! reporting, plus domain extraction and same-domain scope checks.

mod domain;
mod normalize;

// Re-export main types and functions
pub use domain::{authority, extract_domain, is_same_domain};
pub use normalize::CanonicalUrl;
