//! URL handling module for Sitesift
//!
//! This module provides the frontier's normalization key, host extraction,
//! wildcard host matching and the media-resource skip rule.

mod domain;
mod matcher;
mod normalize;
mod skip;

pub use domain::{domain_of, extract_domain};
pub use matcher::matches_wildcard;
pub use normalize::normalize_url;
pub use skip::is_media_resource;
