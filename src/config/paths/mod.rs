//! Well-known locations.

pub mod xdg_root;
