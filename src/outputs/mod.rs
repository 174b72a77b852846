//! Output generation for the composed digest and its JSON preview.
//!
//! # Submodules
//!
//! - [`digest`]: Renders a [`CategoryDigest`](crate::models::CategoryDigest)
//!   into the plain-text email subject and body
//! - [`json`]: Writes the summarized digest to a JSON file for previewing
//!
//! # Output Structure
//!
//! ```text
//! preview_dir/
//! ├── 2024-01-15.json
//! └── 2024-01-16.json
//! ```

pub mod digest;
pub mod json;
