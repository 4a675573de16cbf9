//! Utility modules for xray-prep
//!
//! This module contains various utility functions organized by functionality:
//! - `error`: Crate error type and result alias
//! - `files`: File operations and directory management
//! - `http`: HTTP download helpers
//! - `images`: Image decoding, resizing and encoding

pub mod error;
pub mod files;
pub mod http;
pub mod images;
