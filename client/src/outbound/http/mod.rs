//! HTTP adapter for the sweets authority.

mod authority;
mod dto;

pub use authority::HttpSweetsAuthority;
