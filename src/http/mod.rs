//! HTTP protocol layer
//!
//! Status table, JSON response building and parameter decoding. Knows
//! nothing about resources or dispatch.

pub mod params;
pub mod response;
pub mod status;

pub use params::{is_form_content_type, parse_params};
pub use response::{respond, status_line};
pub use status::reason_phrase;
