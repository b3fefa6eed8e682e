pub mod basic;
pub mod token;

pub use basic::{parse_basic_header, AdminValidator, BasicCredentials};
pub use token::{attendee_link, token, TokenKey};
