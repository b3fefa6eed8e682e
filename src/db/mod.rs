pub mod connection;
pub mod errors;
pub mod read_ops;
pub mod write_ops;

#[cfg(test)]
mod tests;

pub use connection::*;
pub use errors::*;
pub use read_ops::*;
pub use write_ops::*;