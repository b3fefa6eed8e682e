pub mod forms;
pub mod money;
pub mod tables;
pub mod views;


pub use forms::{FormErrors, Validate};
pub use money::{Currency, Money, MoneyError};
pub use tables::*;
