pub mod money;
pub mod pii;
pub mod models;

pub use money::Money;
pub use pii::Masked;
