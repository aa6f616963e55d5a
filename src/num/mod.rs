pub mod number;

pub use number::{LiteralKind, Number};
