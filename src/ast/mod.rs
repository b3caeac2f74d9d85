pub mod builtin;
pub mod expression;
pub mod statement;
pub mod value;

pub use builtin::*;
pub use expression::*;
pub use statement::*;
pub use value::*;
