pub mod binding;
pub mod item;
pub mod selected_set;

pub use binding::*;
pub use item::*;
pub use selected_set::*;
