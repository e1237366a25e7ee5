pub mod proxy;
pub mod task;

pub use proxy::*;
pub use task::*;
