pub mod instance;
pub mod misc;
pub mod pool;
pub mod recover;
pub mod volume;

pub use instance::*;
pub use misc::*;
pub use pool::*;
pub use recover::*;
pub use volume::*;

pub use crate::rpc_impl_string_id;
