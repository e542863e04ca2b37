pub mod error;
pub mod types;

pub use error::{LifecycleError, Result, ValidationError, ValidationErrors};
pub use types::{ByteSize, TimeSpan};
