pub mod logging;
pub mod paths;

pub use paths::{basename, result_locator};
