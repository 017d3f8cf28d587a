pub mod homework;
pub mod status;

pub use homework::{parse_status, Homework};
pub use status::ReviewStatus;
