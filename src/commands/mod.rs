pub mod analyze;
pub mod report;
pub mod setup;

pub use analyze::execute_analyze;
pub use report::execute_report;
pub use setup::execute_setup;
