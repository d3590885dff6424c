mod capture;
mod extract;

pub use capture::run_capture;
pub use extract::run_extract;
