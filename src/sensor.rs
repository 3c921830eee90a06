mod reading;
mod signal;

pub use reading::*;
pub use signal::*;
