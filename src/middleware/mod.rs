pub mod cors;
pub mod identity;
pub mod logging;
