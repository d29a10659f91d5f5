pub mod calendar;
pub mod chlor;
pub mod config;
pub mod extent;
pub mod masked;
pub mod projection;
pub mod readers;
pub mod sic;
