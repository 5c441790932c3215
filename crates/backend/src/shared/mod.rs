pub mod config;
pub mod data;
pub mod qr;
pub mod uploads;
