#![forbid(unsafe_code)]

pub mod primary;
