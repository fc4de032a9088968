#![forbid(unsafe_code)]

pub mod pipeline_service_impl;
pub mod worker;
