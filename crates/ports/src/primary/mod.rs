pub mod pipeline_port;
