pub mod poller;
pub mod status_source;
