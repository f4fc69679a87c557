pub mod native_http;
pub mod transport;
