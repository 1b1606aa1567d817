//! HTTP API: the remote trigger for stock reconstruction plus read-back of
//! snapshot rows.

pub mod app;
pub mod middleware;
