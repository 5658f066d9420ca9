mod client;

pub use client::{GatewayApi, HttpGateway};
