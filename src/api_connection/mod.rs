pub mod connection;
pub mod endpoints;

pub use connection::{
    build_http_client, FetchChain, FoodDataCentralClient, HttpSheet, PageFetcher, ProxyFetcher,
};
