pub mod chromium;
pub mod http_client;
pub mod in_memory_api;
pub mod scout_api;

pub use chromium::ChromiumLauncher;
pub use http_client::build_client;
pub use in_memory_api::InMemoryScoutApi;
pub use scout_api::HttpScoutApi;
