pub mod file_store;
pub mod http_gateway;
pub mod navigator;

pub use file_store::FileStore;
pub use http_gateway::HttpGateway;
pub use navigator::LogNavigator;
