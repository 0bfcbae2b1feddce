pub mod app_config;
pub mod memory;
pub mod stripe;

pub use app_config::Config;
pub use memory::InMemoryProcessor;
pub use stripe::StripeClient;
