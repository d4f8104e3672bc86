pub mod api;
pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod controller;
pub mod error;
pub mod logger;
pub mod page;
pub mod token;
pub mod types;
pub mod util;
pub mod view;

pub use api::ApiClient;
pub use config::Config;
pub use controller::{ViewController, ViewState};
pub use error::{ClientError, Result};
pub use page::{MemoryPage, Page, TerminalPage};
