pub mod api;
pub mod dom;
#[cfg(feature = "browser")]
pub mod session;
pub mod strategy;
pub mod tables;

pub use api::ApiStrategy;
#[cfg(feature = "browser")]
pub use session::{BrowserSession, BrowserSessionFactory};
pub use strategy::{DomStrategy, PlatformStrategy, SessionFactory, StrategyBuilder};
pub use tables::{DomTables, dom_tables_for};
