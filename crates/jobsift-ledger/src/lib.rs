pub mod companies;
pub mod store;

pub use companies::read_companies;
pub use store::CsvLedger;
