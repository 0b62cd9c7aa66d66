pub mod cli;
pub mod config;
pub mod error;
pub mod import;
pub mod lookup;
pub mod ocr;
pub mod resolver;
pub mod review;
pub mod scanner;
pub mod store;
