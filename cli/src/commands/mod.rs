pub mod batch;
pub mod context;
pub mod replay;
pub mod tools;
