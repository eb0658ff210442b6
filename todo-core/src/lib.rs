mod db;
mod error;
pub mod migrate;
mod models;

pub use db::Database;
pub use error::{Error, Result};
pub use models::{
    Confirmation, ErrorBody, NewTask, Priority, ReorderEntry, ReorderRequest, SortMode, Task,
    TaskPatch,
};
