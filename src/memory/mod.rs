pub mod audit;
pub mod config;
pub mod history;
pub mod merge;
pub mod paths;
pub mod project_key;
pub mod sync;
pub mod util;
pub mod warn;
