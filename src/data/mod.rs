pub mod bar;
pub mod loader;

pub use bar::{closes, Bar, BarError};
pub use loader::load_csv;
