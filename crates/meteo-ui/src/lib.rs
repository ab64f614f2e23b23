pub mod app;
pub mod models;
pub mod render;
pub mod services;
pub mod theme;
pub mod view;

pub use app::App;
pub use theme::{ThemeClass, ThemeRoot};
