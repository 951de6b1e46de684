pub mod history;
pub mod images;
