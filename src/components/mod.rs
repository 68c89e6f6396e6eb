pub mod detail;
pub mod editor;
pub mod footer;
pub mod table;
pub mod text_input;
