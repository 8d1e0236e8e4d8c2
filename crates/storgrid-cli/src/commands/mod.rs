pub mod deselect;
pub mod select;
