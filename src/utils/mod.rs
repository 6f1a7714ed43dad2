pub mod fuzzy;
pub mod suggest;
