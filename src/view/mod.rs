pub mod currency;
pub mod filters;
pub mod table;
pub mod viewport;
