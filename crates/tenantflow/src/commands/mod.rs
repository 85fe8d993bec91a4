pub mod apply;
pub mod create;
pub mod kinds;
