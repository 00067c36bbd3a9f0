pub mod engagement;
pub mod page;
pub mod photo;
pub mod user;
