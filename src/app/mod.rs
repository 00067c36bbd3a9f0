pub mod access;
pub mod auth;
pub mod engagement;
pub mod otp;
pub mod photos;
pub mod relations;
pub mod users;
