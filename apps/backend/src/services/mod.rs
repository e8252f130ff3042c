pub mod avatar;
pub mod contacts;
pub mod email;
pub mod mail;
pub mod user_cache;
pub mod users;
