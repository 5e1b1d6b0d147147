pub mod password;

pub use password::{HashedPassword, hash_password, verify_password};
