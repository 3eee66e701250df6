pub mod auth_sessions;
pub mod comments;
pub mod contact;
pub mod courses;
pub mod enrollment;
pub mod identity;
pub mod sessions;
pub mod users;
pub mod videos;

pub use auth_sessions::*;
pub use comments::*;
pub use contact::*;
pub use courses::*;
pub use enrollment::*;
pub use identity::*;
pub use sessions::*;
pub use users::*;
pub use videos::*;
