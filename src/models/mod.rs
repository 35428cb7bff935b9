// Re-export all model types so callers can use `crate::models::Foo`

pub mod activity;
pub mod document;
pub mod fields;
pub mod invoice;
pub mod job;
pub mod locale;
pub mod responses;
pub mod usage;
pub mod user;

pub use activity::*;
pub use document::*;
pub use fields::*;
pub use invoice::*;
pub use job::*;
pub use locale::*;
pub use responses::*;
pub use usage::*;
pub use user::*;
