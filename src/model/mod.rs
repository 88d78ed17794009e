//! Domain rules that do not need the database.

pub mod content;
pub mod permission;

pub use content::DerivedContent;
pub use permission::Permission;
