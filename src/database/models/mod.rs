pub mod group;
pub mod identity;
pub mod permission;

pub use group::{Group, GroupRow};
pub use identity::{AccessRow, Identity};
pub use permission::Permission;
