// Core records
pub mod tenant;

// Tenant-owned records served by the API
pub mod note;
pub mod member;

// Re-export commonly used types
pub use tenant::{Tenant, NewTenant, UpdateTenant};
pub use note::{Note, NewNote};
pub use member::{Member, Membership, NewMember, NewMembership};
