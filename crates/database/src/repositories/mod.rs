pub mod scoped;
pub mod tenants;
