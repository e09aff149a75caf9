//! Repository traits (ports)

pub mod access_store;

pub use access_store::AccessStore;

#[cfg(test)]
pub use access_store::MockAccessStore;
