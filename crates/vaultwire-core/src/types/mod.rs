//! Core types shared by the store, fetcher and registry

mod descriptor;

pub use descriptor::SecretDescriptor;
