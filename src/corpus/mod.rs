//! @ai:module:intent Dataset records and loading
//! @ai:module:layer domain
//! @ai:module:public_api Example, DatasetLoader

pub mod example;
pub mod loader;

pub use example::Example;
pub use loader::{DatasetLoader, DatasetLoaderTrait};
