//! Driver front end and program loading.
//!
//! Provides the `Driver` a scenario talks to, the image loader that puts executables
//! into TCM, and the host-buffer check used at language boundaries.

/// The bus-transaction driver.
pub mod driver;

/// Executable images and the resolver trait.
pub mod image;

/// Segment loading.
pub mod loader;

/// Host payload descriptions.
pub mod payload;

pub use self::driver::Driver;
