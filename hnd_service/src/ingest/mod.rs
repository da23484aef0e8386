/// Data source clients.
///
/// Each upstream gets its own file; `fixtures` holds the test pages.

pub mod hnd;

#[cfg(test)]
pub(crate) mod fixtures;
