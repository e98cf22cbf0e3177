//! Mini-game domain: types, catalog, session store, and action processors.

pub mod catalog;
pub mod processors;
pub mod store;
pub mod types;
