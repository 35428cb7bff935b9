// Document queries: shared row mapping in helpers, reads and writes in crud

mod crud;
mod helpers;

pub use helpers::*;
