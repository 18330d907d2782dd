//! pp-sync library - Demagog publisher synchronization
//!
//! Periodically pulls fact-check statements from the Demagog API and
//! reconciles them into the annotations table: new statements become
//! annotations owned by the Demagog system user, changed statements update
//! the existing rows, untouched ones are left alone.

pub mod demagog;
pub mod store;
pub mod sync;
