pub mod memory;
pub mod store;
pub mod supabase;

pub use memory::{InMemoryDocumentStore, StoreCall};
pub use store::{DocumentStore, SupabaseDocumentStore};
