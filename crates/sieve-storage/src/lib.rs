pub mod memory;
pub mod postgres;
pub mod traits;
pub mod tuple;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use traits::{RelationshipStore, StorageError};
pub use tuple::{ObjectRef, SubjectRef, Tuple, TupleFilter, TupleWrite};
