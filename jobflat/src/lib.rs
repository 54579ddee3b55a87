pub mod naming;
pub mod source;
pub mod resolver;
pub mod flatten;
pub mod export;
pub mod display;
pub mod error;

pub use error::{JobFlatError, Result};
pub use flatten::{flatten, FlatRow};
pub use naming::{NamingPolicy, RefKind, Reference, RelationMap, SuffixConvention};
pub use resolver::Resolver;
pub use source::{CollectionSource, MemorySource, MongoSource, RootQuery};
