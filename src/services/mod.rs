// Service exports
pub mod cache;
pub mod embedding;
pub mod narration;
pub mod routing;
pub mod storage;

pub use cache::{DistanceCache, DistanceKey, EmbeddingCache};
pub use embedding::{EmbeddingError, EmbeddingProvider, HttpEmbeddingClient, KeywordEmbeddingProvider};
pub use narration::{HttpNarrationClient, NarrationError, NarrationProvider, TemplateNarrator};
pub use routing::{HttpRoutingClient, NoopRoutingProvider, RouteOutcome, RoutingError, RoutingProvider};
pub use storage::{PostingStore, SqlitePostingStore, StorageError};
