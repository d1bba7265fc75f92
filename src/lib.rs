pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use application::{
    attribute_table_path, CompletionClient, FragmentStream, GeometrySource, GeometryStore,
    ImportGeometriesUseCase, ImportPreflight, RelayPromptUseCase,
};

pub use connector::{
    fragment_stream, shape_to_wkt, validate_identifier, DuckdbGeometryStore,
    InMemoryGeometryStore, OpenAiCompatibleClient, RelayConfig, ShapefileGeometrySource,
    SseDecoder, SseEvent,
};

pub use domain::{
    ChatMessage, DomainError, GeometryRecord, ImportSummary, Prompt, RelaySummary, Role,
};
