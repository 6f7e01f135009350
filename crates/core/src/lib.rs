pub mod config;
pub mod criteria;
pub mod decision;
pub mod indexer;
pub mod language;
pub mod metrics;
pub mod parser;
pub mod profile;
pub mod quality;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, IndexerConfig,
    IndexerKind, SanitizedConfig,
};
pub use criteria::{SearchCriteria, SearchCriteriaBuilder, SearchIntent, SearchMode, SearchTarget};
pub use decision::{
    DecisionEngine, EngineSettings, ExhaustionCause, ReleaseDecision, SearchReport, SearchState,
    SearchStatus,
};
pub use indexer::{
    create_provider, HttpTransport, IndexerError, IndexerProvider, RateLimiterPool, ReleaseItem,
    Transport, TransportError,
};
pub use language::Language;
pub use parser::{parse, ParsedReleaseInfo, TitleParser};
pub use profile::{
    Decision, InMemoryProfileStore, LanguageProfile, ProfileMatcher, ProfileSet, ProfileStore,
    QualityProfile, RejectionReason,
};
pub use quality::{Quality, QualityModel, QualitySignal};
