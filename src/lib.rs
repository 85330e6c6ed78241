// flagmesh - resolve feature flags across several independent flag clients
//
// Each client is bound to one project or environment. The merged client tries
// them in priority order; the namespaced client addresses them by label.

// Re-export core functionality
pub use flagmesh_features::*;

// Re-export optional crates
#[cfg(feature = "config")]
pub use flagmesh_config;

#[cfg(feature = "log")]
pub use flagmesh_log;

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        ClientError, EvaluationContext, FeatureFlag, FlagClient, InMemoryFlagClient, InitError,
        MergedFlagClient, NamespacedFlagClient, ResolverError, Variation, noop_observer,
    };

    #[cfg(feature = "config")]
    pub use flagmesh_config::{MeshConfig, SourceConfig};
}
