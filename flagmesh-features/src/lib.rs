//! Multi-Source Feature Flags
//!
//! Combines several independent feature flag clients, each bound to its own
//! project or environment, behind a single evaluation interface.
//!
//! # Features
//!
//! - **Ordered resolution** - [`MergedFlagClient`] tries clients in priority
//!   order and stops at the first one that knows the flag
//! - **Namespaces** - [`NamespacedFlagClient`] addresses clients by label
//! - **Pluggable clients** - anything implementing [`FlagClient`]
//! - **Local flags** - [`InMemoryFlagClient`] with targeting rules, regex
//!   matching, and percentage rollout
//!
//! # Quick Start
//!
//! ```
//! use flagmesh_features::*;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let project_a = InMemoryFlagClient::new()
//!     .with_flag(FeatureFlag::boolean("my-feature", true));
//! let project_b = InMemoryFlagClient::new()
//!     .with_flag(FeatureFlag::boolean("my-feature", false));
//!
//! let flags = MergedFlagClient::builder()
//!     .client("Project A", Arc::new(project_a))
//!     .client("Project B", Arc::new(project_b))
//!     .build();
//! flags.initialize().await.unwrap();
//!
//! // Both projects define the key; Project A is first, so it wins.
//! let ctx = EvaluationContext::new("123");
//! assert!(flags.bool_variation("my-feature", &ctx, false).await.unwrap());
//! # });
//! ```
//!
//! # Missing flags are errors
//!
//! A flag found in no client yields the **last** client's error rather than
//! the fallback passed to `variation`. See [`MergedFlagClient::variation`].
//!
//! # Error observers
//!
//! A client with no error observer may log failures and quietly serve the
//! fallback, which hides absence from the resolver.
//! [`MergedFlagClient::initialize`] registers a no-op observer on every
//! client, and evaluation fails fast with [`ResolverError::ObserverMissing`]
//! if one is missing.

pub mod client;
pub mod error;
pub mod flag;
pub mod memory;
pub mod merged;
pub mod namespaced;

pub use client::{ErrorObserver, Evaluation, FlagClient, LabeledClient, noop_observer};
pub use error::{ClientError, ClientResult, InitError, ResolverError, ResolverResult};
pub use flag::{
    Condition, EvaluationContext, FeatureFlag, FromVariation, Operator, Rollout, TargetingRule,
    Variation,
};
pub use memory::InMemoryFlagClient;
pub use merged::{MergedFlagClient, MergedFlagClientBuilder, ResolvedVariation};
pub use namespaced::NamespacedFlagClient;
