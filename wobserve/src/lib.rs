//! Production-friendly observability hooks for turn and tool phases.
//!
//! ```rust
//! use wobserve::{MetricsObservabilityHooks, SafeTurnHooks, TracingObservabilityHooks};
//!
//! let _turn_hooks = SafeTurnHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeToolHooks, SafeTurnHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeToolHooks, SafeTurnHooks, TracingObservabilityHooks,
    };
}
