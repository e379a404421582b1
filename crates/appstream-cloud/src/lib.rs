//! AppStream Cloud Infrastructure
//!
//! This crate provides the provider abstraction for AppStream fleets and
//! stacks, and the convergence driver that moves a fleet to a requested
//! lifecycle state.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  AppStream CLI                   │
//! │          (plan / apply / fleet start)            │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │               appstream-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │          Provider Abstraction             │   │
//! │  │  trait CloudProvider { ... }              │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │  converge()  │  │  State Mgmt  │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────────┐
//! │ appstream-cloud-  │
//! │ aws (SDK client)  │
//! └───────────────────┘
//! ```

pub mod action;
pub mod converge;
pub mod error;
pub mod lifecycle;
pub mod provider;
pub mod state;
pub mod tags;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use action::{Action, ActionType, ApplyResult, Plan, PlanSummary, ResourceKind};
pub use converge::{
    CancelHandle, CancelSignal, ConvergeOptions, Convergence, DEFAULT_CONVERGE_TIMEOUT,
    DEFAULT_POLL_INTERVAL, FleetLifecycle, await_state, cancel_pair, converge, converge_all,
};
pub use error::{CloudError, Result};
pub use lifecycle::{DesiredState, FleetState, TransitionAction};
pub use provider::{AuthStatus, CloudProvider, ResourceConfig, ResourceSet};
pub use state::{
    GlobalState, ProviderState, ResourceState, ResourceStatus, StateLock, StateManager,
};
pub use tags::{TagDiff, Tags};
