//! AWS AppStream 2.0 provider
//!
//! This crate implements the CloudProvider trait for AppStream, managing
//! fleets and stacks and driving fleet start/stop through the convergence
//! driver in `appstream-cloud`.
//!
//! # Features
//!
//! - Fleet management (create, update, associate, start/stop, delete)
//! - Stack management (storage connectors, user settings)
//! - Tag synchronization
//!
//! # Requirements
//!
//! - Credentials from the standard AWS chain (environment, profile, SSO, IMDS)
//!
//! # Example
//!
//! ```ignore
//! use appstream_cloud::{CloudProvider, ConvergeOptions, DesiredState};
//! use appstream_cloud_aws::{AppStreamProvider, SdkAppStream};
//! use std::sync::Arc;
//!
//! let api = SdkAppStream::from_env(Some("eu-west-1")).await;
//! let provider = AppStreamProvider::new(Arc::new(api), ConvergeOptions::new());
//!
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! provider.set_fleet_state("analysts", DesiredState::Running).await?;
//! ```

pub mod api;
pub mod control;
pub mod error;
pub mod fleet;
pub mod provider;
pub mod sdk;
pub mod stack;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use api::{AppStreamApi, FleetDescription, FleetUpdate, StackDescription, StackUpdate, sync_tags};
pub use control::FleetControl;
pub use error::{AwsError, Result};
pub use fleet::{FleetChanges, FleetMapper, FleetRecord, diff_fleet};
pub use provider::{AppStreamProvider, converge_options, resources_from_project};
pub use sdk::SdkAppStream;
pub use stack::{StackChanges, StackMapper, StackRecord, diff_stack};
