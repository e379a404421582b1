//! [`FleetLifecycle`] on top of the AppStream API

use crate::api::AppStreamApi;
use appstream_cloud::{FleetLifecycle, FleetState, Result, TransitionAction};
use async_trait::async_trait;

/// Observes fleets with `DescribeFleets` and transitions them with
/// `StartFleet` / `StopFleet`
pub struct FleetControl<'a> {
    api: &'a dyn AppStreamApi,
}

impl<'a> FleetControl<'a> {
    pub fn new(api: &'a dyn AppStreamApi) -> Self {
        Self { api }
    }
}

#[async_trait]
impl FleetLifecycle for FleetControl<'_> {
    async fn observe(&self, fleet: &str) -> Result<Option<FleetState>> {
        Ok(self.api.describe_fleet(fleet).await?.map(|f| f.state))
    }

    async fn request_transition(&self, fleet: &str, action: TransitionAction) -> Result<()> {
        match action {
            TransitionAction::Start => self.api.start_fleet(fleet).await,
            TransitionAction::Stop => self.api.stop_fleet(fleet).await,
        }
    }
}
