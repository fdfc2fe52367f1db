use agent_terminal_game::{Coordinate, LocationError, LocationOptions, LocationProvider};
use async_trait::async_trait;
use std::time::Duration;

/// What the simulated device does when asked for its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceBehaviour {
    Fix(Coordinate),
    Fail(LocationError),
    /// Answer only after the given delay, so the request timeout can win.
    Slow(Coordinate, Duration),
}

/// Stand-in for a browser geolocation API. Requests are bounded by the
/// caller's timeout the same way a real device would bound them.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedDevice {
    behaviour: DeviceBehaviour,
}

impl SimulatedDevice {
    pub const fn new(behaviour: DeviceBehaviour) -> Self {
        Self { behaviour }
    }

    pub const fn at(position: Coordinate) -> Self {
        Self::new(DeviceBehaviour::Fix(position))
    }

    async fn respond(&self) -> Result<Coordinate, LocationError> {
        match self.behaviour {
            DeviceBehaviour::Fix(position) => {
                if position.is_valid() {
                    Ok(position)
                } else {
                    Err(LocationError::PositionUnavailable)
                }
            }
            DeviceBehaviour::Fail(err) => Err(err),
            DeviceBehaviour::Slow(position, delay) => {
                tokio::time::sleep(delay).await;
                Ok(position)
            }
        }
    }
}

#[async_trait]
impl LocationProvider for SimulatedDevice {
    async fn request_location(
        &self,
        options: &LocationOptions,
    ) -> Result<Coordinate, LocationError> {
        log::debug!(
            "location request (high accuracy: {}, timeout: {:?})",
            options.high_accuracy,
            options.timeout()
        );
        tokio::time::timeout(options.timeout(), self.respond())
            .await
            .unwrap_or(Err(LocationError::Timeout))
    }
}
