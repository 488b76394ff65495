//! Change notifications for progress display and downstream consumers

use crate::core_types::geo::Sector;
use crate::error::FiregroundError;
use std::fmt;
use std::sync::{mpsc, Mutex};

/// Stages of an analysis, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Build each sector's domain over the shared time grid
    Domains,
    /// Terrain per cell
    Terrain,
    /// Hourly weather per sector
    Weather,
    /// Fuel model codes per cell
    FuelType,
    /// Fuel temperature and humidity per cell and hour
    FuelTemperature,
    /// Fuel moisture per cell and hour
    FuelMoisture,
    /// Fire behavior per cell and hour
    FireBehavior,
}

impl Stage {
    /// Every stage in execution order
    pub const ALL: [Stage; 7] = [
        Stage::Domains,
        Stage::Terrain,
        Stage::Weather,
        Stage::FuelType,
        Stage::FuelTemperature,
        Stage::FuelMoisture,
        Stage::FireBehavior,
    ];

    /// Human-readable stage name
    pub fn name(self) -> &'static str {
        match self {
            Stage::Domains => "domains",
            Stage::Terrain => "terrain",
            Stage::Weather => "weather",
            Stage::FuelType => "fuel types",
            Stage::FuelTemperature => "fuel temperatures",
            Stage::FuelMoisture => "fuel moistures",
            Stage::FireBehavior => "fire behavior",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How an analysis ended
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// Every stage ran
    Completed,
    /// The cancel flag was seen before `next` started
    Cancelled {
        /// First stage that did not run
        next: Stage,
    },
    /// `stage` failed; earlier stages' models are kept
    Failed {
        /// The failing stage
        stage: Stage,
        /// Why it failed
        error: FiregroundError,
    },
    /// The worker thread panicked
    Panicked,
}

/// Notifications emitted by a fireground
#[derive(Debug, Clone, PartialEq)]
pub enum FiregroundEvent {
    /// A sector was installed
    SectorAdded(Sector),
    /// A sector and its models were removed
    SectorRemoved(Sector),
    /// General air temperatures were set
    AirTemperaturesAdded,
    /// General relative humidities were set
    RelativeHumiditiesAdded,
    /// General winds were set
    GeneralWindsAdded,
    /// General cloud cover was set
    CloudCoverAdded,
    /// A sector's hourly weather model was (re)built
    FireWeatherAdded(Sector),
    /// A sector's fire behavior model was installed
    FireBehaviorAdded(Sector),
    /// An analysis stage started
    StageStarted(Stage),
    /// An analysis stage finished successfully
    StageCompleted(Stage),
    /// An analysis ended
    AnalysisFinished(AnalysisOutcome),
}

/// Fan-out of events to every live subscriber
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Mutex<Vec<mpsc::Sender<FiregroundEvent>>>,
}

impl EventBus {
    pub(crate) fn subscribe(&self) -> mpsc::Receiver<FiregroundEvent> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.push(tx);
        }
        rx
    }

    /// Send to every subscriber, dropping those whose receiver is gone
    pub(crate) fn emit(&self, event: &FiregroundEvent) {
        if let Ok(mut subscribers) = self.subscribers.lock() {
            subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}
