//! Hourly weather tuples and the general (sector-independent) weather series
//!
//! The fireground receives air temperature, relative humidity, wind and
//! cloud cover as independent time series. Each sector's weather model
//! samples them at its own timestamps by nearest time.

use crate::core_types::time::nearest_time_index;
use crate::core_types::units::{Celsius, Degrees, MetersPerSecond, Percent};
use crate::error::{FiregroundError, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Weather at one hour
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Weather {
    /// Air temperature
    pub air_temperature: Celsius,
    /// Relative humidity
    pub relative_humidity: Percent,
    /// 20-ft wind speed
    pub wind_speed: MetersPerSecond,
    /// Direction the wind blows from, clockwise from north
    pub wind_direction: Degrees,
    /// Cloud cover
    pub cloud_cover: Percent,
}

/// Wind speed and direction
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Wind {
    /// 20-ft wind speed
    pub speed: MetersPerSecond,
    /// Direction the wind blows from, clockwise from north
    pub direction: Degrees,
}

impl Wind {
    /// Create a wind sample
    #[must_use]
    pub const fn new(speed: MetersPerSecond, direction: Degrees) -> Self {
        Self { speed, direction }
    }
}

/// Values paired with ascending timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries<T> {
    times: Vec<NaiveDateTime>,
    values: Vec<T>,
}

impl<T: Copy> TimeSeries<T> {
    /// Build a series from parallel vectors
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the vectors differ in length, are empty,
    /// or the timestamps are not strictly increasing.
    pub fn new(times: Vec<NaiveDateTime>, values: Vec<T>) -> Result<Self> {
        if times.len() != values.len() {
            return Err(FiregroundError::InvalidArgument {
                name: "values",
                value: values.len().to_string(),
                reason: format!("expected {} values to match the timestamps", times.len()),
            });
        }
        if times.is_empty() {
            return Err(FiregroundError::InvalidArgument {
                name: "times",
                value: "[]".into(),
                reason: "a series needs at least one sample".into(),
            });
        }
        if times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(FiregroundError::InvalidArgument {
                name: "times",
                value: format!("{} samples", times.len()),
                reason: "timestamps must be strictly increasing".into(),
            });
        }
        Ok(Self { times, values })
    }

    /// Same value at every timestamp
    ///
    /// # Errors
    ///
    /// As [`TimeSeries::new`].
    pub fn constant(times: Vec<NaiveDateTime>, value: T) -> Result<Self> {
        let values = vec![value; times.len()];
        Self::new(times, values)
    }

    /// Timestamps of the samples
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Sample values
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false for a constructed series
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at the timestamp nearest to `time`
    pub fn nearest(&self, time: NaiveDateTime) -> Option<T> {
        nearest_time_index(&self.times, time).map(|i| self.values[i])
    }
}

/// General weather series shared by every sector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralWeather {
    /// Air temperature series
    pub air_temperatures: Option<TimeSeries<Celsius>>,
    /// Relative humidity series
    pub relative_humidities: Option<TimeSeries<Percent>>,
    /// Wind series
    pub winds: Option<TimeSeries<Wind>>,
    /// Cloud cover series (clear skies when absent)
    pub cloud_cover: Option<TimeSeries<Percent>>,
}

impl GeneralWeather {
    /// True once temperature, humidity and wind are all present
    pub fn is_complete(&self) -> bool {
        self.air_temperatures.is_some()
            && self.relative_humidities.is_some()
            && self.winds.is_some()
    }

    /// Assemble the weather tuple nearest to `time`
    ///
    /// Returns `None` until the three required series are present.
    pub fn weather_at(&self, time: NaiveDateTime) -> Option<Weather> {
        let air_temperature = self.air_temperatures.as_ref()?.nearest(time)?;
        let relative_humidity = self.relative_humidities.as_ref()?.nearest(time)?;
        let wind = self.winds.as_ref()?.nearest(time)?;
        let cloud_cover = self
            .cloud_cover
            .as_ref()
            .and_then(|s| s.nearest(time))
            .unwrap_or_default();
        Some(Weather {
            air_temperature,
            relative_humidity,
            wind_speed: wind.speed,
            wind_direction: wind.direction,
            cloud_cover,
        })
    }
}
