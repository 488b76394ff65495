//! Hourly weather sampled from the general weather at a domain's timestamps

use crate::core_types::weather::{GeneralWeather, TimeSeries, Weather};
use crate::error::{FiregroundError, Result};
use crate::grid::Domain;
use crate::model::memo::FieldModel;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::debug;

/// Inputs of a derived weather series
pub struct WeatherInputs {
    domain: Arc<Domain>,
    general: Arc<GeneralWeather>,
}

/// One weather tuple per hour of a domain
pub struct WeatherModel {
    field: FieldModel<WeatherInputs, TimeSeries<Weather>>,
}

impl WeatherModel {
    /// Weather sampled from `general` at each of `domain`'s timestamps
    pub fn new(domain: Arc<Domain>, general: Arc<GeneralWeather>) -> Self {
        Self {
            field: FieldModel::derived("weather", WeatherInputs { domain, general }),
        }
    }

    /// Weather from a pre-computed series
    pub fn loaded(series: TimeSeries<Weather>) -> Self {
        Self {
            field: FieldModel::loaded(series),
        }
    }

    /// The hourly series, computed on first use
    ///
    /// # Errors
    ///
    /// `MissingInput` when temperature, humidity or wind is absent.
    pub fn data(&self) -> Result<Arc<TimeSeries<Weather>>> {
        self.field.data_with(compute)
    }

    /// Weather of hour `time_index`
    ///
    /// # Errors
    ///
    /// `IndexOutOfRange` for an hour outside the series.
    pub fn weather_at(&self, time_index: usize) -> Result<Weather> {
        let data = self.data()?;
        data.values()
            .get(time_index)
            .copied()
            .ok_or_else(|| FiregroundError::out_of_range("time", time_index, data.len()))
    }

    /// Weather of the hour nearest to `time`
    ///
    /// # Errors
    ///
    /// As [`WeatherModel::data`].
    pub fn value_at(&self, time: NaiveDateTime) -> Result<Option<Weather>> {
        Ok(self.data()?.nearest(time))
    }
}

fn compute(inputs: &WeatherInputs) -> Result<TimeSeries<Weather>> {
    let times = inputs.domain.timestamps().to_vec();
    let values = times
        .iter()
        .map(|t| {
            inputs.general.weather_at(*t).ok_or_else(|| {
                FiregroundError::MissingInput(
                    "general air temperature, humidity and wind are required".into(),
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;
    debug!("Sampled general weather at {} hours", values.len());
    TimeSeries::new(times, values)
}
