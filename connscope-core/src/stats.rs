use crate::timeline::PerSecondSeries;
use chrono::NaiveDateTime;
use connscope_common::{ConnScopeError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeStats {
    pub max_volume: u64,
    pub min_volume: u64,
    pub mean_volume: f64,
    pub peak_instants: Vec<NaiveDateTime>, // every second at max_volume, series order
}

impl VolumeStats {
    pub fn from_series(series: &PerSecondSeries) -> Result<Self> {
        let max_volume = series.counts.iter().copied().max().ok_or(ConnScopeError::NoData)?;
        let min_volume = series.counts.iter().copied().min().ok_or(ConnScopeError::NoData)?;
        let mean_volume =
            series.counts.iter().map(|&c| c as f64).sum::<f64>() / series.len() as f64;
        let peak_instants = series
            .iter()
            .filter(|&(_, c)| c == max_volume)
            .map(|(t, _)| t)
            .collect();
        Ok(Self {
            max_volume,
            min_volume,
            mean_volume,
            peak_instants,
        })
    }
}
