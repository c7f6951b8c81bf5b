//! Tune requests and direction hints

use std::fmt;

/// Automatic-policy tune request
///
/// The driver decides how to split the move between the LO and the DSP
/// stage. The LO is placed at `target_freq + lo_offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TuneRequest {
    /// Desired center frequency in Hz
    pub target_freq: f64,
    /// LO offset from the target in Hz
    #[cfg_attr(feature = "serde", serde(default))]
    pub lo_offset: f64,
}

impl TuneRequest {
    /// Tune request with no LO offset
    pub fn new(target_freq: f64) -> Self {
        Self {
            target_freq,
            lo_offset: 0.0,
        }
    }

    /// Tune request with an explicit LO offset
    pub fn with_lo_offset(target_freq: f64, lo_offset: f64) -> Self {
        Self {
            target_freq,
            lo_offset,
        }
    }

    /// Frequency the LO should land on
    pub fn lo_freq(&self) -> f64 {
        self.target_freq + self.lo_offset
    }
}

impl fmt::Display for TuneRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} MHz", self.target_freq / 1_000_000.0)?;
        if self.lo_offset != 0.0 {
            write!(f, " (LO offset {} Hz)", self.lo_offset)?;
        }
        Ok(())
    }
}

/// Transceiver direction hint carried by the `direction` key
///
/// Never applied to hardware. It orders timed batches that fall due
/// together so the receive side retunes before the transmit side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    Rx,
    Tx,
}

impl Direction {
    /// Parse the wire form (`"RX"` or `"TX"`); anything else is not a direction
    pub fn from_hint(s: &str) -> Option<Self> {
        match s {
            "RX" => Some(Self::Rx),
            "TX" => Some(Self::Tx),
            _ => None,
        }
    }

    /// Wire form of the hint
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rx => "RX",
            Self::Tx => "TX",
        }
    }
}
