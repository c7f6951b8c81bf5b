//! Tune resolution
//!
//! Reduces the tuning keys of a command to one canonical request that is
//! applied identically to every target channel. Precedence: an explicit
//! `tune` request, then `freq` (+ `lo_offset`, default 0), then the manual
//! `lo_freq`/`dsp_freq` stages. Validation guarantees at most one group is
//! present.

use sdr_command::{CommandKey, TuneRequest, ValidatedCommand, Value};

use crate::directive::Action;

/// Canonical tuning outcome for a command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TuneDirective {
    /// Driver picks the LO/DSP split
    Automatic(TuneRequest),
    /// Stages pinned by the caller, passed straight through
    Manual {
        lo_freq: Option<f64>,
        dsp_freq: Option<f64>,
    },
}

impl TuneDirective {
    /// Hardware actions for one channel
    pub fn actions(&self) -> Vec<Action> {
        match self {
            Self::Automatic(req) => vec![Action::Tune(*req)],
            Self::Manual { lo_freq, dsp_freq } => lo_freq
                .map(Action::LoFreq)
                .into_iter()
                .chain(dsp_freq.map(Action::DspFreq))
                .collect(),
        }
    }
}

/// Resolve the tuning keys of a command
pub fn resolve_tune(cmd: &ValidatedCommand) -> Option<TuneDirective> {
    if let Some(Value::Tune(req)) = cmd.get(CommandKey::Tune) {
        return Some(TuneDirective::Automatic(*req));
    }

    if let Some(freq) = cmd.float(CommandKey::Freq) {
        let lo_offset = cmd.float(CommandKey::LoOffset).unwrap_or(0.0);
        return Some(TuneDirective::Automatic(TuneRequest::with_lo_offset(
            freq, lo_offset,
        )));
    }

    let lo_freq = cmd.float(CommandKey::LoFreq);
    let dsp_freq = cmd.float(CommandKey::DspFreq);
    if lo_freq.is_some() || dsp_freq.is_some() {
        return Some(TuneDirective::Manual { lo_freq, dsp_freq });
    }

    None
}
