//! Channel and motherboard scope resolution

use sdr_command::{CommandKey, RadioHardware, ScopeDefault, ValidatedCommand};

use crate::directive::Target;
use crate::error::ControlError;

/// Abstract scope of a directive before expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    AllChannels,
    Channel(usize),
    Motherboard(usize),
}

/// Expands command scopes into concrete targets for one device shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeResolver {
    channels: usize,
    mboards: usize,
}

impl ScopeResolver {
    pub fn new(channels: usize, mboards: usize) -> Self {
        Self { channels, mboards }
    }

    /// Resolver matching a device's channel and motherboard counts
    pub fn for_hardware<H: RadioHardware + ?Sized>(hardware: &H) -> Self {
        Self::new(hardware.num_channels(), hardware.num_mboards())
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn mboards(&self) -> usize {
        self.mboards
    }

    /// Channel scope selected by `chan` (absent or `-1` = all channels)
    pub fn channel_scope(&self, cmd: &ValidatedCommand) -> Result<Scope, ControlError> {
        match cmd.chan() {
            None | Some(-1) => Ok(Scope::AllChannels),
            Some(chan) => {
                let chan = usize::try_from(chan).unwrap_or(usize::MAX);
                if chan >= self.channels {
                    return Err(ControlError::ChannelOutOfRange {
                        chan,
                        channels: self.channels,
                    });
                }
                Ok(Scope::Channel(chan))
            }
        }
    }

    /// Motherboard selected by `mboard` (default 0)
    pub fn mboard(&self, cmd: &ValidatedCommand) -> Result<usize, ControlError> {
        self.check_mboard(cmd.mboard().unwrap_or(0))
    }

    /// Check a motherboard index against the device
    pub fn check_mboard(&self, mboard: usize) -> Result<usize, ControlError> {
        if mboard >= self.mboards {
            return Err(ControlError::MotherboardOutOfRange {
                mboard,
                mboards: self.mboards,
            });
        }
        Ok(mboard)
    }

    /// Scope a key applies to, given the command's selectors
    ///
    /// `None` for keys that are never applied to hardware.
    pub fn scope_for(&self, key: CommandKey, channel_scope: Scope, mboard: usize) -> Option<Scope> {
        match key.spec().scope {
            ScopeDefault::PerChannel => Some(channel_scope),
            ScopeDefault::AllChannels => Some(Scope::AllChannels),
            ScopeDefault::Motherboard => Some(Scope::Motherboard(mboard)),
            ScopeDefault::Selector | ScopeDefault::Unscoped => None,
        }
    }

    /// Concrete targets for a scope, in ascending order
    pub fn expand(&self, scope: Scope) -> Vec<Target> {
        match scope {
            Scope::AllChannels => (0..self.channels).map(Target::Channel).collect(),
            Scope::Channel(n) => vec![Target::Channel(n)],
            Scope::Motherboard(n) => vec![Target::Mboard(n)],
        }
    }
}
