//! The two ways of changing the drive speed.
//!
//! [`PrimaryPath`] issues the native `CDROM_SELECT_SPEED` request on the block
//! device. [`FallbackPath`] sends an MMC SET CD SPEED command through a SCSI
//! transport, normally the drive's `sg` node. Both sit behind
//! [`SpeedSetter`] so the controller can be driven with fakes.

use crate::cdrom;
use crate::command::SetCdSpeedCommand;
use crate::error::{Error, InterfaceFailure, Result};
use crate::settings::Settings;
use crate::sg::{ScsiTransport, SgDevice};
use strum::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    #[strum(to_string = "ioctl")]
    Primary,
    #[strum(to_string = "SG_IO")]
    Fallback,
}

/// Attempt to change the read speed.
pub trait SpeedSetter {
    fn strategy(&self) -> Strategy;

    fn set_speed(&mut self, speed: u16) -> Result<()>;
}

/// Report the speed the drive is currently running at.
pub trait SpeedReader {
    fn read_speed(&mut self) -> Result<u32>;
}

/// Check whether the device node can be opened at all.
pub trait ReadinessProbe {
    fn path(&self) -> &str;

    fn probe(&mut self) -> std::io::Result<()>;
}

/// Native cdrom ioctl path on the block device.
#[derive(Debug, Clone)]
pub struct PrimaryPath {
    path: String,
}

impl PrimaryPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl SpeedSetter for PrimaryPath {
    fn strategy(&self) -> Strategy {
        Strategy::Primary
    }

    fn set_speed(&mut self, speed: u16) -> Result<()> {
        tracing::debug!("Trying ioctl CDROM_SELECT_SPEED on {}...", self.path);
        cdrom::select_speed(&self.path, speed).map_err(|cause| Error::PrimaryInterfaceFailed {
            path: self.path.clone(),
            cause,
        })
    }
}

impl SpeedReader for PrimaryPath {
    fn read_speed(&mut self) -> Result<u32> {
        cdrom::get_speed(&self.path).map_err(|cause| Error::QueryFailed {
            path: self.path.clone(),
            cause,
        })
    }
}

impl ReadinessProbe for PrimaryPath {
    fn path(&self) -> &str {
        &self.path
    }

    fn probe(&mut self) -> std::io::Result<()> {
        cdrom::open_nonblocking(&self.path).map(drop)
    }
}

/// SCSI pass-through path.
#[derive(Debug, Clone)]
pub struct FallbackPath<T = SgDevice> {
    transport: T,
}

impl FallbackPath<SgDevice> {
    pub fn sg(path: impl Into<String>, settings: &Settings) -> Self {
        Self::new(SgDevice::new(path, settings))
    }
}

impl<T: ScsiTransport> FallbackPath<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: ScsiTransport> SpeedSetter for FallbackPath<T> {
    fn strategy(&self) -> Strategy {
        Strategy::Fallback
    }

    fn set_speed(&mut self, speed: u16) -> Result<()> {
        tracing::debug!(
            "Trying SG_IO SCSI SET CD SPEED on {}...",
            self.transport.path()
        );
        let cdb = SetCdSpeedCommand::new(speed).to_bytes();
        let path = self.transport.path().to_string();
        let failed = |cause| Error::FallbackInterfaceFailed {
            path: path.clone(),
            cause,
        };

        let status = self.transport.execute(&cdb).map_err(failed)?;
        if !status.is_ok() {
            return Err(failed(InterfaceFailure::CheckCondition(status)));
        }
        Ok(())
    }
}
