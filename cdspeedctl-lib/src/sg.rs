//! Linux generic SCSI (`sg`) pass-through transport.

use crate::error::InterfaceFailure;
use crate::sense::SenseData;
use crate::settings::Settings;
use nix::libc::{c_int, c_uchar, c_uint, c_ushort, c_void};
use std::fmt;
use std::fs::OpenOptions;
use std::os::fd::AsRawFd;
use std::ptr;
use std::time::Duration;

pub const SG_IO: u32 = 0x2285;
pub const SG_DXFER_NONE: c_int = -1;
pub const SG_INFO_OK_MASK: c_uint = 0x1;
pub const SG_INFO_OK: c_uint = 0x0;

mod ioctl_func {
    use super::{SG_IO, SgIoHdr};

    nix::ioctl_readwrite_bad!(sg_io, SG_IO, SgIoHdr);
}

/// `struct sg_io_hdr` from `<scsi/sg.h>`.
#[repr(C)]
#[derive(Debug)]
pub struct SgIoHdr {
    pub interface_id: c_int,
    pub dxfer_direction: c_int,
    pub cmd_len: c_uchar,
    pub mx_sb_len: c_uchar,
    pub iovec_count: c_ushort,
    pub dxfer_len: c_uint,
    pub dxferp: *mut c_void,
    pub cmdp: *mut c_uchar,
    pub sbp: *mut c_uchar,
    pub timeout: c_uint,
    pub flags: c_uint,
    pub pack_id: c_int,
    pub usr_ptr: *mut c_void,
    pub status: c_uchar,
    pub masked_status: c_uchar,
    pub msg_status: c_uchar,
    pub sb_len_wr: c_uchar,
    pub host_status: c_ushort,
    pub driver_status: c_ushort,
    pub resid: c_int,
    pub duration: c_uint,
    pub info: c_uint,
}

impl SgIoHdr {
    /// Header for a command that moves no data.
    ///
    /// `cdb` and `sense` must outlive the ioctl call that uses the header.
    fn no_data(cdb: &mut [u8], sense: &mut [u8], timeout: Duration) -> Self {
        Self {
            interface_id: b'S' as c_int,
            dxfer_direction: SG_DXFER_NONE,
            cmd_len: cdb.len() as c_uchar,
            mx_sb_len: sense.len().min(u8::MAX as usize) as c_uchar,
            iovec_count: 0,
            dxfer_len: 0,
            dxferp: ptr::null_mut(),
            cmdp: cdb.as_mut_ptr(),
            sbp: sense.as_mut_ptr(),
            timeout: timeout.as_millis().min(c_uint::MAX as u128) as c_uint,
            flags: 0,
            pack_id: 0,
            usr_ptr: ptr::null_mut(),
            status: 0,
            masked_status: 0,
            msg_status: 0,
            sb_len_wr: 0,
            host_status: 0,
            driver_status: 0,
            resid: 0,
            duration: 0,
            info: 0,
        }
    }
}

/// Completion status of one pass-through command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SgStatus {
    pub status: u8,
    pub host_status: u16,
    pub driver_status: u16,
    pub info: u32,
    pub sense: Option<SenseData>,
}

impl SgStatus {
    pub fn good() -> Self {
        Self {
            status: 0,
            host_status: 0,
            driver_status: 0,
            info: SG_INFO_OK,
            sense: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.info & SG_INFO_OK_MASK == SG_INFO_OK
    }
}

impl fmt::Display for SgStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status = 0x{:02x}, host = 0x{:04x}, driver = 0x{:04x}",
            self.status, self.host_status, self.driver_status
        )?;
        if let Some(sense) = &self.sense {
            write!(f, ", {sense}")?;
        }
        Ok(())
    }
}

/// Something that can execute a non-data SCSI command.
pub trait ScsiTransport {
    /// Path shown in diagnostics.
    fn path(&self) -> &str;

    fn execute(&mut self, cdb: &[u8]) -> Result<SgStatus, InterfaceFailure>;
}

/// An `sg` character device, opened read-write for each command.
#[derive(Debug, Clone)]
pub struct SgDevice {
    path: String,
    timeout: Duration,
    sense_len: usize,
}

impl SgDevice {
    pub fn new(path: impl Into<String>, settings: &Settings) -> Self {
        Self {
            path: path.into(),
            timeout: settings.sg_timeout,
            sense_len: settings.sense_buffer_len,
        }
    }
}

impl ScsiTransport for SgDevice {
    fn path(&self) -> &str {
        &self.path
    }

    fn execute(&mut self, cdb: &[u8]) -> Result<SgStatus, InterfaceFailure> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.path)
            .map_err(InterfaceFailure::Open)?;

        tracing::trace!("SG_IO {} cdb: {:02X?}", self.path, cdb);
        let mut cdb = cdb.to_vec();
        let mut sense = vec![0u8; self.sense_len];
        let mut hdr = SgIoHdr::no_data(&mut cdb, &mut sense, self.timeout);

        // SAFETY: `hdr` points into `cdb` and `sense`, both alive until the
        // call returns, and `file` is an open descriptor.
        unsafe { ioctl_func::sg_io(file.as_raw_fd(), &mut hdr) }
            .map_err(InterfaceFailure::Transport)?;

        let written = (hdr.sb_len_wr as usize).min(sense.len());
        Ok(SgStatus {
            status: hdr.status,
            host_status: hdr.host_status,
            driver_status: hdr.driver_status,
            info: hdr.info,
            sense: SenseData::parse(&sense[..written]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_ok_follows_info_mask() {
        let mut status = SgStatus::good();
        assert!(status.is_ok());

        status.info = 0x1;
        assert!(!status.is_ok());

        // Bits outside the mask do not matter.
        status.info = 0x6;
        assert!(status.is_ok());
    }

    #[test]
    fn header_points_at_buffers() {
        let mut cdb = [0xBBu8; 12];
        let mut sense = [0u8; 32];
        let hdr = SgIoHdr::no_data(&mut cdb, &mut sense, Duration::from_secs(5));
        assert_eq!(hdr.interface_id, 'S' as c_int);
        assert_eq!(hdr.dxfer_direction, SG_DXFER_NONE);
        assert_eq!(hdr.cmd_len, 12);
        assert_eq!(hdr.mx_sb_len, 32);
        assert_eq!(hdr.timeout, 5000);
        assert_eq!(hdr.cmdp, cdb.as_mut_ptr());
        assert_eq!(hdr.sbp, sense.as_mut_ptr());
    }
}
