//! Native `linux/cdrom.h` control requests on an optical block device.

use crate::error::InterfaceFailure;
use nix::libc::{O_NONBLOCK, c_int};
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;

pub const CDROM_SELECT_SPEED: u32 = 0x5322;
/// Not exported by every kernel header; this is the value drives answer to.
pub const CDROM_GET_SPEED: u32 = 0x5323;

mod ioctl_func {
    use super::{CDROM_GET_SPEED, CDROM_SELECT_SPEED};
    use nix::libc::c_int;

    nix::ioctl_write_int_bad!(cdrom_select_speed, CDROM_SELECT_SPEED);
    nix::ioctl_read_bad!(cdrom_get_speed, CDROM_GET_SPEED, c_int);
}

/// Open `path` read-only without waiting for media.
pub fn open_nonblocking(path: &str) -> std::io::Result<File> {
    OpenOptions::new()
        .read(true)
        .custom_flags(O_NONBLOCK)
        .open(path)
}

pub fn select_speed(path: &str, speed: u16) -> Result<(), InterfaceFailure> {
    let file = open_nonblocking(path).map_err(InterfaceFailure::Open)?;
    // SAFETY: the descriptor stays open for the duration of the call and
    // the request takes its argument by value.
    unsafe { ioctl_func::cdrom_select_speed(file.as_raw_fd(), c_int::from(speed)) }
        .map_err(InterfaceFailure::Rejected)?;
    Ok(())
}

pub fn get_speed(path: &str) -> Result<u32, InterfaceFailure> {
    let file = open_nonblocking(path).map_err(InterfaceFailure::Open)?;
    let mut speed: c_int = 0;
    // SAFETY: `speed` is a valid `int` the driver writes into.
    unsafe { ioctl_func::cdrom_get_speed(file.as_raw_fd(), &mut speed) }
        .map_err(InterfaceFailure::Rejected)?;
    Ok(speed.max(0) as u32)
}
