//! MMC SET CD SPEED command block.
//!
//! ```text
//! byte  0      operation code (0xBB)
//! byte  1      reserved / rotational control, zero
//! bytes 2..=3  logical unit read speed, big-endian
//! bytes 4..=5  logical unit write speed, big-endian, zero lets the drive choose
//! bytes 6..=10 reserved, zero
//! byte  11     control
//! ```

/// Operation codes understood by the pass-through path.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCode {
    /// MMC-3 6.37
    SetCdSpeed = 0xBB,
}

pub const SET_CD_SPEED_LEN: usize = 12;

/// Write speed value that leaves the choice to the drive.
pub const WRITE_SPEED_DRIVE_CHOICE: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetCdSpeedCommand {
    pub operation_code: OpCode,
    pub rotation_control: u8,
    pub read_speed: u16,
    pub write_speed: u16,
    pub control: u8,
}

impl SetCdSpeedCommand {
    /// Request `read_speed` and let the drive pick the write speed.
    pub fn new(read_speed: u16) -> Self {
        Self {
            operation_code: OpCode::SetCdSpeed,
            rotation_control: 0,
            read_speed,
            write_speed: WRITE_SPEED_DRIVE_CHOICE,
            control: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; SET_CD_SPEED_LEN] {
        let mut cdb = [0u8; SET_CD_SPEED_LEN];
        cdb[0] = self.operation_code as u8;
        cdb[1] = self.rotation_control;
        cdb[2..4].copy_from_slice(&self.read_speed.to_be_bytes());
        cdb[4..6].copy_from_slice(&self.write_speed.to_be_bytes());
        // 6..=10 reserved
        cdb[11] = self.control;
        cdb
    }
}
