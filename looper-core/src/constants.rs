/// Number of independently recordable sample slots.
pub const SLOT_COUNT: usize = 4;

/// Byte span of one external SRAM device (23LC512: 64 KiB).
pub const DEVICE_SPAN: i32 = 65_536;

/// Highest byte offset of a device; origin of the descending slots.
pub const DEVICE_TOP: i32 = DEVICE_SPAN - 1;

/// Address units consumed by one packed transaction (two 12-bit samples).
pub const PACKED_STRIDE: i32 = 3;

/// Largest 12-bit converter code.
pub const SAMPLE_MAX: u16 = 0x0FFF;

/// 12-bit midscale, the DC offset of the unsigned converter codes.
pub const MIDSCALE: u16 = 2048;

/// Signed 12-bit range used for mixing.
pub const MIX_MIN: i32 = -2048;
pub const MIX_MAX: i32 = 2047;

/// Full converter resolution in bits.
pub const FULL_RESOLUTION: u8 = 12;

/// Nominal sample rate in Hz. Slots restored from persistence assume it.
pub const NOMINAL_SAMPLE_RATE: u32 = 16_000;

/// Sample rate range accepted by the sample clock.
pub const MIN_SAMPLE_RATE: u32 = 2_000;
pub const MAX_SAMPLE_RATE: u32 = 32_000;

/// Bytes of non-volatile storage per persisted slot boundary (24-bit).
pub const BOUNDARY_BYTES: u16 = 3;

/// Value of an erased boundary record.
pub const ERASED_BOUNDARY: u32 = 0x00FF_FFFF;
