//! Generator status-flag bits.
//!
//! NanoAOD encodes each generator particle's role as a bitmask. Only the
//! bits the selection modules test are named here; the rest of the mask is
//! carried through untouched.

/// Particle is prompt (bit 0).
pub const IS_PROMPT: u32 = 1 << 0;

/// Particle comes from the hard process (bit 8).
pub const FROM_HARD_PROCESS: u32 = 1 << 8;

/// Particle is the last copy before final-state radiation (bit 14).
pub const IS_LAST_COPY_BEFORE_FSR: u32 = 1 << 14;
