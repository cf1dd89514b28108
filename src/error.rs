/*!
Ambient error types.

Nothing in the stepping loop is recovered by retry (see the kernel's
propagation policy): these types exist so a host can *observe* a fault
after the fact, not so the interpreter can bail out of a step early.
`step()` itself stays infallible; faults are recorded onto kernel state
(`System::last_faults`) for the host to drain.
*/

use thiserror::Error;

/// Returned by the BIOS-loading constructor when the supplied image is the
/// wrong size. The kernel never partially initializes: either the image is
/// exactly [`crate::bus::BIOS_SIZE`] bytes, or construction fails outright.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BiosImageError {
    #[error("BIOS image must be exactly {expected} bytes, got {actual}")]
    WrongSize { expected: usize, actual: usize },
}

/// A recoverable fault recorded during kernel operation. None of these stop
/// the kernel from advancing; they exist purely for host-side diagnostics.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum KernelFault {
    #[error("unmapped bus address accessed: {address:#010x} ({access})")]
    UnknownBusAddress { address: u32, access: AccessKind },

    #[error("unrecognized DMA chcr {chcr:#010x} on channel {channel}")]
    UnknownDmaMode { channel: u8, chcr: u32 },

    #[error("unknown CD-ROM command byte {command:#04x}")]
    UnknownCdRomCommand { command: u8 },

    #[error("unknown CD-ROM indexed register access: index={index} offset={offset}")]
    UnknownCdRomRegister { index: u8, offset: u8 },

    #[error("BIOS reached an unresolvable exception handler at pc={pc:#010x}")]
    UnresolvableException { pc: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
}

impl std::fmt::Display for AccessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessKind::Read => write!(f, "read"),
            AccessKind::Write => write!(f, "write"),
        }
    }
}
