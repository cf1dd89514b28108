#![doc = r#"
Core emulation kernel crate.

This crate exposes the emulator core modules for use by binaries and tests.

Modules:
- cpu: MIPS R3000-class CPU core with COP0 system control and COP2/GTE dispatch
- gte: COP2 geometry-transform coprocessor (fixed-point 3D math)
- bus: system bus, address decode, DMA engines, interrupt aggregation
- cdrom: CD-ROM drive state machine with chained interrupt delivery
- gpu: VRAM/GP0/GP1 passthrough stub (rasterization is out of scope)
- fifo: fixed-capacity ring-buffer FIFO used by the CD-ROM and GTE ports
- error: fault and image-loading error types
- system: the deterministic single-threaded stepping loop

In tests, a synthetic BIOS builder is available under `crate::test_support`.
"#]

/// Per-instruction / per-IO tracing, compiled out entirely unless the
/// `trace` feature is enabled so the hot loop pays nothing for it by
/// default.
#[macro_export]
macro_rules! trace_io {
    ($($arg:tt)*) => {
        #[cfg(feature = "trace")]
        ::log::trace!($($arg)*);
    };
}

pub mod bus;
pub mod cdrom;
pub mod cpu;
pub mod error;
pub mod fifo;
pub mod gpu;
pub mod gte;
pub mod system;

#[cfg(test)]
pub mod test_support;

pub use bus::Bus;
pub use cpu::Cpu;
pub use error::{AccessKind, BiosImageError, KernelFault};
pub use system::System;
