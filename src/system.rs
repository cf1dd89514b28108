/*!
The deterministic single-threaded stepping loop.

[`System`] composes [`Cpu`] and [`Bus`] the way the hardware reference's own
top-level facade composes its CPU and bus: one struct owning both, a
`step()` that advances every sub-component by a fixed, order-independent
amount of work, and host-facing helpers (`reset`, `vblank`, `set_cdrom`)
that a frontend calls between steps rather than reaching into the
components directly.
*/

use crate::bus::{Bus, BIOS_SIZE};
use crate::cdrom::ReadCallback;
use crate::cpu::Cpu;
use crate::error::{BiosImageError, KernelFault};
use log::debug;

const CAUSE: usize = 13;
const CAUSE_IP_BIT: u32 = 1 << 10;

#[derive(Debug)]
pub struct System {
    pub cpu: Cpu,
    pub bus: Bus,
}

impl System {
    /// Builds a kernel from a raw BIOS image. The image must be exactly
    /// [`BIOS_SIZE`] bytes; this constructor never partially initializes.
    pub fn create(bios: Vec<u8>) -> Result<Self, BiosImageError> {
        if bios.len() != BIOS_SIZE {
            return Err(BiosImageError::WrongSize { expected: BIOS_SIZE, actual: bios.len() });
        }
        let mut boxed = Box::new([0u8; BIOS_SIZE]);
        boxed.copy_from_slice(&bios);

        let mut system = Self { cpu: Cpu::new(), bus: Bus::new(boxed) };
        system.reset();
        Ok(system)
    }

    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
        debug!("system reset, pc={:#010x}", self.cpu.pc);
    }

    /// Advances the kernel by exactly one CPU instruction. The bus (and its
    /// owned CD-ROM drive and DMA engines) is stepped twice per CPU
    /// instruction, matching the bus's higher native clock rate relative to
    /// the CPU's fetch-execute cadence.
    pub fn step(&mut self) {
        self.bus.step();
        self.bus.step();

        let pending = self.bus.i_mask & self.bus.i_stat != 0;
        if pending {
            self.cpu.cop0[CAUSE] |= CAUSE_IP_BIT;
        } else {
            self.cpu.cop0[CAUSE] &= !CAUSE_IP_BIT;
        }

        self.cpu.step(&mut self.bus);
    }

    /// Sets the GPU's vblank interrupt line; a host calls this once per
    /// display refresh, outside the instruction-stepping loop.
    pub fn vblank(&mut self) {
        self.bus.i_stat |= 1;
    }

    /// Installs (or clears) the CD-ROM sector-read callback.
    pub fn set_cdrom_read_callback(&mut self, cb: Option<ReadCallback>) {
        self.bus.cdrom.set_read_callback(cb);
    }

    /// Drains the bus's ring of recent unknown-IO faults.
    pub fn drain_faults(&mut self) -> Vec<KernelFault> {
        self.bus.faults.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::bios_with_program;

    fn system_with(words: &[u32]) -> System {
        let bios = bios_with_program(words);
        System::create(bios.to_vec()).unwrap()
    }

    #[test]
    fn create_rejects_wrong_sized_bios() {
        let err = System::create(vec![0u8; 10]).unwrap_err();
        assert!(matches!(err, BiosImageError::WrongSize { expected: BIOS_SIZE, actual: 10 }));
    }

    #[test]
    fn reset_starts_execution_at_reset_vector() {
        let system = system_with(&[0]);
        assert_eq!(system.cpu.pc, crate::cpu::RESET_VECTOR);
    }

    #[test]
    fn lui_ori_sequence_runs_across_two_steps() {
        let lui = (0x0F << 26) | (9 << 16) | 0xDEAD;
        let ori = (0x0D << 26) | (9 << 21) | (9 << 16) | 0xBEEF;
        let mut system = system_with(&[lui, ori]);
        system.step();
        system.step();
        assert_eq!(system.cpu.gpr[9], 0xDEAD_BEEF);
    }

    #[test]
    fn jal_redirects_fetch_to_target_and_links_return_address() {
        let index = 0xBFC0_1000u32 >> 2;
        let jal = (0x03 << 26) | index;
        let mut system = system_with(&[jal]);
        system.step();
        assert_eq!(system.cpu.next_pc, 0xBFC0_1000);
        assert_eq!(system.cpu.gpr[31], 0xBFC0_0008);
    }

    #[test]
    fn pending_unmasked_interrupt_sets_cause_ip_bit() {
        let mut system = system_with(&[0]);
        system.bus.i_mask = 0x1;
        system.vblank();
        system.step();
        assert_ne!(system.cpu.cop0[CAUSE] & CAUSE_IP_BIT, 0);
    }

    #[test]
    fn masked_interrupt_does_not_set_cause_ip_bit() {
        let mut system = system_with(&[0]);
        system.bus.i_mask = 0;
        system.vblank();
        system.step();
        assert_eq!(system.cpu.cop0[CAUSE] & CAUSE_IP_BIT, 0);
    }

    #[test]
    fn unknown_bus_access_is_observable_via_drained_faults() {
        crate::test_support::init_logger();
        let mut system = system_with(&[0]);
        system.bus.read_byte(0x1F00_0000);
        let faults = system.drain_faults();
        assert_eq!(faults.len(), 1);
        assert!(system.bus.faults.is_empty());
    }

    #[test]
    fn unaligned_load_reconstructs_word_via_lwl_lwr() {
        // LWL $8, 3($0) ; LWR $8, 0($0) — load word at 0 in two pieces.
        let lwl = (0x22 << 26) | (0 << 21) | (8 << 16) | 3;
        let lwr = (0x26 << 26) | (0 << 21) | (8 << 16) | 0;
        let mut system = system_with(&[lwl, lwr]);
        system.bus.write_word(0, 0x1122_3344);
        system.step();
        system.step();
        assert_eq!(system.cpu.gpr[8], 0x1122_3344);
    }
}
