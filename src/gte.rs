/*!
COP2 / GTE: the fixed-point perspective and lighting coprocessor.

The register file and limiter set follow the hardware reference's shape
(see the crate-level data model notes): a 3x3 rotation matrix, a 3x3 light
matrix, a 3x3 light-color matrix, translation/background/far-color vectors,
three working vertices, three-deep screen/Z/color history, and a sticky
`flag` word recording which limiter clamped during the last operation.

Every register write that can exceed its defined range is routed through a
`lim_*` helper so the sticky bit bookkeeping cannot be bypassed by a new
call site forgetting to set it.
*/

/// 257-byte Newton-Raphson reciprocal seed table for the perspective divide.
#[rustfmt::skip]
pub const UNR_TABLE: [u8; 257] = [
    0xFF, 0xFD, 0xFB, 0xF9, 0xF7, 0xF5, 0xF3, 0xF1, 0xEF, 0xEE, 0xEC, 0xEA, 0xE8, 0xE6, 0xE4, 0xE3,
    0xE1, 0xDF, 0xDD, 0xDC, 0xDA, 0xD8, 0xD6, 0xD5, 0xD3, 0xD1, 0xD0, 0xCE, 0xCD, 0xCB, 0xC9, 0xC8,
    0xC6, 0xC5, 0xC3, 0xC1, 0xC0, 0xBE, 0xBD, 0xBB, 0xBA, 0xB8, 0xB7, 0xB5, 0xB4, 0xB2, 0xB1, 0xB0,
    0xAE, 0xAD, 0xAB, 0xAA, 0xA9, 0xA7, 0xA6, 0xA4, 0xA3, 0xA2, 0xA0, 0x9F, 0x9E, 0x9C, 0x9B, 0x9A,
    0x99, 0x97, 0x96, 0x95, 0x94, 0x92, 0x91, 0x90, 0x8F, 0x8D, 0x8C, 0x8B, 0x8A, 0x89, 0x87, 0x86,
    0x85, 0x84, 0x83, 0x82, 0x81, 0x7F, 0x7E, 0x7D, 0x7C, 0x7B, 0x7A, 0x79, 0x78, 0x77, 0x75, 0x74,
    0x73, 0x72, 0x71, 0x70, 0x6F, 0x6E, 0x6D, 0x6C, 0x6B, 0x6A, 0x69, 0x68, 0x67, 0x66, 0x65, 0x64,
    0x63, 0x62, 0x61, 0x60, 0x5F, 0x5E, 0x5D, 0x5D, 0x5C, 0x5B, 0x5A, 0x59, 0x58, 0x57, 0x56, 0x55,
    0x54, 0x53, 0x53, 0x52, 0x51, 0x50, 0x4F, 0x4E, 0x4D, 0x4D, 0x4C, 0x4B, 0x4A, 0x49, 0x48, 0x48,
    0x47, 0x46, 0x45, 0x44, 0x43, 0x43, 0x42, 0x41, 0x40, 0x3F, 0x3F, 0x3E, 0x3D, 0x3C, 0x3C, 0x3B,
    0x3A, 0x39, 0x39, 0x38, 0x37, 0x36, 0x36, 0x35, 0x34, 0x33, 0x33, 0x32, 0x31, 0x31, 0x30, 0x2F,
    0x2E, 0x2E, 0x2D, 0x2C, 0x2C, 0x2B, 0x2A, 0x2A, 0x29, 0x28, 0x28, 0x27, 0x26, 0x26, 0x25, 0x24,
    0x24, 0x23, 0x22, 0x22, 0x21, 0x20, 0x20, 0x1F, 0x1E, 0x1E, 0x1D, 0x1D, 0x1C, 0x1B, 0x1B, 0x1A,
    0x19, 0x19, 0x18, 0x18, 0x17, 0x16, 0x16, 0x15, 0x15, 0x14, 0x14, 0x13, 0x12, 0x12, 0x11, 0x11,
    0x10, 0x0F, 0x0F, 0x0E, 0x0E, 0x0D, 0x0D, 0x0C, 0x0C, 0x0B, 0x0A, 0x0A, 0x09, 0x09, 0x08, 0x08,
    0x07, 0x07, 0x06, 0x06, 0x05, 0x05, 0x04, 0x04, 0x03, 0x03, 0x02, 0x02, 0x01, 0x01, 0x00, 0x00,
    0x00,
];

/// FLAG sticky-bit assignments (fixed by hardware, 0-indexed from LSB).
pub mod flag_bits {
    pub const LIM_A1: u32 = 24;
    pub const LIM_A2: u32 = 23;
    pub const LIM_A3: u32 = 22;
    pub const LIM_B1: u32 = 21;
    pub const LIM_B2: u32 = 20;
    pub const LIM_B3: u32 = 19;
    pub const LIM_C: u32 = 18;
    pub const LIM_D1: u32 = 14;
    pub const LIM_D2: u32 = 13;
    pub const LIM_E: u32 = 12;
}

#[derive(Clone, Copy, Default, Debug)]
pub struct Vertex {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

#[derive(Clone, Copy, Default, Debug)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub code: u8,
}

#[derive(Clone, Debug)]
pub struct Gte {
    /// Rotation matrix, row-major R[row][col], Q12 fixed point.
    pub rot: [[i16; 3]; 3],
    /// Light matrix.
    pub light: [[i16; 3]; 3],
    /// Light-color matrix.
    pub light_color: [[i16; 3]; 3],
    pub tr: [i32; 3],
    pub back_color: [i32; 3],
    pub far_color: [i32; 3],

    pub v: [Vertex; 3],

    pub sxy: [(i16, i16); 3],
    pub sz: [u16; 4],
    pub rgb_hist: [Rgb; 3],

    pub ofx: i32,
    pub ofy: i32,
    pub h: u16,
    pub dqa: i16,
    pub dqb: i32,
    pub zsf3: i16,
    pub zsf4: i16,
    pub otz: u16,

    pub ir: [i16; 4],
    pub mac: [i32; 4],
    pub flag: u32,
}

impl Gte {
    pub fn new() -> Self {
        Self {
            rot: [[0; 3]; 3],
            light: [[0; 3]; 3],
            light_color: [[0; 3]; 3],
            tr: [0; 3],
            back_color: [0; 3],
            far_color: [0; 3],
            v: [Vertex::default(); 3],
            sxy: [(0, 0); 3],
            sz: [0; 4],
            rgb_hist: [Rgb::default(); 3],
            ofx: 0,
            ofy: 0,
            h: 0,
            dqa: 0,
            dqb: 0,
            zsf3: 0,
            zsf4: 0,
            otz: 0,
            ir: [0; 4],
            mac: [0; 4],
            flag: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn lim_a(&mut self, idx: usize, value: i64, unsigned: bool) -> i16 {
        let (lo, hi, bit) = match idx {
            0 => (if unsigned { 0 } else { -0x8000 }, 0x7FFF, flag_bits::LIM_A1),
            1 => (if unsigned { 0 } else { -0x8000 }, 0x7FFF, flag_bits::LIM_A2),
            _ => (if unsigned { 0 } else { -0x8000 }, 0x7FFF, flag_bits::LIM_A3),
        };
        if value < lo as i64 {
            self.flag |= 1 << bit;
            lo as i16
        } else if value > hi as i64 {
            self.flag |= 1 << bit;
            hi as i16
        } else {
            value as i16
        }
    }

    fn lim_b(&mut self, idx: usize, value: i64) -> i32 {
        let bit = match idx {
            0 => flag_bits::LIM_B1,
            1 => flag_bits::LIM_B2,
            _ => flag_bits::LIM_B3,
        };
        if value < i32::MIN as i64 {
            self.flag |= 1 << bit;
            i32::MIN
        } else if value > i32::MAX as i64 {
            self.flag |= 1 << bit;
            i32::MAX
        } else {
            value as i32
        }
    }

    fn lim_c(&mut self, value: i64) -> u16 {
        if value < 0 {
            self.flag |= 1 << flag_bits::LIM_C;
            0
        } else if value > 0xFFFF {
            self.flag |= 1 << flag_bits::LIM_C;
            0xFFFF
        } else {
            value as u16
        }
    }

    fn lim_d1(&mut self, value: i64) -> i16 {
        const LO: i64 = -0x400;
        const HI: i64 = 0x3FF;
        if value < LO {
            self.flag |= 1 << flag_bits::LIM_D1;
            LO as i16
        } else if value > HI {
            self.flag |= 1 << flag_bits::LIM_D1;
            HI as i16
        } else {
            value as i16
        }
    }

    fn lim_d2(&mut self, value: i64) -> i16 {
        const LO: i64 = -0x400;
        const HI: i64 = 0x3FF;
        if value < LO {
            self.flag |= 1 << flag_bits::LIM_D2;
            LO as i16
        } else if value > HI {
            self.flag |= 1 << flag_bits::LIM_D2;
            HI as i16
        } else {
            value as i16
        }
    }

    fn lim_e(&mut self, value: i64) -> i16 {
        if value < 0 {
            self.flag |= 1 << flag_bits::LIM_E;
            0
        } else if value > 0x1000 {
            self.flag |= 1 << flag_bits::LIM_E;
            0x1000
        } else {
            value as i16
        }
    }

    /// Newton-Raphson reciprocal divide used by `rtp`'s perspective step.
    /// Returns a value clamped to `0x1FFFF`.
    pub fn unr_divide(h: u16, sz3: u16) -> u32 {
        if sz3 == 0 || (h as u32) >= 2 * (sz3 as u32) {
            return 0x1FFFF;
        }
        // `leading_zeros` on a u16 already counts within the 16-bit width,
        // unlike C's 32-bit `clz` (which needs a `- 16` correction).
        let shift = sz3.leading_zeros();
        let lhs = (h as u32) << shift;
        let rhs = (sz3 as u32) << shift;
        let index = (((rhs - 0x7FC0) >> 7) as usize).min(0x100);
        let factor = UNR_TABLE[index] as u32 + 0x101;
        let tmp = (0x2000000u32.wrapping_sub(factor.wrapping_mul(rhs))) >> 8;
        let recip = (factor.wrapping_mul(tmp) + 0x8000) >> 8;
        let result = (((lhs as u64) * recip as u64) + 0x8000) >> 16;
        (result as u32).min(0x1FFFF)
    }

    /// Per-vertex perspective transform. `last` selects whether IR1..3/MAC1..3
    /// are updated from the raw (pre-clamp) rotation output, per spec step 6.
    pub fn rtp(&mut self, vertex: Vertex, last: bool) {
        let x = vertex.x as i64;
        let y = vertex.y as i64;
        let z = vertex.z as i64;

        let ssx = self.rot[0][0] as i64 * x
            + self.rot[0][1] as i64 * y
            + self.rot[0][2] as i64 * z
            + self.tr[0] as i64;
        let ssy = self.rot[1][0] as i64 * x
            + self.rot[1][1] as i64 * y
            + self.rot[1][2] as i64 * z
            + self.tr[1] as i64;
        let ssz = self.rot[2][0] as i64 * x
            + self.rot[2][1] as i64 * y
            + self.rot[2][2] as i64 * z
            + self.tr[2] as i64;

        self.sz[0] = self.sz[1];
        self.sz[1] = self.sz[2];
        self.sz[2] = self.sz[3];
        self.sz[3] = self.lim_c(ssz);

        let q = Self::unr_divide(self.h, self.sz[3]);

        let sx = self.ofx as i64 + self.ir[1] as i64 * q as i64;
        let sy = self.ofy as i64 + self.ir[2] as i64 * q as i64;
        let p = self.dqb as i64 + self.dqa as i64 * q as i64;

        self.ir[0] = self.lim_e(p);
        self.sxy[0] = self.sxy[1];
        self.sxy[1] = self.sxy[2];
        self.sxy[2] = (self.lim_d1(sx), self.lim_d2(sy));

        if last {
            self.ir[1] = self.lim_a(0, ssx, false);
            self.ir[2] = self.lim_a(1, ssy, false);
            self.ir[3] = self.lim_a(2, ssz, false);
            self.mac[1] = self.lim_b(0, ssx);
            self.mac[2] = self.lim_b(1, ssy);
            self.mac[3] = self.lim_b(2, ssz);
        }
    }

    /// Applies `rtp` to the three working vertices in order.
    pub fn rtpt(&mut self) {
        let verts = self.v;
        self.rtp(verts[0], false);
        self.rtp(verts[1], false);
        self.rtp(verts[2], true);
    }

    pub fn nclip(&mut self) {
        let (x0, y0) = (self.sxy[0].0 as i64, self.sxy[0].1 as i64);
        let (x1, y1) = (self.sxy[1].0 as i64, self.sxy[1].1 as i64);
        let (x2, y2) = (self.sxy[2].0 as i64, self.sxy[2].1 as i64);
        let value = (x0 * y1 + x1 * y2 + x2 * y0) - (x0 * y2 + x1 * y0 + x2 * y1);
        self.mac[0] = self.lim_b(0, value);
    }

    pub fn avsz3(&mut self) {
        let sum = self.sz[1] as i64 + self.sz[2] as i64 + self.sz[3] as i64;
        let value = self.zsf3 as i64 * sum;
        self.mac[0] = self.lim_b(0, value);
        self.otz = self.lim_c(value);
    }

    /// Per-vertex directional-lighting color. `vertex_index` selects which
    /// of the three vertices/history slots is written.
    pub fn ncds(&mut self, vertex_index: usize) {
        let v = self.v[vertex_index];
        let (x, y, z) = (v.x as i64, v.y as i64, v.z as i64);

        let llm = [
            self.light[0][0] as i64 * x + self.light[0][1] as i64 * y + self.light[0][2] as i64 * z,
            self.light[1][0] as i64 * x + self.light[1][1] as i64 * y + self.light[1][2] as i64 * z,
            self.light[2][0] as i64 * x + self.light[2][1] as i64 * y + self.light[2][2] as i64 * z,
        ];
        let llm = [
            self.lim_a(0, llm[0], true) as i64,
            self.lim_a(1, llm[1], true) as i64,
            self.lim_a(2, llm[2], true) as i64,
        ];

        let col = [
            self.light_color[0][0] as i64 * llm[0]
                + self.light_color[0][1] as i64 * llm[1]
                + self.light_color[0][2] as i64 * llm[2]
                + self.back_color[0] as i64,
            self.light_color[1][0] as i64 * llm[0]
                + self.light_color[1][1] as i64 * llm[1]
                + self.light_color[1][2] as i64 * llm[2]
                + self.back_color[1] as i64,
            self.light_color[2][0] as i64 * llm[0]
                + self.light_color[2][1] as i64 * llm[1]
                + self.light_color[2][2] as i64 * llm[2]
                + self.back_color[2] as i64,
        ];
        let col = [
            self.lim_a(0, col[0], true) as i64 * self.rgb_hist[2].r as i64,
            self.lim_a(1, col[1], true) as i64 * self.rgb_hist[2].g as i64,
            self.lim_a(2, col[2], true) as i64 * self.rgb_hist[2].b as i64,
        ];

        let delta = [
            self.far_color[0] as i64 - col[0],
            self.far_color[1] as i64 - col[1],
            self.far_color[2] as i64 - col[2],
        ];
        let delta = [
            self.lim_a(0, delta[0], false) as i64,
            self.lim_a(1, delta[1], false) as i64,
            self.lim_a(2, delta[2], false) as i64,
        ];
        let final_col = [
            col[0] + self.ir[0] as i64 * delta[0],
            col[1] + self.ir[0] as i64 * delta[1],
            col[2] + self.ir[0] as i64 * delta[2],
        ];

        self.rgb_hist[0] = self.rgb_hist[1];
        self.rgb_hist[1] = self.rgb_hist[2];
        self.rgb_hist[2] = Rgb {
            r: self.lim_a(0, final_col[0], true).clamp(0, 255) as u8,
            g: self.lim_a(1, final_col[1], true).clamp(0, 255) as u8,
            b: self.lim_a(2, final_col[2], true).clamp(0, 255) as u8,
            code: 0,
        };
    }
}

impl Default for Gte {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_zeroes_registers_and_flag() {
        let mut gte = Gte::new();
        gte.flag = 0xFFFF_FFFF;
        gte.mac[0] = 42;
        gte.reset();
        assert_eq!(gte.flag, 0);
        assert_eq!(gte.mac[0], 0);
    }

    #[test]
    fn lim_c_clamps_and_sets_flag() {
        let mut gte = Gte::new();
        let clamped = gte.lim_c(-5);
        assert_eq!(clamped, 0);
        assert_ne!(gte.flag & (1 << flag_bits::LIM_C), 0);
    }

    #[test]
    fn lim_c_in_range_does_not_set_flag() {
        let mut gte = Gte::new();
        let v = gte.lim_c(1234);
        assert_eq!(v, 1234);
        assert_eq!(gte.flag, 0);
    }

    #[test]
    fn unr_divide_saturates_when_h_at_least_twice_sz3() {
        assert_eq!(Gte::unr_divide(300, 100), 0x1FFFF);
    }

    #[test]
    fn unr_divide_small_h_yields_small_quotient() {
        // H much smaller than SZ3 takes the UNR computation path and yields
        // a quotient far below the saturation ceiling.
        let q = Gte::unr_divide(0, 100);
        assert!(q < 0x1FFFF);
    }

    #[test]
    fn unr_divide_zero_sz3_saturates() {
        assert_eq!(Gte::unr_divide(1000, 0), 0x1FFFF);
    }

    #[test]
    fn nclip_computes_signed_cross_product_sum() {
        let mut gte = Gte::new();
        gte.sxy = [(0, 0), (10, 0), (0, 10)];
        gte.nclip();
        // (0*0 + 10*10 + 0*0) - (0*10 + 10*0 + 0*0) = 100
        assert_eq!(gte.mac[0], 100);
    }

    #[test]
    fn avsz3_averages_z_history_with_scale_factor() {
        let mut gte = Gte::new();
        gte.sz = [0, 10, 20, 30];
        gte.zsf3 = 1;
        gte.avsz3();
        assert_eq!(gte.mac[0], 60);
        assert_eq!(gte.otz, 60);
    }

    #[test]
    fn rtpt_updates_ir_and_mac_only_on_last_vertex() {
        let mut gte = Gte::new();
        gte.rot[0][0] = 1 << 12; // identity-ish so z contributes directly
        gte.v[0] = Vertex { x: 1, y: 0, z: 0 };
        gte.v[1] = Vertex { x: 2, y: 0, z: 0 };
        gte.v[2] = Vertex { x: 3, y: 0, z: 0 };
        gte.rtpt();
        // Only the third call (last=true) should populate MAC1 from ssx.
        assert_eq!(i64::from(gte.mac[1]), (1i64 << 12) * 3);
    }
}
