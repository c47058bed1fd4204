/// Splits a packed integer into consecutive fields, lowest bits first.
///
/// `0b11111_000000_00001u16.bit_split((5, 6, 5))` yields `(1, 0, 31)`.
pub trait BitField<W> {
    type Output;

    fn bit_split(self, widths: W) -> Self::Output;
}

fn field<T: Into<u64>>(v: T, shift: u32, width: u32) -> u64 {
    let v: u64 = v.into();
    if width >= 64 {
        v >> shift
    } else {
        (v >> shift) & ((1u64 << width) - 1)
    }
}

macro_rules! impl_bitfield {
    ($t:ty) => {
        impl BitField<(u32, u32)> for $t {
            type Output = ($t, $t);

            fn bit_split(self, (a, b): (u32, u32)) -> Self::Output {
                (
                    field(self, 0, a) as $t,
                    field(self, a, b) as $t,
                )
            }
        }

        impl BitField<(u32, u32, u32)> for $t {
            type Output = ($t, $t, $t);

            fn bit_split(self, (a, b, c): (u32, u32, u32)) -> Self::Output {
                (
                    field(self, 0, a) as $t,
                    field(self, a, b) as $t,
                    field(self, a + b, c) as $t,
                )
            }
        }

        impl BitField<(u32, u32, u32, u32)> for $t {
            type Output = ($t, $t, $t, $t);

            fn bit_split(self, (a, b, c, d): (u32, u32, u32, u32)) -> Self::Output {
                (
                    field(self, 0, a) as $t,
                    field(self, a, b) as $t,
                    field(self, a + b, c) as $t,
                    field(self, a + b + c, d) as $t,
                )
            }
        }
    };
}

impl_bitfield!(u8);
impl_bitfield!(u16);
impl_bitfield!(u32);
