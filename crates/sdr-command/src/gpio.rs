//! GPIO attribute directives

/// A write of one GPIO bank attribute
///
/// `value` and `mask` travel as doubles on the wire; drivers take the
/// low 32 bits of their integer part.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GpioDirective {
    /// Bank name, e.g. `FP0`
    pub bank: String,
    /// Attribute name, e.g. `OUT` or `DDR`
    pub attr: String,
    /// Attribute value
    pub value: f64,
    /// Bits of `value` to write
    pub mask: f64,
    /// Target motherboard (default 0)
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub mboard: Option<usize>,
}

impl GpioDirective {
    /// Create a directive for motherboard 0
    pub fn new(bank: impl Into<String>, attr: impl Into<String>, value: f64, mask: f64) -> Self {
        Self {
            bank: bank.into(),
            attr: attr.into(),
            value,
            mask,
            mboard: None,
        }
    }

    /// Target a specific motherboard
    pub fn on_mboard(mut self, mboard: usize) -> Self {
        self.mboard = Some(mboard);
        self
    }

    /// Value as register bits
    pub fn value_bits(&self) -> u32 {
        low_bits(self.value)
    }

    /// Mask as register bits
    pub fn mask_bits(&self) -> u32 {
        low_bits(self.mask)
    }
}

fn low_bits(x: f64) -> u32 {
    // Truncate toward zero, then keep the low word (two's complement for negatives)
    (x as i64) as u32
}
