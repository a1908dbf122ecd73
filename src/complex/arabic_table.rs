use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

/// How a character connects to its neighbours.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum JoiningType {
    /// Does not join.
    U,
    /// Joins to the preceding character only. Unused by these scripts, but
    /// part of the state table.
    L,
    /// Joins to the preceding character.
    R,
    /// Joins on both sides.
    D,
    /// Syriac alaph.
    GroupAlaph,
    /// Syriac dalath and rish.
    GroupDalathRish,
    /// Transparent: marks and format controls.
    T,
}

impl JoiningType {
    /// The state table column. Transparent characters have none.
    pub fn column(self) -> Option<usize> {
        match self {
            JoiningType::U => Some(0),
            JoiningType::L => Some(1),
            JoiningType::R => Some(2),
            JoiningType::D => Some(3),
            JoiningType::GroupAlaph => Some(4),
            JoiningType::GroupDalathRish => Some(5),
            JoiningType::T => None,
        }
    }
}

pub fn joining_type(c: char) -> JoiningType {
    use JoiningType::*;

    match u32::from(c) {
        // Arabic
        0x0621 | 0x0674 => U,
        // ZWNJ breaks joining.
        0x200C => U,
        0x0622..=0x0625
        | 0x0627
        | 0x0629
        | 0x062F..=0x0632
        | 0x0648
        | 0x0671..=0x0673
        | 0x0675..=0x0677
        | 0x0688..=0x0699
        | 0x06C0
        | 0x06C3..=0x06CB
        | 0x06CD
        | 0x06CF
        | 0x06D2
        | 0x06D3
        | 0x06D5
        | 0x06EE
        | 0x06EF => R,
        0x0620
        | 0x0626
        | 0x0628
        | 0x062A..=0x062E
        | 0x0633..=0x063F
        | 0x0641..=0x0647
        | 0x0649
        | 0x064A
        | 0x066E
        | 0x066F
        | 0x0678..=0x0687
        | 0x069A..=0x06BF
        | 0x06C1
        | 0x06C2
        | 0x06CC
        | 0x06CE
        | 0x06D0
        | 0x06D1
        | 0x06FA..=0x06FC
        | 0x06FF => D,
        // Tatweel and ZWJ join causing.
        0x0640 | 0x200D => D,

        // Syriac
        0x0710 => GroupAlaph,
        0x0715 | 0x0716 | 0x072A | 0x072F => GroupDalathRish,
        0x0712..=0x0714
        | 0x071A..=0x071D
        | 0x071F..=0x0727
        | 0x0729
        | 0x072B
        | 0x072D
        | 0x072E
        | 0x074E
        | 0x074F => D,
        0x0717..=0x0719 | 0x071E | 0x0728 | 0x072C | 0x074D => R,

        // Arabic Supplement
        0x0750..=0x0758
        | 0x075C..=0x076A
        | 0x076D..=0x0770
        | 0x0772
        | 0x0775..=0x0777
        | 0x077A..=0x077F => D,
        0x0759..=0x075B | 0x076B | 0x076C | 0x0771 | 0x0773 | 0x0774 | 0x0778 | 0x0779 => R,

        // N'Ko
        0x07CA..=0x07EA => D,
        0x07FA => D,

        _ => match c.general_category() {
            GeneralCategory::NonspacingMark
            | GeneralCategory::EnclosingMark
            | GeneralCategory::Format => T,
            _ => U,
        },
    }
}
