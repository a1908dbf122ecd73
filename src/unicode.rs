use unicode_properties::{GeneralCategory, UnicodeGeneralCategory};

use crate::Script;

pub(crate) trait CharExt {
    fn script(self) -> Script;
    fn is_unicode_mark(self) -> bool;
    fn combining_class(self) -> u8;
}

impl CharExt for char {
    #[inline]
    fn script(self) -> Script {
        Script::from(self)
    }

    fn is_unicode_mark(self) -> bool {
        matches!(
            self.general_category(),
            GeneralCategory::NonspacingMark
                | GeneralCategory::SpacingMark
                | GeneralCategory::EnclosingMark
        )
    }

    #[inline]
    fn combining_class(self) -> u8 {
        unicode_ccc::get_canonical_combining_class(self) as u8
    }
}
