//! Java language level model.
//!
//! Quick fixes that emit newer syntax consult this before offering a proposal, e.g. the
//! enhanced `for` statement requires Java 5.

use serde::{Deserialize, Serialize};

/// The effective Java feature release for a compilation unit (`4` for 1.4, `8`, `17`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JavaLanguageLevel {
    pub major: u16,
}

impl JavaLanguageLevel {
    pub const JAVA_1_4: Self = Self { major: 4 };
    pub const JAVA_5: Self = Self { major: 5 };
    pub const JAVA_8: Self = Self { major: 8 };
    pub const JAVA_17: Self = Self { major: 17 };

    pub const fn new(major: u16) -> Self {
        Self { major }
    }

    pub fn is_enabled(self, feature: JavaFeature) -> bool {
        self.major >= feature.stable_since()
    }

    #[inline]
    pub fn supports_enhanced_for(self) -> bool {
        self.is_enabled(JavaFeature::EnhancedFor)
    }

    #[inline]
    pub fn supports_generics(self) -> bool {
        self.is_enabled(JavaFeature::Generics)
    }
}

impl Default for JavaLanguageLevel {
    fn default() -> Self {
        JavaLanguageLevel::JAVA_17
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JavaFeature {
    Generics,    // Java 5+
    EnhancedFor, // Java 5+
}

impl JavaFeature {
    pub const fn display_name(self) -> &'static str {
        match self {
            JavaFeature::Generics => "generics",
            JavaFeature::EnhancedFor => "enhanced `for` statement",
        }
    }

    pub const fn stable_since(self) -> u16 {
        match self {
            JavaFeature::Generics | JavaFeature::EnhancedFor => 5,
        }
    }
}
