//! PDF permissions according to ISO 32000-1 Table 22

use bitflags::bitflags;

bitflags! {
    /// User access permissions from the `/P` entry
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Permissions: u32 {
        /// Print, possibly at low quality (bit 3)
        const LOW_QUALITY_PRINT = 0x0004;
        /// Modify contents (bit 4)
        const MODIFY_CONTENTS = 0x0008;
        /// Copy or extract text and graphics (bit 5)
        const EXTRACT_CONTENTS = 0x0010;
        /// Add or modify annotations, fill forms (bit 6)
        const ANNOTATION = 0x0020;
        /// Fill in interactive form fields (bit 9)
        const INTERACTIVE = 0x0100;
        /// Extract for accessibility (bit 10)
        const ACCESSIBILITY = 0x0200;
        /// Assemble the document (bit 11)
        const ASSEMBLE_DOC = 0x0400;
        /// Full quality print (bit 12 plus bit 3)
        const PRINT = 0x0804;
    }
}

impl Permissions {
    /// Bits that must be set in every `/P` value: 7-8 and 13-32
    pub const RESERVED_BITS: u32 = 0xFFFF_F0C0;

    /// Interpret the signed `/P` integer
    pub fn from_p_value(p: i32) -> Self {
        Self::from_bits_truncate(p as u32)
    }

    /// `/P` value with the reserved bits set
    pub fn to_p_value(self) -> i32 {
        (self.bits() | Self::RESERVED_BITS) as i32
    }

    pub fn can_print(&self) -> bool {
        self.contains(Self::LOW_QUALITY_PRINT)
    }

    pub fn can_print_high_quality(&self) -> bool {
        self.contains(Self::PRINT)
    }

    pub fn can_modify_contents(&self) -> bool {
        self.contains(Self::MODIFY_CONTENTS)
    }

    pub fn can_copy(&self) -> bool {
        self.contains(Self::EXTRACT_CONTENTS)
    }

    pub fn can_modify_annotations(&self) -> bool {
        self.contains(Self::ANNOTATION)
    }

    pub fn can_fill_forms(&self) -> bool {
        self.contains(Self::INTERACTIVE)
    }

    pub fn can_access_for_accessibility(&self) -> bool {
        self.contains(Self::ACCESSIBILITY)
    }

    pub fn can_assemble(&self) -> bool {
        self.contains(Self::ASSEMBLE_DOC)
    }

    /// Names of the granted permissions, for reports
    pub fn describe(&self) -> Vec<&'static str> {
        let mut granted = Vec::new();
        if self.can_print_high_quality() {
            granted.push("print");
        } else if self.can_print() {
            granted.push("low quality print");
        }
        if self.can_modify_contents() {
            granted.push("modify contents");
        }
        if self.can_copy() {
            granted.push("extract contents");
        }
        if self.can_modify_annotations() {
            granted.push("annotations");
        }
        if self.can_fill_forms() {
            granted.push("fill forms");
        }
        if self.can_access_for_accessibility() {
            granted.push("accessibility");
        }
        if self.can_assemble() {
            granted.push("assemble");
        }
        granted
    }
}
