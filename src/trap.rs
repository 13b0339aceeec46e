//! The eight user-defined trap mnemonics, read from the `trap` file at
//! startup. Both tools consume the same table: the assembler for name lookup
//! and addressing-mode checks, the simulator for trace output.

use std::fs;
use std::io;
use std::path::Path;

use crate::mnemonic::{AddrMode, ModeSet};

pub const TRAP_SLOTS: usize = 8;
/// Slots below this index are unary no matter what the file says.
pub const UNARY_TRAPS: usize = 4;
const MNEMON_LENGTH: usize = 8;

#[derive(Clone, Debug, Default)]
pub struct TrapSlot {
    /// Uppercased mnemonic, at most 8 characters.
    pub name: String,
    pub modes: ModeSet,
}

#[derive(Clone, Debug)]
pub struct TrapTable {
    slots: [TrapSlot; TRAP_SLOTS],
}

impl TrapTable {
    pub fn load(path: &Path) -> io::Result<TrapTable> {
        Ok(TrapTable::parse(&fs::read_to_string(path)?))
    }

    /// One slot per line: mnemonic, then optional whitespace-separated mode
    /// letters from {I, D, N, X, S, SF, SX, SXF}, each counted once. Mode
    /// letters on the first four lines are ignored.
    pub fn parse(text: &str) -> TrapTable {
        let mut slots: [TrapSlot; TRAP_SLOTS] = Default::default();
        let mut lines = text.lines();
        for (index, slot) in slots.iter_mut().enumerate() {
            let line = lines.next().unwrap_or("");
            let mut words = line.split_whitespace();
            slot.name = words
                .next()
                .unwrap_or("")
                .chars()
                .take(MNEMON_LENGTH)
                .collect::<String>()
                .to_ascii_uppercase();
            if index < UNARY_TRAPS {
                continue;
            }
            for word in words {
                let mode = match word.to_ascii_uppercase().as_str() {
                    "I" => AddrMode::Immediate,
                    "D" => AddrMode::Direct,
                    "N" => AddrMode::Indirect,
                    "S" => AddrMode::StackRel,
                    "SF" => AddrMode::StackRelDef,
                    "X" => AddrMode::Indexed,
                    "SX" => AddrMode::StackIndexed,
                    "SXF" => AddrMode::StackIndexedDef,
                    _ => continue,
                };
                slot.modes.insert(mode);
            }
        }
        TrapTable { slots }
    }

    pub fn slot(&self, index: usize) -> &TrapSlot {
        &self.slots[index]
    }

    /// Slot index for an already-uppercased mnemonic.
    pub fn lookup(&self, upper: &str) -> Option<usize> {
        self.slots.iter().position(|s| !s.name.is_empty() && s.name == upper)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const DEFAULT: &str = "NOP0\nNOP1\nNOP2\nNOP3\nNOP I\nDECI D N S SF X SX SXF\nDECO I D N S SF X SX SXF\nSTRO D N SF X\n";

    #[test]
    fn names_uppercase_and_cap_at_eight() {
        let table = TrapTable::parse("verylongmnemonic\nb\nc\nd\ne\nf\ng\nh\n");
        assert_eq!(table.slot(0).name, "VERYLONG");
        assert_eq!(table.slot(1).name, "B");
        assert_eq!(table.lookup("VERYLONG"), Some(0));
    }

    #[test]
    fn unary_slots_ignore_modes() {
        let table = TrapTable::parse("NOP0 I D\nNOP1\nNOP2\nNOP3\nNOP I\nDECI D\nDECO I\nSTRO D\n");
        assert!(table.slot(0).modes.is_empty());
        assert!(table.slot(4).modes.contains(AddrMode::Immediate));
        assert!(!table.slot(4).modes.contains(AddrMode::Direct));
    }

    #[test]
    fn default_table_mode_sets() {
        let table = TrapTable::parse(DEFAULT);
        assert!(table.slot(5).modes.contains(AddrMode::StackIndexedDef));
        assert!(!table.slot(5).modes.contains(AddrMode::Immediate));
        assert!(table.slot(7).modes.contains(AddrMode::StackRelDef));
        assert!(!table.slot(7).modes.contains(AddrMode::StackRel));
        assert_eq!(table.lookup("STRO"), Some(7));
        assert_eq!(table.lookup("HALT"), None);
    }

    #[test]
    fn short_files_leave_slots_empty() {
        let table = TrapTable::parse("NOP0\n");
        assert_eq!(table.slot(7).name, "");
        assert_eq!(table.lookup(""), None);
    }
}
