//! Build instructions for the address lookup table program.
//! The instruction builder is useful if wanting to combine instructions,
//! otherwise use [crate::writer::LookupTableWriter].

use solana_address_lookup_table_program::instruction as alt_instruction;
use solana_sdk::{clock::Slot, instruction::Instruction, pubkey::Pubkey};

/// An instruction builder for lookup tables owned by one authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionBuilder {
    /// The authority that owns the lookup table
    pub authority: Pubkey,
    /// The payer of transaction costs and rent
    pub payer: Pubkey,
}

impl InstructionBuilder {
    /// Creates a new instruction builder
    pub fn new(authority: Pubkey, payer: Pubkey) -> Self {
        Self { authority, payer }
    }

    /// Instruction to create a lookup table.
    ///
    /// Returns the address of the lookup table with the instruction to create it.
    pub fn create_lookup_table(&self, recent_slot: Slot) -> (Instruction, Pubkey) {
        alt_instruction::create_lookup_table(self.authority, self.payer, recent_slot)
    }

    /// Creates an instruction to append addresses to a lookup table.
    ///
    /// The addresses are appended exactly as given; duplicate handling is the
    /// caller's decision.
    pub fn extend_lookup_table(&self, lookup_table: Pubkey, addresses: &[Pubkey]) -> Instruction {
        alt_instruction::extend_lookup_table(
            lookup_table,
            self.authority,
            Some(self.payer),
            addresses.to_vec(),
        )
    }

    /// The address a table created at `recent_slot` will have.
    pub fn lookup_table_address(&self, recent_slot: Slot) -> Pubkey {
        crate::derive_lookup_table_address(&self.authority, recent_slot)
    }
}
