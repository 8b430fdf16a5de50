use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;
use tee_swap_types::{instruction_discriminator, Phase};

/// Program instruction for one phase.
///
/// Account order follows the on-ledger program: the swap account always
/// comes first.
pub fn phase_instruction(
    phase: Phase,
    program_id: &Pubkey,
    swap: &Pubkey,
    payer: &Pubkey,
    validator: &Pubkey,
    amount_in: u64,
    minimum_amount_out: u64,
) -> Instruction {
    let mut data = instruction_discriminator(phase.instruction_name()).to_vec();

    let accounts = match phase {
        Phase::Init => {
            data.extend_from_slice(&amount_in.to_le_bytes());
            data.extend_from_slice(&minimum_amount_out.to_le_bytes());
            vec![
                AccountMeta::new(*swap, false),
                AccountMeta::new(*payer, true),
                AccountMeta::new_readonly(system_program::id(), false),
            ]
        }
        Phase::Delegate => vec![
            AccountMeta::new(*swap, false),
            AccountMeta::new_readonly(*validator, false),
            AccountMeta::new(*payer, true),
        ],
        Phase::Execute => vec![AccountMeta::new(*swap, false)],
        Phase::Finalize => vec![
            AccountMeta::new(*swap, false),
            AccountMeta::new(*payer, true),
        ],
    };

    Instruction {
        program_id: *program_id,
        accounts,
        data,
    }
}
