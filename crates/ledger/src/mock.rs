//! In-memory ledger for tests and offline runs

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::{Transaction, VersionedTransaction};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tee_swap_types::{instruction_discriminator, Phase};
use tokio::sync::Mutex;

use crate::client::{LedgerClient, LedgerError, SignatureState};

/// How the mock answers one `send_transaction` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendBehavior {
    Accept,
    Unavailable,
    Reject(String),
}

/// How the mock answers signature status polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusBehavior {
    /// Report pending for this many polls, then confirmed
    ConfirmAfter(u32),
    Never,
    Fail(String),
}

/// One `send_transaction` call as seen by a mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransaction {
    pub endpoint: String,
    pub phase: Option<Phase>,
    pub signature: Signature,
    pub accepted: bool,
}

/// Send log that several mocks can share to observe cross-endpoint ordering
pub type Journal = Arc<Mutex<Vec<SentTransaction>>>;

struct MockState {
    send_script: VecDeque<SendBehavior>,
    default_send: SendBehavior,
    status: StatusBehavior,
    blockhash_available: bool,
    polls: HashMap<Signature, u32>,
    owners: HashMap<Pubkey, Pubkey>,
    accounts: HashMap<Pubkey, Vec<u8>>,
    delegate_to: Option<Pubkey>,
    send_attempts: u32,
    owner_queries: u32,
}

impl MockState {
    /// Count the attempt and take the scripted answer
    fn next_send(&mut self) -> SendBehavior {
        self.send_attempts += 1;
        self.send_script
            .pop_front()
            .unwrap_or_else(|| self.default_send.clone())
    }
}

/// Mock ledger client for testing
pub struct MockLedgerClient {
    endpoint: String,
    journal: Journal,
    state: Mutex<MockState>,
}

impl MockLedgerClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            journal: Journal::default(),
            state: Mutex::new(MockState {
                send_script: VecDeque::new(),
                default_send: SendBehavior::Accept,
                status: StatusBehavior::ConfirmAfter(0),
                blockhash_available: true,
                polls: HashMap::new(),
                owners: HashMap::new(),
                accounts: HashMap::new(),
                delegate_to: None,
                send_attempts: 0,
                owner_queries: 0,
            }),
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    /// Answers consumed one per send before falling back to the default
    pub fn with_send_script(mut self, script: impl IntoIterator<Item = SendBehavior>) -> Self {
        self.state.get_mut().send_script = script.into_iter().collect();
        self
    }

    pub fn with_default_send(mut self, behavior: SendBehavior) -> Self {
        self.state.get_mut().default_send = behavior;
        self
    }

    pub fn with_status(mut self, behavior: StatusBehavior) -> Self {
        self.state.get_mut().status = behavior;
        self
    }

    /// Fail blockhash queries as if the endpoint were down
    pub fn without_blockhash(mut self) -> Self {
        self.state.get_mut().blockhash_available = false;
        self
    }

    pub fn with_account_owner(mut self, address: Pubkey, owner: Pubkey) -> Self {
        self.state.get_mut().owners.insert(address, owner);
        self
    }

    pub fn with_account_data(mut self, address: Pubkey, data: Vec<u8>) -> Self {
        self.state.get_mut().accounts.insert(address, data);
        self
    }

    /// Hand the swap account to `program` once a delegate transaction lands
    pub fn delegate_on_accept(mut self, program: Pubkey) -> Self {
        self.state.get_mut().delegate_to = Some(program);
        self
    }

    /// Number of sends, legacy or versioned, accepted or not
    pub async fn send_attempts(&self) -> u32 {
        self.state.lock().await.send_attempts
    }

    pub async fn owner_queries(&self) -> u32 {
        self.state.lock().await.owner_queries
    }

    /// Sends recorded against this endpoint
    pub async fn sent(&self) -> Vec<SentTransaction> {
        self.journal
            .lock()
            .await
            .iter()
            .filter(|entry| entry.endpoint == self.endpoint)
            .cloned()
            .collect()
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }
}

impl MockLedgerClient {
    /// Journal the send and turn the scripted answer into a result
    async fn settle_send(
        &self,
        phase: Option<Phase>,
        signature: Signature,
        behavior: SendBehavior,
    ) -> Result<Signature, LedgerError> {
        self.journal.lock().await.push(SentTransaction {
            endpoint: self.endpoint.clone(),
            phase,
            signature,
            accepted: behavior == SendBehavior::Accept,
        });

        match behavior {
            SendBehavior::Accept => Ok(signature),
            SendBehavior::Unavailable => Err(LedgerError::Unavailable(format!(
                "{} refused connection",
                self.endpoint
            ))),
            SendBehavior::Reject(reason) => Err(LedgerError::Rejected(reason)),
        }
    }
}

/// Phase encoded in the first instruction, plus the swap account it touches
fn inspect(tx: &Transaction) -> (Option<Phase>, Option<Pubkey>) {
    let Some(ix) = tx.message.instructions.first() else {
        return (None, None);
    };

    let phase = ix.data.get(..8).and_then(|selector| {
        Phase::ALL
            .into_iter()
            .find(|phase| selector == instruction_discriminator(phase.instruction_name()).as_slice())
    });
    let swap = ix
        .accounts
        .first()
        .and_then(|idx| tx.message.account_keys.get(*idx as usize))
        .copied();

    (phase, swap)
}

#[async_trait]
impl LedgerClient for MockLedgerClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn latest_blockhash(&self) -> Result<Hash, LedgerError> {
        if self.state.lock().await.blockhash_available {
            Ok(Hash::new_from_array([7u8; 32]))
        } else {
            Err(LedgerError::Unavailable(format!(
                "{} refused connection",
                self.endpoint
            )))
        }
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, LedgerError> {
        let signature = tx.signatures.first().copied().unwrap_or_default();
        let (phase, swap) = inspect(tx);

        let behavior = {
            let mut state = self.state.lock().await;
            let behavior = state.next_send();

            if behavior == SendBehavior::Accept {
                if let Some(swap) = swap {
                    match phase {
                        Some(Phase::Init) => {
                            let program = tx
                                .message
                                .instructions
                                .first()
                                .and_then(|ix| {
                                    tx.message.account_keys.get(ix.program_id_index as usize)
                                })
                                .copied();
                            if let Some(program) = program {
                                state.owners.insert(swap, program);
                            }
                        }
                        Some(Phase::Delegate) => {
                            if let Some(delegate_to) = state.delegate_to {
                                state.owners.insert(swap, delegate_to);
                            }
                        }
                        _ => {}
                    }
                }
            }
            behavior
        };

        self.settle_send(phase, signature, behavior).await
    }

    async fn send_versioned_transaction(
        &self,
        tx: &VersionedTransaction,
    ) -> Result<Signature, LedgerError> {
        let signature = tx.signatures.first().copied().unwrap_or_default();
        let behavior = self.state.lock().await.next_send();
        self.settle_send(None, signature, behavior).await
    }

    async fn signature_status(
        &self,
        signature: &Signature,
    ) -> Result<SignatureState, LedgerError> {
        let mut state = self.state.lock().await;
        let polls = {
            let count = state.polls.entry(*signature).or_insert(0);
            *count += 1;
            *count
        };

        Ok(match &state.status {
            StatusBehavior::ConfirmAfter(pending) if polls > *pending => SignatureState::Confirmed,
            StatusBehavior::ConfirmAfter(_) | StatusBehavior::Never => SignatureState::Pending,
            StatusBehavior::Fail(reason) => SignatureState::Failed(reason.clone()),
        })
    }

    async fn account_owner(&self, address: &Pubkey) -> Result<Option<Pubkey>, LedgerError> {
        let mut state = self.state.lock().await;
        state.owner_queries += 1;
        Ok(state.owners.get(address).copied())
    }

    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, LedgerError> {
        Ok(self.state.lock().await.accounts.get(address).cloned())
    }
}
