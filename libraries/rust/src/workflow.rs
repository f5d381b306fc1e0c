//! The duplicate-aware extension workflow.
//!
//! ```text
//! Idle -> Analyzing -> Submitting -> Done | Failed
//!             |            ^
//!             v            | proceed (unique addresses only)
//!       NeedsConfirmation -+
//!             | cancel
//!             v
//!           Idle
//! ```
//!
//! Invalid input or a disconnected wallet moves straight to `Failed` without
//! any network call. While `Analyzing` or `Submitting`, further triggers are
//! ignored, so at most one extension is in flight.

use std::{
    ops::Deref,
    sync::{Arc, Mutex},
};

use solana_sdk::{pubkey::Pubkey, signature::Signature};

use crate::{
    address::{parse_address_list, parse_table_address},
    analyzer::{analyze, DuplicateAnalysis, DuplicatePreview},
    common::ChainClient,
    error::{ErrorKind, LutManagerError, LutManagerResult, ValidationError, WalletError},
    reader::{FetchOutcome, SnapshotFetcher},
    wallet::Wallet,
    writer::LookupTableWriter,
    LookupTableSnapshot, LOOKUP_TABLE_MAX_ADDRESSES,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtendOptions {
    /// Drop repeated candidates from the submitted list, keeping the first
    /// occurrence. Off by default: repeats are submitted as entered.
    pub dedup_candidates: bool,
}

/// The raw user input behind an extension, kept so a failed attempt can be
/// retried without retyping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendRequest {
    pub table_input: String,
    pub input: String,
}

impl ExtendRequest {
    pub fn new(table_input: &str, input: &str) -> Self {
        Self {
            table_input: table_input.to_string(),
            input: input.to_string(),
        }
    }
}

/// An analysis waiting for the user to cancel or proceed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExtension {
    pub table: Pubkey,
    pub request: ExtendRequest,
    pub analysis: DuplicateAnalysis,
    /// Addresses in the table when it was analyzed
    pub table_len: usize,
}

impl PendingExtension {
    pub fn can_proceed(&self) -> bool {
        self.analysis.can_proceed()
    }

    pub fn preview(&self) -> DuplicatePreview {
        self.analysis.preview()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendReceipt {
    pub table: Pubkey,
    pub signature: Signature,
    pub added: Vec<Pubkey>,
    /// The table as re-read after the extension, if that read succeeded
    pub snapshot: Option<LookupTableSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendFailure {
    pub kind: ErrorKind,
    pub message: String,
    pub request: ExtendRequest,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExtendState {
    #[default]
    Idle,
    Analyzing {
        table: Pubkey,
    },
    NeedsConfirmation(PendingExtension),
    Submitting {
        table: Pubkey,
        addresses: usize,
    },
    Done(ExtendReceipt),
    Failed(ExtendFailure),
}

impl ExtendState {
    pub fn name(&self) -> &'static str {
        match self {
            ExtendState::Idle => "idle",
            ExtendState::Analyzing { .. } => "analyzing",
            ExtendState::NeedsConfirmation(_) => "needs_confirmation",
            ExtendState::Submitting { .. } => "submitting",
            ExtendState::Done(_) => "done",
            ExtendState::Failed(_) => "failed",
        }
    }

    /// An operation is in flight
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ExtendState::Analyzing { .. } | ExtendState::Submitting { .. }
        )
    }
}

/// The effect of a user action on the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The action does not apply in the current state
    Ignored,
    /// The state the workflow came to rest in
    Settled(ExtendState),
}

pub struct ExtendWorkflow<A> {
    fetcher: SnapshotFetcher<A>,
    writer: LookupTableWriter<A>,
    options: ExtendOptions,
    state: Mutex<ExtendState>,
}

impl<A: Clone> ExtendWorkflow<A> {
    pub fn new(rpc: A, wallet: Arc<dyn Wallet>, options: ExtendOptions) -> Self {
        Self {
            fetcher: SnapshotFetcher::new(rpc.clone()),
            writer: LookupTableWriter::new(rpc, wallet),
            options,
            state: Mutex::new(ExtendState::Idle),
        }
    }
}

impl<A> ExtendWorkflow<A> {
    pub fn state(&self) -> ExtendState {
        self.state.lock().unwrap().clone()
    }

    pub fn options(&self) -> ExtendOptions {
        self.options
    }

    /// The fetcher holding the target table's snapshot
    pub fn fetcher(&self) -> &SnapshotFetcher<A> {
        &self.fetcher
    }

    /// Discard a pending analysis.
    pub fn cancel(&self) -> Transition {
        let mut state = self.state.lock().unwrap();
        if !matches!(*state, ExtendState::NeedsConfirmation(_)) {
            return Transition::Ignored;
        }
        *state = ExtendState::Idle;
        Transition::Settled(ExtendState::Idle)
    }

    /// The candidate input was edited, so any pending analysis no longer applies.
    pub fn input_changed(&self) -> Transition {
        self.cancel()
    }

    fn settle(&self, next: ExtendState) -> Transition {
        *self.state.lock().unwrap() = next.clone();
        Transition::Settled(next)
    }

    fn validate(&self, request: &ExtendRequest) -> LutManagerResult<(Pubkey, Vec<Pubkey>)> {
        let candidates = parse_address_list(&request.input)?;
        let table = parse_table_address(&request.table_input)?;
        if self.writer.wallet().public_key().is_none() {
            return Err(WalletError::NotConnected.into());
        }
        Ok((table, candidates))
    }

    /// The list that will actually be submitted
    fn submission(
        &self,
        analysis: &DuplicateAnalysis,
        table_len: usize,
    ) -> LutManagerResult<Vec<Pubkey>> {
        let addresses = analysis.to_submit(self.options.dedup_candidates);
        if addresses.is_empty() {
            return Err(ValidationError::NothingToAdd.into());
        }
        let total = table_len + addresses.len();
        if total > LOOKUP_TABLE_MAX_ADDRESSES {
            return Err(ValidationError::CapacityExceeded(total).into());
        }
        Ok(addresses)
    }
}

fn failed(err: LutManagerError, request: ExtendRequest) -> ExtendState {
    tracing::warn!(kind = err.kind().as_str(), "lookup table extension failed: {err}");
    ExtendState::Failed(ExtendFailure {
        kind: err.kind(),
        message: err.to_string(),
        request,
    })
}

impl<A: Deref<Target = X>, X: ChainClient + ?Sized> ExtendWorkflow<A> {
    /// Load the table the user is about to extend, to show its current
    /// addresses. Served from the memo if that table is already loaded.
    pub async fn load_table(&self, table_input: &str) -> LutManagerResult<FetchOutcome> {
        let table = parse_table_address(table_input)?;
        self.fetcher.fetch(&table).await
    }

    /// The extend action: validate, analyze, then submit or ask for confirmation.
    pub async fn extend(&self, table_input: &str, input: &str) -> Transition {
        let request = ExtendRequest::new(table_input, input);
        let (table, candidates) = {
            let mut state = self.state.lock().unwrap();
            match &*state {
                current if current.is_busy() => {
                    tracing::debug!("extension already in flight, ignoring trigger");
                    return Transition::Ignored;
                }
                ExtendState::NeedsConfirmation(pending) if pending.request == request => {
                    return Transition::Ignored;
                }
                _ => {}
            }
            match self.validate(&request) {
                Ok((table, candidates)) => {
                    *state = ExtendState::Analyzing { table };
                    (table, candidates)
                }
                Err(err) => {
                    let next = failed(err, request);
                    *state = next.clone();
                    return Transition::Settled(next);
                }
            }
        };

        let snapshot = match self.fetcher.fetch(&table).await {
            Ok(FetchOutcome::Loaded(snapshot)) | Ok(FetchOutcome::Cached(snapshot)) => snapshot,
            Ok(FetchOutcome::Superseded) => {
                tracing::debug!(%table, "table changed during analysis");
                return self.settle(ExtendState::Idle);
            }
            Err(err) => return self.settle(failed(err, request)),
        };

        let analysis = analyze(&candidates, &snapshot.addresses);
        if analysis.has_duplicates() {
            tracing::info!(
                %table,
                unique = analysis.unique.len(),
                duplicate = analysis.duplicate.len(),
                "duplicates found, waiting for confirmation"
            );
            return self.settle(ExtendState::NeedsConfirmation(PendingExtension {
                table,
                request,
                analysis,
                table_len: snapshot.len(),
            }));
        }

        let addresses = match self.submission(&analysis, snapshot.len()) {
            Ok(addresses) => addresses,
            Err(err) => return self.settle(failed(err, request)),
        };
        self.settle(ExtendState::Submitting {
            table,
            addresses: addresses.len(),
        });
        self.submit(table, request, addresses).await
    }

    /// Submit the unique addresses of a pending analysis.
    ///
    /// Ignored unless an analysis is pending with at least one unique address.
    pub async fn proceed(&self) -> Transition {
        let (pending, addresses) = {
            let mut state = self.state.lock().unwrap();
            let ExtendState::NeedsConfirmation(pending) = &*state else {
                return Transition::Ignored;
            };
            if !pending.can_proceed() {
                return Transition::Ignored;
            }
            let pending = pending.clone();
            match self.submission(&pending.analysis, pending.table_len) {
                Ok(addresses) => {
                    *state = ExtendState::Submitting {
                        table: pending.table,
                        addresses: addresses.len(),
                    };
                    (pending, addresses)
                }
                Err(err) => {
                    let next = failed(err, pending.request);
                    *state = next.clone();
                    return Transition::Settled(next);
                }
            }
        };
        self.submit(pending.table, pending.request, addresses).await
    }

    /// Run the last failed extension again with the same input.
    pub async fn retry(&self) -> Transition {
        let request = match self.state() {
            ExtendState::Failed(failure) => failure.request,
            _ => return Transition::Ignored,
        };
        self.extend(&request.table_input, &request.input).await
    }

    async fn submit(
        &self,
        table: Pubkey,
        request: ExtendRequest,
        addresses: Vec<Pubkey>,
    ) -> Transition {
        let signature = match self.writer.extend_lookup_table(table, &addresses).await {
            Ok(signature) => signature,
            Err(err) => return self.settle(failed(err, request)),
        };

        // Later analyses must see the new members, even if this re-read fails
        self.fetcher.invalidate(&table);
        let snapshot = match self.fetcher.refresh(&table).await {
            Ok(outcome) => outcome.into_snapshot(),
            Err(err) => {
                tracing::warn!(%table, "failed to reload lookup table after extending: {err}");
                None
            }
        };
        self.settle(ExtendState::Done(ExtendReceipt {
            table,
            signature,
            added: addresses,
            snapshot,
        }))
    }
}
