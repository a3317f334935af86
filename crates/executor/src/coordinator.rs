use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use swapflow_planner::OrderedSteps;
use swapflow_types::{
    parse_approve_calldata, Address, AllowanceStep, BuildInput, CapabilityError, Signature, Step,
    StepKind, TransactionRequest, B256,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::capabilities::{OrderId, SignedOrder, Signer, Submitter};
use crate::classifier::{classify, ClassifiedFailure};
use crate::clock::{Clock, SystemClock};
use crate::StepError;

/// How transaction steps wait on one another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Await inclusion of every non-terminal transaction before the next step
    #[default]
    Sequential,

    /// Sign and broadcast back-to-back, relying on nonce order to serialize inclusion
    Pipelined,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoordinatorConfig {
    pub mode: ExecutionMode,

    /// Deadlines closer than this many seconds count as already passed
    pub deadline_buffer_secs: u64,

    /// Upper bound on waiting for inclusion in sequential mode. `None` waits as long
    /// as the submitter does.
    pub inclusion_timeout: Option<Duration>,
}

impl CoordinatorConfig {
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_deadline_buffer(mut self, secs: u64) -> Self {
        self.deadline_buffer_secs = secs;
        self
    }

    pub fn with_inclusion_timeout(mut self, timeout: Duration) -> Self {
        self.inclusion_timeout = Some(timeout);
        self
    }
}

/// Identifier of one execution attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AttemptId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Signing,
    Submitting,
    Confirmed,
    Failed,
}

impl StepState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepState::Pending => "pending",
            StepState::Signing => "signing",
            StepState::Submitting => "submitting",
            StepState::Confirmed => "confirmed",
            StepState::Failed => "failed",
        }
    }
}

/// What a confirmed step produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    Transaction {
        hash: B256,
        nonce: u64,
        /// Set when the step waited for inclusion
        block_number: Option<u64>,
    },
    Signature(Signature),
    Order(OrderId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub index: usize,
    pub kind: StepKind,
    pub state: StepState,
    pub nonce: Option<u64>,
    pub result: Option<StepResult>,
}

impl StepRecord {
    fn pending(index: usize, kind: StepKind) -> Self {
        Self {
            index,
            kind,
            state: StepState::Pending,
            nonce: None,
            result: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalResult {
    Transaction { hash: B256 },
    Order { order_id: OrderId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Completed {
        attempt_id: AttemptId,
        result: TerminalResult,
        steps: Vec<StepRecord>,
    },
    Failed {
        attempt_id: AttemptId,
        step_index: usize,
        step_kind: StepKind,
        failure: ClassifiedFailure,
        steps: Vec<StepRecord>,
    },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed { .. })
    }

    pub fn attempt_id(&self) -> AttemptId {
        match self {
            ExecutionOutcome::Completed { attempt_id, .. }
            | ExecutionOutcome::Failed { attempt_id, .. } => *attempt_id,
        }
    }

    pub fn steps(&self) -> &[StepRecord] {
        match self {
            ExecutionOutcome::Completed { steps, .. } | ExecutionOutcome::Failed { steps, .. } => {
                steps
            }
        }
    }

    pub fn result(&self) -> Option<&TerminalResult> {
        match self {
            ExecutionOutcome::Completed { result, .. } => Some(result),
            ExecutionOutcome::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&ClassifiedFailure> {
        match self {
            ExecutionOutcome::Failed { failure, .. } => Some(failure),
            ExecutionOutcome::Completed { .. } => None,
        }
    }
}

/// Walks planned steps in order against the signer and submitter capabilities.
///
/// Each step moves `Pending -> Signing -> Submitting -> Confirmed`, or to `Failed`, which
/// halts the attempt. Later steps are never started after a failure.
pub struct ExecutionCoordinator {
    config: CoordinatorConfig,
    clock: Arc<dyn Clock>,
}

impl Default for ExecutionCoordinator {
    fn default() -> Self {
        Self::new(CoordinatorConfig::default())
    }
}

impl ExecutionCoordinator {
    pub fn new(config: CoordinatorConfig) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Execute one attempt.
    ///
    /// `cancel` is honoured while waiting on the signer and before anything is broadcast
    /// or posted. Once a transaction is handed to the submitter the step runs to
    /// completion regardless.
    pub async fn execute<S, B>(
        &self,
        steps: &OrderedSteps,
        signer: &S,
        submitter: &B,
        cancel: &CancellationToken,
    ) -> ExecutionOutcome
    where
        S: Signer + ?Sized,
        B: Submitter + ?Sized,
    {
        let attempt = Attempt {
            id: AttemptId::new(),
            config: &self.config,
            clock: self.clock.as_ref(),
            signer,
            submitter,
            cancel,
        };

        info!(
            attempt_id = %attempt.id,
            steps = steps.len(),
            mode = ?self.config.mode,
            "Starting execution"
        );

        let mut records: Vec<StepRecord> = steps
            .iter()
            .enumerate()
            .map(|(index, step)| StepRecord::pending(index, step.kind()))
            .collect();
        let mut permit_signature: Option<Signature> = None;

        for (index, step) in steps.iter().enumerate() {
            let record = &mut records[index];

            match attempt.run_step(index, step, &permit_signature, record).await {
                Ok(result) => {
                    if let (Step::Permit(_), StepResult::Signature(signature)) = (step, &result) {
                        permit_signature = Some(signature.clone());
                    }
                    record.state = StepState::Confirmed;
                    record.result = Some(result);
                    info!(
                        attempt_id = %attempt.id,
                        step_index = index,
                        step = %step.kind(),
                        "Step confirmed"
                    );
                }
                Err(error) => {
                    record.state = StepState::Failed;
                    return attempt.fail(index, step.kind(), &error, records);
                }
            }
        }

        let terminal = records
            .last()
            .and_then(|record| record.result.as_ref())
            .and_then(|result| match result {
                StepResult::Transaction { hash, .. } => {
                    Some(TerminalResult::Transaction { hash: *hash })
                }
                StepResult::Order(order_id) => Some(TerminalResult::Order {
                    order_id: order_id.clone(),
                }),
                StepResult::Signature(_) => None,
            });

        match terminal {
            Some(result) => {
                info!(attempt_id = %attempt.id, result = ?result, "Execution completed");
                ExecutionOutcome::Completed {
                    attempt_id: attempt.id,
                    result,
                    steps: records,
                }
            }
            None => {
                let index = records.len().saturating_sub(1);
                let kind = records
                    .last()
                    .map(|record| record.kind)
                    .unwrap_or(StepKind::Swap);
                attempt.fail(index, kind, &StepError::NoTerminalResult, records)
            }
        }
    }
}

/// Borrowed state for one call to [`ExecutionCoordinator::execute`]
struct Attempt<'a, S: ?Sized, B: ?Sized> {
    id: AttemptId,
    config: &'a CoordinatorConfig,
    clock: &'a dyn Clock,
    signer: &'a S,
    submitter: &'a B,
    cancel: &'a CancellationToken,
}

impl<'a, S, B> Attempt<'a, S, B>
where
    S: Signer + ?Sized,
    B: Submitter + ?Sized,
{
    async fn run_step(
        &self,
        index: usize,
        step: &Step,
        permit_signature: &Option<Signature>,
        record: &mut StepRecord,
    ) -> Result<StepResult, StepError> {
        if self.cancel.is_cancelled() {
            return Err(StepError::Cancelled);
        }
        self.check_deadline(step)?;

        record.state = StepState::Signing;
        debug!(attempt_id = %self.id, step_index = index, step = %step.kind(), "Signing");

        match step {
            Step::Revoke(allowance) | Step::Approve(allowance) => {
                let check = AllowanceCheck {
                    planned: allowance,
                    revoke: matches!(step, Step::Revoke(_)),
                };
                self.transact(&allowance.transaction, Some(check), false, record)
                    .await
            }
            Step::Wrap(wrap) => self.transact(&wrap.transaction, None, false, record).await,
            Step::Swap(swap) => self.transact(&swap.transaction, None, true, record).await,
            Step::SwapAsync(swap) => {
                let input = BuildInput {
                    permit_signature: permit_signature.clone(),
                };
                let request = self.until_cancelled(swap.builder.build(input)).await?;
                self.transact(&request, None, true, record).await
            }
            Step::Permit(permit) => {
                let signature = self
                    .until_cancelled(self.signer.sign_typed_data(&permit.typed_data))
                    .await?;

                record.state = StepState::Submitting;
                self.check_deadline(step)?;
                Ok(StepResult::Signature(signature))
            }
            Step::OffChainOrderSignature(order) => {
                let signature = self
                    .until_cancelled(self.signer.sign_typed_data(&order.typed_data))
                    .await?;

                if self.cancel.is_cancelled() {
                    return Err(StepError::Cancelled);
                }
                self.check_deadline(step)?;

                record.state = StepState::Submitting;
                let order_id = self
                    .submitter
                    .post_order(&SignedOrder {
                        quote: order.quote.clone(),
                        signature,
                    })
                    .await?;

                info!(attempt_id = %self.id, order_id = %order_id, "Order posted");
                Ok(StepResult::Order(order_id))
            }
        }
    }

    /// Allocate, sign, verify and broadcast one transaction
    async fn transact(
        &self,
        request: &TransactionRequest,
        allowance: Option<AllowanceCheck<'_>>,
        terminal: bool,
        record: &mut StepRecord,
    ) -> Result<StepResult, StepError> {
        let account = self.signer.account();
        let nonce = self
            .until_cancelled(self.signer.allocate_nonce(account))
            .await?;
        record.nonce = Some(nonce);

        let signed = match self
            .until_cancelled(self.signer.sign_transaction(request, nonce))
            .await
        {
            Ok(signed) => signed,
            Err(error) => {
                self.signer.release_nonce(account, nonce).await;
                return Err(error);
            }
        };

        let verified = match allowance {
            Some(check) => check.verify(&signed.request.data),
            None => Ok(()),
        };
        if let Err(error) = verified {
            self.signer.release_nonce(account, nonce).await;
            return Err(error);
        }

        if self.cancel.is_cancelled() {
            self.signer.release_nonce(account, nonce).await;
            return Err(StepError::Cancelled);
        }

        record.state = StepState::Submitting;
        debug!(
            attempt_id = %self.id,
            step = %record.kind,
            nonce,
            hash = %signed.hash,
            "Submitting transaction"
        );

        if terminal || self.config.mode == ExecutionMode::Pipelined {
            let receipt = match self.submitter.submit(&signed).await {
                Ok(receipt) => receipt,
                Err(error) => return Err(self.refused(account, nonce, error).await),
            };
            return Ok(StepResult::Transaction {
                hash: receipt.hash,
                nonce,
                block_number: None,
            });
        }

        let included = self.submitter.submit_and_await_inclusion(&signed);
        let receipt = match self.config.inclusion_timeout {
            Some(limit) => match tokio::time::timeout(limit, included).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(StepError::InclusionTimeout {
                        hash: signed.hash.to_string(),
                        secs: limit.as_secs(),
                    })
                }
            },
            None => included.await,
        };
        let receipt = match receipt {
            Ok(receipt) => receipt,
            Err(error) => return Err(self.refused(account, nonce, error).await),
        };
        if !receipt.success {
            return Err(StepError::Reverted {
                hash: receipt.hash.to_string(),
                block_number: receipt.block_number,
            });
        }

        Ok(StepResult::Transaction {
            hash: receipt.hash,
            nonce,
            block_number: Some(receipt.block_number),
        })
    }

    /// Release the nonce when the network entry point refused the broadcast outright.
    ///
    /// Any other submission error is ambiguous: the transaction may be in a mempool, so
    /// the nonce stays consumed and the owner of the registry decides whether to
    /// `evict` the account and re-read the chain.
    async fn refused(&self, account: Address, nonce: u64, error: CapabilityError) -> StepError {
        if matches!(
            error,
            CapabilityError::Backend { .. } | CapabilityError::Network(_)
        ) {
            self.signer.release_nonce(account, nonce).await;
            debug!(attempt_id = %self.id, nonce, "Released nonce of refused broadcast");
        }
        StepError::from(error)
    }

    /// Race a signer-side wait against cancellation
    async fn until_cancelled<T>(
        &self,
        wait: impl Future<Output = Result<T, CapabilityError>>,
    ) -> Result<T, StepError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(StepError::Cancelled),
            result = wait => result.map_err(StepError::from),
        }
    }

    fn check_deadline(&self, step: &Step) -> Result<(), StepError> {
        let Some(deadline) = step.deadline() else {
            return Ok(());
        };

        let now = self.clock.now();
        if step.is_expired_at(now, self.config.deadline_buffer_secs) {
            return Err(StepError::DeadlineExpired { deadline, now });
        }
        Ok(())
    }

    fn fail(
        &self,
        step_index: usize,
        step_kind: StepKind,
        error: &StepError,
        steps: Vec<StepRecord>,
    ) -> ExecutionOutcome {
        let failure = classify(step_kind, error);

        warn!(
            attempt_id = %self.id,
            step_index,
            step = %step_kind,
            failure_kind = failure.kind.as_str(),
            error = %error,
            "Step failed"
        );

        ExecutionOutcome::Failed {
            attempt_id: self.id,
            step_index,
            step_kind,
            failure,
            steps,
        }
    }
}

/// Compares what the wallet signed with what was planned for an allowance step
struct AllowanceCheck<'a> {
    planned: &'a AllowanceStep,
    revoke: bool,
}

impl AllowanceCheck<'_> {
    fn verify(&self, signed_data: &[u8]) -> Result<(), StepError> {
        let signed = parse_approve_calldata(signed_data).map_err(StepError::UnreadableAllowance)?;

        let amount_edited = if self.revoke {
            !signed.amount.is_zero()
        } else {
            signed.amount < self.planned.amount
        };

        if amount_edited || signed.spender != self.planned.spender {
            return Err(StepError::ApprovalEdited {
                planned_spender: self.planned.spender,
                planned_amount: self.planned.amount,
                signed_spender: signed.spender,
                signed_amount: signed.amount,
            });
        }
        Ok(())
    }
}
