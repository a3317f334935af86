use swapflow_types::{
    parse_approve_calldata, AllowanceStep, OrderSignatureStep, PermitPayload, PermitStep,
    Routing, Step, StepKind, SwapAsyncStep, SwapExecutionContext, SwapStep, TokenAmount,
    TransactionRequest, WrapStep, U256,
};
use tracing::debug;

use crate::{OrderedSteps, PlanError};

/// Turn a trade context into the ordered steps that execute it.
///
/// Pure and deterministic: no I/O, no clock, no randomness. Planning the same context
/// twice yields equal plans.
pub fn plan(context: &SwapExecutionContext) -> Result<OrderedSteps, PlanError> {
    let mut steps = Vec::new();

    if let Some(tx) = &context.revocation_transaction {
        steps.push(Step::Revoke(allowance_step(
            StepKind::Revoke,
            tx,
            context,
            U256::ZERO,
        )?));
    }

    if let Some(tx) = &context.approval_transaction {
        steps.push(Step::Approve(allowance_step(
            StepKind::Approve,
            tx,
            context,
            context.trade.required_input_amount(),
        )?));
    }

    match context.routing {
        Routing::DirectSwap | Routing::Bridge => push_swap_steps(&mut steps, context)?,
        Routing::OffChainOrder => push_order_steps(&mut steps, context)?,
        Routing::Wrap => {
            let tx = context
                .wrap_transaction
                .as_ref()
                .ok_or(PlanError::MissingWrapTransaction)?;
            steps.push(wrap_step(tx, context));
        }
    }

    let steps = OrderedSteps::new(steps)?;
    debug!(
        routing = %context.routing,
        steps = ?steps.kinds(),
        unsigned = context.unsigned,
        "Planned swap steps"
    );

    Ok(steps)
}

/// Revoke and approve steps share a shape; only the planned amount differs. The spender
/// always comes from the calldata the wallet will sign.
fn allowance_step(
    kind: StepKind,
    tx: &TransactionRequest,
    context: &SwapExecutionContext,
    amount: U256,
) -> Result<AllowanceStep, PlanError> {
    let call = parse_approve_calldata(&tx.data)
        .map_err(|source| PlanError::InvalidAllowanceCalldata { step: kind, source })?;

    Ok(AllowanceStep {
        transaction: tx.clone(),
        token: context.trade.input.token.clone(),
        spender: call.spender,
        amount,
    })
}

fn wrap_step(tx: &TransactionRequest, context: &SwapExecutionContext) -> Step {
    Step::Wrap(WrapStep {
        transaction: tx.clone(),
        amount: TokenAmount::new(
            context.trade.input.token.clone(),
            context.trade.required_input_amount(),
        ),
    })
}

fn permit_step(permit: &PermitPayload, context: &SwapExecutionContext) -> Step {
    Step::Permit(PermitStep {
        typed_data: permit.typed_data.clone(),
        token: context.trade.input.token.clone(),
        deadline: permit.deadline,
    })
}

/// Direct swaps and bridges. A signed-up-front swap embeds its permit in calldata, so a
/// separate permit step only exists when the swap is built late.
fn push_swap_steps(
    steps: &mut Vec<Step>,
    context: &SwapExecutionContext,
) -> Result<(), PlanError> {
    let routing = context.routing;

    if let (Some(permit), true) = (&context.permit, context.unsigned) {
        let builder = context
            .swap_builder
            .clone()
            .ok_or(PlanError::MissingSwapBuilder { routing })?;
        steps.push(permit_step(permit, context));
        steps.push(Step::SwapAsync(SwapAsyncStep { builder }));
        return Ok(());
    }

    match (&context.swap_transaction, &context.swap_builder) {
        (Some(tx), _) => steps.push(Step::Swap(SwapStep {
            transaction: tx.clone(),
        })),
        (None, Some(builder)) if context.unsigned => steps.push(Step::SwapAsync(SwapAsyncStep {
            builder: builder.clone(),
        })),
        _ => return Err(PlanError::MissingSwapTransaction { routing }),
    }

    Ok(())
}

/// Off-chain orders: wrap first when the input is native, then sign the order.
fn push_order_steps(
    steps: &mut Vec<Step>,
    context: &SwapExecutionContext,
) -> Result<(), PlanError> {
    let permit = context.permit.as_ref().ok_or(PlanError::MissingPermit)?;
    let quote = context
        .trade
        .order_quote
        .as_ref()
        .ok_or(PlanError::MissingOrderQuote)?;

    if let Some(tx) = &context.wrap_transaction {
        steps.push(wrap_step(tx, context));
    }

    steps.push(Step::OffChainOrderSignature(OrderSignatureStep {
        typed_data: permit.typed_data.clone(),
        quote: quote.clone(),
        deadline: quote.deadline,
    }));

    Ok(())
}
