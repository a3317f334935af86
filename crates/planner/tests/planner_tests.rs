use async_trait::async_trait;
use serde_json::json;
use swapflow_planner::{plan, PlanError};
use swapflow_types::{
    encode_approve_calldata, Address, ApproveCall, BuildInput, Bytes, CapabilityError,
    OrderQuote, PermitPayload, Routing, Step, StepKind, SwapExecutionContext, SwapTxBuilder,
    Token, TokenAmount, Trade, TransactionBuilder, TransactionRequest, TypedData, U256,
};

// ═══════════════════════════════════════════════════════════════════════════
// FIXTURES
// ═══════════════════════════════════════════════════════════════════════════

const INPUT_AMOUNT: u64 = 1_000_000_000;

fn permit2() -> Address {
    "0x000000000022d473030f116ddee9f6b43ac78ba3".parse().unwrap()
}

fn usdc() -> Token {
    Token::new(1, Address::repeat_byte(0xa0), 6).with_symbol("USDC")
}

fn wbtc() -> Token {
    Token::new(1, Address::repeat_byte(0x22), 8).with_symbol("WBTC")
}

fn trade() -> Trade {
    Trade::new(
        TokenAmount::new(usdc(), U256::from(INPUT_AMOUNT)),
        TokenAmount::new(wbtc(), U256::from(1_500_000u64)),
    )
}

fn order_quote() -> OrderQuote {
    OrderQuote {
        quote_id: "quote-1".to_string(),
        swapper: Address::repeat_byte(0x12),
        nonce: U256::from(42u64),
        deadline: 1_700_000_600,
        encoded_order: Bytes::from(vec![0xde, 0xad]),
    }
}

fn tx(data: Bytes) -> TransactionRequest {
    TransactionRequest::new(1, Address::repeat_byte(0x12), Address::repeat_byte(0x45), data)
}

fn swap_tx() -> TransactionRequest {
    tx(Bytes::from(vec![0x35, 0x93, 0x56, 0x4c]))
}

fn approve_tx(amount: U256) -> TransactionRequest {
    tx(encode_approve_calldata(&ApproveCall {
        spender: permit2(),
        amount,
    }))
}

fn revoke_tx() -> TransactionRequest {
    approve_tx(U256::ZERO)
}

fn permit() -> PermitPayload {
    PermitPayload {
        typed_data: TypedData {
            domain: json!({ "name": "Permit2", "chainId": 1 }),
            types: json!({ "PermitSingle": [] }),
            primary_type: "PermitSingle".to_string(),
            message: json!({ "sigDeadline": "1700000300" }),
        },
        token: usdc(),
        spender: permit2(),
        amount: U256::from(INPUT_AMOUNT),
        deadline: 1_700_000_300,
    }
}

struct QuoteBuilder;

#[async_trait]
impl TransactionBuilder for QuoteBuilder {
    async fn build(&self, _input: BuildInput) -> Result<TransactionRequest, CapabilityError> {
        Ok(swap_tx())
    }
}

fn direct_swap() -> SwapExecutionContext {
    SwapExecutionContext::new(Routing::DirectSwap, trade()).with_swap(swap_tx())
}

fn off_chain_order() -> SwapExecutionContext {
    SwapExecutionContext::new(
        Routing::OffChainOrder,
        trade().with_order_quote(order_quote()),
    )
    .with_permit(permit())
}

// ═══════════════════════════════════════════════════════════════════════════
// DIRECT SWAP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_direct_swap_without_allowance_is_single_swap() {
    let steps = plan(&direct_swap()).unwrap();

    assert_eq!(steps.kinds(), vec![StepKind::Swap]);
    match steps.get(0) {
        Some(Step::Swap(step)) => assert_eq!(step.transaction, swap_tx()),
        other => panic!("expected swap step, got {other:?}"),
    }
}

#[test]
fn test_direct_swap_with_approval() {
    let context = direct_swap().with_approval(approve_tx(U256::MAX));
    let steps = plan(&context).unwrap();

    assert_eq!(steps.kinds(), vec![StepKind::Approve, StepKind::Swap]);
    match steps.get(0) {
        Some(Step::Approve(step)) => {
            // Exact trade input, not the calldata's max approval
            assert_eq!(step.amount, U256::from(INPUT_AMOUNT));
            assert_eq!(step.spender, permit2());
            assert_eq!(step.token, usdc());
        }
        other => panic!("expected approve step, got {other:?}"),
    }
}

#[test]
fn test_revoke_precedes_approve() {
    let context = direct_swap()
        .with_revocation(revoke_tx())
        .with_approval(approve_tx(U256::MAX));
    let steps = plan(&context).unwrap();

    assert_eq!(
        steps.kinds(),
        vec![StepKind::Revoke, StepKind::Approve, StepKind::Swap]
    );
    match steps.get(0) {
        Some(Step::Revoke(step)) => {
            assert!(step.amount.is_zero());
            assert_eq!(step.spender, permit2());
        }
        other => panic!("expected revoke step, got {other:?}"),
    }
}

#[test]
fn test_unsigned_permit_defers_swap() {
    let context = direct_swap()
        .with_approval(approve_tx(U256::MAX))
        .with_permit(permit())
        .with_swap_builder(SwapTxBuilder::new(QuoteBuilder))
        .unsigned(true);
    let steps = plan(&context).unwrap();

    assert_eq!(
        steps.kinds(),
        vec![StepKind::Approve, StepKind::Permit, StepKind::SwapAsync]
    );
    match steps.get(1) {
        Some(Step::Permit(step)) => {
            assert_eq!(step.token, usdc());
            assert_eq!(step.deadline, 1_700_000_300);
        }
        other => panic!("expected permit step, got {other:?}"),
    }
}

#[test]
fn test_signed_permit_is_embedded_in_swap() {
    let context = direct_swap().with_permit(permit());
    let steps = plan(&context).unwrap();

    assert_eq!(steps.kinds(), vec![StepKind::Swap]);
}

#[test]
fn test_unsigned_permit_requires_builder() {
    let context = direct_swap().with_permit(permit()).unsigned(true);

    assert_eq!(
        plan(&context).unwrap_err(),
        PlanError::MissingSwapBuilder {
            routing: Routing::DirectSwap
        }
    );
}

#[test]
fn test_unsigned_without_permit_uses_builder_when_no_prepared_swap() {
    let context = SwapExecutionContext::new(Routing::DirectSwap, trade())
        .with_swap_builder(SwapTxBuilder::new(QuoteBuilder))
        .unsigned(true);

    assert_eq!(plan(&context).unwrap().kinds(), vec![StepKind::SwapAsync]);
}

#[test]
fn test_missing_swap_transaction_is_rejected() {
    let context = SwapExecutionContext::new(Routing::DirectSwap, trade());

    assert_eq!(
        plan(&context).unwrap_err(),
        PlanError::MissingSwapTransaction {
            routing: Routing::DirectSwap
        }
    );
}

#[test]
fn test_malformed_approval_calldata_is_rejected() {
    let context = direct_swap().with_approval(tx(Bytes::from(vec![0x09, 0x5e])));

    assert!(matches!(
        plan(&context),
        Err(PlanError::InvalidAllowanceCalldata {
            step: StepKind::Approve,
            ..
        })
    ));
}

// ═══════════════════════════════════════════════════════════════════════════
// BRIDGE
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_bridge_matches_direct_swap_shape() {
    let context = SwapExecutionContext::new(Routing::Bridge, trade())
        .with_approval(approve_tx(U256::MAX))
        .with_swap(swap_tx());

    assert_eq!(
        plan(&context).unwrap().kinds(),
        vec![StepKind::Approve, StepKind::Swap]
    );
}

#[test]
fn test_bridge_unsigned_permit_defers_swap() {
    let context = SwapExecutionContext::new(Routing::Bridge, trade())
        .with_permit(permit())
        .with_swap_builder(SwapTxBuilder::new(QuoteBuilder))
        .unsigned(true);

    assert_eq!(
        plan(&context).unwrap().kinds(),
        vec![StepKind::Permit, StepKind::SwapAsync]
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// OFF-CHAIN ORDER
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_order_with_wrap() {
    let context = off_chain_order().with_wrap(tx(Bytes::from(vec![0xd0, 0xe3, 0x0d, 0xb0])));
    let steps = plan(&context).unwrap();

    assert_eq!(
        steps.kinds(),
        vec![StepKind::Wrap, StepKind::OffChainOrderSignature]
    );
    match steps.get(0) {
        Some(Step::Wrap(step)) => assert_eq!(step.amount.amount, U256::from(INPUT_AMOUNT)),
        other => panic!("expected wrap step, got {other:?}"),
    }
    match steps.get(1) {
        Some(Step::OffChainOrderSignature(step)) => {
            assert_eq!(step.quote, order_quote());
            assert_eq!(step.deadline, order_quote().deadline);
            assert_eq!(step.typed_data, permit().typed_data);
        }
        other => panic!("expected order signature step, got {other:?}"),
    }
}

#[test]
fn test_order_without_wrap() {
    let steps = plan(&off_chain_order()).unwrap();
    assert_eq!(steps.kinds(), vec![StepKind::OffChainOrderSignature]);
}

#[test]
fn test_order_with_allowance_and_wrap() {
    let context = off_chain_order()
        .with_revocation(revoke_tx())
        .with_approval(approve_tx(U256::MAX))
        .with_wrap(tx(Bytes::new()));

    assert_eq!(
        plan(&context).unwrap().kinds(),
        vec![
            StepKind::Revoke,
            StepKind::Approve,
            StepKind::Wrap,
            StepKind::OffChainOrderSignature
        ]
    );
}

#[test]
fn test_order_requires_permit_and_quote() {
    let no_permit = SwapExecutionContext::new(
        Routing::OffChainOrder,
        trade().with_order_quote(order_quote()),
    );
    assert_eq!(plan(&no_permit).unwrap_err(), PlanError::MissingPermit);

    let no_quote = SwapExecutionContext::new(Routing::OffChainOrder, trade()).with_permit(permit());
    assert_eq!(plan(&no_quote).unwrap_err(), PlanError::MissingOrderQuote);
}

// ═══════════════════════════════════════════════════════════════════════════
// WRAP
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_wrap_only_emits_single_wrap() {
    let eth = TokenAmount::new(Token::native(1), U256::from(INPUT_AMOUNT));
    let weth = TokenAmount::new(Token::new(1, Address::repeat_byte(0xc0), 18), U256::from(INPUT_AMOUNT));
    let context = SwapExecutionContext::new(Routing::Wrap, Trade::new(eth, weth))
        .with_wrap(tx(Bytes::new()));
    let steps = plan(&context).unwrap();

    assert_eq!(steps.kinds(), vec![StepKind::Wrap]);
    assert!(steps.terminal().is_none());
}

#[test]
fn test_wrap_requires_transaction() {
    let context = SwapExecutionContext::new(Routing::Wrap, trade());
    assert_eq!(plan(&context).unwrap_err(), PlanError::MissingWrapTransaction);
}

// ═══════════════════════════════════════════════════════════════════════════
// DETERMINISM
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_planning_is_idempotent() {
    let contexts = vec![
        direct_swap()
            .with_revocation(revoke_tx())
            .with_approval(approve_tx(U256::MAX)),
        direct_swap()
            .with_permit(permit())
            .with_swap_builder(SwapTxBuilder::new(QuoteBuilder))
            .unsigned(true),
        off_chain_order().with_wrap(tx(Bytes::new())),
    ];

    for context in contexts {
        assert_eq!(plan(&context).unwrap(), plan(&context).unwrap());
    }
}
