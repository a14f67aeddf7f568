use alloy_primitives::{Address, U256};
use serde_json::json;
use tx_domain::{ApprovalPolicy, BranchId, Contracts, Dnum, TroveId, VoteAllocation, VoteDirection};

#[test]
fn test_trove_id_displays_as_hex() {
    assert_eq!(TroveId(U256::from(0x4du64)).to_string(), "0x4d");
    assert_eq!(TroveId(U256::ZERO).to_string(), "0x0");
}

#[test]
fn test_vote_direction_follows_the_larger_side() {
    let a = VoteAllocation::new(Address::repeat_byte(1), U256::from(10u64), U256::ZERO);
    let b = VoteAllocation::new(Address::repeat_byte(2), U256::ZERO, U256::from(10u64));
    // empate: cuenta como voto en contra
    let c = VoteAllocation::new(Address::repeat_byte(3), U256::from(5u64), U256::from(5u64));
    assert_eq!(a.direction(), VoteDirection::For);
    assert_eq!(b.direction(), VoteDirection::Against);
    assert_eq!(c.direction(), VoteDirection::Against);
    assert_eq!(c.total(), U256::from(10u64));
    assert_eq!(VoteAllocation::new(Address::ZERO, U256::MAX, U256::from(1u64)).total(), U256::MAX);
}

#[test]
fn test_dnum_normalizes_to_wad() {
    let percent = Dnum::parse("5", 2).unwrap();
    assert_eq!(percent.to_wad().unwrap(), U256::from(50_000_000_000_000_000u64));
    let tiny = Dnum::parse("1200", 20).unwrap();
    assert_eq!(tiny.to_wad().unwrap(), U256::from(12u64));
    assert!(Dnum::parse("1234", 20).unwrap().to_wad().is_err());
    assert!(Dnum::parse("-1", 0).is_err());
}

#[test]
fn test_contracts_load_from_json() {
    let raw = json!({
        "boldToken": Address::repeat_byte(1),
        "collateralRegistry": Address::repeat_byte(2),
        "governance": Address::repeat_byte(3),
        "lqtyToken": Address::repeat_byte(4),
        "sbold": Address::repeat_byte(5),
        "multisend": Address::repeat_byte(6),
        "branches": [{
            "id": 0, "symbol": "ETH", "native": true,
            "collToken": Address::repeat_byte(0x10),
            "borrowerOperations": Address::repeat_byte(0x20),
            "troveManager": Address::repeat_byte(0x30),
            "stabilityPool": Address::repeat_byte(0x40),
            "collSurplusPool": Address::repeat_byte(0x50),
            "zapper": Address::repeat_byte(0x60),
            "leverageZapper": Address::repeat_byte(0x70),
        }],
    });
    let contracts: Contracts = serde_json::from_value(raw).unwrap();
    let eth = contracts.branch(BranchId::new(0)).unwrap();
    assert!(eth.native);
    assert_eq!(eth.stability_pool, Address::repeat_byte(0x40));
    assert!(contracts.branch(BranchId::new(1)).is_err());
}

#[test]
fn test_approval_policy_amounts() {
    let required = U256::from(7u64);
    assert_eq!(ApprovalPolicy::Exact.amount_for(required), required);
    assert_eq!(ApprovalPolicy::Infinite.amount_for(required), U256::MAX);
    assert_eq!(ApprovalPolicy::default(), ApprovalPolicy::Exact);
}
