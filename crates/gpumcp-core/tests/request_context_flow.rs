//! Exercises the public cross-module surface a caller outside this crate
//! actually sees: context derivation, correlation id propagation, and the
//! environment-variable duration override path.

use std::time::Duration;

use gpumcp_core::{parse_or_default, CorrelationId, OperationMode, RequestContext};

#[test]
fn fan_out_children_share_identity_but_carry_distinct_metadata() {
    let root = RequestContext::new();
    let us_east = root.child_for_node("us-east-1a");
    let us_west = root.child_for_node("us-west-2b");

    assert_eq!(us_east.correlation_id, root.correlation_id);
    assert_eq!(us_west.correlation_id, root.correlation_id);
    assert_eq!(us_east.metadata("node"), Some("us-east-1a"));
    assert_eq!(us_west.metadata("node"), Some("us-west-2b"));
}

#[test]
fn cancelling_root_cancels_every_derived_child() {
    let root = RequestContext::new();
    let child = root.child_for_node("node-a");
    let grandchild = child.child_for_node("node-a");

    assert!(!grandchild.is_cancelled());
    root.cancel();
    assert!(child.is_cancelled());
    assert!(grandchild.is_cancelled());
}

#[test]
fn correlation_id_propagated_from_an_inbound_header_round_trips() {
    let incoming = CorrelationId::generate().to_string();
    let parsed = CorrelationId::parse(&incoming).expect("16-char hex id parses");
    let ctx = RequestContext::with_correlation_id(parsed);
    assert_eq!(ctx.correlation_id.to_string(), incoming);
}

#[test]
fn exec_timeout_env_override_falls_back_to_default_when_unset_or_invalid() {
    let default = Duration::from_secs(60);
    assert_eq!(parse_or_default(None, default), default);
    assert_eq!(parse_or_default(Some("not a duration"), default), default);
    assert_eq!(parse_or_default(Some("90s"), default), Duration::from_secs(90));
}

#[test]
fn operation_mode_defaults_to_read_only() {
    assert_eq!(OperationMode::default(), OperationMode::ReadOnly);
}
