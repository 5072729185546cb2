//! Workflows driven against real HTTP mock nodes.

mod common;

use common::MockNode;
use serde_json::json;
use std::sync::Arc;

use ledger_console::directory::NodeDirectory;
use ledger_console::ledger::{Endpoint, ErrorKind, LedgerApi, LedgerClient, NodeAddress, Transaction};
use ledger_console::view;
use ledger_console::workflow::{
    PeerHistoryStage, PeerHistoryState, PeerHistoryWorkflow, TransactionStage, TransactionState,
    TransactionWorkflow,
};

fn client() -> Arc<dyn LedgerApi> {
    Arc::new(LedgerClient::new())
}

fn workflow_for(node: &MockNode) -> TransactionWorkflow {
    TransactionWorkflow::new(client(), Endpoint::parse(&node.url()).unwrap())
}

#[tokio::test]
async fn test_transaction_runs_three_calls_in_order() {
    let node = MockNode::ledger(&[], Vec::new()).await;

    let report = workflow_for(&node)
        .run(Transaction::new("Alice", "Bob", "10"))
        .await;

    assert!(report.is_completed(), "report: {:?}", report);
    assert_eq!(
        report.transitions,
        vec![
            TransactionState::Idle,
            TransactionState::Submitting,
            TransactionState::Submitted,
            TransactionState::Mining,
            TransactionState::Mined,
            TransactionState::Propagating,
            TransactionState::Completed,
        ]
    );
    assert_eq!(
        node.paths(),
        vec!["/transactions/new", "/mine", "/transactions/propagate"]
    );

    let calls = node.calls();
    assert_eq!(calls[0].method, "POST");
    assert_eq!(calls[1].method, "GET");
    assert_eq!(calls[2].method, "POST");

    let expected = json!({"sender": "Alice", "recipient": "Bob", "amount": "10"});
    assert_eq!(calls[0].json(), expected);
    assert_eq!(calls[2].json(), expected);

    let mined = report.receipt(TransactionStage::Mine).unwrap();
    assert_eq!(mined.message.as_deref(), Some("New block mined"));
}

#[tokio::test]
async fn test_rejected_submission_stops_the_workflow() {
    let node = MockNode::start(|_, path| match path {
        "/transactions/new" => (400, "Missing values".to_string()),
        _ => (200, json!({"message": "ok"}).to_string()),
    })
    .await;

    let report = workflow_for(&node)
        .run(Transaction::new("Alice", "Bob", "10"))
        .await;

    assert_eq!(report.state(), TransactionState::Failed(TransactionStage::Submit));
    assert_eq!(node.paths(), vec!["/transactions/new"]);

    let error = report.error.unwrap();
    assert_eq!(error.kind(), ErrorKind::Server);
    assert!(error.to_string().contains("Missing values"));
}

#[tokio::test]
async fn test_mining_failure_skips_propagation() {
    let node = MockNode::ledger(&["/mine"], Vec::new()).await;

    let report = workflow_for(&node)
        .run(Transaction::new("Alice", "Bob", "10"))
        .await;

    assert_eq!(report.failed_stage(), Some(TransactionStage::Mine));
    assert_eq!(node.paths(), vec!["/transactions/new", "/mine"]);
    assert!(report.receipt(TransactionStage::Submit).is_some());
}

#[tokio::test]
async fn test_unreachable_node_is_a_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let workflow = TransactionWorkflow::new(
        client(),
        Endpoint::parse(&format!("http://{}", addr)).unwrap(),
    );
    let report = workflow.run(Transaction::new("Alice", "Bob", "10")).await;

    assert_eq!(report.failed_stage(), Some(TransactionStage::Submit));
    assert_eq!(report.error.unwrap().kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_peer_history_resolves_then_fetches() {
    let peer = MockNode::ledger(&[], Vec::new()).await;
    let local = MockNode::ledger(&[], vec![peer.address()]).await;

    let directory = NodeDirectory::new(client(), Endpoint::parse(&local.url()).unwrap());
    directory.refresh().await.unwrap();

    let options = directory.options();
    assert_eq!(options.len(), 2);
    assert!(options[0].is_sentinel());
    assert_eq!(options[1].value, peer.address());

    let selection = directory.select(&peer.address()).unwrap();
    let report = PeerHistoryWorkflow::new(client()).run(selection).await;

    assert!(report.is_completed(), "report: {:?}", report);
    assert_eq!(peer.paths(), vec!["/resolve", "/chain"]);
    assert!(report.resolution.as_ref().unwrap().resolved);

    let history = view::render_history(
        report.node.as_ref().unwrap(),
        report.chain.as_ref().unwrap(),
    );
    assert_eq!(history.heading, format!("History of {}", peer.address()));
    let indices: Vec<u64> = history.blocks.iter().map(|b| b.index).collect();
    assert_eq!(indices, vec![1, 2]);
    assert_eq!(
        history.blocks[1].transactions,
        vec!["Alice -> Bob: 10", "0 -> a1b2c3: 1"]
    );
    assert_eq!(history.blocks[0].timestamp, "2023-11-14 22:13:20 UTC");
}

#[tokio::test]
async fn test_resolution_without_flag_still_fetches() {
    let peer = MockNode::start(|_, path| match path {
        "/resolve" => (200, json!({"message": "Our chain is authoritative"}).to_string()),
        path => common::standard_reply(path, &[]),
    })
    .await;

    let report = PeerHistoryWorkflow::new(client())
        .run(Some(NodeAddress::new(peer.address())))
        .await;

    assert!(report.is_completed());
    assert!(!report.resolution.unwrap().resolved);
    assert_eq!(report.chain.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_resolution_skips_fetch() {
    let peer = MockNode::ledger(&["/resolve"], Vec::new()).await;

    let report = PeerHistoryWorkflow::new(client())
        .run(Some(NodeAddress::new(peer.address())))
        .await;

    assert_eq!(report.state(), PeerHistoryState::Failed(PeerHistoryStage::Resolve));
    assert_eq!(peer.paths(), vec!["/resolve"]);
    assert!(report.chain.is_none());
}

#[tokio::test]
async fn test_no_selection_contacts_nobody() {
    let peer = MockNode::ledger(&[], Vec::new()).await;

    let report = PeerHistoryWorkflow::new(client()).run(None).await;

    assert_eq!(report.failed_stage(), Some(PeerHistoryStage::Select));
    assert_eq!(report.error.unwrap().kind(), ErrorKind::Precondition);
    assert!(peer.calls().is_empty());
}
