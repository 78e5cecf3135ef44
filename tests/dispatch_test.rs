// Integration tests for create/delete/convert submission

mod support;

use memtty::authority::{OperationKind, OperationRequest, OperationResponse};
use memtty::dispatch::Dispatcher;
use memtty::errors::{ApplicationError, DispatchError, TransportError};
use memtty::message::{MessageChannel, Severity};
use memtty::model::{ProcessId, Scheme};
use memtty::render::RenderOptions;
use memtty::sync::SyncController;
use std::rc::Rc;
use std::time::Duration;
use support::{snapshot_json, snapshot_with_scheme, ScriptedAuthority, Submit};

struct Harness {
    authority: Rc<ScriptedAuthority>,
    sync: SyncController<ScriptedAuthority>,
    dispatcher: Dispatcher<ScriptedAuthority>,
    channel: MessageChannel,
}

/// Controller and dispatcher with the first snapshot already applied
async fn harness(initial: String) -> Harness {
    let authority = Rc::new(ScriptedAuthority::new());
    authority.snapshot(initial);
    let channel = MessageChannel::default();
    let sync = SyncController::new(
        Rc::clone(&authority),
        channel.clone(),
        RenderOptions::default(),
        Duration::from_secs(1),
    );
    sync.refresh().await.expect("initial refresh failed");
    let dispatcher = Dispatcher::new(sync.clone());
    Harness {
        authority,
        sync,
        dispatcher,
        channel,
    }
}

#[tokio::test(start_paused = true)]
async fn test_create_then_refresh() {
    let h = harness(snapshot_json(1000, &[(0, 1000, None)])).await;
    h.authority
        .reply(OperationResponse {
            pid: Some(ProcessId(7)),
            base: Some(0),
            limit: Some(299),
            ..OperationResponse::ok("Process 7 allocated")
        })
        .snapshot(snapshot_json(1000, &[(0, 300, Some(7)), (300, 700, None)]));

    let completion = h
        .dispatcher
        .create(ProcessId(7), 300, None)
        .await
        .expect("create failed");

    assert_eq!(completion.kind, OperationKind::Create);
    assert_eq!(completion.base, Some(0));
    assert_eq!(completion.limit, Some(299));
    assert_eq!(
        h.authority.submitted(),
        vec![OperationRequest::Create {
            pid: ProcessId(7),
            size: 300,
            strategy: None,
        }]
    );

    let map = completion.snapshot.expect("follow-up refresh failed");
    assert!(Rc::ptr_eq(&map, &h.sync.snapshot()));
    let frame = h.sync.frame();
    assert_eq!(frame.rows.len(), 2);
    assert_eq!(frame.rows[0].occupant, "PID 7");
    assert_eq!(frame.usage.used, 300);
    assert_eq!(frame.usage.free, 700);

    assert_eq!(h.channel.reported(), 1);
    let message = h.channel.latest().expect("no message");
    assert_eq!(message.severity, Severity::Info);
    assert_eq!(message.text, "Process 7 allocated");
    assert_eq!(h.dispatcher.pending(), None);
}

#[tokio::test(start_paused = true)]
async fn test_delete_coalesces_freed_space() {
    let h = harness(snapshot_json(1000, &[(0, 300, Some(7)), (300, 700, None)])).await;
    h.authority
        .reply(OperationResponse::ok("Process 7 deleted"))
        // Authority leaves the freed hole uncoalesced
        .snapshot(snapshot_json(1000, &[(0, 300, None), (300, 700, None)]));

    h.dispatcher
        .delete(ProcessId(7))
        .await
        .expect("delete failed");

    let map = h.sync.snapshot();
    assert_eq!(map.blocks().len(), 1);
    assert_eq!(map.free(), 1000);
    assert_eq!(h.sync.frame().rows[0].occupant, "Free");
}

#[tokio::test(start_paused = true)]
async fn test_zero_size_is_rejected_locally() {
    let h = harness(snapshot_json(1000, &[(0, 1000, None)])).await;
    let before = h.sync.snapshot();

    let result = h.dispatcher.create(ProcessId(1), 0, None).await;
    assert_eq!(
        result.map(|c| c.kind),
        Err(DispatchError::Application(ApplicationError::ZeroSize))
    );

    assert!(h.authority.submitted().is_empty());
    assert_eq!(h.authority.fetch_count(), 1);
    assert!(Rc::ptr_eq(&before, &h.sync.snapshot()));
    assert_eq!(h.channel.reported(), 1);
    assert_eq!(h.channel.errors(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_delete_unknown_process_is_rejected_locally() {
    let h = harness(snapshot_json(100, &[(0, 100, None)])).await;

    let result = h.dispatcher.delete(ProcessId(4)).await;
    assert!(matches!(
        result,
        Err(DispatchError::Application(ApplicationError::UnknownProcess(ProcessId(4))))
    ));
    assert!(h.authority.submitted().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_second_operation_while_pending_is_busy() {
    let h = harness(snapshot_json(100, &[(0, 100, None)])).await;
    h.authority
        .reply_after(OperationResponse::ok("Process 1 allocated"), Duration::from_millis(50))
        .snapshot(snapshot_json(100, &[(0, 10, Some(1)), (10, 90, None)]));

    let (first, second) = tokio::join!(
        h.dispatcher.create(ProcessId(1), 10, None),
        h.dispatcher.create(ProcessId(2), 10, None)
    );

    assert!(first.is_ok());
    assert_eq!(
        second.map(|c| c.kind),
        Err(DispatchError::Busy { pending: "create" })
    );
    assert_eq!(h.authority.submitted().len(), 1);
    assert!(!h.sync.snapshot().contains(ProcessId(2)));
    assert_eq!(h.dispatcher.pending(), None);

    // One busy error, one success
    assert_eq!(h.channel.reported(), 2);
    assert_eq!(h.channel.errors(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_busy_applies_across_operation_kinds() {
    let h = harness(snapshot_json(100, &[(0, 40, Some(9)), (40, 60, None)])).await;
    h.authority
        .reply_after(OperationResponse::ok("Process 1 allocated"), Duration::from_millis(50))
        .snapshot(snapshot_json(
            100,
            &[(0, 40, Some(9)), (40, 10, Some(1)), (50, 50, None)],
        ));

    let (create, delete, convert) = tokio::join!(
        h.dispatcher.create(ProcessId(1), 10, None),
        h.dispatcher.delete(ProcessId(9)),
        h.dispatcher.convert(Scheme::BestFit)
    );

    assert!(create.is_ok());
    assert_eq!(
        delete.map(|c| c.kind),
        Err(DispatchError::Busy { pending: "create" })
    );
    assert_eq!(
        convert.map(|c| c.kind),
        Err(DispatchError::Busy { pending: "create" })
    );
    assert_eq!(h.authority.submitted().len(), 1);
    assert!(h.sync.snapshot().contains(ProcessId(9)));
}

#[tokio::test(start_paused = true)]
async fn test_busy_covers_follow_up_refresh() {
    let h = harness(snapshot_json(100, &[(0, 100, None)])).await;
    h.authority
        .reply(OperationResponse::ok("Process 1 allocated"))
        .snapshot_after(
            snapshot_json(100, &[(0, 10, Some(1)), (10, 90, None)]),
            Duration::from_millis(100),
        );

    let (create, convert) = tokio::join!(h.dispatcher.create(ProcessId(1), 10, None), async {
        // Acknowledged, follow-up refresh still outstanding
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(h.sync.is_refreshing());
        assert_eq!(h.dispatcher.pending(), Some(OperationKind::Create));
        h.dispatcher.convert(Scheme::BestFit).await
    });

    assert!(create.is_ok());
    assert_eq!(
        convert.map(|c| c.kind),
        Err(DispatchError::Busy { pending: "create" })
    );
    assert_eq!(h.authority.submitted().len(), 1);
    assert_eq!(h.dispatcher.pending(), None);
}

#[tokio::test(start_paused = true)]
async fn test_background_refresh_joins_follow_up_refresh() {
    let h = harness(snapshot_json(100, &[(0, 100, None)])).await;
    h.authority
        .reply(OperationResponse::ok("Process 1 allocated"))
        .snapshot_after(
            snapshot_json(100, &[(0, 10, Some(1)), (10, 90, None)]),
            Duration::from_millis(100),
        );

    let (create, background) = tokio::join!(h.dispatcher.create(ProcessId(1), 10, None), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.sync.refresh().await
    });

    let after_create = create
        .expect("create failed")
        .snapshot
        .expect("follow-up refresh failed");
    let background = background.expect("background refresh failed");

    assert!(Rc::ptr_eq(&after_create, &background));
    assert!(background.contains(ProcessId(1)));
    // Initial refresh plus the shared follow-up
    assert_eq!(h.authority.fetch_count(), 2);
    assert_eq!(h.sync.requests_issued(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_authority_rejection_is_an_application_error() {
    let h = harness(snapshot_json(100, &[(0, 100, None)])).await;
    h.authority
        .reply(OperationResponse::failed("Not enough memory to allocate 500 KB"));
    let before = h.sync.snapshot();

    let result = h.dispatcher.create(ProcessId(1), 500, None).await;
    match result {
        Err(DispatchError::Application(e)) => {
            assert!(!e.is_local());
            assert_eq!(e.to_string(), "Not enough memory to allocate 500 KB");
        }
        other => panic!("expected application error, got {:?}", other.map(|c| c.kind)),
    }

    // No follow-up refresh after a rejection
    assert_eq!(h.authority.fetch_count(), 1);
    assert!(Rc::ptr_eq(&before, &h.sync.snapshot()));
    assert_eq!(h.channel.reported(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_failure_is_distinct_from_rejection() {
    let h = harness(snapshot_json(100, &[(0, 100, None)])).await;
    h.authority
        .submit_step(Submit::Fail(TransportError::Status { status: 500 }));

    let result = h.dispatcher.create(ProcessId(1), 10, None).await;
    assert_eq!(
        result.map(|c| c.kind),
        Err(DispatchError::Transport(TransportError::Status { status: 500 }))
    );
    assert_eq!(h.channel.reported(), 1);
    assert_eq!(h.dispatcher.pending(), None);
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_operation_times_out() {
    let h = harness(snapshot_json(100, &[(0, 100, None)])).await;
    h.authority.submit_step(Submit::Hang);

    let result = h.dispatcher.delete(ProcessId(1)).await;
    // Precondition fails before anything is sent
    assert!(result.is_err());
    assert!(h.authority.submitted().is_empty());

    let result = h.dispatcher.create(ProcessId(1), 10, None).await;
    assert_eq!(
        result.map(|c| c.kind),
        Err(DispatchError::Transport(TransportError::Timeout(
            Duration::from_secs(1)
        )))
    );
    assert_eq!(h.dispatcher.pending(), None);
    assert_eq!(h.channel.errors(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_convert_applies_relaid_layout() {
    let h = harness(snapshot_json(
        100,
        &[(0, 20, Some(1)), (20, 30, None), (50, 20, Some(2)), (70, 30, None)],
    ))
    .await;
    h.authority
        .reply(OperationResponse::ok("Converted to compaction"))
        .snapshot(snapshot_with_scheme(
            100,
            &[(0, 20, Some(1)), (20, 20, Some(2)), (40, 60, None)],
            "compaction",
        ));

    let completion = h
        .dispatcher
        .convert(Scheme::Compaction)
        .await
        .expect("convert failed");

    let map = completion.snapshot.expect("follow-up refresh failed");
    assert_eq!(map.scheme(), Some(&Scheme::Compaction));
    assert_eq!(map.largest_free().map(|b| b.size), Some(60));
    assert_eq!(h.sync.frame().scheme.as_deref(), Some("compaction"));
    assert_eq!(
        h.authority.submitted(),
        vec![OperationRequest::Convert {
            scheme: Scheme::Compaction
        }]
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_follow_up_refresh_keeps_completion() {
    let h = harness(snapshot_json(100, &[(0, 100, None)])).await;
    // No second snapshot scripted: the follow-up refresh fails
    h.authority.reply(OperationResponse::ok("Process 1 allocated"));

    let completion = h
        .dispatcher
        .create(ProcessId(1), 10, None)
        .await
        .expect("create failed");
    assert!(completion.snapshot.is_none());

    // Success from the dispatcher, failure from the controller
    assert_eq!(h.channel.reported(), 2);
    assert_eq!(h.channel.errors(), 1);
}
