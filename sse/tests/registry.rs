use futures::StreamExt;
use sse::handler::event_stream;
use sse::{ClientId, CloseReason, Delivery, Manager, Subscription};
use std::sync::Arc;
use std::time::Duration;

fn client(id: &str) -> ClientId {
    ClientId::try_from(id).unwrap()
}

fn spawn_send(
    manager: &Arc<Manager>,
    id: &str,
    payload: &str,
) -> tokio::task::JoinHandle<Delivery> {
    let manager = Arc::clone(manager);
    let id = client(id);
    let payload = payload.to_string();
    tokio::spawn(async move { manager.send(&id, payload).await })
}

#[tokio::test]
async fn reregistration_closes_previous_channel_before_next_is_installed() {
    let manager = Manager::new();
    let mut generations: Vec<Subscription> = Vec::new();

    for _ in 0..10 {
        let subscription = manager.register_connection(client("a"));
        for mut previous in generations.drain(..) {
            assert_eq!(previous.recv().await, None);
            assert_eq!(previous.close_reason(), Some(CloseReason::Superseded));
        }
        assert_eq!(manager.connection_count(), 1);
        generations.push(subscription);
    }
}

#[tokio::test]
async fn close_all_is_idempotent_after_reregistration() {
    let manager = Manager::new();
    let _first = manager.register_connection(client("a"));
    let _second = manager.register_connection(client("a"));
    let _other = manager.register_connection(client("b"));

    assert_eq!(manager.close_all(), 2);
    assert_eq!(manager.close_all(), 0);
    assert_eq!(manager.connection_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn racing_registrations_for_one_id_leave_exactly_one_open() {
    const RACERS: usize = 200;
    let manager = Arc::new(Manager::new());

    let registrations: Vec<_> = (0..RACERS)
        .map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.register_connection(client("a")) })
        })
        .collect();

    let mut subscriptions = Vec::with_capacity(RACERS);
    for registration in registrations {
        subscriptions.push(registration.await.unwrap());
    }
    assert_eq!(manager.connection_count(), 1);

    let mut open = 0;
    for subscription in subscriptions.iter_mut() {
        match tokio::time::timeout(Duration::from_millis(20), subscription.recv()).await {
            Err(_elapsed) => open += 1,
            Ok(frame) => {
                assert_eq!(frame, None);
                assert_eq!(subscription.close_reason(), Some(CloseReason::Superseded));
            }
        }
    }
    assert_eq!(open, 1);
    assert_eq!(manager.connection_count(), 1);
}

#[tokio::test]
async fn registration_after_shutdown_is_closed_immediately() {
    let manager = Manager::new();
    let mut before = manager.register_connection(client("a"));

    assert_eq!(manager.shutdown(), 1);
    assert_eq!(before.recv().await, None);
    assert_eq!(before.close_reason(), Some(CloseReason::Shutdown));

    let mut late = manager.register_connection(client("b"));
    assert_eq!(manager.connection_count(), 0);
    assert_eq!(late.recv().await, None);
    assert_eq!(late.close_reason(), Some(CloseReason::Shutdown));
    assert_eq!(manager.send(&client("b"), "x").await, Delivery::NoRecipient);
}

#[tokio::test]
async fn send_is_emitted_verbatim_as_one_frame() {
    let manager = Arc::new(Manager::new());
    let mut events = Box::pin(event_stream(manager.register_connection(client("a"))));

    let sender = spawn_send(&manager, "a", "hello world");

    assert_eq!(
        events.next().await,
        Some(Ok("data: hello world\n\n".to_string()))
    );
    assert_eq!(sender.await.unwrap(), Delivery::Delivered);
}

#[tokio::test]
async fn send_to_unregistered_id_returns_immediately() {
    let manager = Manager::new();

    let outcome = tokio::time::timeout(
        Duration::from_millis(100),
        manager.send(&client("nobody"), "x"),
    )
    .await
    .expect("send to an unknown id must not block");

    assert_eq!(outcome, Delivery::NoRecipient);
}

#[tokio::test]
async fn superseded_handler_exits_and_successor_receives() {
    let manager = Arc::new(Manager::new());
    let mut frames = Vec::new();

    let mut h1 = Box::pin(event_stream(manager.register_connection(client("a"))));
    let sender = spawn_send(&manager, "a", "x");
    frames.push(("h1", h1.next().await));
    assert_eq!(sender.await.unwrap(), Delivery::Delivered);

    let mut h2 = Box::pin(event_stream(manager.register_connection(client("a"))));
    assert_eq!(h1.next().await, None);
    drop(h1);
    assert_eq!(manager.connection_count(), 1);

    let sender = spawn_send(&manager, "a", "y");
    frames.push(("h2", h2.next().await));
    assert_eq!(sender.await.unwrap(), Delivery::Delivered);

    assert_eq!(
        frames,
        vec![
            ("h1", Some(Ok("data: x\n\n".to_string()))),
            ("h2", Some(Ok("data: y\n\n".to_string()))),
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_clients_receive_only_their_own_messages() {
    const CLIENTS: usize = 1000;
    let manager = Arc::new(Manager::new());

    let registrations: Vec<_> = (0..CLIENTS)
        .map(|i| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                let id = client(&format!("client-{i}"));
                (i, manager.register_connection(id))
            })
        })
        .collect();

    let mut readers = Vec::with_capacity(CLIENTS);
    for registration in registrations {
        let (i, subscription) = registration.await.unwrap();
        readers.push(tokio::spawn(async move {
            let mut events = Box::pin(event_stream(subscription));
            (i, events.next().await)
        }));
    }
    assert_eq!(manager.connection_count(), CLIENTS);

    let senders: Vec<_> = (0..CLIENTS)
        .map(|i| spawn_send(&manager, &format!("client-{i}"), &format!("payload-{i}")))
        .collect();

    for sender in senders {
        assert_eq!(sender.await.unwrap(), Delivery::Delivered);
    }
    for reader in readers {
        let (i, frame) = reader.await.unwrap();
        assert_eq!(frame, Some(Ok(format!("data: payload-{i}\n\n"))));
    }
}

#[tokio::test]
async fn close_all_releases_handlers_and_forgets_ids() {
    let manager = Manager::new();
    let ids = ["a", "b", "c"];
    let mut streams: Vec<_> = ids
        .iter()
        .map(|id| Box::pin(event_stream(manager.register_connection(client(id)))))
        .collect();

    assert_eq!(manager.close_all(), ids.len());

    for events in streams.iter_mut() {
        assert_eq!(events.next().await, None);
    }
    for id in ids {
        assert!(manager.lookup(&client(id)).is_none());
        assert_eq!(manager.send(&client(id), "x").await, Delivery::NoRecipient);
    }
}

#[tokio::test]
async fn disconnected_handler_removes_itself() {
    let manager = Manager::new();
    let events = Box::pin(event_stream(manager.register_connection(client("a"))));

    // The transport drops the body when the peer goes away.
    drop(events);

    assert!(manager.lookup(&client("a")).is_none());
    assert_eq!(manager.send(&client("a"), "x").await, Delivery::NoRecipient);
}

#[tokio::test]
async fn per_client_delivery_is_fifo_for_one_producer() {
    let manager = Arc::new(Manager::new());
    let mut events = Box::pin(event_stream(manager.register_connection(client("a"))));

    let producer = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            for i in 0..5 {
                assert_eq!(
                    manager.send(&client("a"), format!("m{i}")).await,
                    Delivery::Delivered
                );
            }
        })
    };

    for i in 0..5 {
        assert_eq!(events.next().await, Some(Ok(format!("data: m{i}\n\n"))));
    }
    producer.await.unwrap();
}
