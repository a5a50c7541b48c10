//! Signal bus behaviour across tasks.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;

use sigrpc_bus::{NamespaceFilter, SignalBus};

#[tokio::test]
async fn should_fan_out_to_every_matching_subscriber() {
    let bus = Arc::new(SignalBus::new());
    let mut handles = Vec::new();

    for _ in 0..4 {
        let mut sub = bus.subscribe(NamespaceFilter::namespace("room"));
        handles.push(tokio::spawn(async move {
            let first = sub.recv().await.expect("first signal");
            let second = sub.recv().await.expect("second signal");
            (first.payload, second.payload)
        }));
    }

    bus.emit("room:say", "hello").unwrap();
    bus.emit("elsewhere:say", "nobody hears this").unwrap();
    bus.emit("room:say", "bye").unwrap();

    for handle in handles {
        let (first, second) = handle.await.unwrap();
        assert_eq!(first, "hello");
        assert_eq!(second, "bye");
    }
}

#[tokio::test]
async fn should_keep_concurrent_namespaces_apart() {
    let bus = Arc::new(SignalBus::new());
    let mut a = bus.subscribe(NamespaceFilter::namespace("x_1"));
    let mut b = bus.subscribe(NamespaceFilter::namespace("x_2"));

    let emitter = {
        let bus = Arc::clone(&bus);
        tokio::spawn(async move {
            for i in 0..20 {
                bus.emit("x_1:n", &format!("a{i}")).unwrap();
                bus.emit("x_2:n", &format!("b{i}")).unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    for i in 0..20 {
        assert_eq!(a.recv().await.unwrap().payload, format!("a{i}"));
        assert_eq!(b.recv().await.unwrap().payload, format!("b{i}"));
    }
    emitter.await.unwrap();
}

#[tokio::test]
async fn should_not_deliver_after_unsubscribe() {
    let bus = SignalBus::new();
    let sub = bus.subscribe(NamespaceFilter::All);
    let mut survivor = bus.subscribe(NamespaceFilter::All);

    sub.unsubscribe();
    assert_eq!(bus.deliver("ns:after", "x"), 1);
    assert_eq!(survivor.recv().await.unwrap().channel, "ns:after");
}
