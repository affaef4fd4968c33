//! Service properties: versioning, catch-up and fan-out

use proptest::prelude::*;
use tokio::sync::mpsc;
use xfcanvas::backend::realtime::Frame;
use xfcanvas::backend::DocumentService;
use xfcanvas::shared::engine::replay;
use xfcanvas::shared::{Operation, SyncMessage};

use crate::common::{arb_batch, arb_history};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Fresh document with `history` submitted batch by batch
async fn seeded(history: &[Vec<Operation>]) -> (DocumentService, String) {
    let service = DocumentService::in_memory(64);
    let id = service.create_document(800, 600, None).unwrap().id.clone();
    for (i, batch) in history.iter().enumerate() {
        let applied = service.submit(&id, batch.clone()).await.unwrap();
        assert_eq!(applied.version, i as u64 + 1);
    }
    (service, id)
}

fn decode(frame: Frame) -> SyncMessage {
    serde_json::from_str(&frame).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn version_counts_batches(history in arb_history()) {
        runtime().block_on(async {
            let (service, id) = seeded(&history).await;
            let fetched = service.fetch(&id, Some(0)).unwrap();
            assert_eq!(fetched.version, history.len() as u64);
            assert_eq!(fetched.operations_since.len(), history.len());
            for (i, entry) in fetched.operations_since.iter().enumerate() {
                assert_eq!(entry.version, i as u64);
                assert_eq!(&entry.ops, &history[i]);
            }
        });
    }

    #[test]
    fn catch_up_reproduces_current(history in arb_history()) {
        runtime().block_on(async {
            let (service, id) = seeded(&history).await;
            let current = service.get(&id).unwrap();
            for v in 0..=current.version {
                let base = service.snapshot_at(&id, v).unwrap();
                assert_eq!(base.version, v);
                let fetched = service.fetch(&id, Some(v)).unwrap();
                assert_eq!(fetched.operations_since.len() as u64, current.version - v);
                assert_eq!(replay(base, &fetched.operations_since), *current);
            }
        });
    }

    #[test]
    fn fan_out_reaches_every_subscriber(subscribers in 1usize..6, history in arb_history(), batch in arb_batch()) {
        runtime().block_on(async {
            let (service, id) = seeded(&history).await;
            let mut receivers: Vec<mpsc::Receiver<Frame>> = Vec::new();
            for _ in 0..subscribers {
                let (tx, mut rx) = service.broadcaster().channel();
                service.subscribe(&id, tx).await.unwrap();
                let hello = decode(rx.try_recv().unwrap());
                assert_eq!(hello.version(), history.len() as u64);
                receivers.push(rx);
            }

            let applied = service.submit(&id, batch.clone()).await.unwrap();
            let expected = SyncMessage::ops(batch, applied.version);
            for rx in &mut receivers {
                assert_eq!(decode(rx.try_recv().unwrap()), expected);
                assert!(rx.try_recv().is_err());
            }
        });
    }
}
