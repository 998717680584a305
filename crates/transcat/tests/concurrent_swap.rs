//! Readers racing a catalog swap only ever observe a whole set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use transcat::{
    CatalogEntry, CatalogFormat, CatalogHandle, CatalogLoader, CatalogSet, CatalogStore,
    MemorySource, PrefixResolver, Translator,
};

const READERS: usize = 4;
const SWAPS: usize = 200;

fn set(greeting: &str, farewell: &str) -> CatalogSet {
    let store = CatalogStore::build([
        CatalogEntry::new("Main", "Hello", greeting),
        CatalogEntry::new("Main", "Bye", farewell),
    ])
    .unwrap()
    .store;
    CatalogSet::from_stores(vec![Arc::new(store)])
}

#[test]
fn readers_never_see_a_mixed_set() {
    let handle = CatalogHandle::new(set("Hallo", "Doei"));
    let stop = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(READERS + 1));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let handle = handle.clone();
            let stop = Arc::clone(&stop);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut reads = 0_u64;
                while !stop.load(Ordering::Relaxed) {
                    let pair = handle.with_current(|set| {
                        let hello = set.resolve("Main", "Hello", "").map(|e| e.translation.clone());
                        let bye = set.resolve("Main", "Bye", "").map(|e| e.translation.clone());
                        (hello, bye)
                    });
                    match pair {
                        (Some(h), Some(b)) if h == "Hallo" => assert_eq!(b, "Doei"),
                        (Some(h), Some(b)) if h == "Bonjour" => assert_eq!(b, "Au revoir"),
                        other => panic!("torn read: {other:?}"),
                    }
                    reads += 1;
                }
                reads
            })
        })
        .collect();

    barrier.wait();
    for i in 0..SWAPS {
        if i % 2 == 0 {
            handle.replace(set("Bonjour", "Au revoir"));
        } else {
            handle.replace(set("Hallo", "Doei"));
        }
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        reader.join().unwrap();
    }
}

#[test]
fn translator_output_is_consistent_during_swaps() {
    let handle = CatalogHandle::new(set("Hallo", "Doei"));
    let translator = Arc::new(Translator::new(handle.clone()));
    let stop = Arc::new(AtomicBool::new(false));

    let reader = {
        let translator = Arc::clone(&translator);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let text = translator.tr("Main", "Hello");
                assert!(text == "Hallo" || text == "Bonjour", "unexpected {text}");
            }
        })
    };

    for i in 0..SWAPS {
        let next = if i % 2 == 0 {
            set("Bonjour", "Au revoir")
        } else {
            set("Hallo", "Doei")
        };
        handle.replace(next);
    }
    stop.store(true, Ordering::Relaxed);
    reader.join().unwrap();
}

#[test]
fn superseded_background_reload_does_not_publish() {
    let nl = r#"{"contexts":[{"name":"Main","messages":[{"source":"Hello","translation":"Hallo"}]}]}"#;
    let fr = r#"{"contexts":[{"name":"Main","messages":[{"source":"Hello","translation":"Bonjour"}]}]}"#;
    let source = MemorySource::new()
        .with("app_nl", nl, CatalogFormat::Json)
        .with("app_fr", fr, CatalogFormat::Json);
    let loader = Arc::new(CatalogLoader::new(PrefixResolver::new("app"), source));
    let handle = CatalogHandle::default();
    let translator = Translator::new(handle.clone());

    // Ticket for the first request is taken before the second one starts,
    // so the first request is stale by the time it completes.
    let stale = handle.spawn_reload(Arc::clone(&loader), "nl");
    let latest = handle.reload(&loader, "fr").unwrap();
    assert!(latest.is_published());

    let stale = stale.join().unwrap().unwrap();
    assert!(!stale.is_published());
    assert_eq!(stale.report().loaded.len(), 1);
    assert_eq!(translator.tr("Main", "Hello"), "Bonjour");
    assert_eq!(handle.snapshot().locale(), Some("fr"));
}

#[test]
fn snapshot_outlives_replacement() {
    let handle = CatalogHandle::new(set("Hallo", "Doei"));
    let before = handle.snapshot();
    let old = handle.replace(set("Bonjour", "Au revoir"));
    assert!(Arc::ptr_eq(&before, &old));
    assert_eq!(
        before.resolve("Main", "Hello", "").unwrap().translation,
        "Hallo"
    );
    assert_eq!(
        handle.snapshot().resolve("Main", "Hello", "").unwrap().translation,
        "Bonjour"
    );
}
