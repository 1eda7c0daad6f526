//! Two editors annotating the same image over the in-memory backend.
//!
//! Run with: cargo run --example workbench

use std::sync::Arc;

use visionflow::{ClassSet, ImageRef, InMemoryBackend, Key, Mode, Workbench};

/// Let spawned persistence calls run to completion.
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

fn classes() -> ClassSet {
    ClassSet::new(vec![
        "car".to_string(),
        "person".to_string(),
        "bicycle".to_string(),
    ])
}

fn print_store(label: &str, wb: &Workbench) {
    let Some(store) = wb.store() else {
        println!("{label}: no open image");
        return;
    };
    println!("{label}: {} annotation(s)", store.len());
    for ann in store.iter() {
        let b = ann.geometry.bounding_box().expect("demo only draws boxes");
        println!(
            "  {} [{}] {:.0}x{:.0} at ({:.0}, {:.0}) {}",
            ann.id,
            ann.class_name,
            b.width,
            b.height,
            b.x,
            b.y,
            if ann.is_optimistic() {
                "(optimistic)"
            } else {
                ""
            }
        );
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .init();

    let backend = Arc::new(InMemoryBackend::new());
    let image = ImageRef::new("img-1", "https://images.test/img-1.png", 800, 600);

    let mut alice = Workbench::new(backend.clone(), backend.clone(), classes());
    let mut bob = Workbench::new(backend.clone(), backend.clone(), classes());
    alice.open_image(image.clone());
    bob.open_image(image);

    // Alice draws a car box
    alice.pointer_down(120.0, 90.0);
    alice.pointer_move(260.0, 180.0);
    alice.pointer_up(300.0, 210.0);
    print_store("alice (before confirm)", &alice);

    settle().await;
    alice.pump();
    bob.pump();
    print_store("alice (confirmed)", &alice);
    print_store("bob (via change feed)", &bob);

    // Bob selects the record and deletes it
    bob.key(Key::V);
    assert_eq!(bob.mode(), Mode::Select);
    bob.pointer_down(200.0, 150.0);
    bob.pointer_up(200.0, 150.0);
    bob.key(Key::Delete);

    settle().await;
    alice.pump();
    bob.pump();
    print_store("alice (after bob's delete)", &alice);
    print_store("bob", &bob);
}
