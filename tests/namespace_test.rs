mod common;

use small_queue::{Namespace, NamespaceConfig, QueueConfiguration, QueueItem};
use tempfile::tempdir;
use uuid::Uuid;

fn namespace_at(parent: &std::path::Path) -> Namespace {
    Namespace::new(
        parent,
        NamespaceConfig {
            namespace_name: "orders".to_string(),
            namespace_id: 7,
        },
    )
    .unwrap()
}

fn queue_config(queue_id: u32) -> QueueConfiguration {
    QueueConfiguration {
        queue_id,
        queue_name: format!("queue-{}", queue_id),
        ..QueueConfiguration::default()
    }
}

#[test]
fn creates_its_directory() {
    common::setup();
    let dir = tempdir().unwrap();
    let namespace = namespace_at(dir.path());
    assert_eq!(namespace.root_dir, dir.path().join("orders-7"));
    assert!(namespace.root_dir.is_dir());
}

#[test]
fn add_and_get_queue() {
    common::setup();
    let dir = tempdir().unwrap();
    let mut namespace = namespace_at(dir.path());

    namespace.add_queue(queue_config(1)).unwrap();
    assert!(namespace.get_queue(1).is_some());
    assert!(namespace.get_queue(99).is_none());
    assert!(dir.path().join("orders-7/1/main/pages").is_file());
}

#[test]
fn load_queue_reuses_the_open_handle() {
    common::setup();
    let dir = tempdir().unwrap();
    let mut namespace = namespace_at(dir.path());

    let it = QueueItem {
        message_id: Uuid::new_v4(),
        priority: 4,
    };
    namespace
        .load_queue(queue_config(2))
        .unwrap()
        .enqueue(&it)
        .unwrap();

    let queue = namespace.load_queue(queue_config(2)).unwrap();
    assert_eq!(queue.dequeue().unwrap(), it);
    assert!(queue.is_empty().unwrap());
}

#[test]
fn delete_queue_removes_directory_and_handle() {
    common::setup();
    let dir = tempdir().unwrap();
    let mut namespace = namespace_at(dir.path());

    namespace.add_queue(queue_config(3)).unwrap();
    assert!(dir.path().join("orders-7/3").is_dir());

    namespace.delete_queue(3).unwrap();
    assert!(namespace.get_queue(3).is_none());
    assert!(!dir.path().join("orders-7/3").exists());

    // deleting an unknown queue is a no-op
    namespace.delete_queue(42).unwrap();
}
