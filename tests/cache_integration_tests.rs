//! Integration Tests for the Cache API
//!
//! Exercises the public surface end to end, including the background sweeper
//! with and without a surrounding Tokio runtime.

use std::sync::Arc;
use std::thread::{self, sleep};
use std::time::Duration;

use memcache::{Cache, CacheError, Config, CountMode, Expiration};

// == Helper Functions ==

fn create_test_cache() -> Cache<String> {
    Cache::new(Duration::from_secs(300), Duration::ZERO)
}

// == Insert / Read ==

#[test]
fn test_insert_then_read() {
    let cache = create_test_cache();

    cache.add("test_key", "test_value".to_string(), Expiration::Default);

    assert_eq!(cache.get("test_key").unwrap(), "test_value");
    assert!(cache.exists("test_key"));
    assert_eq!(cache.count(), 1);
}

#[test]
fn test_generic_values() {
    let cache: Cache<Arc<Vec<u8>>> = Cache::new(Duration::from_secs(300), Duration::ZERO);
    let payload = Arc::new(vec![1, 2, 3]);

    cache.add("bytes", Arc::clone(&payload), Expiration::Default);

    let read = cache.get("bytes").unwrap();
    assert!(Arc::ptr_eq(&read, &payload));

    // The returned handle outlives the cached item
    cache.delete("bytes").unwrap();
    assert_eq!(*read, vec![1, 2, 3]);
}

#[test]
fn test_signed_seconds_convention() {
    let cache: Cache<u32> = Cache::new(Duration::from_millis(30), Duration::ZERO);

    cache.add("default", 1, Expiration::from_secs_signed(0));
    cache.add("never", 2, Expiration::from_secs_signed(-1));
    cache.add("explicit", 3, Expiration::from_secs_signed(60));

    sleep(Duration::from_millis(60));

    assert!(matches!(cache.get("default"), Err(CacheError::Expired(_))));
    assert_eq!(cache.get("never").unwrap(), 2);
    assert_eq!(cache.get("explicit").unwrap(), 3);
}

#[test]
fn test_get_item_reports_lifetime() {
    let cache = create_test_cache();

    cache.add("key", "value".to_string(), Expiration::Default);

    let item = cache.get_item("key").unwrap();
    assert_eq!(item.value, "value");
    assert!(item.ttl_remaining().unwrap() <= Duration::from_secs(300));
    assert!(!item.is_expired());
}

#[test]
fn test_sweeper_survives_construction_runtime() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache: Cache<String> =
        rt.block_on(async { Cache::new(Duration::from_secs(300), Duration::from_millis(20)) });
    drop(rt);

    cache.add("short", "value".to_string(), Duration::from_millis(10));
    sleep(Duration::from_millis(300));

    assert!(!cache.exists("short"));
    assert_eq!(cache.count(), 0);
    assert!(cache.destroy().is_ok());
}

// == Expiration ==

#[test]
fn test_expired_item_remains_until_swept() {
    let cache = create_test_cache();

    cache.add("key", "value".to_string(), Duration::from_millis(20));
    sleep(Duration::from_millis(50));

    assert_eq!(cache.get("key"), Err(CacheError::Expired("key".to_string())));
    assert!(cache.exists("key"));
    assert_eq!(cache.count(), 1);

    assert_eq!(cache.purge_expired(), 1);
    assert!(!cache.exists("key"));
    assert_eq!(cache.get("key"), Err(CacheError::ItemNotFound("key".to_string())));
}

#[test]
fn test_delete_expired_item() {
    let cache = create_test_cache();

    cache.add("key", "value".to_string(), Duration::from_millis(10));
    sleep(Duration::from_millis(30));

    cache.delete("key").unwrap();
    assert_eq!(cache.count(), 0);
    assert_eq!(cache.delete("key"), Err(CacheError::KeyNotFound("key".to_string())));
}

// == Count Policies ==

#[test]
fn test_count_unique_keys() {
    let cache = create_test_cache();

    for i in 0..10 {
        cache.add(format!("key{}", i), "v".to_string(), Expiration::Default);
    }
    cache.add("key0", "again".to_string(), Expiration::Default);
    for i in 0..4 {
        cache.delete(&format!("key{}", i)).unwrap();
    }

    assert_eq!(cache.count(), 6);
}

#[test]
fn test_count_every_insert() {
    let cache: Cache<String> =
        Cache::with_count_mode(Duration::from_secs(300), Duration::ZERO, CountMode::EveryInsert);

    for i in 0..10 {
        cache.add(format!("key{}", i), "v".to_string(), Expiration::Default);
    }
    cache.add("key0", "again".to_string(), Expiration::Default);
    for i in 0..4 {
        cache.delete(&format!("key{}", i)).unwrap();
    }

    assert_eq!(cache.count(), 7);
    assert_eq!(cache.stats().total_entries, 6);
}

// == Background Sweeper ==

#[test]
fn test_sweeper_thread_evicts_within_interval() {
    let cache: Cache<String> = Cache::new(Duration::from_secs(300), Duration::from_millis(50));

    cache.add("short", "v".to_string(), Duration::from_millis(20));
    cache.add("long", "v".to_string(), Expiration::Never);
    assert_eq!(cache.count(), 2);

    sleep(Duration::from_millis(250));

    assert!(!cache.exists("short"));
    assert!(cache.exists("long"));
    assert_eq!(cache.count(), 1);
    assert_eq!(cache.stats().evictions, 1);

    cache.destroy().unwrap();
}

#[tokio::test]
async fn test_sweeper_evicts_inside_runtime() {
    let cache: Cache<String> = Cache::new(Duration::from_millis(20), Duration::from_millis(50));

    cache.add("default", "v".to_string(), Expiration::Default);

    tokio::time::sleep(Duration::from_millis(250)).await;

    assert!(!cache.exists("default"));
    assert_eq!(cache.count(), 0);

    cache.destroy().unwrap();
}

#[test]
fn test_from_config() {
    let config = Config {
        default_expiration: Duration::from_secs(10),
        sweep_interval: Duration::ZERO,
        count_mode: CountMode::EveryInsert,
    };

    let cache: Cache<String> = Cache::from_config(&config);

    assert_eq!(cache.default_expiration(), Duration::from_secs(10));
    assert_eq!(cache.sweep_interval(), Duration::ZERO);
    assert_eq!(cache.count_mode(), CountMode::EveryInsert);
}

// == Destroy ==

#[test]
fn test_destroy_with_sweeper() {
    let cache: Cache<String> = Cache::new(Duration::from_secs(300), Duration::from_millis(10));

    cache.add("a", "v".to_string(), Expiration::Default);
    cache.add("b", "v".to_string(), Expiration::Never);

    assert!(cache.destroy().is_ok());
    assert!(cache.is_destroyed());
    assert_eq!(cache.count(), 0);
    assert!(!cache.exists("a"));
    assert!(matches!(cache.get("b"), Err(CacheError::ItemNotFound(_))));

    // Second call is a no-op
    assert!(cache.destroy().is_ok());
}

#[test]
fn test_destroy_without_sweeper() {
    let cache = create_test_cache();
    cache.add("a", "v".to_string(), Expiration::Default);

    assert!(cache.destroy().is_ok());
    assert_eq!(cache.count(), 0);
}

#[test]
fn test_drop_clone_keeps_sweeper_running() {
    let cache: Cache<String> = Cache::new(Duration::from_secs(300), Duration::from_millis(20));
    let other = cache.clone();
    drop(cache);

    other.add("short", "v".to_string(), Duration::from_millis(10));
    sleep(Duration::from_millis(200));

    assert!(!other.exists("short"));
    assert_eq!(other.count(), 0);
}

// == Concurrency ==

#[test]
fn test_concurrent_stress_with_sweeper() {
    let cache: Cache<usize> = Cache::new(Duration::from_millis(5), Duration::from_millis(5));
    let threads = 8;
    let per_thread = 500;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..per_thread {
                    let key = format!("k{}", (t * per_thread + i) % 97);
                    match i % 4 {
                        0 => cache.add(key, i, Expiration::Default),
                        1 => cache.add(key, i, Expiration::Never),
                        2 => {
                            let _ = cache.get(&key);
                        }
                        _ => {
                            let _ = cache.delete(&key);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    // Let every default-lifetime item expire and get swept so the map settles
    sleep(Duration::from_millis(150));

    assert_eq!(cache.count(), cache.stats().total_entries);
    assert_eq!(cache.purge_expired(), 0);
    assert!(cache.count() <= 97);

    cache.destroy().unwrap();
    assert_eq!(cache.count(), 0);
}
